use thiserror::Error;
use uuid::Uuid;

use crate::entities::JobState;

#[derive(Debug, Error)]
pub enum OceanyxError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Artifact {artifact_id} already has a live job ({job_id})")]
    DuplicateArtifact { artifact_id: Uuid, job_id: Uuid },

    #[error("Invalid transition for job {job_id}: cannot {operation} while {state}")]
    InvalidTransition {
        job_id: Uuid,
        state: JobState,
        operation: &'static str,
    },

    #[error("Job {job_id} is {state}, expected {expected}")]
    InvalidState {
        job_id: Uuid,
        state: JobState,
        expected: JobState,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out after {elapsed_ms}ms: {operation}")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OceanyxError {
    pub fn job_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "job", id: id.to_string() }
    }

    pub fn artifact_not_found(id: Uuid) -> Self {
        Self::NotFound { kind: "artifact", id: id.to_string() }
    }

    /// Stable machine-readable code, used by API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. }          => "not_found",
            Self::DuplicateArtifact { .. } => "duplicate_artifact",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InvalidState { .. }      => "invalid_state",
            Self::MalformedInput(_)        => "malformed_input",
            Self::InsufficientData(_)      => "insufficient_data",
            Self::InvalidInput(_)          => "invalid_input",
            Self::Timeout { .. }           => "timeout",
            Self::Config(_)                => "config",
            Self::Serialization(_)         => "serialization",
            Self::Other(_)                 => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, OceanyxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_kind() {
        let id = Uuid::nil();
        let err = OceanyxError::job_not_found(id);
        assert_eq!(err.to_string(), format!("job not found: {id}"));
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = OceanyxError::InvalidTransition {
            job_id: Uuid::nil(),
            state: JobState::Completed,
            operation: "advance",
        };
        assert!(err.to_string().contains("cannot advance while completed"));
    }
}
