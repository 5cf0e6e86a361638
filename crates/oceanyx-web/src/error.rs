//! JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use oceanyx_common::OceanyxError;

/// Handler error: an [`OceanyxError`] rendered as `{"error": {code, message, status}}`.
#[derive(Debug)]
pub struct ApiError(pub OceanyxError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            OceanyxError::NotFound { .. } => StatusCode::NOT_FOUND,
            OceanyxError::DuplicateArtifact { .. }
            | OceanyxError::InvalidTransition { .. }
            | OceanyxError::InvalidState { .. } => StatusCode::CONFLICT,
            OceanyxError::MalformedInput(_) | OceanyxError::InsufficientData(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            OceanyxError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            OceanyxError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            OceanyxError::Config(_) | OceanyxError::Serialization(_) | OceanyxError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<OceanyxError> for ApiError {
    fn from(err: OceanyxError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(OceanyxError::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(OceanyxError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": self.0.code(),
                "message": self.0.to_string(),
                "status": status.as_u16(),
            }
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use oceanyx_common::JobState;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (OceanyxError::job_not_found(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                OceanyxError::InvalidTransition {
                    job_id: Uuid::nil(),
                    state: JobState::Completed,
                    operation: "advance",
                },
                StatusCode::CONFLICT,
            ),
            (OceanyxError::MalformedInput("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (OceanyxError::InsufficientData("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (OceanyxError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                OceanyxError::Timeout { operation: "analysis".into(), elapsed_ms: 5 },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (OceanyxError::Other(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
