//! oceanyx-common: Shared types, errors, and scoring helpers used across all Oceanyx crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod nucleotides;

// Re-export commonly used types
pub use entities::{
    Artifact, ArtifactMetadata, CatalogEntry, Coverage, Job, JobState, MatchResult,
    MetricsReport, MimeKind, SurveyParameter,
};
pub use error::{OceanyxError, Result};
