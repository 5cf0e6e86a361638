//! HTTP handlers for all API routes.

pub mod artifacts;
pub mod jobs;
pub mod results;
pub mod search;
pub mod system;

use uuid::Uuid;

use oceanyx_common::OceanyxError;

use crate::error::ApiError;

/// Parse a path id, rejecting anything that is not a UUID.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError(OceanyxError::InvalidInput(format!("not a valid id: {raw}"))))
}
