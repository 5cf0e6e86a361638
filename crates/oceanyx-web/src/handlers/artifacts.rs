//! Artifact registration and lookup.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use oceanyx_common::{Artifact, Job};
use oceanyx_ingestion::ArtifactRegistration;

use crate::error::ApiResult;
use crate::handlers::parse_id;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct ArtifactWithJob {
    pub artifact: Artifact,
    /// Most recent job for the artifact.
    pub job: Option<Job>,
}

/// POST /api/artifacts - Register an upload and queue its job
pub async fn register_artifact(
    State(state): State<SharedState>,
    payload: Result<Json<ArtifactRegistration>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(registration) = payload?;
    let artifact = state.artifacts().register(registration).await?;
    let job = state.jobs().submit(&artifact).await?;
    Ok((StatusCode::CREATED, Json(ArtifactWithJob { artifact, job: Some(job) })))
}

/// GET /api/artifacts - All artifacts, oldest first
pub async fn list_artifacts(State(state): State<SharedState>) -> Json<Vec<Artifact>> {
    Json(state.artifacts().list().await)
}

/// GET /api/artifacts/{id}
pub async fn get_artifact(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ArtifactWithJob>> {
    let id = parse_id(&id)?;
    let artifact = state.artifacts().get(id).await?;
    let job = state.jobs().job_for_artifact(id).await;
    Ok(Json(ArtifactWithJob { artifact, job }))
}

/// POST /api/artifacts/{id}/jobs - Queue a fresh job once the previous one has ended
pub async fn resubmit_artifact(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let artifact = state.artifacts().get(parse_id(&id)?).await?;
    let job = state.jobs().submit(&artifact).await?;
    Ok((StatusCode::CREATED, Json(job)))
}
