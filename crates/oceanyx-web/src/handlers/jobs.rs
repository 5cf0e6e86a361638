//! Job lifecycle endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use oceanyx_common::{Job, MetricsReport};

use crate::error::ApiResult;
use crate::handlers::{parse_id, results::MatchView};
use crate::state::SharedState;

// ── Request bodies ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub progress_percent: u8,
}

#[derive(Debug, Deserialize)]
pub struct FailRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// FASTA, FASTQ or bare sequence text.
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub job: Job,
    pub matches: Vec<MatchView>,
    pub metrics: Option<MetricsReport>,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/jobs - All jobs, oldest first
pub async fn list_jobs(State(state): State<SharedState>) -> Json<Vec<Job>> {
    Json(state.jobs().list_jobs().await)
}

/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.jobs().get(parse_id(&id)?).await?))
}

/// POST /api/jobs/{id}/start
pub async fn start_job(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.jobs().start(parse_id(&id)?).await?))
}

/// POST /api/jobs/{id}/advance - Body: {"progress_percent": 40}
pub async fn advance_job(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<AdvanceRequest>, JsonRejection>,
) -> ApiResult<Json<Job>> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    Ok(Json(state.jobs().advance(id, req.progress_percent).await?))
}

/// POST /api/jobs/{id}/fail - Body: {"reason": "..."}
pub async fn fail_job(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<FailRequest>, JsonRejection>,
) -> ApiResult<Json<Job>> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    Ok(Json(state.jobs().fail(id, req.reason).await?))
}

/// POST /api/jobs/{id}/analyze - Run decode, matching and metrics for a sequence job
pub async fn analyze_job(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let outcome = state.analysis.run(id, req.content.as_bytes()).await?;
    Ok(Json(AnalyzeResponse {
        job: outcome.job,
        matches: outcome.matches.into_iter().map(MatchView::from).collect(),
        metrics: outcome.metrics,
    }))
}
