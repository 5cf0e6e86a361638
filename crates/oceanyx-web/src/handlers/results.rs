//! Match sets and diversity metrics of completed jobs.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use oceanyx_common::confidence::ConfidenceBand;
use oceanyx_common::{MatchResult, MetricsReport};

use crate::error::ApiResult;
use crate::handlers::parse_id;
use crate::state::SharedState;

/// A match as shown on the dashboard, with its confidence band.
#[derive(Debug, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub result: MatchResult,
    pub band: ConfidenceBand,
}

impl From<MatchResult> for MatchView {
    fn from(result: MatchResult) -> Self {
        let band = ConfidenceBand::from_percent(result.confidence_percent);
        Self { result, band }
    }
}

/// GET /api/jobs/{id}/matches
pub async fn job_matches(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<MatchView>>> {
    let matches = state.analysis.get_matches(parse_id(&id)?).await?;
    Ok(Json(matches.iter().cloned().map(MatchView::from).collect()))
}

/// GET /api/jobs/{id}/metrics
pub async fn job_metrics(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MetricsReport>> {
    Ok(Json(state.analysis.get_metrics(parse_id(&id)?).await?))
}
