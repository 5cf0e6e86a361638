//! Liveness and basic counters.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub catalog_entries: usize,
    pub artifacts: usize,
    pub jobs: usize,
    pub event_subscribers: usize,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        catalog_entries: state.catalog.len(),
        artifacts: state.artifacts().list().await.len(),
        jobs: state.jobs().list_jobs().await.len(),
        event_subscribers: state.jobs().events().subscriber_count(),
    })
}
