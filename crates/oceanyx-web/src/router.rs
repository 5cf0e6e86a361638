//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    artifacts::{get_artifact, list_artifacts, register_artifact, resubmit_artifact},
    jobs::{advance_job, analyze_job, fail_job, get_job, list_jobs, start_job},
    results::{job_matches, job_metrics},
    search::{catalog_families, catalog_search, catalog_species},
    system::health,
};
use crate::sse::sse_handler;
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/health", get(health))

        // Artifacts
        .route("/api/artifacts",           get(list_artifacts).post(register_artifact))
        .route("/api/artifacts/{id}",      get(get_artifact))
        .route("/api/artifacts/{id}/jobs", post(resubmit_artifact))

        // Jobs
        .route("/api/jobs",               get(list_jobs))
        .route("/api/jobs/{id}",          get(get_job))
        .route("/api/jobs/{id}/start",    post(start_job))
        .route("/api/jobs/{id}/advance",  post(advance_job))
        .route("/api/jobs/{id}/fail",     post(fail_job))
        .route("/api/jobs/{id}/analyze",  post(analyze_job))
        .route("/api/jobs/{id}/matches",  get(job_matches))
        .route("/api/jobs/{id}/metrics",  get(job_metrics))

        // Catalog
        .route("/api/catalog/search",       get(catalog_search))
        .route("/api/catalog/families",     get(catalog_families))
        .route("/api/catalog/species/{id}", get(catalog_species))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
