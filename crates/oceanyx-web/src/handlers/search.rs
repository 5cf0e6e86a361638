//! Species catalog search.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use oceanyx_catalog::FamilySummary;
use oceanyx_common::{CatalogEntry, OceanyxError};

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    /// Exact family name; "all" or empty means no filter.
    pub family: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub family: Option<String>,
    pub total: usize,
    pub results: Vec<CatalogEntry>,
}

/// GET /api/catalog/search?q=angel&family=Pomacanthidae
pub async fn catalog_search(
    State(state): State<SharedState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Json<SearchResponse>> {
    let Query(query) = query?;
    let results: Vec<CatalogEntry> = state
        .catalog
        .search_in_family(&query.q, query.family.as_deref())?
        .cloned()
        .collect();

    Ok(Json(SearchResponse {
        total: results.len(),
        results,
        query: query.q,
        family: query.family,
    }))
}

/// GET /api/catalog/families
pub async fn catalog_families(State(state): State<SharedState>) -> Json<Vec<FamilySummary>> {
    Json(state.catalog.families())
}

/// GET /api/catalog/species/{id}
pub async fn catalog_species(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CatalogEntry>> {
    let entry = state
        .catalog
        .get(&id)
        .cloned()
        .ok_or(OceanyxError::NotFound { kind: "species", id })?;
    Ok(Json(entry))
}
