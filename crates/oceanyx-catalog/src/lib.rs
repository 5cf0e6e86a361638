//! oceanyx-catalog: Species reference catalog.
//! - Loading the catalog from YAML/JSON once at startup
//! - Case-insensitive substring search by scientific or common name
//! - Family filter and family summary

pub mod index;
pub mod loader;

pub use index::{CatalogSearchIndex, FamilySummary, MAX_QUERY_CHARS};
pub use loader::load_catalog;
