//! Catalog file loading.
//!
//! Accepts either a bare list of entries or a document with a top-level
//! `species:` list, in YAML or JSON (picked by extension).

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use oceanyx_common::{CatalogEntry, OceanyxError, Result};

use crate::index::CatalogSearchIndex;

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { species: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

impl CatalogFile {
    fn into_entries(self) -> Vec<CatalogEntry> {
        match self {
            CatalogFile::Wrapped { species } => species,
            CatalogFile::Bare(entries) => entries,
        }
    }
}

/// Parse catalog entries from text. `format` is a file extension.
pub fn parse_catalog(content: &str, format: &str) -> Result<Vec<CatalogEntry>> {
    let file: CatalogFile = match format {
        "json" => serde_json::from_str(content)?,
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| OceanyxError::InvalidInput(format!("catalog yaml: {e}")))?,
        other => {
            return Err(OceanyxError::InvalidInput(format!(
                "unsupported catalog format: {other}"
            )))
        }
    };
    Ok(file.into_entries())
}

/// Load and index the catalog at `path`.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogSearchIndex> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let format = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
    let entries = parse_catalog(&content, format)?;
    let index = CatalogSearchIndex::new(entries)?;
    info!(path = %path.display(), entries = index.len(), "Catalog loaded");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
species:
  - id: pomacanthus-imperator
    scientific_name: Pomacanthus imperator
    common_name: Emperor Angelfish
    family: Pomacanthidae
    habitat: Coral reefs, lagoons
  - id: chaetodon-auriga
    scientific_name: Chaetodon auriga
    common_name: Threadfin Butterflyfish
    family: Chaetodontidae
"#;

    #[test]
    fn test_parse_wrapped_yaml() {
        let entries = parse_catalog(YAML, "yaml").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].habitat.as_deref(), Some("Coral reefs, lagoons"));
        assert!(entries[1].reference_sequence.is_none());
    }

    #[test]
    fn test_parse_bare_json() {
        let json = r#"[{"id":"a","scientific_name":"A a","common_name":"Aa","family":"F"}]"#;
        let entries = parse_catalog(json, "json").unwrap();
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(matches!(parse_catalog("", "xml"), Err(OceanyxError::InvalidInput(_))));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let index = load_catalog(file.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.get("chaetodon-auriga").is_some());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(load_catalog("/no/such/catalog.yaml"), Err(OceanyxError::Other(_))));
    }
}
