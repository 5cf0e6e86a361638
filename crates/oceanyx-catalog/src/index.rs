//! In-memory catalog search.
//!
//! The index keeps the catalog in load order alongside pre-lowercased name
//! keys, so a search is a single filtered pass that borrows from the index.
//! Results are lazy iterators; the dashboard re-runs them per keystroke.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use oceanyx_common::{nucleotides, CatalogEntry, OceanyxError, Result};

/// Longest accepted query, in characters.
pub const MAX_QUERY_CHARS: usize = 256;

#[derive(Debug)]
struct SearchKeys {
    scientific: String,
    common: String,
    family: String,
}

impl SearchKeys {
    fn of(entry: &CatalogEntry) -> Self {
        Self {
            scientific: entry.scientific_name.to_lowercase(),
            common: entry.common_name.to_lowercase(),
            family: entry.family.to_lowercase(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        needle.is_empty() || self.scientific.contains(needle) || self.common.contains(needle)
    }
}

/// Number of catalog entries per family.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FamilySummary {
    pub family: String,
    pub entry_count: usize,
}

/// Read-only search index over a species catalog.
#[derive(Debug, Clone)]
pub struct CatalogSearchIndex {
    entries: Arc<[CatalogEntry]>,
    keys: Arc<[SearchKeys]>,
}

impl CatalogSearchIndex {
    /// Build an index. Entry ids must be unique and names non-empty.
    /// Reference sequences are normalised to upper-case DNA and must hold
    /// only nucleotide symbols.
    pub fn new(mut entries: Vec<CatalogEntry>) -> Result<Self> {
        for entry in &mut entries {
            if let Some(raw) = entry.reference_sequence.as_deref() {
                let bases = nucleotides::normalise(raw).ok_or_else(|| {
                    OceanyxError::InvalidInput(format!(
                        "catalog entry {} has an invalid reference sequence",
                        entry.id
                    ))
                })?;
                entry.reference_sequence = Some(bases);
            }
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(OceanyxError::InvalidInput("catalog entry with empty id".to_string()));
            }
            if entry.scientific_name.trim().is_empty() {
                return Err(OceanyxError::InvalidInput(format!(
                    "catalog entry {} has no scientific name",
                    entry.id
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(OceanyxError::InvalidInput(format!(
                    "duplicate catalog id {}",
                    entry.id
                )));
            }
        }
        let keys: Vec<SearchKeys> = entries.iter().map(SearchKeys::of).collect();
        Ok(Self { entries: entries.into(), keys: keys.into() })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared handle to the entries, in load order.
    pub fn entries(&self) -> Arc<[CatalogEntry]> {
        Arc::clone(&self.entries)
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Case-insensitive substring search on scientific or common name.
    /// An empty query yields the whole catalog in load order.
    pub fn search<'a>(&'a self, query: &str) -> Result<impl Iterator<Item = &'a CatalogEntry> + 'a> {
        self.search_in_family(query, None)
    }

    /// Like [`search`](Self::search), narrowed to one family (case-insensitive, exact).
    pub fn search_in_family<'a>(
        &'a self,
        query: &str,
        family: Option<&str>,
    ) -> Result<impl Iterator<Item = &'a CatalogEntry> + 'a> {
        let needle = normalise_query(query)?;
        let family = family
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty() && f != "all");

        Ok(self
            .entries
            .iter()
            .zip(self.keys.iter())
            .filter(move |(_, keys)| {
                family.as_deref().map_or(true, |f| keys.family == f) && keys.matches(&needle)
            })
            .map(|(entry, _)| entry))
    }

    /// Families with their entry counts, in first-seen order.
    pub fn families(&self) -> Vec<FamilySummary> {
        let mut out: Vec<FamilySummary> = Vec::new();
        for entry in self.entries.iter() {
            match out.iter_mut().find(|s| s.family == entry.family) {
                Some(summary) => summary.entry_count += 1,
                None => out.push(FamilySummary { family: entry.family.clone(), entry_count: 1 }),
            }
        }
        out
    }
}

/// Search an arbitrary catalog slice without building an index.
pub fn search<'a>(
    query: &str,
    catalog: &'a [CatalogEntry],
) -> Result<impl Iterator<Item = &'a CatalogEntry> + 'a> {
    let needle = normalise_query(query)?;
    Ok(catalog.iter().filter(move |entry| SearchKeys::of(entry).matches(&needle)))
}

fn normalise_query(query: &str) -> Result<String> {
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(OceanyxError::InvalidInput(format!(
            "query longer than {MAX_QUERY_CHARS} characters"
        )));
    }
    if query.chars().any(char::is_control) {
        return Err(OceanyxError::InvalidInput("query contains control characters".to_string()));
    }
    Ok(query.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceanyx_test_utils::fixtures::sample_catalog;
    use pretty_assertions::assert_eq;

    fn names<'a>(it: impl Iterator<Item = &'a CatalogEntry>) -> Vec<&'a str> {
        it.map(|e| e.common_name.as_str()).collect()
    }

    #[test]
    fn test_angel_matches_common_name_case_insensitively() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        let hits = names(index.search("angel").unwrap());
        assert!(hits.contains(&"Emperor Angelfish"));
        assert!(hits.contains(&"French Angelfish"));
        assert!(hits.iter().all(|n| n.to_lowercase().contains("angel")));
    }

    #[test]
    fn test_scientific_name_match() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        let hits = names(index.search("EPINEPHELUS").unwrap());
        assert_eq!(hits, vec!["Malabar Grouper", "Nassau Grouper"]);
    }

    #[test]
    fn test_empty_query_returns_catalog_in_order() {
        let catalog = sample_catalog();
        let index = CatalogSearchIndex::new(catalog.clone()).unwrap();
        let all: Vec<&CatalogEntry> = index.search("").unwrap().collect();
        assert_eq!(all.len(), catalog.len());
        for (got, want) in all.iter().zip(catalog.iter()) {
            assert_eq!(got.id, want.id);
        }
    }

    #[test]
    fn test_search_is_restartable() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        let first = names(index.search("fish").unwrap());
        let second = names(index.search("fish").unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_match_yields_nothing() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        assert_eq!(index.search("kraken").unwrap().count(), 0);
    }

    #[test]
    fn test_family_filter() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        let hits = names(index.search_in_family("", Some("pomacanthidae")).unwrap());
        assert_eq!(hits, vec!["Emperor Angelfish", "French Angelfish"]);
        let all = index.search_in_family("", Some("all")).unwrap().count();
        assert_eq!(all, index.len());
    }

    #[test]
    fn test_control_characters_rejected() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        assert!(matches!(index.search("angel\u{0007}"), Err(OceanyxError::InvalidInput(_))));
        let long = "a".repeat(MAX_QUERY_CHARS + 1);
        assert!(matches!(index.search(&long), Err(OceanyxError::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut catalog = sample_catalog();
        let dup = catalog[0].clone();
        catalog.push(dup);
        assert!(matches!(CatalogSearchIndex::new(catalog), Err(OceanyxError::InvalidInput(_))));
    }

    #[test]
    fn test_reference_sequences_normalised() {
        let mut catalog = sample_catalog();
        catalog[0].reference_sequence = Some("acguacgu".to_string());
        let index = CatalogSearchIndex::new(catalog).unwrap();
        assert_eq!(index.entries()[0].reference_sequence.as_deref(), Some("ACGTACGT"));
    }

    #[test]
    fn test_non_nucleotide_reference_rejected() {
        for bad in ["ACGTACGTÄACGTACGT", "ACGT ACGT", ""] {
            let mut catalog = sample_catalog();
            catalog[2].reference_sequence = Some(bad.to_string());
            let err = CatalogSearchIndex::new(catalog).unwrap_err();
            assert!(matches!(err, OceanyxError::InvalidInput(_)), "{bad:?}: {err}");
        }
    }

    #[test]
    fn test_families_first_seen_order() {
        let index = CatalogSearchIndex::new(sample_catalog()).unwrap();
        let families = index.families();
        assert_eq!(families[0].family, "Serranidae");
        let total: usize = families.iter().map(|f| f.entry_count).sum();
        assert_eq!(total, index.len());
    }

    #[test]
    fn test_free_function_matches_index() {
        let catalog = sample_catalog();
        let index = CatalogSearchIndex::new(catalog.clone()).unwrap();
        let a = names(search("parrot", &catalog).unwrap());
        let b = names(index.search("parrot").unwrap());
        assert_eq!(a, b);
    }
}
