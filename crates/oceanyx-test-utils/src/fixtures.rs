//! Canned catalog, artifacts and sequence files.

use chrono::Utc;
use uuid::Uuid;

use oceanyx_common::{
    Artifact, ArtifactMetadata, CatalogEntry, Coverage, MatchResult, MimeKind,
};

/// (id, scientific name, common name, family, 48bp reference barcode)
const SPECIES: &[(&str, &str, &str, &str, &str)] = &[
    ("epinephelus-malabaricus", "Epinephelus malabaricus", "Malabar Grouper", "Serranidae",
     "GCTAAAGACAATTACATAACATACACGTCAGCACGAAACTTGTTGGCC"),
    ("scarus-coeruleus", "Scarus coeruleus", "Blue Parrotfish", "Scaridae",
     "CAGTGTGAATCGCTTAAGGGTTAAGTAAGTGTGATGCATACGCCTTTA"),
    ("pomacanthus-imperator", "Pomacanthus imperator", "Emperor Angelfish", "Pomacanthidae",
     "CTTGCTGTGTCCACCCCATCGGACTGGCATTTTTATTACACTCAGAAA"),
    ("chaetodon-auriga", "Chaetodon auriga", "Threadfin Butterflyfish", "Chaetodontidae",
     "CAGAACTCGGGTAATTTTGACAGGTCACGCAGAGGCGCGCCCTCCTGA"),
    ("acanthurus-coeruleus", "Acanthurus coeruleus", "Blue Tang", "Acanthuridae",
     "AGTGCGTGGACACTCGCTATGAATCTCTGATTTACCCACTCTGCCAAA"),
    ("epinephelus-striatus", "Epinephelus striatus", "Nassau Grouper", "Serranidae",
     "CTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATAATGCGTTC"),
    ("scarus-vetula", "Scarus vetula", "Queen Parrotfish", "Scaridae",
     "GCTCTATTGACTACGACGCGCTCATTCCCTTGTCGGAGAGTTATGGAA"),
    ("pomacanthus-paru", "Pomacanthus paru", "French Angelfish", "Pomacanthidae",
     "CAAGGACGCTGTCTGAGACTAGAAGACAGATAGTGCACACGACCGGCG"),
];

/// Eight reef species across five families, each with a reference barcode.
pub fn sample_catalog() -> Vec<CatalogEntry> {
    SPECIES
        .iter()
        .map(|(id, sci, common, family, seq)| CatalogEntry {
            id: id.to_string(),
            scientific_name: sci.to_string(),
            common_name: common.to_string(),
            family: family.to_string(),
            conservation_status: Some("Least Concern".to_string()),
            habitat: Some("Coral reefs".to_string()),
            depth_range: None,
            length_range: None,
            reference_sequence: Some(seq.to_string()),
        })
        .collect()
}

/// Reference barcode for a catalog species.
pub fn reference_of(species_id: &str) -> &'static str {
    SPECIES
        .iter()
        .find(|(id, ..)| *id == species_id)
        .map(|(.., seq)| *seq)
        .unwrap_or_else(|| panic!("unknown fixture species {species_id}"))
}

/// Render `(name, bases)` pairs as FASTA text.
pub fn fasta(records: &[(&str, &str)]) -> String {
    records
        .iter()
        .map(|(name, bases)| format!(">{name}\n{bases}\n"))
        .collect()
}

/// FASTA with `copies` full-length reads of each listed species.
pub fn community_fasta(abundances: &[(&str, usize)]) -> String {
    let mut out = String::new();
    for (species, copies) in abundances {
        for i in 0..*copies {
            out.push_str(&format!(">{species}_{i}\n{}\n", reference_of(species)));
        }
    }
    out
}

pub fn artifact(filename: &str, mime_kind: MimeKind) -> Artifact {
    Artifact {
        id: Uuid::new_v4(),
        filename: filename.to_string(),
        size_bytes: 5_700_000,
        mime_kind,
        uploaded_at: Utc::now(),
        metadata: ArtifactMetadata::default(),
    }
}

pub fn sequence_artifact() -> Artifact {
    artifact("edna_samples_pacific.fasta", MimeKind::Sequence)
}

/// A match result with only the fields diversity maths cares about.
pub fn matched(species_id: &str, supporting_sequence_count: u32) -> MatchResult {
    MatchResult {
        species_id: species_id.to_string(),
        scientific_name: species_id.to_string(),
        common_name: species_id.to_string(),
        confidence_percent: 90.0,
        supporting_sequence_count,
        coverage: Coverage::Complete,
    }
}
