/// Core record types shared by the ingestion, matching and catalog crates.
/// Everything here is plain data; lifecycle rules live in `oceanyx-ingestion`.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OceanyxError, Result};

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// Broad content class of an uploaded artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MimeKind {
    Tabular,
    Imagery,
    Sequence,
}

impl MimeKind {
    /// Infer the kind from a filename extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "json"                        => Some(MimeKind::Tabular),
            "jpg" | "jpeg" | "png" | "tif" | "tiff" | "zip" => Some(MimeKind::Imagery),
            "fasta" | "fa" | "fastq" | "fq"               => Some(MimeKind::Sequence),
            _                                             => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeKind::Tabular  => "tabular",
            MimeKind::Imagery  => "imagery",
            MimeKind::Sequence => "sequence",
        }
    }
}

/// Survey parameter an upload was collected for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SurveyParameter {
    Temperature,
    Salinity,
    Biodiversity,
    Edna,
    WaterQuality,
}

/// Optional field context attached at upload time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtifactMetadata {
    pub collection_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub parameter: Option<SurveyParameter>,
    pub depth_meters: Option<f64>,
    pub notes: Option<String>,
}

/// Deepest point in the ocean, rounded up.
pub const MAX_DEPTH_METERS: f64 = 11_000.0;

impl ArtifactMetadata {
    pub fn validate(&self) -> Result<()> {
        if let Some(depth) = self.depth_meters {
            if !(0.0..=MAX_DEPTH_METERS).contains(&depth) {
                return Err(OceanyxError::InvalidInput(format!(
                    "depth {depth}m outside 0-{MAX_DEPTH_METERS}m"
                )));
            }
        }
        Ok(())
    }
}

/// An uploaded research file. Immutable once registered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: u64,
    pub mime_kind: MimeKind,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ArtifactMetadata,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Processing lifecycle state of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued     => "queued",
            JobState::Processing => "processing",
            JobState::Completed  => "completed",
            JobState::Failed     => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one artifact's processing lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub artifact_id: Uuid,
    pub state: JobState,
    pub progress_percent: u8,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Species reference record. Loaded once, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub scientific_name: String,
    pub common_name: String,
    pub family: String,
    #[serde(default)]
    pub conservation_status: Option<String>,
    #[serde(default)]
    pub habitat: Option<String>,
    #[serde(default)]
    pub depth_range: Option<String>,
    #[serde(default)]
    pub length_range: Option<String>,
    /// Barcode region used by sequence scorers, if known.
    #[serde(default)]
    pub reference_sequence: Option<String>,
}

impl CatalogEntry {
    pub fn reference_length(&self) -> usize {
        self.reference_sequence.as_deref().map_or(0, str::len)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Complete,
    Partial,
}

/// A scored candidate species identification for a sequence job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub species_id: String,
    pub scientific_name: String,
    pub common_name: String,
    pub confidence_percent: f64,
    pub supporting_sequence_count: u32,
    pub coverage: Coverage,
}

impl MatchResult {
    /// Ranking order: confidence desc, supporting count desc, species id asc.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence_percent
            .total_cmp(&self.confidence_percent)
            .then_with(|| other.supporting_sequence_count.cmp(&self.supporting_sequence_count))
            .then_with(|| self.species_id.cmp(&other.species_id))
    }
}

/// Community diversity statistics derived from a match set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricsReport {
    pub shannon_index: f64,
    pub species_richness: usize,
    pub evenness: f64,
    pub rare_species_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(id: &str, confidence: f64, seqs: u32) -> MatchResult {
        MatchResult {
            species_id: id.to_string(),
            scientific_name: id.to_string(),
            common_name: id.to_string(),
            confidence_percent: confidence,
            supporting_sequence_count: seqs,
            coverage: Coverage::Partial,
        }
    }

    #[test]
    fn test_mime_kind_from_extension() {
        assert_eq!(MimeKind::from_filename("coral_reef_survey_2024.csv"), Some(MimeKind::Tabular));
        assert_eq!(MimeKind::from_filename("species_photos_batch1.ZIP"), Some(MimeKind::Imagery));
        assert_eq!(MimeKind::from_filename("edna_samples_pacific.fasta"), Some(MimeKind::Sequence));
        assert_eq!(MimeKind::from_filename("reads.fq"), Some(MimeKind::Sequence));
        assert_eq!(MimeKind::from_filename("notes.docx"), None);
        assert_eq!(MimeKind::from_filename("README"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_rank_cmp_tie_breaks() {
        let mut v = vec![
            m("b", 90.0, 10),
            m("a", 90.0, 10),
            m("c", 90.0, 12),
            m("d", 95.0, 1),
        ];
        v.sort_by(MatchResult::rank_cmp);
        let ids: Vec<&str> = v.iter().map(|r| r.species_id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn test_metadata_depth_bounds() {
        let ok = ArtifactMetadata { depth_meters: Some(150.0), ..Default::default() };
        assert!(ok.validate().is_ok());
        let bad = ArtifactMetadata { depth_meters: Some(-3.0), ..Default::default() };
        assert!(matches!(bad.validate(), Err(OceanyxError::InvalidInput(_))));
    }

    #[test]
    fn test_job_state_serializes_snake_case() {
        let json = serde_json::to_string(&JobState::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
