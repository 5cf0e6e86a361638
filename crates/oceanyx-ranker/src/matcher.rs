//! Species matching for sequence jobs.
//!
//! Scores every catalog entry through the configured [`SimilarityScorer`],
//! drops entries under the confidence floor, ranks the rest and keeps the
//! top K. Matching only runs while the job is `processing` and holds the
//! job's lease for the whole stage.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use oceanyx_common::confidence::clamp_percent;
use oceanyx_common::{CatalogEntry, Coverage, JobState, MatchResult, OceanyxError, Result};
use oceanyx_config::MatchingConfig;
use oceanyx_ingestion::{DecodedSequence, JobLease, JobManager};

use crate::results::ResultStore;
use crate::scorer::{SimilarityScore, SimilarityScorer};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingOptions {
    pub min_confidence_percent: f64,
    pub top_k: usize,
    pub coverage_tolerance: f64,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self::from(&MatchingConfig::default())
    }
}

impl From<&MatchingConfig> for MatchingOptions {
    fn from(cfg: &MatchingConfig) -> Self {
        Self {
            min_confidence_percent: cfg.min_confidence_percent,
            top_k: cfg.top_k,
            coverage_tolerance: cfg.coverage_tolerance,
        }
    }
}

impl MatchingOptions {
    pub fn coverage(&self, score: &SimilarityScore) -> Coverage {
        if score.reference_length == 0 {
            return Coverage::Partial;
        }
        let needed = score.reference_length as f64 * (1.0 - self.coverage_tolerance);
        if score.aligned_length as f64 >= needed {
            Coverage::Complete
        } else {
            Coverage::Partial
        }
    }
}

/// Turn raw scores into the ranked, floored, truncated match list.
pub fn rank_matches(
    scored: impl IntoIterator<Item = (CatalogEntry, SimilarityScore)>,
    options: &MatchingOptions,
) -> Vec<MatchResult> {
    let mut matches: Vec<MatchResult> = scored
        .into_iter()
        .filter_map(|(entry, score)| {
            let confidence = clamp_percent(score.confidence_percent);
            if confidence < options.min_confidence_percent {
                return None;
            }
            Some(MatchResult {
                species_id: entry.id,
                scientific_name: entry.scientific_name,
                common_name: entry.common_name,
                confidence_percent: confidence,
                supporting_sequence_count: score.supporting_sequences,
                coverage: options.coverage(&score),
            })
        })
        .collect();

    matches.sort_by(MatchResult::rank_cmp);
    matches.truncate(options.top_k);
    matches
}

pub struct SequenceMatchingEngine {
    jobs: Arc<JobManager>,
    scorer: Arc<dyn SimilarityScorer>,
    results: Arc<ResultStore>,
    options: MatchingOptions,
}

impl SequenceMatchingEngine {
    pub fn new(
        jobs: Arc<JobManager>,
        scorer: Arc<dyn SimilarityScorer>,
        results: Arc<ResultStore>,
        options: MatchingOptions,
    ) -> Self {
        Self { jobs, scorer, results, options }
    }

    pub fn results(&self) -> &Arc<ResultStore> {
        &self.results
    }

    /// Match a decoded sample for a `processing` job and publish the ranking.
    pub async fn match_sequence(
        &self,
        job_id: Uuid,
        decoded: DecodedSequence,
        catalog: Arc<[CatalogEntry]>,
    ) -> Result<Vec<MatchResult>> {
        let lease = self.jobs.lease(job_id).await?;
        self.match_with_lease(&lease, decoded, catalog).await
    }

    /// Same as [`match_sequence`](Self::match_sequence) for a caller that
    /// already holds the job's lease. Never transitions the job.
    #[instrument(skip_all, fields(job_id = %lease.id(), scorer = self.scorer.name()))]
    pub async fn match_with_lease(
        &self,
        lease: &JobLease,
        decoded: DecodedSequence,
        catalog: Arc<[CatalogEntry]>,
    ) -> Result<Vec<MatchResult>> {
        let job = lease.require_state(JobState::Processing)?;
        if decoded.is_empty() || decoded.total_bases() == 0 {
            return Err(OceanyxError::MalformedInput("sequence has no bases".to_string()));
        }

        debug!(reads = decoded.len(), entries = catalog.len(), "Scoring catalog");
        let scorer = Arc::clone(&self.scorer);
        let options = self.options.clone();
        let matches = tokio::task::spawn_blocking(move || {
            let scored = catalog.iter().filter_map(|entry| {
                scorer.score(&decoded, entry).map(|score| (entry.clone(), score))
            });
            rank_matches(scored, &options)
        })
        .await
        .map_err(|e| OceanyxError::Other(anyhow::anyhow!("scoring task failed: {e}")))?;

        self.results.publish(job.id, matches.clone()).await;
        info!(
            job_id = %job.id,
            matches = matches.len(),
            top = matches.first().map(|m| m.species_id.as_str()).unwrap_or("-"),
            "Match set published"
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceanyx_ingestion::{decode, ArtifactStore, EventBus};
    use oceanyx_test_utils::fixtures::{community_fasta, sample_catalog, sequence_artifact};
    use pretty_assertions::assert_eq;

    use crate::scorer::KmerScorer;

    fn score(confidence: f64, seqs: u32, aligned: usize) -> SimilarityScore {
        SimilarityScore {
            confidence_percent: confidence,
            supporting_sequences: seqs,
            aligned_length: aligned,
            reference_length: 100,
        }
    }

    fn entry(id: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            scientific_name: id.to_string(),
            common_name: id.to_string(),
            family: "Testidae".to_string(),
            conservation_status: None,
            habitat: None,
            depth_range: None,
            length_range: None,
            reference_sequence: None,
        }
    }

    async fn processing_job() -> (Arc<JobManager>, Uuid) {
        let artifacts = Arc::new(ArtifactStore::new(u64::MAX));
        let artifact = sequence_artifact();
        artifacts.insert(artifact.clone()).await;
        let jobs = Arc::new(JobManager::new(artifacts, EventBus::default()));
        let job = jobs.submit(&artifact).await.unwrap();
        (jobs, job.id)
    }

    fn engine(jobs: Arc<JobManager>) -> SequenceMatchingEngine {
        SequenceMatchingEngine::new(
            jobs,
            Arc::new(KmerScorer::default()),
            Arc::new(ResultStore::new()),
            MatchingOptions::default(),
        )
    }

    #[test]
    fn test_floor_and_ranking() {
        let scored = vec![
            (entry("low"), score(49.9, 50, 100)),
            (entry("b"), score(90.0, 4, 100)),
            (entry("a"), score(90.0, 4, 90)),
            (entry("top"), score(99.0, 1, 100)),
            (entry("edge"), score(50.0, 1, 100)),
        ];
        let ranked = rank_matches(scored, &MatchingOptions::default());
        let ids: Vec<&str> = ranked.iter().map(|m| m.species_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "a", "b", "edge"]);
        assert_eq!(ranked[1].coverage, Coverage::Partial);
        assert_eq!(ranked[2].coverage, Coverage::Complete);
    }

    #[test]
    fn test_ranking_independent_of_input_order() {
        let scored: Vec<_> = (0..30)
            .map(|i| (entry(&format!("sp{i:02}")), score(50.0 + (i % 7) as f64, i % 3, 100)))
            .collect();
        let forward = rank_matches(scored.clone(), &MatchingOptions::default());
        let backward = rank_matches(scored.into_iter().rev(), &MatchingOptions::default());
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 10);
    }

    #[test]
    fn test_scores_are_clamped() {
        let ranked = rank_matches(
            vec![(entry("over"), score(180.0, 1, 100)), (entry("nan"), score(f64::NAN, 1, 100))],
            &MatchingOptions::default(),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].confidence_percent, 100.0);
    }

    #[test]
    fn test_coverage_tolerance() {
        let options = MatchingOptions::default();
        assert_eq!(options.coverage(&score(90.0, 1, 95)), Coverage::Complete);
        assert_eq!(options.coverage(&score(90.0, 1, 94)), Coverage::Partial);
        let unknown = SimilarityScore { reference_length: 0, ..score(90.0, 1, 0) };
        assert_eq!(options.coverage(&unknown), Coverage::Partial);
    }

    #[tokio::test]
    async fn test_match_requires_processing() {
        let (jobs, job_id) = processing_job().await;
        let engine = engine(Arc::clone(&jobs));
        let decoded = decode(&community_fasta(&[("scarus-vetula", 2)])).unwrap();

        let err = engine
            .match_sequence(job_id, decoded, sample_catalog().into())
            .await
            .unwrap_err();
        assert!(matches!(err, OceanyxError::InvalidState { state: JobState::Queued, .. }));
        assert!(engine.results().get(job_id).await.is_none());
    }

    #[tokio::test]
    async fn test_match_publishes_ranking() {
        let (jobs, job_id) = processing_job().await;
        jobs.start(job_id).await.unwrap();
        let engine = engine(Arc::clone(&jobs));
        let decoded =
            decode(&community_fasta(&[("scarus-vetula", 3), ("pomacanthus-paru", 1)])).unwrap();

        let matches = engine
            .match_sequence(job_id, decoded, sample_catalog().into())
            .await
            .unwrap();
        let ids: Vec<&str> = matches.iter().map(|m| m.species_id.as_str()).collect();
        assert_eq!(ids, vec!["scarus-vetula", "pomacanthus-paru"]);
        assert_eq!(matches[0].supporting_sequence_count, 3);
        assert_eq!(matches[0].coverage, Coverage::Complete);

        let stored = engine.results().get(job_id).await.unwrap();
        assert_eq!(&stored[..], &matches[..]);
        // Matching does not move the job.
        assert_eq!(jobs.get(job_id).await.unwrap().state, JobState::Processing);
    }

    #[tokio::test]
    async fn test_empty_sample_malformed_without_transition() {
        let (jobs, job_id) = processing_job().await;
        jobs.start(job_id).await.unwrap();
        let engine = engine(Arc::clone(&jobs));
        let empty = DecodedSequence {
            format: oceanyx_ingestion::SequenceFormat::Raw,
            records: vec![],
        };

        let err = engine.match_sequence(job_id, empty, sample_catalog().into()).await.unwrap_err();
        assert!(matches!(err, OceanyxError::MalformedInput(_)));
        let job = jobs.get(job_id).await.unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.progress_percent, 0);
    }
}
