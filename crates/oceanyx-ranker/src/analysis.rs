//! End-to-end analysis of one sequence job.
//!
//! Stages, each a real progress boundary:
//!   start (if queued) → decode (25%) → match + publish (75%) → complete (100%)
//!
//! A boundary the job has already reached through manual `advance` calls is
//! skipped rather than sent backwards. The whole run holds the job's lease.
//! Any stage error fails the job with the error text; an expired deadline
//! fails it with reason `timeout`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use oceanyx_common::{
    CatalogEntry, Job, JobState, MatchResult, MetricsReport, MimeKind, OceanyxError, Result,
};
use oceanyx_config::Config;
use oceanyx_ingestion::{decode_bytes, JobLease, JobManager};

use crate::diversity::DiversityMetricsCalculator;
use crate::matcher::{MatchingOptions, SequenceMatchingEngine};
use crate::results::ResultStore;
use crate::scorer::SimilarityScorer;

pub const TIMEOUT_REASON: &str = "timeout";

const DECODED_PROGRESS: u8 = 25;
const MATCHED_PROGRESS: u8 = 75;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub job: Job,
    pub matches: Vec<MatchResult>,
    /// `None` when no match carried any supporting sequence.
    pub metrics: Option<MetricsReport>,
}

pub struct AnalysisService {
    jobs: Arc<JobManager>,
    engine: SequenceMatchingEngine,
    calculator: DiversityMetricsCalculator,
    catalog: Arc<[CatalogEntry]>,
    timeout: Duration,
}

impl AnalysisService {
    pub fn new(
        jobs: Arc<JobManager>,
        engine: SequenceMatchingEngine,
        calculator: DiversityMetricsCalculator,
        catalog: Arc<[CatalogEntry]>,
        timeout: Duration,
    ) -> Self {
        Self { jobs, engine, calculator, catalog, timeout }
    }

    /// Wire an analysis service from loaded configuration.
    pub fn from_config(
        config: &Config,
        jobs: Arc<JobManager>,
        scorer: Arc<dyn SimilarityScorer>,
        catalog: Arc<[CatalogEntry]>,
    ) -> Self {
        let engine = SequenceMatchingEngine::new(
            Arc::clone(&jobs),
            scorer,
            Arc::new(ResultStore::new()),
            MatchingOptions::from(&config.matching),
        );
        Self::new(
            jobs,
            engine,
            DiversityMetricsCalculator::from(&config.diversity),
            catalog,
            Duration::from_secs(config.ingestion.analysis_timeout_secs),
        )
    }

    pub fn jobs(&self) -> &Arc<JobManager> {
        &self.jobs
    }

    pub fn results(&self) -> &Arc<ResultStore> {
        self.engine.results()
    }

    /// Run every stage for a sequence job, within the configured deadline.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn run(&self, job_id: Uuid, content: &[u8]) -> Result<AnalysisOutcome> {
        let job = self.jobs.get(job_id).await?;
        let artifact = self.jobs.artifacts().get(job.artifact_id).await?;
        if artifact.mime_kind != MimeKind::Sequence {
            return Err(OceanyxError::InvalidInput(format!(
                "{} is {}, only sequence artifacts can be analysed",
                artifact.filename,
                artifact.mime_kind.as_str()
            )));
        }

        let started = Instant::now();
        match tokio::time::timeout(self.timeout, self.run_leased(job_id, content)).await {
            Ok(result) => result,
            Err(_) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(%job_id, elapsed_ms, "Analysis deadline expired");
                let current = self.jobs.get(job_id).await?;
                if !current.state.is_terminal() {
                    self.jobs.fail(job_id, TIMEOUT_REASON).await?;
                }
                Err(OceanyxError::Timeout {
                    operation: format!("analysis of job {job_id}"),
                    elapsed_ms,
                })
            }
        }
    }

    async fn run_leased(&self, job_id: Uuid, content: &[u8]) -> Result<AnalysisOutcome> {
        let lease = self.jobs.lease(job_id).await?;
        let result = self.stages(&lease, content).await;
        if let Err(e) = &result {
            if !lease.job().state.is_terminal() {
                if let Err(fail_err) = lease.fail(e.to_string()) {
                    warn!(%job_id, error = %fail_err, "Could not mark job failed");
                }
            }
        }
        result
    }

    async fn stages(&self, lease: &JobLease, content: &[u8]) -> Result<AnalysisOutcome> {
        if lease.job().state == JobState::Queued {
            lease.start()?;
        }
        lease.require_state(JobState::Processing)?;

        let decoded = decode_bytes(content)?;
        advance_past(lease, DECODED_PROGRESS)?;

        let matches = self
            .engine
            .match_with_lease(lease, decoded, Arc::clone(&self.catalog))
            .await?;
        advance_past(lease, MATCHED_PROGRESS)?;

        let metrics = match self.calculator.compute(&matches) {
            Ok(report) => Some(report),
            Err(OceanyxError::InsufficientData(_)) => None,
            Err(e) => return Err(e),
        };
        let job = lease.advance(100)?;

        info!(
            job_id = %job.id,
            matches = matches.len(),
            richness = metrics.map(|m| m.species_richness).unwrap_or(0),
            "Analysis complete"
        );
        Ok(AnalysisOutcome { job, matches, metrics })
    }

    /// Ranked matches of a completed job.
    pub async fn get_matches(&self, job_id: Uuid) -> Result<Arc<[MatchResult]>> {
        let job = self.jobs.get(job_id).await?;
        if job.state != JobState::Completed {
            return Err(OceanyxError::InvalidState {
                job_id,
                state: job.state,
                expected: JobState::Completed,
            });
        }
        self.results().get(job_id).await.ok_or_else(|| OceanyxError::NotFound {
            kind: "match set",
            id: job_id.to_string(),
        })
    }

    /// Diversity metrics of a completed job, computed from its stored matches.
    pub async fn get_metrics(&self, job_id: Uuid) -> Result<MetricsReport> {
        let matches = self.get_matches(job_id).await?;
        self.calculator.compute(&matches)
    }
}

/// Move an intermediate stage boundary forward unless the job is already past it.
fn advance_past(lease: &JobLease, boundary: u8) -> Result<()> {
    if lease.job().progress_percent < boundary {
        lease.advance(boundary)?;
    }
    Ok(())
}
