//! Shared application state for the web server.

use std::sync::Arc;

use oceanyx_catalog::CatalogSearchIndex;
use oceanyx_config::Config;
use oceanyx_ingestion::{ArtifactStore, EventBus, JobManager};
use oceanyx_ranker::{AnalysisService, KmerScorer, SimilarityScorer};

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogSearchIndex,
    pub analysis: AnalysisService,
}

impl AppState {
    /// State with the built-in k-mer scorer.
    pub fn new(config: Config, catalog: CatalogSearchIndex) -> Self {
        let scorer = Arc::new(
            KmerScorer::new(config.matching.kmer_size)
                .with_min_read_identity(config.matching.min_read_identity_percent),
        );
        Self::with_scorer(config, catalog, scorer)
    }

    pub fn with_scorer(
        config: Config,
        catalog: CatalogSearchIndex,
        scorer: Arc<dyn SimilarityScorer>,
    ) -> Self {
        let artifacts = Arc::new(ArtifactStore::new(config.ingestion.max_artifact_bytes));
        let events = EventBus::new(config.ingestion.event_buffer);
        let jobs = Arc::new(JobManager::new(artifacts, events));
        let analysis = AnalysisService::from_config(&config, jobs, scorer, catalog.entries());
        Self { config, catalog, analysis }
    }

    pub fn jobs(&self) -> &Arc<JobManager> {
        self.analysis.jobs()
    }

    pub fn artifacts(&self) -> &Arc<ArtifactStore> {
        self.jobs().artifacts()
    }
}

pub type SharedState = Arc<AppState>;
