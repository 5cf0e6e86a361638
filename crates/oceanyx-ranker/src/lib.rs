//! oceanyx-ranker: Species matching and community diversity.
//! - Pluggable similarity scoring (k-mer overlap scorer included)
//! - Ranked, floored, top-K species matches per sequence job
//! - Shannon diversity, richness, evenness and rarity
//! - End-to-end analysis driver for sequence jobs

pub mod analysis;
pub mod diversity;
pub mod matcher;
pub mod results;
pub mod scorer;

pub use analysis::{AnalysisOutcome, AnalysisService};
pub use diversity::DiversityMetricsCalculator;
pub use matcher::{MatchingOptions, SequenceMatchingEngine};
pub use results::ResultStore;
pub use scorer::{KmerScorer, SimilarityScore, SimilarityScorer};
