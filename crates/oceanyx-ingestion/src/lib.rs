//! oceanyx-ingestion: Artifact intake and job lifecycle.
//! - Artifact registration with kind inference and metadata tagging
//! - One job per artifact: queued → processing → completed | failed
//! - Per-job serialisation of processing operations
//! - Job change feed over a broadcast channel, with resync for lagging subscribers
//! - FASTA / FASTQ decoding for sequence artifacts

pub mod artifacts;
pub mod events;
pub mod fasta;
pub mod jobs;
pub mod watch;

pub use artifacts::{ArtifactRegistration, ArtifactStore};
pub use events::{EventBus, JobEvent};
pub use fasta::{decode, decode_bytes, DecodedSequence, SequenceFormat, SequenceRecord};
pub use jobs::{JobLease, JobManager};
pub use watch::{FeedItem, JobWatcher};
