//! Job change feed.
//!
//! Every committed job change is broadcast as a [`JobEvent`]. Events are sent
//! while the job's processing gate is held, so one job's events always arrive
//! in the order they happened; events of different jobs interleave freely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use oceanyx_common::{Job, JobState};

/// One observed change of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobEvent {
    pub job_id: Uuid,
    pub artifact_id: Uuid,
    /// `None` when the job was just created.
    pub old_state: Option<JobState>,
    pub new_state: JobState,
    pub progress_percent: u8,
    pub error_reason: Option<String>,
    pub at: DateTime<Utc>,
    /// Set on current-state events re-sent after a subscriber fell behind.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub resync: bool,
}

impl JobEvent {
    pub fn from_change(old_state: Option<JobState>, job: &Job) -> Self {
        Self {
            job_id: job.id,
            artifact_id: job.artifact_id,
            old_state,
            new_state: job.state,
            progress_percent: job.progress_percent,
            error_reason: job.error_reason.clone(),
            at: Utc::now(),
            resync: false,
        }
    }

    /// The job's current state, for a subscriber that missed events.
    pub fn resync(job: &Job) -> Self {
        Self { resync: true, ..Self::from_change(Some(job.state), job) }
    }

    pub fn is_state_change(&self) -> bool {
        self.old_state != Some(self.new_state)
    }
}

/// Broadcast fan-out for job events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JobEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: JobEvent) {
        // No subscribers is fine; the dashboard may not be connected.
        if let Err(e) = self.tx.send(event) {
            debug!(job_id = %e.0.job_id, "No event subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
