//! Job feed subscription that recovers from falling behind.
//!
//! The broadcast channel drops the oldest events for a slow subscriber. When
//! that happens the watcher reports the gap, moves to the live end of the
//! channel and then replays the current state of every job it follows, so
//! the last event a consumer sees for each job always matches the job.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use crate::events::JobEvent;
use crate::jobs::JobManager;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Event(JobEvent),
    /// The subscriber missed this many events; resync events follow.
    Lagged(u64),
}

pub struct JobWatcher {
    jobs: Arc<JobManager>,
    rx: broadcast::Receiver<JobEvent>,
    only: Option<Uuid>,
    pending: VecDeque<JobEvent>,
}

impl JobWatcher {
    /// Follow every job, or just `only`.
    pub fn new(jobs: Arc<JobManager>, only: Option<Uuid>) -> Self {
        let rx = jobs.subscribe();
        Self { jobs, rx, only, pending: VecDeque::new() }
    }

    /// Next item, or `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<FeedItem> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(FeedItem::Event(event));
            }
            match self.rx.recv().await {
                Ok(event) if self.only.map_or(true, |id| id == event.job_id) => {
                    return Some(FeedItem::Event(event));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, job_id = ?self.only, "Job feed subscriber lagged, resyncing");
                    // Resubscribe before reading state so nothing committed
                    // after the snapshot can be lost.
                    self.rx = self.rx.resubscribe();
                    self.pending = self.snapshot().await;
                    return Some(FeedItem::Lagged(missed));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    async fn snapshot(&self) -> VecDeque<JobEvent> {
        match self.only {
            Some(id) => self.jobs.get(id).await.ok().iter().map(JobEvent::resync).collect(),
            None => self.jobs.list_jobs().await.iter().map(JobEvent::resync).collect(),
        }
    }
}
