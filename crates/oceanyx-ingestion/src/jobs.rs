//! Job lifecycle manager.
//!
//! One job per artifact, moving through
//!
//!   queued ──start──▶ processing ──advance(100)──▶ completed
//!      │                  │
//!      └──────fail────────┴──────────────────────▶ failed
//!
//! `completed` and `failed` are terminal. All transition rules live in
//! [`transition`]; everything else here is bookkeeping around it.
//!
//! Progress only moves through `advance`. A queued job always reports 0, and
//! `start` leaves it there, so a processing job reads 0 until its first
//! `advance`. The analysis driver advances right after decoding.
//!
//! Each job has its own processing gate. Mutating operations hold the gate for
//! their whole duration, which serialises `advance`, `fail` and the matching
//! stage per job while leaving different jobs fully independent. Reads go to a
//! committed snapshot and never wait on the gate.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock as SnapshotLock};

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use oceanyx_common::{Artifact, Job, JobState, OceanyxError, Result};

use crate::artifacts::ArtifactStore;
use crate::events::{EventBus, JobEvent};

// ── Transitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Transition {
    Start,
    Advance(u8),
    Fail(String),
}

impl Transition {
    fn name(&self) -> &'static str {
        match self {
            Transition::Start      => "start",
            Transition::Advance(_) => "advance",
            Transition::Fail(_)    => "fail",
        }
    }
}

/// Apply one transition to a job.
/// `Ok(None)` means the call was an idempotent no-op.
fn transition(job: &Job, t: &Transition) -> Result<Option<Job>> {
    let invalid = || OceanyxError::InvalidTransition {
        job_id: job.id,
        state: job.state,
        operation: t.name(),
    };

    match (job.state, t) {
        (JobState::Queued, Transition::Start) => {
            let mut next = job.clone();
            next.state = JobState::Processing;
            Ok(Some(next))
        }
        (JobState::Processing, Transition::Advance(progress)) => {
            if *progress <= job.progress_percent || *progress > 100 {
                return Err(invalid());
            }
            let mut next = job.clone();
            next.progress_percent = *progress;
            if *progress == 100 {
                next.state = JobState::Completed;
                next.completed_at = Some(Utc::now());
            }
            Ok(Some(next))
        }
        (JobState::Queued | JobState::Processing, Transition::Fail(reason)) => {
            let mut next = job.clone();
            next.state = JobState::Failed;
            next.error_reason = Some(reason.clone());
            Ok(Some(next))
        }
        (JobState::Failed, Transition::Fail(reason))
            if job.error_reason.as_deref() == Some(reason.as_str()) =>
        {
            Ok(None)
        }
        (JobState::Queued, Transition::Advance(_))
        | (JobState::Processing, Transition::Start)
        | (JobState::Completed, _)
        | (JobState::Failed, _) => Err(invalid()),
    }
}

// ── Per-job slot ─────────────────────────────────────────────────────────────

struct JobSlot {
    gate: Arc<Mutex<()>>,
    current: SnapshotLock<Job>,
}

impl JobSlot {
    fn new(job: Job) -> Self {
        Self { gate: Arc::new(Mutex::new(())), current: SnapshotLock::new(job) }
    }

    fn snapshot(&self) -> Job {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn store(&self, job: Job) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = job;
    }
}

/// Exclusive processing access to one job.
///
/// While a lease is alive no other lease for the same job can be taken, so a
/// caller can run a multi-step stage (decode, score, advance) without another
/// writer slipping in between. Dropping the lease releases the job.
pub struct JobLease {
    slot: Arc<JobSlot>,
    events: EventBus,
    _gate: OwnedMutexGuard<()>,
}

impl JobLease {
    pub fn id(&self) -> Uuid {
        self.slot.snapshot().id
    }

    pub fn job(&self) -> Job {
        self.slot.snapshot()
    }

    /// Fail with `InvalidState` unless the job is in `expected`.
    pub fn require_state(&self, expected: JobState) -> Result<Job> {
        let job = self.slot.snapshot();
        if job.state != expected {
            return Err(OceanyxError::InvalidState { job_id: job.id, state: job.state, expected });
        }
        Ok(job)
    }

    pub fn start(&self) -> Result<Job> {
        self.apply(Transition::Start)
    }

    pub fn advance(&self, progress: u8) -> Result<Job> {
        self.apply(Transition::Advance(progress))
    }

    pub fn fail(&self, reason: impl Into<String>) -> Result<Job> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(OceanyxError::InvalidInput("failure reason is empty".to_string()));
        }
        self.apply(Transition::Fail(reason))
    }

    fn apply(&self, t: Transition) -> Result<Job> {
        let current = self.slot.snapshot();
        let Some(next) = transition(&current, &t)? else {
            debug!(job_id = %current.id, operation = t.name(), "Transition was a no-op");
            return Ok(current);
        };

        self.slot.store(next.clone());
        let event = JobEvent::from_change(Some(current.state), &next);
        if event.is_state_change() {
            info!(
                job_id = %next.id,
                from = %current.state,
                to = %next.state,
                progress = next.progress_percent,
                reason = next.error_reason.as_deref().unwrap_or(""),
                "Job state changed"
            );
        } else {
            debug!(job_id = %next.id, progress = next.progress_percent, "Job progressed");
        }
        self.events.publish(event);
        Ok(next)
    }
}

// ── Manager ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Registry {
    jobs: HashMap<Uuid, Arc<JobSlot>>,
    order: Vec<Uuid>,
    /// Most recent job per artifact.
    latest_by_artifact: HashMap<Uuid, Uuid>,
}

/// Owns every job for the lifetime of the process.
pub struct JobManager {
    artifacts: Arc<ArtifactStore>,
    registry: RwLock<Registry>,
    events: EventBus,
}

impl JobManager {
    pub fn new(artifacts: Arc<ArtifactStore>, events: EventBus) -> Self {
        Self { artifacts, registry: RwLock::new(Registry::default()), events }
    }

    pub fn artifacts(&self) -> &Arc<ArtifactStore> {
        &self.artifacts
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Create a queued job for a registered artifact.
    ///
    /// Rejected with `DuplicateArtifact` while the artifact's previous job is
    /// still queued or processing. The check and the insert happen under one
    /// write lock.
    #[instrument(skip(self, artifact), fields(artifact_id = %artifact.id))]
    pub async fn submit(&self, artifact: &Artifact) -> Result<Job> {
        if !self.artifacts.contains(artifact.id).await {
            return Err(OceanyxError::artifact_not_found(artifact.id));
        }

        let mut registry = self.registry.write().await;
        if let Some(live) = registry
            .latest_by_artifact
            .get(&artifact.id)
            .and_then(|id| registry.jobs.get(id))
            .map(|slot| slot.snapshot())
            .filter(|job| !job.state.is_terminal())
        {
            return Err(OceanyxError::DuplicateArtifact {
                artifact_id: artifact.id,
                job_id: live.id,
            });
        }

        let job = Job {
            id: Uuid::new_v4(),
            artifact_id: artifact.id,
            state: JobState::Queued,
            progress_percent: 0,
            created_at: Utc::now(),
            completed_at: None,
            error_reason: None,
        };
        registry.jobs.insert(job.id, Arc::new(JobSlot::new(job.clone())));
        registry.order.push(job.id);
        registry.latest_by_artifact.insert(artifact.id, job.id);
        self.events.publish(JobEvent::from_change(None, &job));

        info!(job_id = %job.id, filename = %artifact.filename, "Job queued");
        Ok(job)
    }

    /// Take exclusive processing access to a job, waiting for any current holder.
    pub async fn lease(&self, job_id: Uuid) -> Result<JobLease> {
        let slot = self.slot(job_id).await?;
        let gate = Arc::clone(&slot.gate).lock_owned().await;
        Ok(JobLease { slot, events: self.events.clone(), _gate: gate })
    }

    pub async fn start(&self, job_id: Uuid) -> Result<Job> {
        self.lease(job_id).await?.start()
    }

    pub async fn advance(&self, job_id: Uuid, progress: u8) -> Result<Job> {
        self.lease(job_id).await?.advance(progress)
    }

    pub async fn fail(&self, job_id: Uuid, reason: impl Into<String>) -> Result<Job> {
        self.lease(job_id).await?.fail(reason)
    }

    pub async fn get(&self, job_id: Uuid) -> Result<Job> {
        Ok(self.slot(job_id).await?.snapshot())
    }

    /// All jobs, oldest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        let registry = self.registry.read().await;
        registry
            .order
            .iter()
            .filter_map(|id| registry.jobs.get(id))
            .map(|slot| slot.snapshot())
            .collect()
    }

    /// Most recent job for an artifact, if any.
    pub async fn job_for_artifact(&self, artifact_id: Uuid) -> Option<Job> {
        let registry = self.registry.read().await;
        registry
            .latest_by_artifact
            .get(&artifact_id)
            .and_then(|id| registry.jobs.get(id))
            .map(|slot| slot.snapshot())
    }

    async fn slot(&self, job_id: Uuid) -> Result<Arc<JobSlot>> {
        self.registry
            .read()
            .await
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or_else(|| OceanyxError::job_not_found(job_id))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use oceanyx_test_utils::fixtures::sequence_artifact;
    use pretty_assertions::assert_eq;

    async fn setup() -> (Arc<JobManager>, Artifact) {
        let artifacts = Arc::new(ArtifactStore::new(u64::MAX));
        let artifact = sequence_artifact();
        artifacts.insert(artifact.clone()).await;
        let manager = Arc::new(JobManager::new(artifacts, EventBus::new(64)));
        (manager, artifact)
    }

    #[tokio::test]
    async fn test_submit_creates_queued_job() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.progress_percent, 0);
        assert_eq!(job.artifact_id, artifact.id);
        assert_eq!(manager.get(job.id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn test_submit_unknown_artifact_not_found() {
        let (manager, _) = setup().await;
        let stranger = sequence_artifact();
        let err = manager.submit(&stranger).await.unwrap_err();
        assert!(matches!(err, OceanyxError::NotFound { kind: "artifact", .. }));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        let job = manager.start(job.id).await.unwrap();
        assert_eq!(job.state, JobState::Processing);

        let job = manager.advance(job.id, 40).await.unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert!(job.completed_at.is_none());

        let job = manager.advance(job.id, 100).await.unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress_percent, 100);
        assert!(job.completed_at.is_some());

        let err = manager.advance(job.id, 100).await.unwrap_err();
        assert!(matches!(err, OceanyxError::InvalidTransition { state: JobState::Completed, .. }));
    }

    #[tokio::test]
    async fn test_advance_requires_strict_increase() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        manager.start(job.id).await.unwrap();
        manager.advance(job.id, 30).await.unwrap();

        for bad in [30, 10, 101] {
            let err = manager.advance(job.id, bad).await.unwrap_err();
            assert!(matches!(err, OceanyxError::InvalidTransition { .. }), "progress {bad}");
        }
        assert_eq!(manager.get(job.id).await.unwrap().progress_percent, 30);
    }

    #[tokio::test]
    async fn test_advance_and_start_outside_legal_state() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        let err = manager.advance(job.id, 10).await.unwrap_err();
        assert!(matches!(err, OceanyxError::InvalidTransition { state: JobState::Queued, .. }));

        tokio_test::assert_ok!(manager.start(job.id).await);
        let err = tokio_test::assert_err!(manager.start(job.id).await);
        assert!(matches!(err, OceanyxError::InvalidTransition { operation: "start", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_submit_rejected_until_failed() {
        let (manager, artifact) = setup().await;
        let first = manager.submit(&artifact).await.unwrap();

        let err = manager.submit(&artifact).await.unwrap_err();
        assert!(matches!(err, OceanyxError::DuplicateArtifact { job_id, .. } if job_id == first.id));

        manager.start(first.id).await.unwrap();
        assert!(manager.submit(&artifact).await.is_err());

        manager.fail(first.id, "decoder crashed").await.unwrap();
        let second = manager.submit(&artifact).await.unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(second.state, JobState::Queued);
        assert_eq!(manager.job_for_artifact(artifact.id).await.unwrap().id, second.id);
        assert_eq!(manager.list_jobs().await.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_idempotent_with_same_reason() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        let failed = manager.fail(job.id, "timeout").await.unwrap();
        assert_eq!(failed.state, JobState::Failed);
        assert_eq!(failed.error_reason.as_deref(), Some("timeout"));

        let again = manager.fail(job.id, "timeout").await.unwrap();
        assert_eq!(again, failed);

        let err = manager.fail(job.id, "other").await.unwrap_err();
        assert!(matches!(err, OceanyxError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_fail_after_completion_rejected() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        manager.start(job.id).await.unwrap();
        manager.advance(job.id, 100).await.unwrap();
        assert!(manager.fail(job.id, "late").await.is_err());
    }

    #[tokio::test]
    async fn test_get_unknown_job() {
        let (manager, _) = setup().await;
        let err = manager.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, OceanyxError::NotFound { kind: "job", .. }));
    }

    #[tokio::test]
    async fn test_events_follow_transition_order() {
        let (manager, artifact) = setup().await;
        let mut rx = manager.subscribe();
        let job = manager.submit(&artifact).await.unwrap();
        manager.start(job.id).await.unwrap();
        manager.advance(job.id, 50).await.unwrap();
        manager.advance(job.id, 100).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push((event.old_state, event.new_state, event.progress_percent));
        }
        assert_eq!(
            seen,
            vec![
                (None, JobState::Queued, 0),
                (Some(JobState::Queued), JobState::Processing, 0),
                (Some(JobState::Processing), JobState::Processing, 50),
                (Some(JobState::Processing), JobState::Completed, 100),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_advances_stay_monotonic() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        manager.start(job.id).await.unwrap();
        let mut rx = manager.subscribe();

        let mut handles = Vec::new();
        for progress in (1..=100u8).rev() {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move { manager.advance(job.id, progress).await }));
        }
        for h in handles {
            let _ = h.await.unwrap();
        }

        let mut last = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(event.progress_percent > last);
            last = event.progress_percent;
        }
        let job = manager.get(job.id).await.unwrap();
        assert_eq!(job.progress_percent, last);
    }

    #[tokio::test]
    async fn test_concurrent_submit_single_winner() {
        let (manager, artifact) = setup().await;
        let mut handles = Vec::new();
        for _ in 0..16 {
            let manager = Arc::clone(&manager);
            let artifact = artifact.clone();
            handles.push(tokio::spawn(async move { manager.submit(&artifact).await }));
        }
        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(OceanyxError::DuplicateArtifact { .. }) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_lease_serialises_writers() {
        let (manager, artifact) = setup().await;
        let job = manager.submit(&artifact).await.unwrap();
        let lease = manager.lease(job.id).await.unwrap();
        lease.start().unwrap();

        let waiter = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.advance(job.id, 10).await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        // Reads do not wait on the lease.
        assert_eq!(manager.get(job.id).await.unwrap().state, JobState::Processing);

        lease.advance(5).unwrap();
        drop(lease);
        let job = waiter.await.unwrap().unwrap();
        assert_eq!(job.progress_percent, 10);
    }

    #[test]
    fn test_transition_table_rejects_from_terminal() {
        let job = Job {
            id: Uuid::nil(),
            artifact_id: Uuid::nil(),
            state: JobState::Completed,
            progress_percent: 100,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
            error_reason: None,
        };
        for t in [Transition::Start, Transition::Advance(100), Transition::Fail("x".into())] {
            assert!(transition(&job, &t).is_err());
        }
    }
}
