//! Published match sets, keyed by job id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use oceanyx_common::MatchResult;

/// Read-mostly store of ranked match sets.
///
/// A set is replaced wholesale on publish, so readers never observe a
/// partially written ranking.
#[derive(Default)]
pub struct ResultStore {
    by_job: RwLock<HashMap<Uuid, Arc<[MatchResult]>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, job_id: Uuid, matches: Vec<MatchResult>) -> Arc<[MatchResult]> {
        let matches: Arc<[MatchResult]> = matches.into();
        self.by_job.write().await.insert(job_id, Arc::clone(&matches));
        matches
    }

    pub async fn get(&self, job_id: Uuid) -> Option<Arc<[MatchResult]>> {
        self.by_job.read().await.get(&job_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceanyx_test_utils::fixtures::matched;

    #[tokio::test]
    async fn test_publish_replaces_previous_set() {
        let store = ResultStore::new();
        let job_id = Uuid::new_v4();
        assert!(store.get(job_id).await.is_none());

        store.publish(job_id, vec![matched("a", 1), matched("b", 2)]).await;
        store.publish(job_id, vec![matched("c", 3)]).await;

        let got = store.get(job_id).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].species_id, "c");
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }
}
