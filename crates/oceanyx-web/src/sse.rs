//! Server-Sent Events (SSE) feed of job changes.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use futures_util::stream;
use serde::Deserialize;
use tokio_stream::StreamExt;
use uuid::Uuid;

use oceanyx_ingestion::{FeedItem, JobWatcher};

use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// Only forward events of this job.
    pub job_id: Option<Uuid>,
}

/// SSE endpoint. Each change is sent as a `job` event carrying the JSON
/// `JobEvent`. A slow client that falls behind gets a `lagged` event with
/// the number of events it missed, followed by a `job` event with
/// `resync: true` for the current state of every job it follows.
pub async fn sse_handler(
    State(state): State<SharedState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let watcher = JobWatcher::new(Arc::clone(state.jobs()), filter.job_id);
    let items = stream::unfold(watcher, |mut watcher| async move {
        watcher.recv().await.map(|item| (item, watcher))
    });
    let stream = items.filter_map(|item| match item {
        FeedItem::Event(event) => serde_json::to_string(&event)
            .ok()
            .map(|data| Ok(Event::default().event("job").data(data))),
        FeedItem::Lagged(missed) => {
            Some(Ok(Event::default().event("lagged").data(missed.to_string())))
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
