//! Shared fixtures and helpers for Oceanyx tests.

pub mod fixtures;

use std::time::Duration;

/// Install a test log subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("oceanyx=debug"))
        .with_test_writer()
        .try_init();
}

/// Await a future, panicking if it does not finish within `secs` seconds.
pub async fn within<F: std::future::Future>(secs: u64, fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .expect("future did not complete in time")
}
