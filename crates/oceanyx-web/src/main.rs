//! Oceanyx Web Server
//!
//! Run with: cargo run -p oceanyx-web

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use oceanyx_catalog::load_catalog;
use oceanyx_config::Config;
use oceanyx_web::{logging, router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_filter = logging::init();
    let config = Config::load().context("loading configuration")?;
    log_filter
        .apply(&config.logging.filter)
        .context("applying configured log filter")?;

    info!("Oceanyx starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let catalog = load_catalog(&config.catalog.path)
        .with_context(|| format!("loading species catalog from {}", config.catalog.path))?;
    if catalog.is_empty() {
        warn!(path = %config.catalog.path, "Species catalog is empty, matching will find nothing");
    }

    let addr = config.bind_addr();
    let state = AppState::new(config, catalog);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
