//! Hardware CI daemon entry point.
//!
//! Startup order matters: reconciliation re-drives runs a previous process
//! left behind *before* the consumer starts, so a commit with several
//! stale runs is enqueued once with all of them attached.

use std::sync::Arc;

use anyhow::Context;
use benchci_core::{telemetry, BoardSet};
use benchcid::{http, orchestrator, poller, reconcile, AppState, DaemonConfig};
use clap::Parser;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::parse();
    telemetry::init_tracing(config.json, Level::INFO);

    let boards = BoardSet::load(&config.boards_file)
        .with_context(|| format!("loading board inventory {}", config.boards_file.display()))?;
    info!(
        boards = boards.len(),
        enabled = boards.enabled().count(),
        "board inventory loaded"
    );

    let (state, build_rx) = AppState::new(config, boards);
    let state = Arc::new(state);

    reconcile::run(&state).await;
    orchestrator::spawn(state.clone(), build_rx);
    poller::spawn(state.clone());

    let app = http::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.config.listen)
        .await
        .with_context(|| format!("binding {}", state.config.listen))?;
    info!(listen = %state.config.listen, "benchcid listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
