//! benchcid — the hardware CI daemon.
//!
//! One process owns the whole pipeline: an axum listener accepts provider
//! webhooks, ingestion tracks a build per commit and creates its check
//! runs, a poller recovers signals the webhook path missed, and a single
//! queue consumer builds the toolchain image and walks the board fleet.
//! The consumer is deliberately the only task that touches Docker or the
//! boards; both are scarce physical resources and nothing about them is
//! safe to share.

use std::sync::Arc;

use benchci_core::{Board, BoardSet, BuildRegistry, CommandRunner, CommitId, SystemRunner};
use benchci_github::{ArtifactResolver, CheckRunGateway, GithubClient};
use tokio::sync::mpsc;

pub mod config;
pub mod executor;
pub mod http;
pub mod ingest;
pub mod orchestrator;
pub mod poller;
pub mod reconcile;
pub mod toolchain;

pub use config::DaemonConfig;
pub use toolchain::Toolchain;

/// Queue depth for pending builds. Reconciliation can enqueue a batch
/// before the consumer starts, so this is sized for a backlog, not for
/// steady state.
const BUILD_QUEUE_DEPTH: usize = 256;

/// Shared daemon state. Every task (listener, poller, consumer) holds the
/// same `Arc<AppState>`; interior mutability lives inside the registry and
/// the gateway.
pub struct AppState {
    pub config: DaemonConfig,
    pub boards: BoardSet,
    pub registry: Arc<BuildRegistry>,
    pub gateway: Arc<CheckRunGateway>,
    pub resolver: Arc<ArtifactResolver>,
    pub runner: Arc<dyn CommandRunner>,
    pub toolchain: Toolchain,
    /// Commits ready for the consumer. The consumer re-reads the registry
    /// at dequeue time, so runs attached after enqueueing are not lost.
    pub build_tx: mpsc::Sender<CommitId>,
}

impl AppState {
    /// Production wiring: real GitHub client, real subprocess runner.
    pub fn new(config: DaemonConfig, boards: BoardSet) -> (Self, mpsc::Receiver<CommitId>) {
        let (build_tx, build_rx) = mpsc::channel(BUILD_QUEUE_DEPTH);
        let client = Arc::new(GithubClient::new(config.github()));

        let mut resolver = ArtifactResolver::new(client.clone(), &config.workflow, &config.job);
        if let Some(url) = &config.pinned_firmware_url {
            resolver = resolver.with_pinned_url(url);
        }

        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(config.tool_deadline()));
        let toolchain = Toolchain::from_config(&config);

        let state = AppState {
            boards,
            registry: Arc::new(BuildRegistry::new()),
            gateway: Arc::new(CheckRunGateway::new(client)),
            resolver: Arc::new(resolver),
            runner,
            toolchain,
            build_tx,
            config,
        };
        (state, build_rx)
    }

    /// Board for a check-run target, if the inventory knows it.
    pub fn board(&self, target: &str) -> Option<&Board> {
        self.boards.get(target)
    }
}
