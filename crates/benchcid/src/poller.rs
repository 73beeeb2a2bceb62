//! Periodic recovery loop.
//!
//! Webhook deliveries are best-effort; a dropped workflow-completion event
//! would otherwise strand a build forever. Every tick retries artifact
//! resolution for builds still awaiting CI and runs the registry eviction
//! pass.

use std::sync::Arc;

use benchci_github::GithubError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{ingest, AppState};

pub fn spawn(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = state.config.poll_interval();
        info!(interval_secs = interval.as_secs(), "poller started");
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            tick(&state).await;
        }
    })
}

/// One poller pass, separated out so tests can drive it directly.
pub async fn tick(state: &AppState) {
    for build in state.registry.awaiting_ci() {
        match state
            .resolver
            .resolve_for_commit(&build.commit, build.poll_after)
            .await
        {
            Ok(url) => {
                info!(commit = %build.commit.short(), "poller found the firmware artifact");
                ingest::attach_and_enqueue(state, &build.commit, &url).await;
            }
            Err(GithubError::NotFound(_)) => {
                debug!(commit = %build.commit.short(), "artifact still pending");
            }
            Err(err) => {
                warn!(commit = %build.commit.short(), error = %err, "poll attempt failed");
            }
        }
    }

    state.registry.evict_finished(
        state.config.completed_ttl(),
        state.config.abandoned_ttl(),
    );
}
