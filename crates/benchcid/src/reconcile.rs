//! Startup reconciliation.
//!
//! Registry state dies with the process, but check runs live on the
//! provider. On start the daemon looks for runs of its own that are still
//! queued or in progress on recently built commits and re-drives each
//! through the re-request path, so a restart mid-build ends with reported
//! runs instead of permanently yellow ones.

use benchci_core::obs;
use benchci_github::{parse_target, CheckStatus};
use tracing::{debug, info};

use crate::{ingest, AppState};

/// One reconciliation pass. Returns how many stale runs were re-driven.
pub async fn run(state: &AppState) -> usize {
    let runs = match state.resolver.recent_successful_runs().await {
        Ok(runs) => runs,
        Err(err) => {
            obs::emit_api_dropped("list_workflow_runs", &err);
            return 0;
        }
    };

    let mut shas: Vec<String> = Vec::new();
    for run in runs {
        if run.name == state.config.workflow && !shas.contains(&run.head_sha) {
            shas.push(run.head_sha);
        }
    }
    debug!(commits = shas.len(), "reconciling recent commits");

    let mut redriven = 0;
    for sha in &shas {
        for status in [CheckStatus::Queued, CheckStatus::InProgress] {
            let stale = match state.gateway.list_for_ref(sha, status).await {
                Ok(runs) => runs,
                Err(err) => {
                    obs::emit_api_dropped("list_check_runs", &err);
                    continue;
                }
            };
            for run in stale {
                if parse_target(&run.name).is_none() {
                    continue;
                }
                info!(check_run_id = run.id, name = %run.name, "re-driving stale check run");
                ingest::rerequest_run(state, run.id, &run.name, sha).await;
                redriven += 1;
            }
        }
    }
    if redriven > 0 {
        info!(redriven, "reconciliation re-drove stale runs");
    }
    redriven
}
