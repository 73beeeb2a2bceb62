//! Check-run gateway.
//!
//! Single owner of check-run state transitions. Every write to the provider
//! goes through here, which is what makes two guarantees hold no matter
//! which daemon task reports:
//!
//! - status only ever advances `queued -> in_progress -> completed`
//! - each handle is completed at most once
//!
//! API failures are logged and dropped; there is no inline retry. A lost
//! update leaves the run to be re-driven by the poller or by startup
//! reconciliation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use benchci_core::build::CheckRunHandle;
use benchci_core::obs;
use tracing::{info, warn};

use crate::api::{CheckConclusion, CheckRun, CheckRunOutput, CheckStatus, ChecksApi};
use crate::error::GithubResult;

/// Check runs are named `benchci: <target>` so ours are recognizable among
/// other apps' runs on the same commit.
pub const RUN_NAME_PREFIX: &str = "benchci: ";

pub fn run_name(target: &str) -> String {
    format!("{RUN_NAME_PREFIX}{target}")
}

/// Board target carried in a check-run name. `None` for runs that are not
/// ours.
pub fn parse_target(name: &str) -> Option<&str> {
    name.strip_prefix(RUN_NAME_PREFIX).map(str::trim)
}

pub struct CheckRunGateway {
    api: Arc<dyn ChecksApi>,
    active: Mutex<HashMap<u64, CheckStatus>>,
}

impl CheckRunGateway {
    pub fn new(api: Arc<dyn ChecksApi>) -> Self {
        Self {
            api,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Create a pending check run for a target. On API failure the error is
    /// logged and `None` returned; the next suite signal recreates the run.
    pub async fn create_pending(&self, target: &str, head_sha: &str) -> Option<CheckRunHandle> {
        let name = run_name(target);
        match self.api.create_check_run(&name, head_sha).await {
            Ok(run) => {
                self.active
                    .lock()
                    .unwrap()
                    .insert(run.id, CheckStatus::Queued);
                info!(target, check_run_id = run.id, "created pending check run");
                Some(CheckRunHandle::new(run.id, run.name))
            }
            Err(err) => {
                obs::emit_api_dropped("create_check_run", &err);
                None
            }
        }
    }

    /// Register an externally created run (re-request, reconciliation) as
    /// queued so it can advance through the normal lifecycle.
    pub fn adopt(&self, handle: &CheckRunHandle) {
        self.active
            .lock()
            .unwrap()
            .insert(handle.id, CheckStatus::Queued);
    }

    /// Advance a run to in_progress. Only legal from queued.
    pub async fn mark_in_progress(&self, handle: &CheckRunHandle) {
        if !self.advance(handle.id, CheckStatus::InProgress) {
            return;
        }
        if let Err(err) = self
            .api
            .update_check_run_status(handle.id, CheckStatus::InProgress)
            .await
        {
            obs::emit_api_dropped("update_check_run", &err);
        }
    }

    /// Conclude a run. The handle leaves active tracking before the API
    /// call, so a repeated completion attempt is ignored.
    pub async fn complete(
        &self,
        handle: &CheckRunHandle,
        conclusion: CheckConclusion,
        output: CheckRunOutput,
    ) {
        if !self.finish(handle.id) {
            return;
        }
        if let Err(err) = self
            .api
            .complete_check_run(handle.id, conclusion, output.clamped())
            .await
        {
            obs::emit_api_dropped("complete_check_run", &err);
        }
    }

    pub async fn report_pass(&self, handle: &CheckRunHandle, text: &str) {
        self.complete(handle, CheckConclusion::Success, CheckRunOutput::passed(text))
            .await;
    }

    pub async fn report_fail(&self, handle: &CheckRunHandle, text: &str) {
        self.complete(handle, CheckConclusion::Failure, CheckRunOutput::failed(text))
            .await;
    }

    /// Disabled boards report success without any hardware interaction so
    /// the commit's check suite stays green while a board is out for
    /// repair.
    pub async fn report_disabled(&self, handle: &CheckRunHandle, display_name: &str) {
        self.complete(
            handle,
            CheckConclusion::Success,
            CheckRunOutput::disabled(display_name),
        )
        .await;
    }

    /// Check runs on a commit in the given state. Read-only; used by
    /// startup reconciliation to find runs a previous process left behind.
    pub async fn list_for_ref(
        &self,
        head_sha: &str,
        status: CheckStatus,
    ) -> GithubResult<Vec<CheckRun>> {
        self.api.list_check_runs_for_ref(head_sha, Some(status)).await
    }

    /// True when the transition strictly advances the lifecycle. Stale and
    /// repeated attempts are rejected with a warning.
    fn advance(&self, id: u64, next: CheckStatus) -> bool {
        let mut active = self.active.lock().unwrap();
        match active.get(&id) {
            Some(current) if *current < next => {
                active.insert(id, next);
                true
            }
            Some(current) => {
                warn!(
                    check_run_id = id,
                    current = current.as_str(),
                    attempted = next.as_str(),
                    "rejected non-advancing check-run transition"
                );
                false
            }
            None => {
                warn!(
                    check_run_id = id,
                    "transition on unknown or already-completed handle ignored"
                );
                false
            }
        }
    }

    fn finish(&self, id: u64) -> bool {
        let mut active = self.active.lock().unwrap();
        if active.remove(&id).is_some() {
            true
        } else {
            warn!(check_run_id = id, "duplicate completion ignored");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeChecks;

    fn gateway() -> (Arc<FakeChecks>, CheckRunGateway) {
        let api = Arc::new(FakeChecks::new());
        let gateway = CheckRunGateway::new(api.clone());
        (api, gateway)
    }

    #[test]
    fn test_run_name_round_trip() {
        let name = run_name("itsybitsy-m4");
        assert_eq!(name, "benchci: itsybitsy-m4");
        assert_eq!(parse_target(&name), Some("itsybitsy-m4"));
        assert_eq!(parse_target("other-app: lint"), None);
    }

    #[tokio::test]
    async fn test_create_pending_tracks_handle() {
        let (api, gateway) = gateway();
        let handle = gateway.create_pending("microbit", "abc123").await.unwrap();
        assert_eq!(handle.name, "benchci: microbit");
        assert_eq!(api.created().len(), 1);
        assert_eq!(api.created()[0].head_sha, "abc123");
    }

    #[tokio::test]
    async fn test_create_failure_is_dropped() {
        let (api, gateway) = gateway();
        api.fail_next_create();
        assert!(gateway.create_pending("microbit", "abc123").await.is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_advances_once() {
        let (api, gateway) = gateway();
        let handle = gateway.create_pending("microbit", "abc123").await.unwrap();

        gateway.mark_in_progress(&handle).await;
        gateway.mark_in_progress(&handle).await;
        assert_eq!(api.transitions().len(), 1);

        gateway.report_pass(&handle, "all ok").await;
        assert_eq!(api.completions().len(), 1);
        assert_eq!(api.completions()[0].1, CheckConclusion::Success);
    }

    #[tokio::test]
    async fn test_completion_is_at_most_once() {
        let (api, gateway) = gateway();
        let handle = gateway.create_pending("microbit", "abc123").await.unwrap();
        gateway.mark_in_progress(&handle).await;

        gateway.report_fail(&handle, "boom").await;
        gateway.report_pass(&handle, "never mind").await;

        let completions = api.completions();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].1, CheckConclusion::Failure);
    }

    #[tokio::test]
    async fn test_no_regression_after_completion() {
        let (api, gateway) = gateway();
        let handle = gateway.create_pending("microbit", "abc123").await.unwrap();
        gateway.mark_in_progress(&handle).await;
        gateway.report_pass(&handle, "done").await;

        gateway.mark_in_progress(&handle).await;
        assert_eq!(api.transitions().len(), 1);
    }

    #[tokio::test]
    async fn test_adopted_handle_can_complete() {
        let (api, gateway) = gateway();
        let handle = CheckRunHandle::new(910, "benchci: arduino");
        gateway.adopt(&handle);
        gateway.mark_in_progress(&handle).await;
        gateway.report_fail(&handle, "flash error").await;
        assert_eq!(api.completions().len(), 1);
        assert_eq!(api.completions()[0].0, 910);
    }

    #[tokio::test]
    async fn test_disabled_report_is_success_with_note() {
        let (api, gateway) = gateway();
        let handle = gateway.create_pending("maixbit", "abc123").await.unwrap();
        gateway.report_disabled(&handle, "Sipeed MAiX BiT").await;

        let (_, conclusion, output) = api.completions()[0].clone();
        assert_eq!(conclusion, CheckConclusion::Success);
        assert!(output.summary.contains("disabled"));
    }
}
