//! Firmware artifact resolution.
//!
//! A build cannot start until upstream CI has published the toolchain
//! artifact for its commit. The resolver finds the workflow run that built
//! it and the artifact's download URL, or short-circuits both lookups when
//! a pinned URL is configured (offline and debug runs).

use std::sync::Arc;

use benchci_core::build::CommitId;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::{ActionsApi, WorkflowRun};
use crate::error::{GithubError, GithubResult};

pub struct ArtifactResolver {
    actions: Arc<dyn ActionsApi>,
    /// Workflow display name the artifact comes from.
    workflow: String,
    /// Job display name whose head SHA identifies the commit.
    job: String,
    pinned_url: Option<String>,
}

impl ArtifactResolver {
    pub fn new(actions: Arc<dyn ActionsApi>, workflow: &str, job: &str) -> Self {
        Self {
            actions,
            workflow: workflow.to_string(),
            job: job.to_string(),
            pinned_url: None,
        }
    }

    /// Serve this fixed URL instead of looking anything up.
    pub fn with_pinned_url(mut self, url: &str) -> Self {
        self.pinned_url = Some(url.to_string());
        self
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_url.is_some()
    }

    /// Artifact URL for a known workflow run.
    pub async fn resolve_url(&self, run_id: u64) -> GithubResult<String> {
        if let Some(pinned) = &self.pinned_url {
            return Ok(pinned.clone());
        }
        self.actions.artifact_url(run_id).await
    }

    /// Recent successful runs, newest first, for reconciliation sweeps.
    pub async fn recent_successful_runs(&self) -> GithubResult<Vec<WorkflowRun>> {
        self.actions.list_successful_runs().await
    }

    /// Most recent successful run of the configured workflow whose job list
    /// carries `commit` as head SHA. `after` bounds the search to runs
    /// created after that instant so a stale run never satisfies a newer
    /// build of the same commit.
    pub async fn find_run_for_commit(
        &self,
        commit: &CommitId,
        after: Option<DateTime<Utc>>,
    ) -> GithubResult<u64> {
        let runs = self.actions.list_successful_runs().await?;
        for run in runs {
            if run.name != self.workflow {
                continue;
            }
            if let Some(bound) = after {
                if run.created_at <= bound {
                    continue;
                }
            }
            let jobs = self.actions.list_jobs(run.id).await?;
            if jobs
                .iter()
                .any(|job| job.name == self.job && job.head_sha == commit.as_str())
            {
                debug!(run_id = run.id, commit = %commit.short(), "matched workflow run");
                return Ok(run.id);
            }
        }
        Err(GithubError::NotFound(format!(
            "no successful {} run for {}",
            self.workflow,
            commit.short()
        )))
    }

    /// Full resolution for a pending build: matching run, then artifact
    /// URL. In pinned mode neither lookup happens.
    pub async fn resolve_for_commit(
        &self,
        commit: &CommitId,
        after: Option<DateTime<Utc>>,
    ) -> GithubResult<String> {
        if let Some(pinned) = &self.pinned_url {
            return Ok(pinned.clone());
        }
        let run_id = self.find_run_for_commit(commit, after).await?;
        self.actions.artifact_url(run_id).await
    }
}
