//! In-memory fakes for the provider APIs (testing only)
//!
//! `FakeChecks` and `FakeActions` satisfy the trait contracts without any
//! network. They record every write so tests can assert what the daemon
//! reported, and they can be seeded with runs for reconciliation and
//! resolver scenarios.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::{
    ActionsApi, CheckConclusion, CheckRun, CheckRunOutput, CheckStatus, ChecksApi, WorkflowJob,
    WorkflowRun,
};
use crate::error::{GithubError, GithubResult};

// ---------------------------------------------------------------------------
// FakeChecks
// ---------------------------------------------------------------------------

/// In-memory checks API.
#[derive(Debug, Default)]
pub struct FakeChecks {
    next_id: AtomicUsize,
    created: Mutex<Vec<CheckRun>>,
    transitions: Mutex<Vec<(u64, CheckStatus)>>,
    completions: Mutex<Vec<(u64, CheckConclusion, CheckRunOutput)>>,
    /// Extra runs returned by `list_check_runs_for_ref`, keyed by SHA.
    listed: Mutex<HashMap<String, Vec<CheckRun>>>,
    fail_next_create: AtomicBool,
}

impl FakeChecks {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            ..Self::default()
        }
    }

    /// Seed a run into the listing for a SHA (reconciliation scenarios).
    pub fn seed_listed(&self, head_sha: &str, run: CheckRun) {
        self.listed
            .lock()
            .unwrap()
            .entry(head_sha.to_string())
            .or_default()
            .push(run);
    }

    /// Make the next `create_check_run` fail with a 500.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn created(&self) -> Vec<CheckRun> {
        self.created.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<(u64, CheckStatus)> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<(u64, CheckConclusion, CheckRunOutput)> {
        self.completions.lock().unwrap().clone()
    }

    /// Completion recorded for the given check-run id, if any.
    pub fn completion_for(&self, id: u64) -> Option<(CheckConclusion, CheckRunOutput)> {
        self.completions
            .lock()
            .unwrap()
            .iter()
            .find(|(run_id, _, _)| *run_id == id)
            .map(|(_, conclusion, output)| (*conclusion, output.clone()))
    }
}

#[async_trait]
impl ChecksApi for FakeChecks {
    async fn create_check_run(&self, name: &str, head_sha: &str) -> GithubResult<CheckRun> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(GithubError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        let run = CheckRun {
            id,
            name: name.to_string(),
            status: "queued".to_string(),
            head_sha: head_sha.to_string(),
            conclusion: None,
        };
        self.created.lock().unwrap().push(run.clone());
        Ok(run)
    }

    async fn update_check_run_status(&self, id: u64, status: CheckStatus) -> GithubResult<()> {
        self.transitions.lock().unwrap().push((id, status));
        Ok(())
    }

    async fn complete_check_run(
        &self,
        id: u64,
        conclusion: CheckConclusion,
        output: CheckRunOutput,
    ) -> GithubResult<()> {
        self.completions
            .lock()
            .unwrap()
            .push((id, conclusion, output));
        Ok(())
    }

    async fn list_check_runs_for_ref(
        &self,
        head_sha: &str,
        status: Option<CheckStatus>,
    ) -> GithubResult<Vec<CheckRun>> {
        let listed = self.listed.lock().unwrap();
        let runs = listed.get(head_sha).cloned().unwrap_or_default();
        Ok(match status {
            Some(status) => runs
                .into_iter()
                .filter(|run| run.status == status.as_str())
                .collect(),
            None => runs,
        })
    }
}

// ---------------------------------------------------------------------------
// FakeActions
// ---------------------------------------------------------------------------

/// In-memory actions API with scripted runs, jobs, and artifacts.
#[derive(Debug, Default)]
pub struct FakeActions {
    runs: Mutex<Vec<WorkflowRun>>,
    jobs: Mutex<HashMap<u64, Vec<WorkflowJob>>>,
    artifacts: Mutex<HashMap<u64, String>>,
    lookups: AtomicUsize,
}

impl FakeActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a successful workflow run.
    pub fn push_run(&self, id: u64, name: &str, head_sha: &str, created_at: DateTime<Utc>) {
        self.runs.lock().unwrap().push(WorkflowRun {
            id,
            name: name.to_string(),
            head_sha: head_sha.to_string(),
            conclusion: Some("success".to_string()),
            created_at,
        });
    }

    /// Attach a successful job to a run.
    pub fn set_job(&self, run_id: u64, name: &str, head_sha: &str) {
        let job = WorkflowJob {
            id: run_id * 10,
            run_id,
            name: name.to_string(),
            head_sha: head_sha.to_string(),
            conclusion: Some("success".to_string()),
        };
        self.jobs.lock().unwrap().entry(run_id).or_default().push(job);
    }

    pub fn set_artifact(&self, run_id: u64, url: &str) {
        self.artifacts
            .lock()
            .unwrap()
            .insert(run_id, url.to_string());
    }

    /// Number of API lookups made (pinned-mode tests assert zero).
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionsApi for FakeActions {
    async fn list_successful_runs(&self) -> GithubResult<Vec<WorkflowRun>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        // Newest first, as the provider returns them.
        let mut runs = self.runs.lock().unwrap().clone();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }

    async fn list_jobs(&self, run_id: u64) -> GithubResult<Vec<WorkflowJob>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .get(&run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn artifact_url(&self, run_id: u64) -> GithubResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.artifacts
            .lock()
            .unwrap()
            .get(&run_id)
            .cloned()
            .ok_or_else(|| GithubError::NotFound(format!("no artifacts for run {run_id}")))
    }
}
