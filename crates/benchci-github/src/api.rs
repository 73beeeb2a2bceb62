//! Provider API trait definitions and wire types
//!
//! Two traits cover everything the daemon needs from GitHub:
//! - `ChecksApi`: check-run lifecycle (create, advance, complete, list)
//! - `ActionsApi`: workflow-run and artifact lookups
//!
//! Both are async and backend-agnostic. The production implementation is
//! [`crate::client::GithubClient`]; in-memory fakes live in `fakes`.
//!
//! Wire structs mirror the REST JSON. Status and conclusion strings on
//! foreign payloads stay plain `String`s because other apps' check runs
//! share the same endpoints; the typed enums below are only used for values
//! this daemon writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GithubResult;

/// Lifecycle status of a check run.
///
/// Variant order follows the lifecycle, so the derived ordering lets the
/// gateway reject regressions with a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Queued => "queued",
            CheckStatus::InProgress => "in_progress",
            CheckStatus::Completed => "completed",
        }
    }
}

/// Conclusion of a completed check run. The daemon only ever reports these
/// two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
}

impl CheckConclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckConclusion::Success => "success",
            CheckConclusion::Failure => "failure",
        }
    }
}

/// One check run as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub head_sha: String,
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// Report body attached to a completed check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub text: String,
}

/// The check-run API rejects output text beyond this length.
pub const OUTPUT_TEXT_LIMIT: usize = 65_535;

impl CheckRunOutput {
    pub fn passed(text: impl Into<String>) -> Self {
        Self {
            title: "Hardware CI passed".to_string(),
            summary: "Hardware CI tests have passed.".to_string(),
            text: text.into(),
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            title: "Hardware CI failed".to_string(),
            summary: "Hardware CI tests have failed.".to_string(),
            text: text.into(),
        }
    }

    pub fn disabled(display_name: &str) -> Self {
        Self {
            title: "Board disabled".to_string(),
            summary: format!("{display_name} is currently disabled; hardware tests were skipped."),
            text: String::new(),
        }
    }

    /// Clamp the text body to the API limit, keeping the tail. Failures
    /// show up at the end of tool output, so the tail is the part worth
    /// keeping.
    pub fn clamped(mut self) -> Self {
        if self.text.len() > OUTPUT_TEXT_LIMIT {
            let marker = "... (output truncated)\n";
            let keep = OUTPUT_TEXT_LIMIT - marker.len();
            let mut start = self.text.len() - keep;
            while !self.text.is_char_boundary(start) {
                start += 1;
            }
            self.text = format!("{marker}{}", &self.text[start..]);
        }
        self
    }
}

/// One workflow run as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: String,
    pub head_sha: String,
    #[serde(default)]
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One job within a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub id: u64,
    pub run_id: u64,
    pub name: String,
    pub head_sha: String,
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// One uploaded workflow artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: u64,
    pub name: String,
    pub archive_download_url: String,
}

/// Check-run lifecycle operations.
#[async_trait]
pub trait ChecksApi: Send + Sync {
    /// Create a check run in `queued` status on the given commit.
    async fn create_check_run(&self, name: &str, head_sha: &str) -> GithubResult<CheckRun>;

    /// Move a check run to a new status without concluding it.
    async fn update_check_run_status(&self, id: u64, status: CheckStatus) -> GithubResult<()>;

    /// Conclude a check run with a report body.
    async fn complete_check_run(
        &self,
        id: u64,
        conclusion: CheckConclusion,
        output: CheckRunOutput,
    ) -> GithubResult<()>;

    /// Check runs attached to a commit, optionally filtered by status.
    /// Returns runs from every app, not just ours.
    async fn list_check_runs_for_ref(
        &self,
        head_sha: &str,
        status: Option<CheckStatus>,
    ) -> GithubResult<Vec<CheckRun>>;
}

/// Workflow-run and artifact lookups.
#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// Recent workflow runs that completed successfully, newest first.
    async fn list_successful_runs(&self) -> GithubResult<Vec<WorkflowRun>>;

    /// Jobs of one workflow run.
    async fn list_jobs(&self, run_id: u64) -> GithubResult<Vec<WorkflowJob>>;

    /// Download URL of the run's artifact. `NotFound` when the run
    /// uploaded nothing.
    async fn artifact_url(&self, run_id: u64) -> GithubResult<String>;
}
