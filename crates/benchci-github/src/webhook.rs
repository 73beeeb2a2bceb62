//! Webhook event model.
//!
//! Deliveries arrive with the event kind in the `X-GitHub-Event` header and
//! a JSON body. [`WebhookEvent::parse`] turns the pair into a closed sum
//! type: every kind the daemon reacts to has a typed payload, and anything
//! else becomes [`WebhookEvent::Unsupported`] so ingestion can log it and
//! move on without inspecting raw JSON.

use serde::Deserialize;

use crate::api::{CheckRun, WorkflowJob, WorkflowRun};
use crate::error::GithubResult;

#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Head commit after the push.
    pub after: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSuite {
    pub head_sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckSuitePayload {
    pub action: String,
    pub check_suite: CheckSuite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRunPayload {
    pub action: String,
    pub check_run: CheckRun,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunPayload {
    pub action: String,
    pub workflow_run: WorkflowRun,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowJobPayload {
    pub action: String,
    pub workflow_job: WorkflowJob,
}

/// One webhook delivery, discriminated by the event header.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// Intake is driven by check-suite signals; pushes are acknowledged
    /// and ignored.
    Push(PushPayload),
    CheckSuite(CheckSuitePayload),
    CheckRun(CheckRunPayload),
    WorkflowRun(WorkflowRunPayload),
    WorkflowJob(WorkflowJobPayload),
    /// Event kinds the daemon does not react to.
    Unsupported(String),
}

impl WebhookEvent {
    pub fn parse(event: &str, body: &[u8]) -> GithubResult<WebhookEvent> {
        Ok(match event {
            "push" => WebhookEvent::Push(serde_json::from_slice(body)?),
            "check_suite" => WebhookEvent::CheckSuite(serde_json::from_slice(body)?),
            "check_run" => WebhookEvent::CheckRun(serde_json::from_slice(body)?),
            "workflow_run" => WebhookEvent::WorkflowRun(serde_json::from_slice(body)?),
            "workflow_job" => WebhookEvent::WorkflowJob(serde_json::from_slice(body)?),
            other => WebhookEvent::Unsupported(other.to_string()),
        })
    }

    /// Event kind for logs.
    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::Push(_) => "push",
            WebhookEvent::CheckSuite(_) => "check_suite",
            WebhookEvent::CheckRun(_) => "check_run",
            WebhookEvent::WorkflowRun(_) => "workflow_run",
            WebhookEvent::WorkflowJob(_) => "workflow_job",
            WebhookEvent::Unsupported(kind) => kind,
        }
    }
}
