//! Event ingestion.
//!
//! Maps provider signals onto registry state:
//!
//! - a queued check suite opens a build and creates one pending check run
//!   per enabled board;
//! - a re-requested check run retries a single board, re-resolving the
//!   artifact and rebuilding the image from scratch;
//! - a completed upstream workflow (or job) attaches the firmware artifact
//!   and hands the build to the consumer;
//! - pushes are acknowledged and ignored, the suite signal drives intake.
//!
//! Nothing here blocks on hardware. Resolution failures leave the build
//! pending for the poller instead of erroring out, so a missed or early
//! signal costs one poll interval, not the build.

use benchci_core::build::{Build, CheckRunHandle};
use benchci_core::{obs, CommitId};
use benchci_github::webhook::{
    CheckRunPayload, CheckSuitePayload, WorkflowJobPayload, WorkflowRunPayload,
};
use benchci_github::{parse_target, WebhookEvent};
use tracing::{debug, info, warn};

use crate::AppState;

pub async fn handle_event(state: &AppState, event: WebhookEvent) {
    match event {
        WebhookEvent::CheckSuite(payload) => handle_check_suite(state, payload).await,
        WebhookEvent::CheckRun(payload) => handle_check_run(state, payload).await,
        WebhookEvent::WorkflowRun(payload) => handle_workflow_run(state, payload).await,
        WebhookEvent::WorkflowJob(payload) => handle_workflow_job(state, payload).await,
        WebhookEvent::Push(payload) => {
            debug!(git_ref = %payload.git_ref, "push acknowledged; suite signal drives intake");
        }
        WebhookEvent::Unsupported(kind) => {
            debug!(kind, "unsupported event ignored");
        }
    }
}

/// A new check suite on a commit: open a build and create its check runs.
async fn handle_check_suite(state: &AppState, payload: CheckSuitePayload) {
    if payload.action != "requested" && payload.action != "rerequested" {
        debug!(action = %payload.action, "check_suite action ignored");
        return;
    }
    let commit = CommitId::new(payload.check_suite.head_sha);

    if state.registry.create(&commit).is_none() {
        debug!(commit = %commit.short(), "duplicate suite delivery ignored");
        return;
    }

    let mut attached = 0;
    for board in state.boards.enabled() {
        // A failed create leaves this board without a run for the build;
        // the next suite signal or reconciliation recreates it.
        if let Some(handle) = state
            .gateway
            .create_pending(&board.target, commit.as_str())
            .await
        {
            state.registry.attach_run(&commit, &board.target, handle);
            attached += 1;
        }
    }
    info!(
        commit = %commit.short(),
        boards = attached,
        "suite accepted; awaiting upstream artifact"
    );
}

/// An operator pressed re-run on one of our check runs.
async fn handle_check_run(state: &AppState, payload: CheckRunPayload) {
    if payload.action != "rerequested" {
        debug!(action = %payload.action, "check_run action ignored");
        return;
    }
    let run = payload.check_run;
    rerequest_run(state, run.id, &run.name, &run.head_sha).await;
}

/// Retry a single board's check run. Also the entry point for startup
/// reconciliation, which re-drives stale runs through the same path.
pub async fn rerequest_run(state: &AppState, run_id: u64, name: &str, head_sha: &str) {
    let Some(target) = parse_target(name) else {
        debug!(name, "re-request for a foreign check run ignored");
        return;
    };
    if head_sha.is_empty() {
        warn!(name, run_id, "re-request without a head SHA ignored");
        return;
    }
    let commit = CommitId::new(head_sha);
    let handle = CheckRunHandle::new(run_id, name);
    state.gateway.adopt(&handle);

    match state.registry.get(&commit) {
        Some(existing) if !existing.is_completed() => {
            state.registry.attach_run(&commit, target, handle);
            info!(
                commit = %commit.short(),
                target,
                "attached re-requested run to the build in flight"
            );
        }
        _ => {
            state
                .registry
                .replace(Build::for_rerequest(commit.clone(), target, handle));
            info!(commit = %commit.short(), target, "re-request opened a single-board build");
        }
    }

    // No time bound here: the workflow run that built this commit's
    // artifact predates the retry.
    match state.resolver.resolve_for_commit(&commit, None).await {
        Ok(url) => attach_and_enqueue(state, &commit, &url).await,
        Err(err) => warn!(
            commit = %commit.short(),
            error = %err,
            "artifact not resolvable yet; the poller will retry"
        ),
    }
}

/// Upstream CI finished a workflow run for some commit.
async fn handle_workflow_run(state: &AppState, payload: WorkflowRunPayload) {
    let run = payload.workflow_run;
    if payload.action != "completed"
        || run.conclusion.as_deref() != Some("success")
        || run.name != state.config.workflow
    {
        debug!(workflow = %run.name, action = %payload.action, "workflow_run ignored");
        return;
    }
    ci_completed(state, &CommitId::new(run.head_sha), run.id).await;
}

/// Same signal at job granularity, for repos that deliver job events.
async fn handle_workflow_job(state: &AppState, payload: WorkflowJobPayload) {
    let job = payload.workflow_job;
    if payload.action != "completed"
        || job.conclusion.as_deref() != Some("success")
        || job.name != state.config.job
    {
        debug!(job = %job.name, action = %payload.action, "workflow_job ignored");
        return;
    }
    ci_completed(state, &CommitId::new(job.head_sha), job.run_id).await;
}

async fn ci_completed(state: &AppState, commit: &CommitId, run_id: u64) {
    let Some(build) = state.registry.get(commit) else {
        debug!(commit = %commit.short(), "CI completed for a commit with no build");
        return;
    };
    if !build.awaiting_ci {
        debug!(commit = %commit.short(), "artifact already attached");
        return;
    }
    match state.resolver.resolve_url(run_id).await {
        Ok(url) => attach_and_enqueue(state, commit, &url).await,
        Err(err) => {
            // Artifacts can lag the completion event; the poller recovers.
            warn!(commit = %commit.short(), run_id, error = %err, "artifact lookup failed");
        }
    }
}

/// Record the firmware source and hand the build to the consumer. Only the
/// transition from awaiting to resolved enqueues; repeated resolutions for
/// the same commit attach nothing new and must not re-run boards.
pub(crate) async fn attach_and_enqueue(state: &AppState, commit: &CommitId, url: &str) {
    let was_awaiting = state
        .registry
        .get(commit)
        .map(|build| build.awaiting_ci)
        .unwrap_or(false);
    state.registry.set_source_url(commit, url);
    if !was_awaiting {
        debug!(commit = %commit.short(), "source already attached; not re-enqueueing");
        return;
    }

    let targets = state
        .registry
        .get(commit)
        .map(|build| build.runs.len())
        .unwrap_or(0);
    obs::emit_build_queued(commit, targets);
    if state.build_tx.send(commit.clone()).await.is_err() {
        warn!(commit = %commit.short(), "build queue closed; dropping build");
    }
}
