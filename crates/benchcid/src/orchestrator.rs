//! Build queue consumer.
//!
//! The single place where toolchain images get built and boards get
//! flashed. One consumer task means at most one image build and one open
//! serial session exist at a time; the fleet is walked in target order and
//! a failing board never blocks the ones after it.

use std::sync::Arc;
use std::time::Instant;

use benchci_core::build::Build;
use benchci_core::{obs, CommitId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::{executor, AppState};

pub fn spawn(state: Arc<AppState>, rx: mpsc::Receiver<CommitId>) -> JoinHandle<()> {
    tokio::spawn(consume(state, rx))
}

pub async fn consume(state: Arc<AppState>, mut rx: mpsc::Receiver<CommitId>) {
    info!("build consumer started");
    while let Some(commit) = rx.recv().await {
        process_build(&state, &commit).await;
    }
    info!("build queue closed; consumer exiting");
}

/// Run one build end to end: image, then every attached board.
///
/// The registry is re-read here rather than trusting the queued snapshot,
/// so runs attached between enqueue and dequeue are included.
pub async fn process_build(state: &AppState, commit: &CommitId) {
    // The span rides the future; the consumer task is spawned, so nothing
    // here may hold an entered guard across an await.
    run_build(state, commit)
        .instrument(obs::build_span(commit))
        .await
}

async fn run_build(state: &AppState, commit: &CommitId) {
    let Some(build) = state.registry.get(commit) else {
        warn!(commit = %commit.short(), "queued build vanished from the registry");
        return;
    };
    let started = Instant::now();

    for handle in build.runs.values() {
        state.gateway.mark_in_progress(handle).await;
    }

    // A pinned URL wins over whatever resolution attached.
    let source = state
        .config
        .pinned_firmware_url
        .clone()
        .or_else(|| build.source_url.clone());
    let Some(source) = source else {
        warn!(commit = %commit.short(), "no firmware source attached to this build");
        fail_all(state, &build, "No firmware artifact was resolved for this commit.").await;
        state.registry.mark_completed(commit);
        return;
    };
    obs::emit_build_started(commit, &source);

    let image = state.toolchain.image_tag(commit);
    let build_args = state.toolchain.image_build_args(commit, &source);
    match state.runner.run("docker", &build_args, &[]).await {
        Ok(output) if output.success => {
            obs::emit_image_built(commit, &image, output.duration_ms);
        }
        Ok(output) => {
            // Without a toolchain there is nothing to flash; every run in
            // the build fails with the same captured output.
            obs::emit_image_failed(commit, output.exit_code);
            fail_all(state, &build, &output.output).await;
            state.registry.mark_completed(commit);
            return;
        }
        Err(err) => {
            obs::emit_image_failed(commit, -1);
            fail_all(
                state,
                &build,
                &format!("toolchain image build could not be started: {err}"),
            )
            .await;
            state.registry.mark_completed(commit);
            return;
        }
    }

    for (target, handle) in &build.runs {
        let Some(board) = state.board(target) else {
            warn!(target, "check run names a target with no configured board");
            state
                .gateway
                .report_fail(handle, &format!("No board is configured for target {target}."))
                .await;
            continue;
        };
        if !board.enabled {
            obs::emit_board_skipped(commit, target);
            state
                .gateway
                .report_disabled(handle, &board.display_name)
                .await;
            continue;
        }

        let board_started = Instant::now();
        let outcome =
            executor::run_board(state.runner.as_ref(), &state.toolchain, board, &image).await;
        obs::emit_board_result(
            commit,
            target,
            outcome.pass,
            board_started.elapsed().as_millis() as u64,
        );
        debug!(target, output_digest = %outcome.digest(), "board output captured");

        if outcome.pass {
            state.gateway.report_pass(handle, &outcome.text).await;
        } else {
            state.gateway.report_fail(handle, &outcome.text).await;
        }
    }

    state.registry.mark_completed(commit);
    obs::emit_build_completed(commit, build.runs.len(), started.elapsed().as_millis() as u64);
}

async fn fail_all(state: &AppState, build: &Build, text: &str) {
    for handle in build.runs.values() {
        state.gateway.report_fail(handle, text).await;
    }
}
