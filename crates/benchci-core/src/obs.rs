//! Structured observability hooks for build lifecycle events.
//!
//! This module provides:
//! - Build-scoped tracing spans via [`build_span`]
//! - Emission functions for the events operators watch: queueing, image
//!   construction, per-board results, completion, dropped API calls
//!
//! Events are emitted at `info!` level; dropped external calls at `warn!`.

use tracing::{info, warn, Span};

use crate::build::CommitId;

/// Span for one build's processing, carrying the short commit id.
///
/// Attach it with `tracing::Instrument` rather than entering it: build
/// processing awaits between log calls, and an entered guard must not be
/// held across an await point on a spawned task.
///
/// # Example
///
/// ```ignore
/// process(&build).instrument(obs::build_span(&build.commit)).await;
/// ```
pub fn build_span(commit: &CommitId) -> Span {
    tracing::info_span!("benchci.build", commit = %commit.short())
}

/// Emit event: build queued for the consumer with its board count.
pub fn emit_build_queued(commit: &CommitId, targets: usize) {
    info!(event = "build.queued", commit = %commit, targets = targets);
}

/// Emit event: consumer picked up a build.
pub fn emit_build_started(commit: &CommitId, source_url: &str) {
    info!(event = "build.started", commit = %commit, source_url = %source_url);
}

/// Emit event: toolchain image built.
pub fn emit_image_built(commit: &CommitId, image: &str, duration_ms: u64) {
    info!(event = "image.built", commit = %commit, image = %image, duration_ms = duration_ms);
}

/// Emit event: toolchain image construction failed (fails the whole build).
pub fn emit_image_failed(commit: &CommitId, exit_code: i32) {
    warn!(event = "image.failed", commit = %commit, exit_code = exit_code);
}

/// Emit event: one board finished with a pass/fail verdict.
pub fn emit_board_result(commit: &CommitId, target: &str, passed: bool, duration_ms: u64) {
    info!(
        event = "board.result",
        commit = %commit,
        target = %target,
        passed = passed,
        duration_ms = duration_ms,
    );
}

/// Emit event: a disabled board was reported without hardware interaction.
pub fn emit_board_skipped(commit: &CommitId, target: &str) {
    info!(event = "board.skipped", commit = %commit, target = %target);
}

/// Emit event: every board in the build has been reported.
pub fn emit_build_completed(commit: &CommitId, boards: usize, duration_ms: u64) {
    info!(
        event = "build.completed",
        commit = %commit,
        boards = boards,
        duration_ms = duration_ms,
    );
}

/// Emit event: an external API call failed and was dropped (warning level).
/// Recovery belongs to the poller and startup reconciliation.
pub fn emit_api_dropped(context: &str, error: &dyn std::fmt::Display) {
    warn!(event = "api.dropped", context = %context, error = %error);
}
