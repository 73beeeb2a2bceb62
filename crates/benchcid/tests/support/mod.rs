//! Shared fixture: daemon state over in-memory fakes.
//!
//! Each test binary compiles its own copy, so helpers unused by one binary
//! are expected.
#![allow(dead_code)]

use std::sync::Arc;

use benchci_core::fakes::ScriptedRunner;
use benchci_core::{BoardSet, BuildRegistry, CommitId};
use benchci_github::fakes::{FakeActions, FakeChecks};
use benchci_github::{ArtifactResolver, CheckRun, CheckRunGateway, WebhookEvent};
use benchcid::{AppState, DaemonConfig, Toolchain};
use chrono::{DateTime, Utc};
use clap::Parser;
use tokio::sync::mpsc;

/// Two enabled boards plus one disabled board with a dead USB port.
const INVENTORY: &str = r#"
[[boards]]
target = "itsybitsy-m4"
display_name = "Adafruit ItsyBitsy M4"
device = "itsybitsy_m4"
baud = 115200
settle_secs = 0

[[boards]]
target = "microbit"
display_name = "BBC micro:bit"
device = "microbit"
baud = 115200
settle_secs = 0

[[boards]]
target = "maixbit"
display_name = "Sipeed MAiX BiT"
device = "maixbit"
baud = 115200
settle_secs = 0
enabled = false
"#;

pub struct Fixture {
    pub state: Arc<AppState>,
    pub checks: Arc<FakeChecks>,
    pub actions: Arc<FakeActions>,
    pub runner: Arc<ScriptedRunner>,
    pub build_rx: mpsc::Receiver<CommitId>,
}

pub fn fixture() -> Fixture {
    fixture_with(|config| config)
}

/// Fixture with the parsed default config adjusted before wiring.
pub fn fixture_with(tweak: impl FnOnce(DaemonConfig) -> DaemonConfig) -> Fixture {
    let config = tweak(DaemonConfig::parse_from([
        "benchcid", "--owner", "acme", "--repo", "firmware",
    ]));
    let boards = BoardSet::from_toml_str(INVENTORY).unwrap();

    let checks = Arc::new(FakeChecks::new());
    let actions = Arc::new(FakeActions::new());
    let runner = Arc::new(ScriptedRunner::new());
    let (build_tx, build_rx) = mpsc::channel(16);

    let mut resolver = ArtifactResolver::new(actions.clone(), &config.workflow, &config.job);
    if let Some(url) = &config.pinned_firmware_url {
        resolver = resolver.with_pinned_url(url);
    }
    let toolchain = Toolchain::from_config(&config);

    let state = Arc::new(AppState {
        boards,
        registry: Arc::new(BuildRegistry::new()),
        gateway: Arc::new(CheckRunGateway::new(checks.clone())),
        resolver: Arc::new(resolver),
        runner: runner.clone(),
        toolchain,
        build_tx,
        config,
    });

    Fixture {
        state,
        checks,
        actions,
        runner,
        build_rx,
    }
}

impl Fixture {
    /// Seed the fake provider so `run_id` resolves to an artifact URL.
    pub fn seed_artifact(&self, run_id: u64, head_sha: &str, created_at: DateTime<Utc>) -> String {
        let url = format!("https://api.acme.test/artifacts/{run_id}/zip");
        self.actions.push_run(run_id, "Linux", head_sha, created_at);
        self.actions.set_job(run_id, "build-linux", head_sha);
        self.actions.set_artifact(run_id, &url);
        url
    }
}

pub fn suite_requested(head_sha: &str) -> WebhookEvent {
    let body = format!(r#"{{"action": "requested", "check_suite": {{"head_sha": "{head_sha}"}}}}"#);
    WebhookEvent::parse("check_suite", body.as_bytes()).unwrap()
}

pub fn run_rerequested(id: u64, name: &str, head_sha: &str) -> WebhookEvent {
    let body = format!(
        r#"{{
            "action": "rerequested",
            "check_run": {{"id": {id}, "name": "{name}", "status": "completed", "head_sha": "{head_sha}", "conclusion": "failure"}}
        }}"#
    );
    WebhookEvent::parse("check_run", body.as_bytes()).unwrap()
}

pub fn workflow_run_completed(id: u64, name: &str, head_sha: &str) -> WebhookEvent {
    let body = format!(
        r#"{{
            "action": "completed",
            "workflow_run": {{
                "id": {id},
                "name": "{name}",
                "head_sha": "{head_sha}",
                "conclusion": "success",
                "created_at": "2026-03-01T10:15:00Z"
            }}
        }}"#
    );
    WebhookEvent::parse("workflow_run", body.as_bytes()).unwrap()
}

pub fn workflow_job_completed(run_id: u64, name: &str, head_sha: &str) -> WebhookEvent {
    let body = format!(
        r#"{{
            "action": "completed",
            "workflow_job": {{
                "id": 1,
                "run_id": {run_id},
                "name": "{name}",
                "head_sha": "{head_sha}",
                "conclusion": "success"
            }}
        }}"#
    );
    WebhookEvent::parse("workflow_job", body.as_bytes()).unwrap()
}

/// A check run as `list_check_runs_for_ref` would report it.
pub fn listed_run(id: u64, name: &str, status: &str, head_sha: &str) -> CheckRun {
    CheckRun {
        id,
        name: name.to_string(),
        status: status.to_string(),
        head_sha: head_sha.to_string(),
        conclusion: None,
    }
}
