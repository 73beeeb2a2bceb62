//! Consumer scenarios: one build walked end to end over scripted tools.
//!
//! Failure scoping is the core contract here. An image failure takes the
//! whole build down with one shared report; a flash or test failure stays
//! on its board; a disabled board never touches hardware at all.

mod support;

use std::time::Duration;

use benchci_core::CommitId;
use benchci_github::{CheckConclusion, CheckStatus};
use benchci_tap::TapProducer;
use benchcid::{ingest, orchestrator};
use chrono::Utc;
use support::{fixture, fixture_with, run_rerequested, suite_requested, workflow_run_completed, Fixture};

const SHA: &str = "0871e02fd08f5c63ba7486cbb69a2ae1d55f0b2c";

/// Suite intake plus artifact resolution, returning the dequeued commit.
async fn queued_build(fx: &mut Fixture) -> CommitId {
    ingest::handle_event(&fx.state, suite_requested(SHA)).await;
    fx.seed_artifact(4242, SHA, Utc::now());
    ingest::handle_event(&fx.state, workflow_run_completed(4242, "Linux", SHA)).await;
    fx.build_rx.try_recv().expect("build enqueued")
}

/// What a green board prints over serial.
fn passing_transcript() -> String {
    let mut tap = TapProducer::new(Vec::new());
    tap.header(2).unwrap();
    tap.pass("spi configure").unwrap();
    tap.pass("i2c scan").unwrap();
    String::from_utf8(tap.into_inner()).unwrap()
}

#[tokio::test]
async fn test_image_build_failure_fails_every_run_identically() {
    let mut fx = fixture();
    let commit = queued_build(&mut fx).await;
    fx.runner.push_failure(
        "Step 3/7 : RUN curl -L $FIRMWARE_URL\ncurl: (22) The requested URL returned error: 404",
    );

    orchestrator::process_build(&fx.state, &commit).await;

    assert_eq!(fx.runner.call_count(), 1, "no flash without an image");
    let calls = fx.runner.calls();
    assert_eq!(calls[0].program, "docker");
    assert_eq!(calls[0].args[0], "build");

    let completions = fx.checks.completions();
    assert_eq!(completions.len(), 2);
    assert!(completions
        .iter()
        .all(|(_, conclusion, _)| *conclusion == CheckConclusion::Failure));
    assert_eq!(
        completions[0].2.text, completions[1].2.text,
        "every board reports the same image failure"
    );
    assert!(completions[0].2.text.contains("404"));
    assert!(fx.state.registry.get(&commit).unwrap().is_completed());
}

#[tokio::test]
async fn test_flash_failure_stays_on_its_board() {
    let mut fx = fixture();
    let commit = queued_build(&mut fx).await;
    fx.runner.push_success("Successfully tagged benchci/toolchain:0871e02");
    fx.runner.push_failure("error: unable to open port /dev/itsybitsy_m4");
    fx.runner.push_success("flashed 131072 bytes");
    fx.runner.push_success(&passing_transcript());

    orchestrator::process_build(&fx.state, &commit).await;

    let calls = fx.runner.calls();
    assert_eq!(calls.len(), 4, "failed flash skips its harness run");
    assert_eq!(calls[1].args[0], "run");
    assert!(calls[1].args.iter().any(|arg| arg == "--device=/dev/itsybitsy_m4"));
    assert_eq!(calls[3].program, "benchci-harness");
    assert_eq!(calls[3].args, ["/dev/microbit", "115200", "5"]);

    // itsybitsy-m4: flash output alone, no transcript.
    let (conclusion, output) = fx.checks.completion_for(1).unwrap();
    assert_eq!(conclusion, CheckConclusion::Failure);
    assert_eq!(output.text, "error: unable to open port /dev/itsybitsy_m4");

    // microbit is unaffected and reports flash plus transcript.
    let (conclusion, output) = fx.checks.completion_for(2).unwrap();
    assert_eq!(conclusion, CheckConclusion::Success);
    assert!(output.text.contains("flashed 131072 bytes"));
    assert!(output.text.contains("ok 2 - i2c scan"));
}

#[tokio::test]
async fn test_failing_transcript_fails_the_board() {
    let mut fx = fixture();
    let commit = queued_build(&mut fx).await;
    let mut tap = TapProducer::new(Vec::new());
    tap.header(2).unwrap();
    tap.pass("spi configure").unwrap();
    tap.fail("i2c scan").unwrap();
    let transcript = String::from_utf8(tap.into_inner()).unwrap();

    fx.runner.push_success("image ok");
    fx.runner.push_success("flashed");
    fx.runner.push_failure(&transcript);
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());

    orchestrator::process_build(&fx.state, &commit).await;

    let (conclusion, output) = fx.checks.completion_for(1).unwrap();
    assert_eq!(conclusion, CheckConclusion::Failure);
    assert!(output.text.contains("not ok 2 - i2c scan"));
    let (conclusion, _) = fx.checks.completion_for(2).unwrap();
    assert_eq!(conclusion, CheckConclusion::Success);
}

#[tokio::test]
async fn test_disabled_board_reports_skip_without_hardware() {
    let mut fx = fixture();
    fx.seed_artifact(11, SHA, Utc::now());
    ingest::handle_event(&fx.state, run_rerequested(77, "benchci: maixbit", SHA)).await;
    let commit = fx.build_rx.try_recv().unwrap();
    fx.runner.push_success("Successfully tagged benchci/toolchain:0871e02");

    orchestrator::process_build(&fx.state, &commit).await;

    assert_eq!(fx.runner.call_count(), 1, "image only; no flash, no serial");
    let (conclusion, output) = fx.checks.completion_for(77).unwrap();
    assert_eq!(conclusion, CheckConclusion::Success);
    assert!(output.summary.contains("Sipeed MAiX BiT"));
    assert!(output.summary.contains("disabled"));
    assert!(output.text.is_empty());
}

#[tokio::test]
async fn test_unknown_target_fails_with_a_note() {
    let mut fx = fixture();
    fx.seed_artifact(11, SHA, Utc::now());
    ingest::handle_event(&fx.state, run_rerequested(78, "benchci: pyportal", SHA)).await;
    let commit = fx.build_rx.try_recv().unwrap();
    fx.runner.push_success("image ok");

    orchestrator::process_build(&fx.state, &commit).await;

    assert_eq!(fx.runner.call_count(), 1);
    let (conclusion, output) = fx.checks.completion_for(78).unwrap();
    assert_eq!(conclusion, CheckConclusion::Failure);
    assert!(output.text.contains("No board is configured for target pyportal."));
}

#[tokio::test]
async fn test_build_without_artifact_fails_without_touching_tools() {
    let fx = fixture();
    ingest::handle_event(&fx.state, suite_requested(SHA)).await;
    let commit = CommitId::new(SHA);

    // Queue hiccup: the commit reaches the consumer with nothing attached.
    orchestrator::process_build(&fx.state, &commit).await;

    assert_eq!(fx.runner.call_count(), 0);
    let completions = fx.checks.completions();
    assert_eq!(completions.len(), 2);
    assert!(completions
        .iter()
        .all(|(_, conclusion, _)| *conclusion == CheckConclusion::Failure));
    assert!(completions[0].2.text.contains("No firmware artifact"));
    assert!(fx.state.registry.get(&commit).unwrap().is_completed());
}

#[tokio::test]
async fn test_pinned_url_feeds_the_image_build() {
    let mut fx = fixture_with(|mut config| {
        config.pinned_firmware_url =
            Some("https://ci.acme.test/firmware/nightly.tar.gz".to_string());
        config
    });
    ingest::handle_event(&fx.state, suite_requested(SHA)).await;
    // No seeded provider state: pinned mode resolves without lookups.
    ingest::handle_event(&fx.state, workflow_run_completed(4242, "Linux", SHA)).await;
    let commit = fx.build_rx.try_recv().expect("pinned resolution needs no provider");

    fx.runner.push_success("image ok");
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());

    orchestrator::process_build(&fx.state, &commit).await;

    let calls = fx.runner.calls();
    assert!(calls[0]
        .args
        .iter()
        .any(|arg| arg == "FIRMWARE_URL=https://ci.acme.test/firmware/nightly.tar.gz"));
    assert_eq!(fx.checks.completions().len(), 2);
}

#[tokio::test]
async fn test_full_pass_reports_every_board_green() {
    let mut fx = fixture();
    let commit = queued_build(&mut fx).await;
    fx.runner.push_success("Successfully tagged benchci/toolchain:0871e02");
    fx.runner.push_success("flashed itsybitsy-m4");
    fx.runner.push_success(&passing_transcript());
    fx.runner.push_success("flashed microbit");
    fx.runner.push_success(&passing_transcript());

    orchestrator::process_build(&fx.state, &commit).await;

    assert_eq!(fx.runner.call_count(), 5);
    assert_eq!(
        fx.checks.transitions(),
        vec![(1, CheckStatus::InProgress), (2, CheckStatus::InProgress)]
    );

    let completions = fx.checks.completions();
    assert_eq!(completions.len(), 2);
    assert!(completions
        .iter()
        .all(|(_, conclusion, _)| *conclusion == CheckConclusion::Success));
    assert!(completions[0].2.text.contains("flashed itsybitsy-m4"));
    assert!(completions[0].2.text.contains("TAP version 13"));
    assert!(fx.state.registry.get(&commit).unwrap().is_completed());
}

#[tokio::test]
async fn test_spawned_consumer_walks_the_queue() {
    let fx = fixture();
    ingest::handle_event(&fx.state, suite_requested(SHA)).await;
    fx.seed_artifact(4242, SHA, Utc::now());
    ingest::handle_event(&fx.state, workflow_run_completed(4242, "Linux", SHA)).await;
    fx.runner.push_success("image ok");
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());

    // The production path: the consumer runs on its own spawned task.
    let consumer = orchestrator::spawn(fx.state.clone(), fx.build_rx);

    tokio::time::timeout(Duration::from_secs(5), async {
        while fx.checks.completions().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("consumer reported both boards");
    consumer.abort();

    assert!(fx
        .checks
        .completions()
        .iter()
        .all(|(_, conclusion, _)| *conclusion == CheckConclusion::Success));
}

#[tokio::test]
async fn test_reprocessing_a_completed_build_reports_nothing_twice() {
    let mut fx = fixture();
    let commit = queued_build(&mut fx).await;
    fx.runner.push_success("image ok");
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());
    orchestrator::process_build(&fx.state, &commit).await;
    assert_eq!(fx.checks.completions().len(), 2);

    // A duplicate queue entry reprocesses the commit; hardware runs again
    // but the provider sees no second report.
    fx.runner.push_success("image ok");
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());
    fx.runner.push_success("flashed");
    fx.runner.push_success(&passing_transcript());
    orchestrator::process_build(&fx.state, &commit).await;

    assert_eq!(fx.checks.completions().len(), 2);
    assert_eq!(
        fx.checks.transitions().len(),
        2,
        "completed handles cannot re-enter in_progress"
    );
}
