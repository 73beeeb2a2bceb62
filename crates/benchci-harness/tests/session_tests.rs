//! Session behavior against scripted fake boards on an in-memory duplex
//! stream. Timer-driven paths run under paused time so nothing here sleeps
//! for real.

use benchci_harness::{SessionConfig, SessionOutcome, TestSession};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

const PROMPT: &str = "Press 't' key to begin running tests...\r\n";

async fn await_trigger(device: &mut DuplexStream) {
    let mut byte = [0u8; 1];
    device.read_exact(&mut byte).await.expect("trigger byte");
    assert_eq!(byte[0], b't');
}

/// Parks until the harness side of the pipe is dropped.
async fn hold_open(mut device: DuplexStream) {
    let mut sink = [0u8; 16];
    while let Ok(n) = device.read(&mut sink).await {
        if n == 0 {
            break;
        }
    }
}

#[tokio::test]
async fn test_passing_suite_yields_pass() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(b"=== RUNNING INTEGRATION TESTS ===\r\n").await.unwrap();
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device
            .write_all(b"TAP version 13\r\n1..2\r\nok 1 - SPI loopback\r\nok 2 - I2C probe\r\n")
            .await
            .unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Pass);
    assert!(report.transcript.plan_satisfied());
    assert!(report.raw_text().contains("ok 2 - I2C probe"));
    script.await.unwrap();
}

#[tokio::test]
async fn test_failing_result_yields_fail() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device
            .write_all(
                b"TAP version 13\r\n1..3\r\nok 1 - SPI loopback\r\nnot ok 2 - I2C probe\r\nok 3 - UART echo\r\n",
            )
            .await
            .unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Fail);
    assert_eq!(report.transcript.failures().len(), 1);
    assert!(report.raw_text().contains("not ok 2 - I2C probe"));
    script.await.unwrap();
}

#[tokio::test]
async fn test_todo_failure_is_exempt() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device
            .write_all(b"1..2\r\nok 1 - LED blink\r\nnot ok 2 # TODO flaky pull-up\r\n")
            .await
            .unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Pass);
    script.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_trigger_sent_without_prompt() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        // This board boots silently and only answers the trigger.
        await_trigger(&mut device).await;
        device
            .write_all(b"1..1\r\nok 1 - watchdog\r\n")
            .await
            .unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Pass);
    script.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_suite_finished_during_prompt_wait_passes() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        // Auto-start firmware: the whole suite is out before any prompt.
        device.write_all(b"1..1\r\nok 1 - autostart suite\r\n").await.unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Pass);
    assert!(report.transcript.plan_satisfied());
    script.await.unwrap();
}

#[tokio::test]
async fn test_session_end_releases_the_stream() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device.write_all(b"1..1\r\nok 1 - blink\r\n").await.unwrap();
        // The finished session must drop both halves of the pipe, so the
        // device sees EOF rather than a reader parked forever.
        let mut sink = [0u8; 16];
        let n = device.read(&mut sink).await.unwrap();
        assert_eq!(n, 0);
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Pass);
    script.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_silent_board_times_out() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::TimedOut);
    assert_eq!(report.transcript.results_seen(), 0);
    script.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_partial_results_time_out() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device.write_all(b"1..3\r\nok 1 - SPI loopback\r\n").await.unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::TimedOut);
    assert_eq!(report.transcript.results_seen(), 1);
    assert!(!report.transcript.plan_satisfied());
    script.await.unwrap();
}

#[tokio::test]
async fn test_eof_after_failure_reports_fail() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device
            .write_all(b"1..2\r\nnot ok 1 - brownout detect\r\n")
            .await
            .unwrap();
        // Board resets mid-suite.
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Fail);
    script.await.unwrap();
}

#[tokio::test]
async fn test_eof_without_plan_times_out() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device
            .write_all(b"ok 1 - SPI loopback\r\nok 2 - I2C probe\r\n")
            .await
            .unwrap();
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    // Results without a plan never count as a pass.
    assert_eq!(report.outcome, SessionOutcome::TimedOut);
    script.await.unwrap();
}

#[tokio::test]
async fn test_boot_noise_is_retained() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(b"bootloader v2.1\r\n").await.unwrap();
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        device.write_all(b"1..1\r\nok 1 - boot\r\n").await.unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    let text = report.raw_text();
    assert!(text.starts_with("bootloader v2.1\n"));
    assert!(text.contains("begin running tests"));
    script.await.unwrap();
}

#[tokio::test]
async fn test_descriptions_cannot_end_collection_early() {
    let (mut device, harness) = duplex(4096);
    let script = tokio::spawn(async move {
        device.write_all(PROMPT.as_bytes()).await.unwrap();
        await_trigger(&mut device).await;
        // Only the satisfied plan may stop collection, whatever the
        // descriptions say.
        device
            .write_all(b"1..2\r\nok 1 - prints all tests passed\r\nok 2 - second\r\n")
            .await
            .unwrap();
        hold_open(device).await;
    });

    let report = TestSession::new(SessionConfig::default())
        .drive(harness)
        .await
        .unwrap();

    assert_eq!(report.outcome, SessionOutcome::Pass);
    assert_eq!(report.transcript.results_seen(), 2);
    script.await.unwrap();
}
