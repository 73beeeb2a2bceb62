//! Run the on-board test suite for one attached board.
//!
//! The daemon invokes this after flashing:
//!
//! ```text
//! benchci-harness /dev/itsybitsy_m4 115200 5
//! ```
//!
//! The full transcript goes to stdout; logs go to stderr so the caller can
//! capture the transcript cleanly. Exit code 0 means every observed test
//! passed, 1 means a failure, a timeout, or a device error.

use std::process::ExitCode;
use std::time::Duration;

use benchci_harness::{run_device_session, SessionConfig, SessionOutcome};
use clap::Parser;
use tracing::{debug, error, Level};

#[derive(Parser, Debug)]
#[command(name = "benchci-harness", version)]
#[command(about = "Drive a board's test suite over its serial link")]
struct Cli {
    /// Serial device path (e.g. /dev/itsybitsy_m4)
    device: String,

    /// Baud rate of the serial link
    baud: u32,

    /// Accepted for invocation compatibility; the settle pause now happens
    /// before the harness starts
    #[arg(default_value_t = 5)]
    legacy_delay: u64,

    /// Seconds to wait for the ready prompt before triggering anyway
    #[arg(long, default_value_t = 5)]
    prompt_timeout: u64,

    /// Seconds allowed for the whole collection window
    #[arg(long, default_value_t = 60)]
    collect_timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    benchci_core::telemetry::init_tracing_stderr(Level::INFO);
    debug!(legacy_delay = cli.legacy_delay, "legacy delay argument ignored");

    let config = SessionConfig {
        prompt_timeout: Duration::from_secs(cli.prompt_timeout),
        collect_timeout: Duration::from_secs(cli.collect_timeout),
        ..SessionConfig::default()
    };

    match run_device_session(&cli.device, cli.baud, config).await {
        Ok(report) => {
            print!("{}", report.raw_text());
            match report.outcome {
                SessionOutcome::Pass => ExitCode::SUCCESS,
                SessionOutcome::Fail | SessionOutcome::TimedOut => ExitCode::FAILURE,
            }
        }
        Err(err) => {
            error!(error = %err, "harness session failed");
            ExitCode::FAILURE
        }
    }
}
