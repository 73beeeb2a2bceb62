//! Tool execution capability.
//!
//! Everything the daemon shells out to (toolchain image builds, board
//! flashes, the test harness) goes through [`CommandRunner`], so
//! orchestration logic can run against scripted outputs in tests and no
//! module but this one touches `tokio::process`.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::CoreResult;

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Captured stdout followed by stderr.
    pub output: String,
    /// Exit code (-1 when terminated by a signal or a deadline).
    pub exit_code: i32,
    /// Whether the tool exited zero.
    pub success: bool,
    /// Wall time of the invocation in milliseconds.
    pub duration_ms: u64,
}

impl ToolOutput {
    /// Output reported for an invocation that exceeded its deadline.
    pub fn timed_out(deadline: Duration) -> Self {
        Self {
            output: format!("tool did not finish within {}s", deadline.as_secs()),
            exit_code: -1,
            success: false,
            duration_ms: deadline.as_millis() as u64,
        }
    }
}

/// Capability interface for running external tools.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and extra environment variables, capturing
    /// combined output. A nonzero exit is an `Ok` with `success: false`;
    /// `Err` means the tool could not be spawned or awaited at all.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> CoreResult<ToolOutput>;
}

/// Runs tools as real subprocesses with a hard deadline per invocation.
///
/// A deadline elapse reports a failed [`ToolOutput`] instead of an error so
/// a wedged flash tool fails one check run rather than the whole daemon
/// loop. The child is killed when the deadline drops the wait future.
pub struct SystemRunner {
    deadline: Duration,
}

impl SystemRunner {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> CoreResult<ToolOutput> {
        let start = Instant::now();
        debug!(program, ?args, "running tool");

        let child = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(self.deadline, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    program,
                    deadline_secs = self.deadline.as_secs(),
                    "tool deadline elapsed"
                );
                return Ok(ToolOutput::timed_out(self.deadline));
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput {
            output: combined,
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
