//! Board executor: flash one board, run its test suite, judge the result.
//!
//! Tool exit codes are the only verdict source here; transcript parsing
//! happens inside the harness process. Failures stay scoped to the board:
//! whatever goes wrong, the caller gets an [`Outcome`] it can report, never
//! an error that would take down the rest of the fleet.

use benchci_core::{Board, CommandRunner};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::toolchain::Toolchain;

/// Result of one board run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub pass: bool,
    /// Report body for the check run: flash output, then test output.
    pub text: String,
}

impl Outcome {
    fn fail(text: impl Into<String>) -> Self {
        Self {
            pass: false,
            text: text.into(),
        }
    }

    /// Short content digest of the captured output, for correlating a
    /// check-run body with local logs without dumping it into the log
    /// stream.
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(self.text.as_bytes());
        hex::encode(&hash[..8])
    }
}

/// Flash `board` from `image`, wait out the bootloader reset, then run the
/// harness.
///
/// A failed flash reports the flash output alone and never touches the
/// serial port. After a successful flash the harness verdict decides, with
/// the flash and test output combined in the report either way.
pub async fn run_board(
    runner: &dyn CommandRunner,
    toolchain: &Toolchain,
    board: &Board,
    image: &str,
) -> Outcome {
    debug!(board = %board.display_name, image, "flashing");
    let flash = match runner
        .run("docker", &toolchain.flash_args(image, board), &[])
        .await
    {
        Ok(output) => output,
        Err(err) => return Outcome::fail(format!("flash tool could not be started: {err}")),
    };
    if !flash.success {
        return Outcome::fail(flash.output);
    }

    tokio::time::sleep(board.settle()).await;

    debug!(board = %board.display_name, "running on-board tests");
    let (program, args) = toolchain.harness_invocation(board);
    match runner.run(&program, &args, &[]).await {
        Ok(test) => Outcome {
            pass: test.success,
            text: combine(&flash.output, &test.output),
        },
        Err(err) => Outcome::fail(combine(
            &flash.output,
            &format!("test harness could not be started: {err}"),
        )),
    }
}

fn combine(flash: &str, test: &str) -> String {
    let flash = flash.trim_end_matches('\n');
    if flash.is_empty() {
        test.to_string()
    } else {
        format!("{flash}\n{test}")
    }
}
