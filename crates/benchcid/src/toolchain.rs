//! Toolchain tool invocations.
//!
//! The daemon shells out for three things: building the per-commit
//! toolchain image, flashing a board from that image, and running the test
//! harness. This module only composes the argv for each; execution goes
//! through the [`benchci_core::CommandRunner`] capability so orchestration
//! stays testable without Docker or hardware.

use benchci_core::{Board, CommitId};

use crate::config::DaemonConfig;

/// Legacy third argument of the harness invocation. The settle pause moved
/// into the executor, but the argument position is still expected.
const HARNESS_LEGACY_DELAY: &str = "5";

#[derive(Debug, Clone)]
pub struct Toolchain {
    image_repo: String,
    dockerfile: String,
    build_context: String,
    flash_command: String,
    harness_bin: String,
}

impl Toolchain {
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            image_repo: config.image_repo.clone(),
            dockerfile: config.dockerfile.clone(),
            build_context: config.build_context.clone(),
            flash_command: config.flash_command.clone(),
            harness_bin: config.harness_bin.clone(),
        }
    }

    /// Image tag for a commit: `<repo>:<short-sha>`.
    pub fn image_tag(&self, commit: &CommitId) -> String {
        format!("{}:{}", self.image_repo, commit.short())
    }

    /// `docker build` argv for the toolchain image of one commit. The
    /// firmware download URL reaches the Dockerfile as a build argument.
    pub fn image_build_args(&self, commit: &CommitId, firmware_url: &str) -> Vec<String> {
        vec![
            "build".to_string(),
            "-t".to_string(),
            self.image_tag(commit),
            "-f".to_string(),
            self.dockerfile.clone(),
            "--build-arg".to_string(),
            format!("FIRMWARE_URL={firmware_url}"),
            self.build_context.clone(),
        ]
    }

    /// `docker run` argv that flashes `board` from `image`. The board's
    /// device node is mapped into the container and `/media` is shared for
    /// boards that mount as mass storage while flashing.
    pub fn flash_args(&self, image: &str, board: &Board) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            format!("--device={}", board.device_path()),
            "-v".to_string(),
            "/media:/media:shared".to_string(),
            "-v".to_string(),
            format!("{}:/src", self.build_context),
            "--rm".to_string(),
            image.to_string(),
        ];
        args.extend(self.flash_command.split_whitespace().map(str::to_string));
        args.push("-target".to_string());
        args.push(board.target.clone());
        args.push(format!("-port={}", board.device_path()));
        args.push(format!("/src/{}", board.target));
        args
    }

    /// Harness invocation for a board: program plus positional argv.
    pub fn harness_invocation(&self, board: &Board) -> (String, Vec<String>) {
        (
            self.harness_bin.clone(),
            vec![
                board.device_path(),
                board.baud.to_string(),
                HARNESS_LEGACY_DELAY.to_string(),
            ],
        )
    }
}
