//! Daemon configuration.
//!
//! Everything is a CLI flag with an environment override, so deployments
//! can ship a unit file with flags or a plain env file. The only secrets
//! are the GitHub token (env only in practice) and nothing else.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use benchci_github::GithubConfig;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "benchcid", version)]
#[command(about = "Hardware CI daemon: validates compiler commits on attached boards")]
pub struct DaemonConfig {
    /// Listen address for the webhook listener
    #[arg(long, env = "BENCHCI_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Board inventory file
    #[arg(long, env = "BENCHCI_BOARDS_FILE", default_value = "boards.toml")]
    pub boards_file: PathBuf,

    /// GitHub REST base URL (override for GitHub Enterprise)
    #[arg(long, env = "BENCHCI_GITHUB_API_BASE", default_value = "https://api.github.com")]
    pub github_api_base: String,

    /// Repository owner the daemon reports checks for
    #[arg(long, env = "BENCHCI_OWNER")]
    pub owner: String,

    /// Repository name
    #[arg(long, env = "BENCHCI_REPO")]
    pub repo: String,

    /// API token; unset only works against unauthenticated mirrors
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Display name of the upstream workflow that publishes the firmware
    /// artifact
    #[arg(long, env = "BENCHCI_WORKFLOW", default_value = "Linux")]
    pub workflow: String,

    /// Display name of the job whose head SHA identifies the commit
    #[arg(long, env = "BENCHCI_JOB", default_value = "build-linux")]
    pub job: String,

    /// Seconds between poller passes over builds still awaiting CI
    #[arg(long, env = "BENCHCI_POLL_INTERVAL", default_value_t = 30)]
    pub poll_interval_secs: u64,

    /// Fixed firmware URL that bypasses artifact resolution entirely
    #[arg(long, env = "BENCHCI_PINNED_FIRMWARE_URL")]
    pub pinned_firmware_url: Option<String>,

    /// Repository part of the toolchain image tag
    #[arg(long, env = "BENCHCI_IMAGE_REPO", default_value = "benchci/toolchain")]
    pub image_repo: String,

    /// Dockerfile for the toolchain image
    #[arg(long, env = "BENCHCI_DOCKERFILE", default_value = "tools/Dockerfile")]
    pub dockerfile: String,

    /// Build context directory, also mounted into flash containers as /src
    #[arg(long, env = "BENCHCI_BUILD_CONTEXT", default_value = ".")]
    pub build_context: String,

    /// Command run inside the toolchain container to flash a board. The
    /// image entrypoint is the compiler under test; target, port, and
    /// source path are appended per board.
    #[arg(long, env = "BENCHCI_FLASH_COMMAND", default_value = "flash -size short")]
    pub flash_command: String,

    /// Test harness binary invoked per board after flashing
    #[arg(long, env = "BENCHCI_HARNESS_BIN", default_value = "benchci-harness")]
    pub harness_bin: String,

    /// Hard deadline per external tool invocation, in seconds. A wedged
    /// flash tool fails one check run instead of stalling the queue
    /// forever.
    #[arg(long, env = "BENCHCI_TOOL_DEADLINE", default_value_t = 900)]
    pub tool_deadline_secs: u64,

    /// How long completed builds stay visible in the registry, in seconds
    #[arg(long, env = "BENCHCI_COMPLETED_TTL", default_value_t = 3_600)]
    pub completed_ttl_secs: u64,

    /// How long a build may wait for upstream CI before it is abandoned,
    /// in seconds
    #[arg(long, env = "BENCHCI_ABANDONED_TTL", default_value_t = 86_400)]
    pub abandoned_ttl_secs: u64,

    /// Emit JSON-formatted log lines
    #[arg(long, env = "BENCHCI_LOG_JSON")]
    pub json: bool,
}

impl DaemonConfig {
    /// Provider configuration derived from the flags.
    pub fn github(&self) -> GithubConfig {
        let mut config =
            GithubConfig::new(&self.owner, &self.repo).with_api_base(&self.github_api_base);
        if let Some(token) = &self.github_token {
            config = config.with_token(token);
        }
        config
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn tool_deadline(&self) -> Duration {
        Duration::from_secs(self.tool_deadline_secs)
    }

    pub fn completed_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.completed_ttl_secs as i64)
    }

    pub fn abandoned_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.abandoned_ttl_secs as i64)
    }
}
