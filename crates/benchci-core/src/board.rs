//! Board inventory.
//!
//! The attached fleet is declared in a TOML file read once at daemon start;
//! the set is read-only afterwards. Disabled entries stay in the file so a
//! board with failed hardware keeps its check-run slot (reported as skipped)
//! until it is repaired.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// One physically attached test board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Toolchain target name; also the check-run key.
    pub target: String,
    /// Human-readable name for logs and check-run text.
    pub display_name: String,
    /// Stable device name under `/dev` (udev alias for the USB path).
    pub device: String,
    /// Serial link speed for the test harness.
    pub baud: u32,
    /// Seconds to wait after flashing before the serial port is opened.
    /// Slow bootloaders need up to 15.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_settle_secs() -> u64 {
    2
}

fn default_enabled() -> bool {
    true
}

impl Board {
    /// Absolute device path for tool invocations.
    pub fn device_path(&self) -> String {
        format!("/dev/{}", self.device)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

/// The configured board fleet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardSet {
    boards: Vec<Board>,
}

impl BoardSet {
    /// Load the inventory from a TOML file with a `[[boards]]` table array.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(raw: &str) -> CoreResult<Self> {
        let set: BoardSet =
            toml::from_str(raw).map_err(|e| CoreError::Config(e.to_string()))?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for board in &self.boards {
            if !seen.insert(board.target.as_str()) {
                return Err(CoreError::Config(format!(
                    "duplicate board target: {}",
                    board.target
                )));
            }
            if board.baud == 0 {
                return Err(CoreError::Config(format!(
                    "board {} has zero baud",
                    board.target
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, target: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.target == target)
    }

    /// Boards that participate in new builds.
    pub fn enabled(&self) -> impl Iterator<Item = &Board> {
        self.boards.iter().filter(|b| b.enabled)
    }

    pub fn all(&self) -> &[Board] {
        &self.boards
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}
