//! Error types for the benchci domain.

use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised by the benchci domain and its tool capabilities.
///
/// Deliberately small. A failed tool invocation is not an error here; it is
/// an ordinary `ToolOutput` with `success = false`, and how far a failure
/// reaches is decided where it is reported: an image failure fails every
/// check run in the build, a flash or serial failure fails one board, and a
/// dropped provider call is logged and left to the poller and startup
/// reconciliation.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Board inventory or daemon configuration problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tool process could not be spawned or awaited.
    #[error("tool execution failed: {0}")]
    Io(#[from] std::io::Error),
}
