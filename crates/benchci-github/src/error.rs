//! Error types for provider interactions

use thiserror::Error;

/// Result type for provider operations
pub type GithubResult<T> = std::result::Result<T, GithubError>;

/// Errors from the GitHub REST surfaces.
#[derive(Error, Debug)]
pub enum GithubError {
    /// Transport-level failure (connect, TLS, body decode).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API responded {status}: {body}")]
    Status { status: u16, body: String },

    /// A lookup came back empty (no matching run, no artifact).
    #[error("not found: {0}")]
    NotFound(String),

    /// Webhook payload failed to deserialize.
    #[error("payload decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}
