//! Error types for the serial harness.

use thiserror::Error;

/// Errors that abort a harness session.
///
/// A board that fails its tests is not an error; that is a normal session
/// outcome. These variants cover the cases where the session could not be
/// run at all: the device would not open, or the link broke underneath us.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("failed to open {device} after {attempts} attempts: {source}")]
    Connect {
        device: String,
        attempts: u32,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("serial link failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
