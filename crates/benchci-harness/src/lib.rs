//! Serial test harness for a single attached board.
//!
//! The daemon flashes a board, waits for it to settle, then invokes this
//! crate (through the `benchci-harness` binary) to drive the on-board test
//! suite over the board's serial link. The harness waits for the firmware's
//! ready prompt, sends the trigger byte, and collects the TAP transcript
//! until the plan is satisfied or the collection window closes.
//!
//! The session logic is generic over any `AsyncRead + AsyncWrite` stream so
//! it can run against an in-memory duplex pipe in tests and a real serial
//! device in production.

pub mod error;
pub mod reader;
pub mod serial;
pub mod session;

pub use error::{HarnessError, HarnessResult};
pub use reader::{spawn_line_reader, LineReader, ReaderEvent};
pub use serial::open_with_retry;
pub use session::{
    run_device_session, SessionConfig, SessionOutcome, SessionReport, SessionState, TestSession,
};
