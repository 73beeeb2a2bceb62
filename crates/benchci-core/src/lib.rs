//! benchci core library
//!
//! Domain model shared by the benchci daemon and its surfaces: the board
//! inventory, builds and their check-run references, the in-memory build
//! registry, and the capability interface used to run external tools.

pub mod board;
pub mod build;
pub mod error;
pub mod fakes;
pub mod obs;
pub mod registry;
pub mod runner;
pub mod telemetry;

pub use board::{Board, BoardSet};
pub use build::{Build, CheckRunHandle, CommitId};
pub use error::{CoreError, CoreResult};
pub use registry::BuildRegistry;
pub use runner::{CommandRunner, SystemRunner, ToolOutput};
