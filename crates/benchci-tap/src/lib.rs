//! TAP (Test Anything Protocol) line codec for board test transcripts.
//!
//! Firmware under test reports over its serial link in TAP version 13: a
//! version header, a `1..N` plan, one result line per test, and optional
//! `#`-prefixed diagnostics. This crate covers both directions of that
//! protocol:
//!
//! - [`TapProducer`] emits well-formed TAP lines to any [`std::io::Write`]
//!   sink, tracking test ordinals and the TODO directive.
//! - [`TapLine`] parses a single received line; [`Transcript`] accumulates
//!   parsed lines, tracks completion against the announced plan, and decides
//!   the overall [`Verdict`].
//!
//! The verdict rule is fixed: a transcript fails if and only if at least one
//! result line is `not ok` and carries no `# TODO` or `# SKIP` exemption.

mod line;
mod producer;
mod transcript;

pub use line::{Directive, TapLine};
pub use producer::TapProducer;
pub use transcript::{Transcript, Verdict};
