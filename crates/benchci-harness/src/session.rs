//! The harness session state machine.
//!
//! A session walks one board through its test run:
//!
//! 1. `Connecting`: the serial device is opened (see [`crate::serial`]).
//! 2. `WaitingForPrompt`: wait for a line containing the ready prompt. A
//!    board that boots straight into its suite never prints it, so after a
//!    short bound the trigger is sent anyway.
//! 3. `Triggered`: the trigger byte has been written.
//! 4. `CollectingResults`: lines accumulate into a TAP transcript until the
//!    announced plan is satisfied or the collection window closes.
//! 5. `Done`: outcome decided.
//!
//! Collection stops on the plan, not on magic sentinel strings, so test
//! descriptions and board noise can never terminate a run early.

use std::time::Duration;

use benchci_tap::{Transcript, Verdict};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::error::HarnessResult;
use crate::reader::{spawn_line_reader, ReaderEvent};
use crate::serial::open_with_retry;

/// Where a session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    WaitingForPrompt,
    Triggered,
    CollectingResults,
    Done,
}

/// How a completed session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every result line passed or carried an exempting directive.
    Pass,
    /// At least one unexempted failure was observed.
    Fail,
    /// The stream went silent or closed before the plan was satisfied.
    TimedOut,
}

/// Session tuning knobs. The defaults match what boards in the rack expect.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Substring that marks the firmware's ready line.
    pub ready_prompt: String,
    /// Byte written to start the suite.
    pub trigger: u8,
    /// How long to wait for the ready prompt before triggering anyway.
    pub prompt_timeout: Duration,
    /// Bound on the whole collection phase, prompt to final result.
    pub collect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ready_prompt: "begin running tests".to_string(),
            trigger: b't',
            prompt_timeout: Duration::from_secs(5),
            collect_timeout: Duration::from_secs(60),
        }
    }
}

/// Everything a finished session produced.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub transcript: Transcript,
    /// Every line received, verbatim, in arrival order.
    pub raw: Vec<String>,
}

impl SessionReport {
    /// The transcript as received, newline-terminated when non-empty.
    pub fn raw_text(&self) -> String {
        if self.raw.is_empty() {
            String::new()
        } else {
            format!("{}\n", self.raw.join("\n"))
        }
    }
}

enum PromptWait {
    Ready,
    Silent,
    Closed,
}

/// Drives one test run over an already-open stream.
pub struct TestSession {
    config: SessionConfig,
    state: SessionState,
    transcript: Transcript,
    raw: Vec<String>,
}

impl TestSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Connecting,
            transcript: Transcript::new(),
            raw: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session to completion over `stream`.
    ///
    /// Returns `Err` only for link-level failures; a failing or silent board
    /// is reported through [`SessionOutcome`].
    pub async fn drive<S>(mut self, stream: S) -> HarnessResult<SessionReport>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut events = spawn_line_reader(read_half);
        self.transition(SessionState::WaitingForPrompt);

        let prompt_deadline = Instant::now() + self.config.prompt_timeout;
        let wait = loop {
            match timeout_at(prompt_deadline, events.recv()).await {
                Ok(Some(ReaderEvent::Line(line))) => {
                    let ready = line.contains(&self.config.ready_prompt);
                    self.record(line);
                    if ready {
                        break PromptWait::Ready;
                    }
                }
                Ok(Some(ReaderEvent::Closed)) | Ok(None) => break PromptWait::Closed,
                Ok(Some(ReaderEvent::Failed(err))) => return Err(err.into()),
                Err(_) => break PromptWait::Silent,
            }
        };

        match wait {
            PromptWait::Ready => debug!("ready prompt seen"),
            PromptWait::Silent => debug!(
                waited_secs = self.config.prompt_timeout.as_secs(),
                "no ready prompt; sending trigger anyway"
            ),
            PromptWait::Closed => {
                warn!("stream closed before the suite could be triggered");
                return Ok(self.finish(SessionOutcome::TimedOut));
            }
        }

        write_half.write_all(&[self.config.trigger]).await?;
        write_half.flush().await?;
        self.transition(SessionState::Triggered);

        // An auto-start board may have run its whole suite during the
        // prompt wait; those lines are already on record.
        if self.transcript.plan_satisfied() {
            let outcome = match self.transcript.verdict() {
                Verdict::Pass => SessionOutcome::Pass,
                Verdict::Fail => SessionOutcome::Fail,
            };
            return Ok(self.finish(outcome));
        }

        let collect_deadline = Instant::now() + self.config.collect_timeout;
        let outcome = loop {
            match timeout_at(collect_deadline, events.recv()).await {
                Ok(Some(ReaderEvent::Line(line))) => {
                    if self.state == SessionState::Triggered {
                        self.transition(SessionState::CollectingResults);
                    }
                    self.record(line);
                    if self.transcript.plan_satisfied() {
                        break match self.transcript.verdict() {
                            Verdict::Pass => SessionOutcome::Pass,
                            Verdict::Fail => SessionOutcome::Fail,
                        };
                    }
                }
                Ok(Some(ReaderEvent::Closed)) | Ok(None) => {
                    warn!("stream closed before the plan was satisfied");
                    break self.early_outcome();
                }
                Ok(Some(ReaderEvent::Failed(err))) => return Err(err.into()),
                Err(_) => {
                    warn!(
                        waited_secs = self.config.collect_timeout.as_secs(),
                        results = self.transcript.results_seen(),
                        "collection window closed"
                    );
                    break self.early_outcome();
                }
            }
        };

        Ok(self.finish(outcome))
    }

    fn record(&mut self, line: String) {
        self.transcript.push_raw(&line);
        self.raw.push(line);
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }

    /// Outcome for a session cut short. A failure already on record stands;
    /// otherwise the run counts as timed out, never as a pass.
    fn early_outcome(&self) -> SessionOutcome {
        match self.transcript.verdict() {
            Verdict::Fail => SessionOutcome::Fail,
            Verdict::Pass => SessionOutcome::TimedOut,
        }
    }

    fn finish(mut self, outcome: SessionOutcome) -> SessionReport {
        self.transition(SessionState::Done);
        info!(
            outcome = ?outcome,
            results = self.transcript.results_seen(),
            plan = self.transcript.plan(),
            "session finished"
        );
        SessionReport {
            outcome,
            transcript: self.transcript,
            raw: self.raw,
        }
    }
}

/// Opens the serial device and runs one full session against it.
pub async fn run_device_session(
    device: &str,
    baud: u32,
    config: SessionConfig,
) -> HarnessResult<SessionReport> {
    let stream = open_with_retry(device, baud).await?;
    TestSession::new(config).drive(stream).await
}
