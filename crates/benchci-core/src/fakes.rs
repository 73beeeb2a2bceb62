//! In-memory fakes for core capabilities (testing only)
//!
//! `ScriptedRunner` satisfies the [`CommandRunner`] contract without
//! touching processes or hardware.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::runner::{CommandRunner, ToolOutput};

/// One recorded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl RecordedCall {
    /// The invocation rendered as a single command line, for assertions.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Scripted command runner: replays queued responses in order and records
/// every invocation. When the script runs dry it answers with an empty
/// success, so tests only script the invocations they care about.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<Result<ToolOutput, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful invocation with the given combined output.
    pub fn push_success(&self, output: &str) {
        self.push(ToolOutput {
            output: output.to_string(),
            exit_code: 0,
            success: true,
            duration_ms: 1,
        });
    }

    /// Queue a failed invocation with the given combined output.
    pub fn push_failure(&self, output: &str) {
        self.push(ToolOutput {
            output: output.to_string(),
            exit_code: 1,
            success: false,
            duration_ms: 1,
        });
    }

    pub fn push(&self, output: ToolOutput) {
        self.script.lock().unwrap().push_back(Ok(output));
    }

    /// Queue a spawn error (tool missing), as opposed to a tool failure.
    pub fn push_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> CoreResult<ToolOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            env: env.to_vec(),
        });
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(CoreError::Io(std::io::Error::other(message))),
            None => Ok(ToolOutput {
                output: String::new(),
                exit_code: 0,
                success: true,
                duration_ms: 0,
            }),
        }
    }
}
