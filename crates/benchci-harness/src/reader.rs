//! Line-oriented reading off the serial stream.
//!
//! Boards write CRLF-terminated output in bursts. A dedicated task owns the
//! read half and forwards complete lines over a channel, which lets the
//! session loop race line arrival against its timers without holding the
//! stream across await points.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What the reader task observed on the stream.
#[derive(Debug)]
pub enum ReaderEvent {
    /// A complete line, with the trailing newline (and CR) stripped.
    Line(String),
    /// The peer closed the stream.
    Closed,
    /// A hardware-level read failure; the session cannot continue.
    Failed(std::io::Error),
}

/// Receiving side of a line-reader task.
///
/// Dropping this aborts the task, which releases the read half it owns —
/// the peer then sees EOF instead of a stream held open by a task parked
/// in a read.
pub struct LineReader {
    events: mpsc::Receiver<ReaderEvent>,
    task: JoinHandle<()>,
}

impl LineReader {
    /// Next event off the stream; `None` once the task has exited and the
    /// channel drained.
    pub async fn recv(&mut self) -> Option<ReaderEvent> {
        self.events.recv().await
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that reads lines until EOF or error.
pub fn spawn_line_reader<R>(read_half: R) -> LineReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(256);
    let task = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(ReaderEvent::Line(line)).await.is_err() {
                        // Session is gone; stop reading.
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(ReaderEvent::Closed).await;
                    break;
                }
                Err(err) => {
                    let _ = tx.send(ReaderEvent::Failed(err)).await;
                    break;
                }
            }
        }
    });
    LineReader { events: rx, task }
}
