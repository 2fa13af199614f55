//! Background draining of a child's diagnostic stream.
//!
//! [`spawn_drain`] moves the stream into a tokio task that reads it line by
//! line until end-of-input, forwarding every line to a [`DrainSink`] and
//! reporting decoded progress alongside. The task owns the stream, so the
//! pipe is closed when the task ends, whichever way it ends.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

use crate::progress::parse_progress;

/// Receiver for drained diagnostic output.
pub trait DrainSink: Send + 'static {
    /// Called for every line, in stream order.
    fn line(&mut self, line: &str);

    /// Called after [`line`](Self::line) when that line carried a decodable
    /// progress sample. `percent` is within `0.0..=100.0`.
    fn progress(&mut self, _percent: f64) {}
}

/// Summary of a finished drain.
#[derive(Debug)]
pub struct DrainReport<S> {
    /// The sink, handed back to the caller.
    pub sink: S,
    /// Number of lines forwarded to the sink.
    pub lines: u64,
    /// Number of lines that produced a progress update.
    pub progress_updates: u64,
    /// Last non-empty line seen, usually the encoder's final message.
    pub last_line: Option<String>,
    /// Read error that ended the drain early, if any.
    pub error: Option<std::io::Error>,
}

/// Handle to a running drain task.
#[derive(Debug)]
pub struct DrainHandle<S> {
    task: JoinHandle<DrainReport<S>>,
}

impl<S: Send + 'static> DrainHandle<S> {
    /// Wait for the drain to reach end-of-stream.
    pub async fn join(self) -> vf_core::Result<DrainReport<S>> {
        self.task
            .await
            .map_err(|e| vf_core::Error::tool("drain", format!("drain task failed: {e}")))
    }

    /// Wait at most `grace` for end-of-stream.
    ///
    /// Returns `Ok(None)` and aborts the task when the stream is still open
    /// after `grace`.
    pub async fn join_within(mut self, grace: Duration) -> vf_core::Result<Option<DrainReport<S>>> {
        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(Ok(report)) => Ok(Some(report)),
            Ok(Err(e)) => Err(vf_core::Error::tool("drain", format!("drain task failed: {e}"))),
            Err(_elapsed) => {
                self.task.abort();
                Ok(None)
            }
        }
    }
}

/// Spawn a task draining `reader` into `sink`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_drain<R, S>(reader: R, sink: S) -> DrainHandle<S>
where
    R: AsyncRead + Unpin + Send + 'static,
    S: DrainSink,
{
    DrainHandle {
        task: tokio::spawn(drain(reader, sink)),
    }
}

/// Read `reader` to end-of-stream, forwarding each line to `sink`.
///
/// Lines are split on `\n` with one trailing `\r` removed; a `\r` anywhere
/// else stays inside the line. An unterminated final line is still
/// forwarded. Invalid UTF-8 is replaced rather than treated as an error.
pub async fn drain<R, S>(reader: R, mut sink: S) -> DrainReport<S>
where
    R: AsyncRead + Unpin,
    S: DrainSink,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut lines = 0u64;
    let mut progress_updates = 0u64;
    let mut last_line = None;

    let error = loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break None,
            Ok(_) => {
                let mut end = buf.len();
                if buf[..end].ends_with(b"\n") {
                    end -= 1;
                }
                if buf[..end].ends_with(b"\r") {
                    end -= 1;
                }
                let line = String::from_utf8_lossy(&buf[..end]);

                sink.line(&line);
                lines += 1;

                if let Some(sample) = parse_progress(&line) {
                    sink.progress(sample.percent());
                    progress_updates += 1;
                }

                if !line.trim().is_empty() {
                    last_line = Some(line.into_owned());
                }
            }
            Err(e) => {
                tracing::debug!("Diagnostic stream read failed after {lines} lines: {e}");
                break Some(e);
            }
        }
    };

    tracing::trace!("Drain finished: {lines} lines, {progress_updates} progress updates");

    DrainReport {
        sink,
        lines,
        progress_updates,
        last_line,
        error,
    }
}
