//! Captures child output streams into the log.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Which pipe a capture task reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum OutputStream {
    Stdout,
    Stderr,
}

/// Spawns a task that logs each line of `reader` until the pipe closes.
///
/// Lines are decoded lossily so a stray invalid byte never stops capture.
pub(super) fn capture_lines<R>(reader: R, stream: OutputStream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => log_line(stream, &String::from_utf8_lossy(&line)),
                Err(err) => {
                    tracing::debug!(?stream, error = %err, "output capture stopped");
                    break;
                }
            }
        }
    })
}

fn log_line(stream: OutputStream, raw: &str) {
    let text = raw.trim_end();
    if text.is_empty() {
        return;
    }
    match stream {
        OutputStream::Stdout => tracing::info!(target: "odin::backend", "{text}"),
        OutputStream::Stderr => tracing::warn!(target: "odin::backend::stderr", "{text}"),
    }
}
