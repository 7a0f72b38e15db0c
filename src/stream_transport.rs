use std::{io, pin::Pin, process::Stdio, sync::Mutex};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, stdin, stdout},
    process::{Child, Command},
    spawn,
};
use tracing::{trace, warn};

use super::{Downstream, Transport, TransportError};

type BoxReader = Pin<Box<dyn AsyncBufRead + Send>>;
type BoxWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Newline-delimited JSON over a byte stream.
///
/// The reader is consumed by the first [`Transport::set_downstream`] call, which spawns
/// a task forwarding each non-empty line.
pub struct StreamTransport {
    reader: Mutex<Option<BoxReader>>,
    writer: tokio::sync::Mutex<BoxWriter>,
    _child: Option<Mutex<Child>>,
}

impl StreamTransport {
    pub fn new(
        reader: impl AsyncBufRead + Send + 'static,
        writer: impl AsyncWrite + Send + 'static,
    ) -> Self {
        Self {
            reader: Mutex::new(Some(Box::pin(reader))),
            writer: tokio::sync::Mutex::new(Box::pin(writer)),
            _child: None,
        }
    }

    pub fn stdio() -> Self {
        Self::new(BufReader::new(stdin()), stdout())
    }

    /// Spawns `command` and talks to it over its stdin and stdout.
    ///
    /// The child process is killed when the transport is dropped.
    pub fn from_command(command: &mut Command) -> io::Result<Self> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(io::Error::other("child process has no piped stdio"));
        };
        let mut this = Self::new(BufReader::new(stdout), stdin);
        this._child = Some(Mutex::new(child));
        Ok(this)
    }
}

impl Transport for StreamTransport {
    async fn send_upstream(&self, text: String) -> Result<(), TransportError> {
        let mut w = self.writer.lock().await;
        w.write_all(text.as_bytes()).await?;
        w.write_all(b"\n").await?;
        w.flush().await?;
        Ok(())
    }

    fn set_downstream(&self, downstream: Downstream) {
        let Some(reader) = self.reader.lock().unwrap().take() else {
            warn!("stream transport downstream is already registered");
            return;
        };
        spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        trace!(%line, "stream transport received line");
                        if !downstream.deliver(line) {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stream transport read failed");
                        break;
                    }
                }
            }
        });
    }
}
