use tokio::sync::broadcast;
use tracing::warn;

use super::{CorrelationError, MessageError, TransportError};

/// A non-fatal problem noticed while processing inbound traffic.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Diagnostic {
    #[error("message parse failed: {0}")]
    Malformed(MessageError),
    #[error(transparent)]
    Correlation(CorrelationError),
    #[error("received request `{method}` on a client endpoint")]
    UnexpectedRequest { method: String },
    #[error("failed to send message: {0}")]
    Transport(TransportError),
}

/// Per-endpoint diagnostic channel.
#[derive(Clone)]
pub(crate) struct Diagnostics(broadcast::Sender<Diagnostic>);

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self(broadcast::channel(capacity.max(1)).0)
    }
    pub fn emit(&self, d: Diagnostic) {
        warn!(diagnostic = %d, "jsonpeer diagnostic");
        let _ = self.0.send(d);
    }
    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.0.subscribe()
    }
}
