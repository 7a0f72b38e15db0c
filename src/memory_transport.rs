use std::sync::{Arc, Mutex};

use super::{Downstream, Transport, TransportError};

type Slot = Arc<Mutex<Option<Downstream>>>;

/// One end of an in-process connection created by [`MemoryTransport::pair`].
///
/// Text sent on one end is delivered to whatever is registered on the other end.
pub struct MemoryTransport {
    local: Slot,
    remote: Slot,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let a = Slot::default();
        let b = Slot::default();
        (
            MemoryTransport {
                local: a.clone(),
                remote: b.clone(),
            },
            MemoryTransport {
                local: b,
                remote: a,
            },
        )
    }
}

impl Transport for MemoryTransport {
    async fn send_upstream(&self, text: String) -> Result<(), TransportError> {
        let Some(remote) = self.remote.lock().unwrap().clone() else {
            return Err(TransportError::NotConnected);
        };
        if remote.deliver(text) {
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }
    fn set_downstream(&self, downstream: Downstream) {
        *self.local.lock().unwrap() = Some(downstream);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test]
    async fn delivers_to_other_end() {
        let (a, b) = MemoryTransport::pair();
        let (tx, mut rx) = unbounded_channel();
        b.set_downstream(Downstream::new(tx));
        a.send_upstream("hello".to_string()).await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn not_connected_without_downstream() {
        let (a, _b) = MemoryTransport::pair();
        let e = a.send_upstream("x".to_string()).await.unwrap_err();
        assert!(matches!(e, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn closed_after_receiver_dropped() {
        let (a, b) = MemoryTransport::pair();
        let (tx, rx) = unbounded_channel();
        b.set_downstream(Downstream::new(tx));
        drop(rx);
        let e = a.send_upstream("x".to_string()).await.unwrap_err();
        assert!(matches!(e, TransportError::Closed));
    }
}
