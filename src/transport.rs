use std::{future::Future, pin::Pin, sync::Arc};

use tokio::sync::mpsc::UnboundedSender;

use super::TransportError;

/// The connection a peer talks over.
///
/// Each call to [`Downstream::deliver`] must carry exactly one complete serialized message.
/// Ordering and reliability are whatever the transport provides.
pub trait Transport: Send + Sync + 'static {
    fn send_upstream(
        &self,
        text: String,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Registers where inbound messages go. A later call replaces the earlier one.
    fn set_downstream(&self, downstream: Downstream);

    fn boxed(self) -> BoxTransport
    where
        Self: Sized,
    {
        BoxTransport(Arc::new(self))
    }
}

/// Inbound half handed to [`Transport::set_downstream`].
#[derive(Clone, Debug)]
pub struct Downstream(UnboundedSender<String>);

impl Downstream {
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self(sender)
    }

    /// Hands one message to the endpoint. Returns `false` once the endpoint is gone.
    pub fn deliver(&self, text: impl Into<String>) -> bool {
        self.0.send(text.into()).is_ok()
    }
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[derive(Clone)]
pub struct BoxTransport(Arc<dyn DynTransport>);

impl Transport for BoxTransport {
    async fn send_upstream(&self, text: String) -> Result<(), TransportError> {
        self.0.dyn_send_upstream(text).await
    }
    fn set_downstream(&self, downstream: Downstream) {
        self.0.dyn_set_downstream(downstream)
    }
    fn boxed(self) -> BoxTransport {
        self
    }
}

trait DynTransport: Send + Sync {
    fn dyn_send_upstream<'a>(
        &'a self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;
    fn dyn_set_downstream(&self, downstream: Downstream);
}
impl<T: Transport> DynTransport for T {
    fn dyn_send_upstream<'a>(
        &'a self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>> {
        Box::pin(self.send_upstream(text))
    }
    fn dyn_set_downstream(&self, downstream: Downstream) {
        self.set_downstream(downstream)
    }
}
