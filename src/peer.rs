use std::{
    future::Future,
    sync::{Arc, Weak},
    time::Duration,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{
    spawn,
    sync::{broadcast, mpsc::unbounded_channel},
};
use tracing::trace;

use super::{
    BoxTransport, Correlator, Diagnostic, Dispatcher, Downstream, Error, ErrorCode, ErrorObject,
    HandlerResult, Message, MethodHandler, Params, Request, Response, Result, Transport,
    diagnostic::Diagnostics,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct PeerOptions {
    /// How long `call` waits for a response.
    pub request_timeout: Duration,
    /// Buffered diagnostics per subscriber before the oldest are dropped.
    pub diagnostic_capacity: usize,
}
impl Default for PeerOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            diagnostic_capacity: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Client,
    Server,
    Peer,
}

struct RawPeer {
    role: Role,
    transport: BoxTransport,
    correlator: Correlator,
    dispatcher: Dispatcher,
    diagnostics: Diagnostics,
}

impl RawPeer {
    fn new(role: Role, transport: BoxTransport, options: &PeerOptions) -> Arc<Self> {
        let diagnostics = Diagnostics::new(options.diagnostic_capacity);
        let correlator = Correlator::new(
            transport.clone(),
            options.request_timeout,
            diagnostics.clone(),
        );
        let raw = Arc::new(Self {
            role,
            transport,
            correlator,
            dispatcher: Dispatcher::new(),
            diagnostics,
        });
        raw.connect();
        raw
    }

    fn connect(self: &Arc<Self>) {
        let (tx, mut rx) = unbounded_channel::<String>();
        self.transport.set_downstream(Downstream::new(tx));
        let this = Arc::downgrade(self);
        spawn(async move {
            while let Some(text) = rx.recv().await {
                let Some(this) = this.upgrade() else {
                    break;
                };
                this.on_message(&text);
            }
        });
    }

    fn on_message(self: &Arc<Self>, text: &str) {
        trace!(role = ?self.role, text, "received message");
        match (Message::parse(text), self.role) {
            (Ok(Message::Response(res)), Role::Client | Role::Peer) => {
                self.correlator.handle_response(res)
            }
            (Ok(Message::Request(req)), Role::Server | Role::Peer) => self.dispatch(req),
            (Ok(Message::Request(req)), Role::Client) => {
                self.diagnostics
                    .emit(Diagnostic::UnexpectedRequest { method: req.method });
            }
            (Ok(Message::Response(_)), Role::Server) => {
                self.reply(Response::error(
                    None,
                    ErrorObject::from_code(ErrorCode::INVALID_REQUEST),
                ));
            }
            (Err(e), Role::Server) => {
                self.reply(Response::error(None, e.to_error_object()));
                self.diagnostics.emit(Diagnostic::Malformed(e));
            }
            (Err(e), Role::Client | Role::Peer) => {
                self.diagnostics.emit(Diagnostic::Malformed(e));
            }
        }
    }

    fn dispatch(self: &Arc<Self>, req: Request) {
        let this = self.clone();
        spawn(async move {
            if let Some(res) = this.dispatcher.handle_request(req).await {
                this.send(res.into()).await;
            }
        });
    }

    fn reply(self: &Arc<Self>, res: Response) {
        let this = self.clone();
        spawn(async move { this.send(res.into()).await });
    }

    async fn send(&self, m: Message) {
        if let Err(e) = self.transport.send_upstream(m.serialize()).await {
            self.diagnostics.emit(Diagnostic::Transport(e));
        }
    }
}

/// An endpoint that both issues calls and answers them over one transport.
///
/// Inbound responses complete calls made through [`Peer::call`]. Inbound requests run
/// the methods bound with [`Peer::bind`]. Handlers that need to call back into the
/// remote side capture a [`PeerContext`].
#[derive(Clone)]
pub struct Peer(Arc<RawPeer>);

impl Peer {
    /// Wires `transport` to a new peer. Must be called inside a tokio runtime.
    pub fn new(transport: impl Transport, options: &PeerOptions) -> Self {
        Self(RawPeer::new(Role::Peer, transport.boxed(), options))
    }

    pub async fn call(&self, method: &str, params: impl Into<Params>) -> Result<Value> {
        self.0.correlator.call(method, params.into()).await
    }
    pub async fn request<T>(&self, method: &str, params: &impl Serialize) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.0.correlator.request(method, params).await
    }
    pub async fn notify(&self, method: &str, params: impl Into<Params>) -> Result<()> {
        self.0.correlator.notify(method, params.into()).await
    }

    pub fn bind<F, Fut, R>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.0.dispatcher.bind(name, f)
    }
    pub fn bind_sync<F, R>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Params) -> HandlerResult<R> + Send + Sync + 'static,
        R: Serialize,
    {
        self.0.dispatcher.bind_sync(name, f)
    }
    pub fn bind_handler(&self, name: impl Into<String>, handler: impl MethodHandler) {
        self.0.dispatcher.bind_handler(name, handler)
    }

    pub fn correlator(&self) -> &Correlator {
        &self.0.correlator
    }
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.0.dispatcher
    }
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.0.diagnostics.subscribe()
    }

    /// A handle that does not keep the peer alive, for use inside bound handlers.
    pub fn context(&self) -> PeerContext {
        PeerContext(Arc::downgrade(&self.0))
    }
}

/// Weak handle to a [`Peer`].
///
/// Calls fail with [`Error::Shutdown`] once every `Peer` clone has been dropped.
#[derive(Clone)]
pub struct PeerContext(Weak<RawPeer>);

impl PeerContext {
    fn upgrade(&self) -> Result<Arc<RawPeer>> {
        self.0.upgrade().ok_or(Error::Shutdown)
    }

    pub async fn call(&self, method: &str, params: impl Into<Params>) -> Result<Value> {
        let p = self.upgrade()?;
        p.correlator.call(method, params.into()).await
    }
    pub async fn request<T>(&self, method: &str, params: &impl Serialize) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let p = self.upgrade()?;
        p.correlator.request(method, params).await
    }
    pub async fn notify(&self, method: &str, params: impl Into<Params>) -> Result<()> {
        let p = self.upgrade()?;
        p.correlator.notify(method, params.into()).await
    }
}

/// Caller-only endpoint. Inbound requests are reported as diagnostics.
pub struct Client(Peer);

impl Client {
    pub fn new(transport: impl Transport, options: &PeerOptions) -> Self {
        Self(Peer(RawPeer::new(Role::Client, transport.boxed(), options)))
    }

    pub async fn call(&self, method: &str, params: impl Into<Params>) -> Result<Value> {
        self.0.call(method, params).await
    }
    pub async fn request<T>(&self, method: &str, params: &impl Serialize) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.0.request(method, params).await
    }
    pub async fn notify(&self, method: &str, params: impl Into<Params>) -> Result<()> {
        self.0.notify(method, params).await
    }
    pub fn correlator(&self) -> &Correlator {
        self.0.correlator()
    }
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.0.diagnostics()
    }
}

/// Callee-only endpoint.
///
/// Malformed input and stray responses are answered with a `null`-id error response:
/// `Parse error` for invalid JSON, `Invalid Request` for everything else.
pub struct Server(Peer);

impl Server {
    pub fn new(transport: impl Transport, options: &PeerOptions) -> Self {
        Self(Peer(RawPeer::new(Role::Server, transport.boxed(), options)))
    }

    pub fn bind<F, Fut, R>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.0.bind(name, f)
    }
    pub fn bind_sync<F, R>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Params) -> HandlerResult<R> + Send + Sync + 'static,
        R: Serialize,
    {
        self.0.bind_sync(name, f)
    }
    pub fn bind_handler(&self, name: impl Into<String>, handler: impl MethodHandler) {
        self.0.bind_handler(name, handler)
    }
    pub fn dispatcher(&self) -> &Dispatcher {
        self.0.dispatcher()
    }
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.0.diagnostics()
    }
}
