use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{
    sync::oneshot,
    time::timeout,
};
use tracing::{debug, trace};

use super::{
    BoxTransport, CorrelationError, Diagnostic, Error, Message, MethodError, Params, Request,
    RequestId, Response, Result, Transport, diagnostic::Diagnostics,
};

type Completion = oneshot::Sender<Result<Value, MethodError>>;

struct CorrelatorState {
    pending: HashMap<i64, Completion>,
    next_id: i64,
}
impl CorrelatorState {
    fn insert_pending(&mut self) -> Result<(i64, oneshot::Receiver<Result<Value, MethodError>>)> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(Error::RequestIdOverflow)?;
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        Ok((id, rx))
    }
}

/// Caller side of a connection: issues requests and matches responses to them by id.
pub struct Correlator {
    transport: BoxTransport,
    state: Mutex<CorrelatorState>,
    request_timeout: Duration,
    diagnostics: Diagnostics,
}

impl Correlator {
    pub(crate) fn new(
        transport: BoxTransport,
        request_timeout: Duration,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            transport,
            state: Mutex::new(CorrelatorState {
                pending: HashMap::new(),
                next_id: 0,
            }),
            request_timeout,
            diagnostics,
        }
    }

    fn lock(&self) -> MutexGuard<CorrelatorState> {
        self.state.lock().unwrap()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
    pub fn pending_requests(&self) -> usize {
        self.lock().pending.len()
    }

    /// Sends a request and waits for its response or the request timeout.
    pub async fn call(&self, method: &str, params: Params) -> Result<Value> {
        let (guard, rx) = PendingGuard::new(self)?;
        let m = Message::from(Request::new(
            Some(RequestId::Number(guard.id)),
            method,
            params,
        ));
        trace!(id = guard.id, method, "sending request");
        self.transport.send_upstream(m.serialize()).await?;
        match timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(_)) => Err(Error::Shutdown),
            Err(_) => {
                debug!(id = guard.id, method, "request timed out");
                Err(Error::Timeout(guard.id))
            }
        }
    }

    /// Typed form of [`call`](Self::call).
    pub async fn request<T>(&self, method: &str, params: &impl Serialize) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self.call(method, Params::from_serialize(params)?).await?;
        T::deserialize(value).map_err(|e| Error::Deserialize(e.into()))
    }

    pub async fn notify(&self, method: &str, params: Params) -> Result<()> {
        let m = Message::from(Request::notification(method, params));
        trace!(method, "sending notification");
        Ok(self.transport.send_upstream(m.serialize()).await?)
    }

    /// Completes the call waiting for `res`.
    ///
    /// Responses with a non-numeric id or an id with no outstanding call are reported as
    /// diagnostics and otherwise ignored.
    pub fn handle_response(&self, res: Response) {
        let Some(id) = res.id.as_ref().and_then(RequestId::as_i64) else {
            self.diagnostics.emit(Diagnostic::Correlation(
                CorrelationError::NonNumericId(res.id),
            ));
            return;
        };
        let completion = self.lock().pending.remove(&id);
        let Some(completion) = completion else {
            self.diagnostics
                .emit(Diagnostic::Correlation(CorrelationError::UnknownId(id)));
            return;
        };
        trace!(id, "received response");
        let _ = completion.send(res.into_result());
    }
}

/// Removes the pending entry when the call finishes, times out or is dropped.
struct PendingGuard<'a> {
    id: i64,
    correlator: &'a Correlator,
}
impl<'a> PendingGuard<'a> {
    fn new(
        correlator: &'a Correlator,
    ) -> Result<(Self, oneshot::Receiver<Result<Value, MethodError>>)> {
        let (id, rx) = correlator.lock().insert_pending()?;
        Ok((Self { id, correlator }, rx))
    }
}
impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.correlator.lock().pending.remove(&self.id);
    }
}
