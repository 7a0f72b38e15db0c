use std::{
    future::{Future, ready},
    pin::Pin,
};

use serde::Serialize;
use serde_json::Value;

use super::{HandlerError, HandlerResult, Params};

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult<Value>> + Send + 'static>>;

/// A method bound with [`Dispatcher::bind`](crate::Dispatcher::bind).
///
/// Implemented for async closures `Fn(Params) -> impl Future<Output = HandlerResult<R>>`
/// where `R: Serialize`.
pub trait MethodHandler: Send + Sync + 'static {
    fn invoke(&self, params: Params) -> HandlerFuture;
}

impl<F, Fut, R> MethodHandler for F
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    fn invoke(&self, params: Params) -> HandlerFuture {
        let task = self(params);
        Box::pin(async move { to_result(task.await) })
    }
}

/// Adapter for synchronous handlers, see [`Dispatcher::bind_sync`](crate::Dispatcher::bind_sync).
pub struct SyncHandler<F>(pub F);

impl<F, R> MethodHandler for SyncHandler<F>
where
    F: Fn(Params) -> HandlerResult<R> + Send + Sync + 'static,
    R: Serialize,
{
    fn invoke(&self, params: Params) -> HandlerFuture {
        Box::pin(ready(to_result((self.0)(params))))
    }
}

fn to_result(result: HandlerResult<impl Serialize>) -> HandlerResult<Value> {
    serde_json::to_value(result?).map_err(HandlerError::from)
}
