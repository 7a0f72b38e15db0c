use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, RwLock},
};

use serde::Serialize;
use serde_json::Value;
use tokio::spawn;
use tracing::{debug, trace};

use super::{
    ErrorCode, HandlerError, HandlerResult, MethodError, MethodHandler, Params, Request,
    Response, handler::SyncHandler,
};

/// Callee side of a connection: a registry of methods and the logic that turns a
/// request into a response.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<String, Arc<dyn MethodHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an async closure to `name`, replacing any earlier binding.
    pub fn bind<F, Fut, R>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        self.bind_handler(name, f)
    }

    pub fn bind_handler(&self, name: impl Into<String>, handler: impl MethodHandler) {
        self.handlers
            .write()
            .unwrap()
            .insert(name.into(), Arc::new(handler));
    }

    pub fn bind_sync<F, R>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(Params) -> HandlerResult<R> + Send + Sync + 'static,
        R: Serialize,
    {
        self.bind_handler(name, SyncHandler(f))
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.handlers.read().unwrap().contains_key(name)
    }

    /// Runs the handler for `req` and builds the response to send back.
    ///
    /// Returns `None` for notifications. The handler runs on its own task, so a panic
    /// is reported as an internal error instead of unwinding into the caller.
    pub async fn handle_request(&self, req: Request) -> Option<Response> {
        let Request { id, method, params } = req;
        let handler = self.handlers.read().unwrap().get(&method).cloned();
        let result = match handler {
            Some(handler) => invoke(handler, params).await,
            None => Err(HandlerError::method(MethodError::from_code(
                ErrorCode::METHOD_NOT_FOUND,
            ))),
        };
        let Some(id) = id else {
            if let Err(e) = result {
                debug!(method, error = %e, "notification failed");
            }
            return None;
        };
        trace!(method, ok = result.is_ok(), "request handled");
        Some(match result {
            Ok(value) => Response::result(Some(id), value),
            Err(e) => Response::error(Some(id), e.to_error_object()),
        })
    }
}

async fn invoke(handler: Arc<dyn MethodHandler>, params: Params) -> HandlerResult<Value> {
    match spawn(async move { handler.invoke(params).await }).await {
        Ok(result) => result,
        Err(e) => Err(HandlerError::internal("Panic", e)),
    }
}
