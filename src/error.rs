use std::{any::type_name, fmt, io, sync::Arc};

use parse_display::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ErrorObject, RequestId, utils::downcast};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
#[display("{0}")]
pub struct ErrorCode(pub i64);

impl ErrorCode {
    pub const PARSE_ERROR: Self = Self(-32700);
    pub const INVALID_REQUEST: Self = Self(-32600);
    pub const METHOD_NOT_FOUND: Self = Self(-32601);
    pub const INVALID_PARAMS: Self = Self(-32602);
    pub const INTERNAL_ERROR: Self = Self(-32603);

    /// Standard message for the predefined codes, empty for application codes.
    pub fn message(self) -> &'static str {
        match self {
            Self::PARSE_ERROR => "Parse error",
            Self::INVALID_REQUEST => "Invalid Request",
            Self::METHOD_NOT_FOUND => "Method not found",
            Self::INVALID_PARAMS => "Invalid params",
            Self::INTERNAL_ERROR => "Internal error",
            _ => "",
        }
    }
}
impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        Self(code)
    }
}

/// Failure to turn text into a [`Message`](crate::Message).
#[derive(Debug, Clone, thiserror::Error)]
pub enum MessageError {
    #[error("JSON parse error: {0}")]
    Parse(Arc<serde_json::Error>),
    #[error("invalid message: wrong json rpc version {0}")]
    Version(Value),
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("invalid response: {0}")]
    InvalidResponse(&'static str),
    #[error("invalid message: {0}")]
    InvalidMessage(&'static str),
}
impl MessageError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::PARSE_ERROR,
            _ => ErrorCode::INVALID_REQUEST,
        }
    }
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject::from_code(self.error_code())
    }
}
impl From<serde_json::Error> for MessageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(Arc::new(e))
    }
}

/// An application error raised by a method handler.
///
/// Maps one to one onto the `error` member of a response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("method error {code}: {message}")]
pub struct MethodError {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<Value>,
}
impl MethodError {
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.message())
    }
    pub fn invalid_params(e: impl fmt::Display) -> Self {
        Self::from_code(ErrorCode::INVALID_PARAMS).with_data(Value::String(e.to_string()))
    }
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code,
            message: self.message.clone(),
            data: self.data.clone(),
        }
    }
}
impl From<ErrorObject> for MethodError {
    fn from(e: ErrorObject) -> Self {
        Self {
            code: e.code,
            message: e.message,
            data: e.data,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    NotConnected,
    #[error("transport is closed")]
    Closed,
    #[error("transport I/O error: {0}")]
    Io(Arc<io::Error>),
}
impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

/// A response that could not be matched to an outstanding call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CorrelationError {
    #[error("response id is not a number: {}", display_id(.0))]
    NonNumericId(Option<RequestId>),
    #[error("request with id {0} not found")]
    UnknownId(i64),
}
fn display_id(id: &Option<RequestId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "null".to_string(),
    }
}

/// Error returned to the caller of `call`, `request` and `notify`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Method(#[from] MethodError),
    #[error("request {0} timed out")]
    Timeout(i64),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to serialize params: {0}")]
    Serialize(Arc<serde_json::Error>),
    #[error("failed to deserialize result: {0}")]
    Deserialize(Arc<serde_json::Error>),
    #[error("params must serialize to an array, an object or null")]
    InvalidParams,
    #[error("request id overflow")]
    RequestIdOverflow,
    #[error("peer is shut down")]
    Shutdown,
}
impl Error {
    pub fn method_error(&self) -> Option<&MethodError> {
        match self {
            Self::Method(e) => Some(e),
            _ => None,
        }
    }
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by a method handler.
///
/// Any [`std::error::Error`] converts into it with `?`. A [`MethodError`], or an
/// [`Error::Method`] coming back from a nested call, keeps its code, message and
/// data. Every other error is reported as an internal error whose message is
/// `"<type name>: <error text>"`.
pub struct HandlerError(HandlerErrorRepr);

enum HandlerErrorRepr {
    Method(MethodError),
    Internal { kind: String, message: String },
}

impl HandlerError {
    pub fn method(e: MethodError) -> Self {
        Self(HandlerErrorRepr::Method(e))
    }
    pub fn internal(kind: impl Into<String>, message: impl fmt::Display) -> Self {
        Self(HandlerErrorRepr::Internal {
            kind: kind.into(),
            message: message.to_string(),
        })
    }
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::internal("Error", message)
    }
    pub fn method_error(&self) -> Option<&MethodError> {
        match &self.0 {
            HandlerErrorRepr::Method(e) => Some(e),
            HandlerErrorRepr::Internal { .. } => None,
        }
    }
    pub fn to_error_object(&self) -> ErrorObject {
        match &self.0 {
            HandlerErrorRepr::Method(e) => e.to_error_object(),
            HandlerErrorRepr::Internal { kind, message } => {
                ErrorObject::new(ErrorCode::INTERNAL_ERROR, format!("{kind}: {message}"))
            }
        }
    }
}
impl<E> From<E> for HandlerError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(e: E) -> Self {
        let e = match downcast::<MethodError, E>(e) {
            Ok(e) => return Self::method(e),
            Err(e) => e,
        };
        match downcast::<Error, E>(e) {
            Ok(Error::Method(e)) => Self::method(e),
            Ok(e) => Self::internal(short_type_name::<Error>(), e),
            Err(e) => Self::internal(short_type_name::<E>(), e),
        }
    }
}
impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            HandlerErrorRepr::Method(e) => fmt::Debug::fmt(e, f),
            HandlerErrorRepr::Internal { kind, message } => f
                .debug_struct("Internal")
                .field("kind", kind)
                .field("message", message)
                .finish(),
        }
    }
}
impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            HandlerErrorRepr::Method(e) => write!(f, "{e}"),
            HandlerErrorRepr::Internal { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

fn short_type_name<T>() -> &'static str {
    let name = type_name::<T>();
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}
