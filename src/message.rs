use std::{fmt, str::FromStr};

use derive_ex::derive_ex;
use ordered_float::OrderedFloat;
use parse_display::Display;
use serde::{
    Deserialize, Serialize, Serializer,
    de::DeserializeOwned,
    ser::SerializeMap,
};
use serde_json::{Map, Value};

use super::{ErrorCode, MessageError, MethodError};


pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize, Deserialize, Clone, Display)]
#[derive_ex(Eq, PartialEq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    #[display("{0}")]
    Number(i64),
    #[display("{0}")]
    Float(#[eq(key = OrderedFloat($))] f64),
    #[display("{0}")]
    String(String),
}
const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

impl RequestId {
    /// The id as an integer, if it is numeric and integral.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            RequestId::Number(n) => Some(n),
            RequestId::Float(f) => {
                if f.fract() == 0.0 && (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&f) {
                    Some(f as i64)
                } else {
                    None
                }
            }
            RequestId::String(_) => None,
        }
    }

    fn from_value(value: Option<Value>) -> Option<Option<Self>> {
        match value {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(RequestId::String(s))),
            Some(Value::Number(n)) => {
                if let Some(n) = n.as_i64() {
                    Some(Some(RequestId::Number(n)))
                } else {
                    n.as_f64().map(|f| Some(RequestId::Float(f)))
                }
            }
            Some(_) => None,
        }
    }
}
impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}
impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}
impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

/// Parameters of a request.
///
/// Positional parameters deserialize into tuples or sequences, named parameters into
/// structs or maps.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    pub fn is_none(&self) -> bool {
        matches!(self, Params::None)
    }
    pub fn to_value(&self) -> Value {
        match self {
            Params::None => Value::Null,
            Params::Positional(values) => Value::Array(values.clone()),
            Params::Named(map) => Value::Object(map.clone()),
        }
    }

    /// Deserialize the parameters, reporting a mismatch as `Invalid params`.
    pub fn to<T>(&self) -> Result<T, MethodError>
    where
        T: DeserializeOwned,
    {
        T::deserialize(self.to_value()).map_err(MethodError::invalid_params)
    }

    /// Serialize `value` into parameters. It must produce an array, an object or null.
    pub fn from_serialize(value: &impl Serialize) -> crate::Result<Self> {
        match serde_json::to_value(value) {
            Ok(value) => Params::try_from(value).map_err(|_| crate::Error::InvalidParams),
            Err(e) => Err(crate::Error::Serialize(e.into())),
        }
    }
}
impl TryFrom<Value> for Params {
    type Error = Value;
    fn try_from(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(Params::None),
            Value::Array(values) => Ok(Params::Positional(values)),
            Value::Object(map) => Ok(Params::Named(map)),
            value => Err(value),
        }
    }
}
impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}
impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}
impl From<()> for Params {
    fn from(_: ()) -> Self {
        Params::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
impl ErrorObject {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Params,
}
impl Request {
    pub fn new(id: Option<RequestId>, method: impl Into<String>, params: Params) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
    pub fn notification(method: impl Into<String>, params: Params) -> Self {
        Self::new(None, method, params)
    }
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Result(Value),
    Error(ErrorObject),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: Option<RequestId>,
    pub payload: ResponsePayload,
}
impl Response {
    pub fn result(id: Option<RequestId>, result: Value) -> Self {
        Self {
            id,
            payload: ResponsePayload::Result(result),
        }
    }
    pub fn error(id: Option<RequestId>, error: ErrorObject) -> Self {
        Self {
            id,
            payload: ResponsePayload::Error(error),
        }
    }
    pub fn into_result(self) -> Result<Value, MethodError> {
        match self.payload {
            ResponsePayload::Result(value) => Ok(value),
            ResponsePayload::Error(e) => Err(e.into()),
        }
    }
}

/// A JSON-RPC 2.0 message.
///
/// [`Message::parse`] classifies a message by which members are present: `method`
/// makes a request, then `result` a successful response, then `error` an error
/// response. Falsy values such as `0`, `false` or `""` count as present.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Message {
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        let Value::Object(mut m) = serde_json::from_str::<Value>(text)? else {
            return Err(MessageError::InvalidMessage("message is not an object"));
        };
        match m.get("jsonrpc") {
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            v => return Err(MessageError::Version(v.cloned().unwrap_or(Value::Null))),
        }
        if let Some(method) = m.remove("method") {
            let Value::String(method) = method else {
                return Err(MessageError::InvalidRequest("method is not a string"));
            };
            let id = RequestId::from_value(m.remove("id")).ok_or(
                MessageError::InvalidRequest("id must be a string, a number or null"),
            )?;
            let params = Params::try_from(m.remove("params").unwrap_or(Value::Null))
                .map_err(|_| MessageError::InvalidRequest("params must be an array or an object"))?;
            return Ok(Message::Request(Request { id, method, params }));
        }
        if let Some(result) = m.remove("result") {
            if !m.contains_key("id") {
                return Err(MessageError::InvalidResponse("id not found"));
            }
            let id = parse_response_id(m.remove("id"))?;
            return Ok(Message::Response(Response::result(id, result)));
        }
        if let Some(error) = m.remove("error") {
            let Value::Object(mut error) = error else {
                return Err(MessageError::InvalidResponse("error is not an object"));
            };
            let code = match error.get("code") {
                Some(Value::Number(n)) => n.as_i64().ok_or(MessageError::InvalidResponse(
                    "error code is not an integer",
                ))?,
                _ => return Err(MessageError::InvalidResponse("error code is not a number")),
            };
            let Some(Value::String(message)) = error.remove("message") else {
                return Err(MessageError::InvalidResponse(
                    "error message is not a string",
                ));
            };
            let error = ErrorObject {
                code: ErrorCode(code),
                message,
                data: error.remove("data").filter(|data| !data.is_null()),
            };
            let id = parse_response_id(m.remove("id"))?;
            return Ok(Message::Response(Response::error(id, error)));
        }
        Err(MessageError::InvalidMessage("unknown message type"))
    }

    pub fn serialize(&self) -> String {
        self.to_string()
    }
}
fn parse_response_id(value: Option<Value>) -> Result<Option<RequestId>, MessageError> {
    RequestId::from_value(value).ok_or(MessageError::InvalidResponse(
        "id must be a string, a number or null",
    ))
}

impl FromStr for Message {
    type Err = MessageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(None)?;
        m.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
        match self {
            Message::Request(r) => {
                if let Some(id) = &r.id {
                    m.serialize_entry("id", id)?;
                }
                m.serialize_entry("method", &r.method)?;
                if !r.params.is_none() {
                    m.serialize_entry("params", &r.params)?;
                }
            }
            Message::Response(r) => {
                m.serialize_entry("id", &r.id)?;
                match &r.payload {
                    ResponsePayload::Result(value) => m.serialize_entry("result", value)?,
                    ResponsePayload::Error(error) => m.serialize_entry("error", error)?,
                }
            }
        }
        m.end()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Message::Request(r)
    }
}
impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Message::Response(r)
    }
}
