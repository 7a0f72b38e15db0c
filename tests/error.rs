use std::{
    fmt::{self, Display},
    io,
};

use jsonpeer::{
    Error, ErrorCode, ErrorObject, HandlerError, Message, MessageError, MethodError,
};
use serde_json::json;

#[derive(Debug)]
struct DetailedError;

impl std::error::Error for DetailedError {}

impl Display for DetailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "something broke")
    }
}

#[test]
fn custom_error_is_internal() {
    let e = HandlerError::from(DetailedError);
    assert!(e.method_error().is_none());
    let eo = e.to_error_object();
    assert_eq!(eo.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(eo.message, "DetailedError: something broke");
    assert_eq!(eo.data, None);
}

#[test]
fn io_error_is_internal() {
    let e = HandlerError::from(io::Error::other("boom"));
    let eo = e.to_error_object();
    assert_eq!(eo.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(eo.message, "Error: boom");
}

#[test]
fn method_error_keeps_fields() {
    let e = HandlerError::from(MethodError::new(69, "custom").with_data(json!([1, 2])));
    let eo = e.to_error_object();
    assert_eq!(eo.code, ErrorCode(69));
    assert_eq!(eo.message, "custom");
    assert_eq!(eo.data, Some(json!([1, 2])));
}

#[test]
fn nested_method_error_is_forwarded() {
    let e = HandlerError::from(Error::Method(MethodError::new(7, "denied")));
    assert_eq!(e.method_error(), Some(&MethodError::new(7, "denied")));
}

#[test]
fn nested_timeout_is_internal() {
    let e = HandlerError::from(Error::Timeout(3));
    let eo = e.to_error_object();
    assert_eq!(eo.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(eo.message, "Error: request 3 timed out");
}

#[test]
fn invalid_params_carries_reason() {
    let e = MethodError::invalid_params("missing field `name`");
    assert_eq!(e.code, ErrorCode::INVALID_PARAMS);
    assert_eq!(e.message, "Invalid params");
    assert_eq!(e.data, Some(json!("missing field `name`")));
}

#[test]
fn error_object_into_method_error() {
    let eo = ErrorObject::new(ErrorCode(-32000), "server error");
    let e = MethodError::from(eo);
    assert_eq!(e.to_string(), "method error -32000: server error");
}

#[test]
fn message_error_codes() {
    let e = Message::parse("{").unwrap_err();
    assert!(matches!(e, MessageError::Parse(_)));
    assert_eq!(e.error_code(), ErrorCode::PARSE_ERROR);

    let e = Message::parse(r#"{"jsonrpc":"1.0","method":"x"}"#).unwrap_err();
    assert_eq!(e.error_code(), ErrorCode::INVALID_REQUEST);
    assert_eq!(e.to_error_object().message, "Invalid Request");

    let e = Message::parse("[]").unwrap_err();
    assert!(matches!(e, MessageError::InvalidMessage(_)));
}

#[test]
fn error_helpers() {
    assert!(Error::Timeout(0).is_timeout());
    assert!(!Error::Shutdown.is_timeout());
    assert_eq!(Error::Shutdown.method_error(), None);
}
