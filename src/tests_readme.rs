// #![include_doc("../README.md", start)]
//! # jsonpeer
//!
//! A transport-agnostic JSON-RPC 2.0 engine for callers, callees and bidirectional peers.
//!
//! ## Overview
//!
//! `jsonpeer` implements the protocol half of JSON-RPC 2.0: message parsing and
//! validation, id-based correlation of calls with their responses, request timeouts,
//! method dispatch and error-code mapping. The connection itself is supplied through the
//! small `Transport` trait, so the same engine runs over WebSockets, pipes or anything
//! else that moves text messages.
//!
//! ## Features
//!
//! - Asynchronous, built on [`tokio`]
//! - One `Peer` can call and be called over the same connection, including re-entrant
//!   calls made from inside a handler
//! - Single-role `Client` and `Server` endpoints
//! - Handlers take positional or named parameters and deserialize them with [`serde`]
//! - `MethodError` maps straight onto the wire `error` object; any other error becomes
//!   `-32603 Internal error`
//! - Per-endpoint diagnostic channel for stray or malformed inbound traffic
//! - In-memory and newline-delimited stream transports included
//!
//! ## Usage
//!
//! ### Echo over an in-memory channel
//!
//! ```rust
//! use jsonpeer::{Params, Peer, PeerOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> jsonpeer::Result<()> {
//!     let (server, client) = Peer::new_channel(&PeerOptions::default());
//!     server.bind_sync("echo", |p: Params| {
//!         let (s,): (String,) = p.to()?;
//!         Ok(s)
//!     });
//!     let res = client.call("echo", vec![json!("World")]).await?;
//!     assert_eq!(res, json!("World"));
//!     Ok(())
//! }
//! ```
//!
//! ### Application errors
//!
//! ```rust
//! use jsonpeer::{ErrorCode, HandlerResult, MethodError, Params, Peer, PeerOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (server, client) = Peer::new_channel(&PeerOptions::default());
//!     server.bind_sync("fail", |_: Params| -> HandlerResult<()> {
//!         Err(MethodError::new(69, "custom").with_data(json!({"x": 1})).into())
//!     });
//!     let e = client.call("fail", ()).await.unwrap_err();
//!     let e = e.method_error().unwrap();
//!     assert_eq!(e.code, ErrorCode(69));
//!     assert_eq!(e.data, Some(json!({"x": 1})));
//! }
//! ```
//!
//! ## License
//!
//! This project is dual licensed under Apache-2.0/MIT.
//!
//! [`tokio`]: https://github.com/tokio-rs/tokio
//! [`serde`]: https://github.com/serde-rs/serde
// #![include_doc("../README.md", end)]
