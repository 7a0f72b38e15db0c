//! A transport-agnostic JSON-RPC 2.0 engine.
//!
//! - [`Message`] parses, validates and serializes wire messages.
//! - [`Correlator`] is the caller role: it allocates ids, tracks pending calls and
//!   applies the request timeout.
//! - [`Dispatcher`] is the callee role: a method registry and the mapping of handler
//!   outcomes to responses.
//! - [`Peer`] composes both over one [`Transport`], so a single connection can issue
//!   calls and answer them, including calls made from inside a handler.
//!   [`Client`] and [`Server`] are the single-role variants.
//!
//! Problems with inbound traffic that are not addressed to a caller are published as
//! [`Diagnostic`]s on a per-endpoint channel.

mod correlator;
mod diagnostic;
mod dispatcher;
mod error;
mod handler;
mod memory_transport;
mod message;
mod peer;
mod peer_builder;
mod stream_transport;
mod transport;
mod utils;

#[cfg(doctest)]
mod tests_readme;

pub use correlator::*;
pub use diagnostic::Diagnostic;
pub use dispatcher::*;
pub use error::*;
pub use handler::*;
pub use memory_transport::*;
pub use message::*;
pub use peer::*;
pub use stream_transport::*;
pub use transport::*;
