//! Core protocol abstractions of the gateway interface.
//!
//! This module provides the values exchanged between a gateway and the
//! application: the wire [`Message`]s, the connection [`Scope`], the
//! [`Request`] handed to endpoints and the error taxonomy.
//!
//! # Components
//!
//! - **Messages** ([`message`]): the closed set of wire messages
//!   - [`Protocol`]: `http` or `websocket`
//!   - [`Message`]: one inbound or outbound message, keyed by its type
//!   - [`Headers`]: ordered header byte-pairs
//!
//! - **Scope** ([`scope`]): connection description
//!   - [`Scope`]: protocol, path, method, headers and URL parts
//!   - [`Url`]: borrowed URL components
//!   - [`PathParams`]: parameters captured from a path pattern
//!
//! - **Requests** ([`request`]): received messages with their type stripped
//!
//! - **Errors** ([`error`]):
//!   - [`ConnectionError`]: protocol, type and state violations
//!   - [`TransportError`]: failures of the receive/send primitives

mod message;
pub use message::Headers;
pub use message::Message;
pub use message::Protocol;

mod scope;
pub use scope::ClientAddr;
pub use scope::PathParams;
pub use scope::Scope;
pub use scope::ServerAddr;
pub use scope::Url;

mod request;
pub use request::Request;
pub use request::RequestData;

mod error;
pub use error::ConnectionError;
pub use error::TransportError;
