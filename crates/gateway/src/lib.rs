//! Message-level connections for gateway-driven web applications
//!
//! A gateway (an ASGI-style server) terminates the network protocol and hands
//! the application one [`protocol::Scope`] per inbound connection together with
//! two primitives: one that receives the next [`protocol::Message`] and one
//! that sends a message back. This crate turns those primitives into typed,
//! lifecycle-checked connections.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::StatusCode;
//! use micro_gateway::connection::{Connection, HttpConnection};
//! use micro_gateway::protocol::{ConnectionError, Message, Scope};
//! use micro_gateway::response::ContentResponse;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ConnectionError> {
//!     let (client_tx, app_rx) = mpsc::unbounded_channel::<Message>();
//!     let (app_tx, mut client_rx) = mpsc::unbounded_channel::<Message>();
//!
//!     let mut connection = HttpConnection::new(Scope::http("POST", "/echo"), app_rx, app_tx)?;
//!     client_tx.send(Message::HttpRequest { body: Bytes::from("Hello"), more_body: false }).ok();
//!
//!     let body = connection.get_requests_body().await?;
//!     let text = String::from_utf8_lossy(&body).into_owned();
//!     connection.send_response(ContentResponse::plain_text(text).with_status(StatusCode::OK)).await?;
//!
//!     while let Ok(message) = client_rx.try_recv() {
//!         println!("{}", message.message_type());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: wire messages, scope, requests and errors
//! - [`transport`]: the receive/send primitives and their channel implementations
//! - [`connection`]: HTTP and WebSocket connection state machines
//! - [`response`]: responses and their rendering into messages
//!
//! # Lifecycles
//!
//! An HTTP connection sends exactly one response: one `http.response.start`
//! followed by `http.response.body` messages until one has `more_body` unset.
//!
//! A WebSocket connection tracks the client side (`websocket.connect`,
//! `websocket.disconnect`) and the application side (`websocket.accept`,
//! `websocket.send`, `websocket.close`) separately.
//!
//! Every violation is reported as a [`protocol::ConnectionError`] and nothing
//! is sent to the gateway in that case.

pub mod connection;
pub mod protocol;
pub mod response;
pub mod transport;

mod utils;
pub(crate) use utils::ensure;
