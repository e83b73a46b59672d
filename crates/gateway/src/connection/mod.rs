//! Connections between the gateway and the application.
//!
//! A connection adapts the raw receive/send primitives of one [`Scope`] into
//! typed [`Request`]s and [`Response`]s, and enforces the lifecycle of its
//! protocol:
//!
//! - [`HttpConnection`]: `open` → `closing` (response started) → `closed` (final body sent)
//! - [`WebSocketConnection`]: `connecting` → `connected` → `disconnected`, tracked for
//!   the client and the application side independently
//!
//! [`make_connection`] picks the connection type from the scope `type`.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ClientAddr, ConnectionError, Message, PathParams, Protocol, Request, Scope, Url};
use crate::response::Response;
use crate::transport::{MessageReceiver, MessageSender};
use crate::utils::latin1_decode;

mod http_connection;
mod websocket_connection;

pub use http_connection::HttpConnection;
pub use http_connection::HttpState;
pub use websocket_connection::WebSocketConnection;
pub use websocket_connection::WebSocketState;

/// The state shared by every connection: its scope and its two primitives.
pub struct ConnectionCore {
    protocol: Protocol,
    scope: Scope,
    receiver: Box<dyn MessageReceiver>,
    sender: Box<dyn MessageSender>,
    path_params: PathParams,
}

impl ConnectionCore {
    /// Fails with [`ConnectionError::ConnectionType`] when the scope declares another protocol.
    pub fn new(
        protocol: Protocol,
        scope: Scope,
        receiver: Box<dyn MessageReceiver>,
        sender: Box<dyn MessageSender>,
    ) -> Result<Self, ConnectionError> {
        ensure!(scope.scope_type() == protocol.as_str(), ConnectionError::connection_type(protocol, scope.scope_type()));

        Ok(Self { protocol, scope, receiver, sender, path_params: PathParams::empty() })
    }

    #[inline]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[inline]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Decodes the scope headers as Latin-1 text.
    ///
    /// A repeated header name keeps its last value, no headers yield an empty map.
    pub fn headers(&self) -> HashMap<String, String> {
        self.scope
            .get_headers()
            .unwrap_or_default()
            .iter()
            .map(|(name, value)| (latin1_decode(name), latin1_decode(value)))
            .collect()
    }

    #[inline]
    pub fn url(&self) -> Url<'_> {
        self.scope.url()
    }

    /// Returns the remote peer, absent when the gateway did not report it.
    #[inline]
    pub fn client(&self) -> Option<&ClientAddr> {
        self.scope.get_client()
    }

    /// Decodes the query string into its name/value pairs, in order.
    pub fn query_params(&self) -> Result<Vec<(String, String)>, ConnectionError> {
        self.query()
    }

    /// Deserializes the query string, an absent query string is treated as empty.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ConnectionError> {
        let query_string = self.scope.get_query_string().unwrap_or_default();
        serde_urlencoded::from_bytes(query_string).map_err(ConnectionError::invalid_data)
    }

    /// Parses every `cookie` header into name/value pairs.
    ///
    /// Cookies split over several headers are merged, a repeated name keeps
    /// its last value.
    pub fn cookies(&self) -> HashMap<String, String> {
        self.scope
            .get_headers()
            .unwrap_or_default()
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(b"cookie"))
            .flat_map(|(_, value)| {
                latin1_decode(value)
                    .split(';')
                    .filter_map(|pair| pair.split_once('='))
                    .map(|(name, value)| (name.trim().to_owned(), value.trim().trim_matches('"').to_owned()))
                    .filter(|(name, _)| !name.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[inline]
    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn set_path_params(&mut self, path_params: PathParams) {
        self.path_params = path_params;
    }

    /// Receives one message, rejecting any message of another protocol.
    pub async fn receive(&mut self) -> Result<Message, ConnectionError> {
        let message = self.receiver.receive().await?;
        trace!(message_type = message.message_type(), "received message");

        ensure!(message.protocol() == self.protocol, ConnectionError::protocol_mismatch(self.protocol, message.protocol()));
        Ok(message)
    }

    /// Sends one message, rejecting any message of another protocol.
    pub async fn send(&mut self, message: Message) -> Result<(), ConnectionError> {
        ensure!(message.protocol() == self.protocol, ConnectionError::protocol_mismatch(self.protocol, message.protocol()));

        trace!(message_type = message.message_type(), "sending message");
        self.sender.send(message).await?;
        Ok(())
    }
}

impl fmt::Debug for ConnectionCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCore")
            .field("protocol", &self.protocol)
            .field("scope", &self.scope)
            .field("path_params", &self.path_params)
            .finish_non_exhaustive()
    }
}

/// The protocol specific behaviour of a connection.
#[async_trait]
pub trait Connection: Send {
    /// The protocol this connection type handles, a scope must declare it.
    const PROTOCOL: Protocol;

    fn core(&self) -> &ConnectionCore;

    fn core_mut(&mut self) -> &mut ConnectionCore;

    fn protocol(&self) -> Protocol {
        Self::PROTOCOL
    }

    fn scope(&self) -> &Scope {
        self.core().scope()
    }

    fn headers(&self) -> HashMap<String, String> {
        self.core().headers()
    }

    fn url(&self) -> Url<'_> {
        self.core().url()
    }

    async fn receive(&mut self) -> Result<Message, ConnectionError> {
        self.core_mut().receive().await
    }

    async fn send(&mut self, message: Message) -> Result<(), ConnectionError> {
        self.core_mut().send(message).await
    }

    /// Receives the next message from the client as a [`Request`].
    async fn receive_request(&mut self) -> Result<Request, ConnectionError>;

    /// Sends one outbound message, applying the state transition it implies.
    async fn send_message(&mut self, message: Message) -> Result<(), ConnectionError>;

    /// Renders the response and sends its messages in order.
    ///
    /// Stops at the first message that fails to send.
    async fn send_response<R: Response + 'static>(&mut self, response: R) -> Result<(), ConnectionError> {
        let mut messages = response.render_messages();
        while let Some(message) = messages.next().await {
            self.send_message(message).await?;
        }
        Ok(())
    }
}

/// A connection of any supported protocol.
#[derive(Debug)]
pub enum AnyConnection {
    Http(HttpConnection),
    WebSocket(WebSocketConnection),
}

impl AnyConnection {
    pub fn protocol(&self) -> Protocol {
        match self {
            AnyConnection::Http(_) => Protocol::Http,
            AnyConnection::WebSocket(_) => Protocol::WebSocket,
        }
    }

    pub fn core(&self) -> &ConnectionCore {
        match self {
            AnyConnection::Http(connection) => connection.core(),
            AnyConnection::WebSocket(connection) => connection.core(),
        }
    }

    pub fn core_mut(&mut self) -> &mut ConnectionCore {
        match self {
            AnyConnection::Http(connection) => connection.core_mut(),
            AnyConnection::WebSocket(connection) => connection.core_mut(),
        }
    }

    pub fn url(&self) -> Url<'_> {
        self.core().url()
    }
}

type Constructor = fn(Scope, Box<dyn MessageReceiver>, Box<dyn MessageSender>) -> Result<AnyConnection, ConnectionError>;

const CONNECTIONS: [(Protocol, Constructor); 2] = [(Protocol::Http, http), (Protocol::WebSocket, websocket)];

fn http(scope: Scope, receiver: Box<dyn MessageReceiver>, sender: Box<dyn MessageSender>) -> Result<AnyConnection, ConnectionError> {
    HttpConnection::with_transport(scope, receiver, sender).map(AnyConnection::Http)
}

fn websocket(
    scope: Scope,
    receiver: Box<dyn MessageReceiver>,
    sender: Box<dyn MessageSender>,
) -> Result<AnyConnection, ConnectionError> {
    WebSocketConnection::with_transport(scope, receiver, sender).map(AnyConnection::WebSocket)
}

/// Creates the connection registered for the scope `type`.
///
/// Fails with [`ConnectionError::ProtocolUnknown`] when no connection handles that type.
pub fn make_connection(
    scope: Scope,
    receiver: Box<dyn MessageReceiver>,
    sender: Box<dyn MessageSender>,
) -> Result<AnyConnection, ConnectionError> {
    let constructor = CONNECTIONS
        .iter()
        .find(|(protocol, _)| protocol.as_str() == scope.scope_type())
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| ConnectionError::protocol_unknown(scope.scope_type()))?;

    constructor(scope, receiver, sender)
}
