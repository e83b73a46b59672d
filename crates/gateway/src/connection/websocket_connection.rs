use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::connection::{Connection, ConnectionCore};
use crate::ensure;
use crate::protocol::{ConnectionError, Headers, Message, Protocol, Request, Scope};
use crate::transport::{MessageReceiver, MessageSender};

/// The lifecycle of one side of a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebSocketState {
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for WebSocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            WebSocketState::Connecting => "connecting",
            WebSocketState::Connected => "connected",
            WebSocketState::Disconnected => "disconnected",
        };
        f.write_str(state)
    }
}

/// A connection for one WebSocket session.
///
/// The client state follows the received messages, the application state
/// follows the sent ones.
#[derive(Debug)]
pub struct WebSocketConnection {
    core: ConnectionCore,
    client_state: WebSocketState,
    application_state: WebSocketState,
}

impl WebSocketConnection {
    pub fn new<R, S>(scope: Scope, receiver: R, sender: S) -> Result<Self, ConnectionError>
    where
        R: MessageReceiver + 'static,
        S: MessageSender + 'static,
    {
        Self::with_transport(scope, Box::new(receiver), Box::new(sender))
    }

    pub fn with_transport(
        scope: Scope,
        receiver: Box<dyn MessageReceiver>,
        sender: Box<dyn MessageSender>,
    ) -> Result<Self, ConnectionError> {
        let core = ConnectionCore::new(Self::PROTOCOL, scope, receiver, sender)?;
        Ok(Self { core, client_state: WebSocketState::Connecting, application_state: WebSocketState::Connecting })
    }

    #[inline]
    pub fn client_state(&self) -> WebSocketState {
        self.client_state
    }

    #[inline]
    pub fn application_state(&self) -> WebSocketState {
        self.application_state
    }

    /// Accepts the connection, optionally selecting a subprotocol.
    pub async fn accept_connection(&mut self, subprotocol: Option<String>, headers: Headers) -> Result<(), ConnectionError> {
        self.send_message(Message::WebSocketAccept { subprotocol, headers }).await
    }

    /// Closes the connection with the given close code.
    pub async fn close_connection(&mut self, code: u16) -> Result<(), ConnectionError> {
        self.send_message(Message::WebSocketClose { code }).await
    }

    pub async fn send_bytes(&mut self, data: impl Into<Bytes> + Send) -> Result<(), ConnectionError> {
        self.send_message(Message::WebSocketSend { bytes: Some(data.into()), text: None }).await
    }

    pub async fn send_text(&mut self, data: impl Into<String> + Send) -> Result<(), ConnectionError> {
        self.send_message(Message::WebSocketSend { bytes: None, text: Some(data.into()) }).await
    }
}

fn next_client_state(state: WebSocketState, message: &Message) -> WebSocketState {
    match message {
        Message::WebSocketConnect => WebSocketState::Connected,
        Message::WebSocketDisconnect { .. } => WebSocketState::Disconnected,
        _ => state,
    }
}

fn next_application_state(state: WebSocketState, message: &Message) -> Result<WebSocketState, ConnectionError> {
    match (state, message) {
        (WebSocketState::Connecting, Message::WebSocketAccept { .. }) => Ok(WebSocketState::Connected),
        (WebSocketState::Connecting | WebSocketState::Connected, Message::WebSocketClose { .. }) => {
            Ok(WebSocketState::Disconnected)
        }
        (WebSocketState::Connected, Message::WebSocketSend { .. }) => Ok(WebSocketState::Connected),
        (state, message) => Err(ConnectionError::invalid_connection_state(format!(
            "cannot send {} while the application is {}",
            message.message_type(),
            state
        ))),
    }
}

#[async_trait]
impl Connection for WebSocketConnection {
    const PROTOCOL: Protocol = Protocol::WebSocket;

    #[inline]
    fn core(&self) -> &ConnectionCore {
        &self.core
    }

    #[inline]
    fn core_mut(&mut self) -> &mut ConnectionCore {
        &mut self.core
    }

    async fn receive_request(&mut self) -> Result<Request, ConnectionError> {
        ensure!(
            self.client_state != WebSocketState::Disconnected,
            ConnectionError::invalid_connection_state("cannot receive a request after the client disconnected")
        );

        let message = self.core.receive().await?;
        self.client_state = next_client_state(self.client_state, &message);

        Ok(Request::from(message))
    }

    async fn send_message(&mut self, message: Message) -> Result<(), ConnectionError> {
        ensure!(message.protocol() == Self::PROTOCOL, ConnectionError::protocol_mismatch(Self::PROTOCOL, message.protocol()));
        ensure!(
            matches!(message, Message::WebSocketAccept { .. } | Message::WebSocketSend { .. } | Message::WebSocketClose { .. }),
            ConnectionError::type_mismatch("send", message.kind())
        );

        let next_state = next_application_state(self.application_state, &message)?;
        self.core.send(message).await?;
        self.application_state = next_state;
        Ok(())
    }
}
