use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use micro_gateway::connection::{Connection, WebSocketConnection};
use micro_gateway::response::{CloseResponse, INTERNAL_ERROR};

use crate::endpoint::{AcceptConnection, IgnoreMessage, WebSocketEndpoint};
use crate::route::{RouteError, send_terminal_response};

/// The client messages a WebSocket route dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebSocketEvent {
    /// `websocket.connect`
    Connect,
    /// `websocket.receive`
    Receive,
    /// `websocket.disconnect`
    Disconnect,
}

impl WebSocketEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            WebSocketEvent::Connect => "connect",
            WebSocketEvent::Receive => "receive",
            WebSocketEvent::Disconnect => "disconnect",
        }
    }
}

impl FromStr for WebSocketEvent {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connect" => Ok(WebSocketEvent::Connect),
            "receive" => Ok(WebSocketEvent::Receive),
            "disconnect" => Ok(WebSocketEvent::Disconnect),
            other => Err(RouteError::endpoint_not_found(other)),
        }
    }
}

/// A WebSocket route dispatching on the type of the received message.
///
/// By default a connect is accepted while received messages and disconnects
/// are ignored. One call handles one received message.
pub struct WebSocketRoute {
    path: String,
    endpoints: HashMap<WebSocketEvent, Box<dyn WebSocketEndpoint>>,
}

impl WebSocketRoute {
    pub fn new(path: impl Into<String>) -> Self {
        let mut endpoints = HashMap::<WebSocketEvent, Box<dyn WebSocketEndpoint>>::with_capacity(3);
        endpoints.insert(WebSocketEvent::Connect, Box::new(AcceptConnection));
        endpoints.insert(WebSocketEvent::Receive, Box::new(IgnoreMessage));
        endpoints.insert(WebSocketEvent::Disconnect, Box::new(IgnoreMessage));

        Self { path: path.into(), endpoints }
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn endpoint<E: WebSocketEndpoint + 'static>(mut self, event: WebSocketEvent, endpoint: E) -> Self {
        self.endpoints.insert(event, Box::new(endpoint));
        self
    }

    pub fn on_connect<E: WebSocketEndpoint + 'static>(self, endpoint: E) -> Self {
        self.endpoint(WebSocketEvent::Connect, endpoint)
    }

    pub fn on_receive<E: WebSocketEndpoint + 'static>(self, endpoint: E) -> Self {
        self.endpoint(WebSocketEvent::Receive, endpoint)
    }

    pub fn on_disconnect<E: WebSocketEndpoint + 'static>(self, endpoint: E) -> Self {
        self.endpoint(WebSocketEvent::Disconnect, endpoint)
    }

    /// Resolves the endpoint of a message type without protocol prefix, e.g. `receive`.
    pub fn get_endpoint(&self, name: &str) -> Result<&dyn WebSocketEndpoint, RouteError> {
        let event = name.parse::<WebSocketEvent>()?;
        self.endpoints
            .get(&event)
            .map(|endpoint| endpoint.as_ref())
            .ok_or_else(|| RouteError::endpoint_not_found(name))
    }

    /// Receives one message and hands it to the endpoint of its type.
    ///
    /// Any failure closes the connection with code `1011` before it is returned.
    pub async fn call(&self, connection: &mut WebSocketConnection) -> Result<(), RouteError> {
        let result = self.dispatch(connection).await;

        if result.is_err() {
            send_terminal_response(connection, CloseResponse::new(INTERNAL_ERROR)).await;
        }
        result
    }

    async fn dispatch(&self, connection: &mut WebSocketConnection) -> Result<(), RouteError> {
        let request = connection.receive_request().await?;
        let endpoint = self.get_endpoint(request.kind())?;
        endpoint.call(connection, request).await.map_err(RouteError::endpoint)
    }
}

impl fmt::Debug for WebSocketRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketRoute").field("path", &self.path).field("events", &self.endpoints.keys()).finish()
    }
}
