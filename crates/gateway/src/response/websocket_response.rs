use bytes::Bytes;
use futures::StreamExt;
use futures::stream;

use crate::protocol::{Headers, Message, Protocol};
use crate::response::{MessageStream, Response};

/// Close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code sent when the application hit an unexpected condition.
pub const INTERNAL_ERROR: u16 = 1011;

/// Accepts a WebSocket connection, optionally selecting a subprotocol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptResponse {
    subprotocol: Option<String>,
    headers: Headers,
}

impl AcceptResponse {
    pub fn new(subprotocol: Option<String>, headers: Headers) -> Self {
        Self { subprotocol, headers }
    }
}

impl Response for AcceptResponse {
    fn protocol(&self) -> Protocol {
        Protocol::WebSocket
    }

    fn render_messages(self) -> MessageStream {
        stream::iter([Message::WebSocketAccept { subprotocol: self.subprotocol, headers: self.headers }]).boxed()
    }
}

/// Sends one WebSocket frame.
///
/// Exactly one of `bytes` and `text` is expected to be set, though both are
/// forwarded as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageResponse {
    bytes: Option<Bytes>,
    text: Option<String>,
}

impl MessageResponse {
    pub fn new(bytes: Option<Bytes>, text: Option<String>) -> Self {
        Self { bytes, text }
    }

    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self { bytes: Some(data.into()), text: None }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self { bytes: None, text: Some(data.into()) }
    }
}

impl Response for MessageResponse {
    fn protocol(&self) -> Protocol {
        Protocol::WebSocket
    }

    fn render_messages(self) -> MessageStream {
        stream::iter([Message::WebSocketSend { bytes: self.bytes, text: self.text }]).boxed()
    }
}

/// Closes a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseResponse {
    code: u16,
}

impl CloseResponse {
    pub fn new(code: u16) -> Self {
        Self { code }
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }
}

impl Default for CloseResponse {
    fn default() -> Self {
        Self::new(NORMAL_CLOSURE)
    }
}

impl Response for CloseResponse {
    fn protocol(&self) -> Protocol {
        Protocol::WebSocket
    }

    fn render_messages(self) -> MessageStream {
        stream::iter([Message::WebSocketClose { code: self.code }]).boxed()
    }
}
