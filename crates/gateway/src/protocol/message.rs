use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use http::StatusCode;

use crate::protocol::ConnectionError;

/// Header byte-pairs in the order they appear on the wire.
pub type Headers = Vec<(Bytes, Bytes)>;

/// The protocols a gateway can hand to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    WebSocket,
}

impl Protocol {
    /// Returns the identifier used in scope `type` fields and message type prefixes.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Protocol::Http),
            "websocket" => Ok(Protocol::WebSocket),
            other => Err(ConnectionError::protocol_unknown(other)),
        }
    }
}

/// A single message exchanged with the gateway.
///
/// Every variant corresponds to one message `type` of the wire contract, e.g.
/// [`Message::HttpResponseStart`] is `http.response.start`. Inbound and outbound
/// messages share this type, so a connection has to check the direction and
/// protocol of whatever it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `http.request`, one chunk of the request body
    HttpRequest { body: Bytes, more_body: bool },
    /// `http.disconnect`, the client went away before the response completed
    HttpDisconnect,
    /// `http.response.start`
    HttpResponseStart { status: StatusCode, headers: Headers },
    /// `http.response.body`, `more_body = false` marks the final chunk
    HttpResponseBody { body: Bytes, more_body: bool },
    /// `websocket.connect`
    WebSocketConnect,
    /// `websocket.receive`
    WebSocketReceive { bytes: Option<Bytes>, text: Option<String> },
    /// `websocket.disconnect`
    WebSocketDisconnect { code: Option<u16> },
    /// `websocket.accept`
    WebSocketAccept { subprotocol: Option<String>, headers: Headers },
    /// `websocket.send`
    WebSocketSend { bytes: Option<Bytes>, text: Option<String> },
    /// `websocket.close`
    WebSocketClose { code: u16 },
}

impl Message {
    /// Returns the full message type, protocol prefix included.
    pub const fn message_type(&self) -> &'static str {
        match self {
            Message::HttpRequest { .. } => "http.request",
            Message::HttpDisconnect => "http.disconnect",
            Message::HttpResponseStart { .. } => "http.response.start",
            Message::HttpResponseBody { .. } => "http.response.body",
            Message::WebSocketConnect => "websocket.connect",
            Message::WebSocketReceive { .. } => "websocket.receive",
            Message::WebSocketDisconnect { .. } => "websocket.disconnect",
            Message::WebSocketAccept { .. } => "websocket.accept",
            Message::WebSocketSend { .. } => "websocket.send",
            Message::WebSocketClose { .. } => "websocket.close",
        }
    }

    /// Returns the protocol named by the text before the first `.` of the message type.
    pub const fn protocol(&self) -> Protocol {
        match self {
            Message::HttpRequest { .. }
            | Message::HttpDisconnect
            | Message::HttpResponseStart { .. }
            | Message::HttpResponseBody { .. } => Protocol::Http,
            _ => Protocol::WebSocket,
        }
    }

    /// Returns the message type with the protocol prefix stripped, e.g. `response.start`.
    pub fn kind(&self) -> &'static str {
        let message_type = self.message_type();
        message_type.split_once('.').map_or(message_type, |(_, kind)| kind)
    }
}
