//! Received messages as seen by endpoints.
//!
//! A [`Request`] is created fresh for every received message: the message type
//! is split into its protocol and its kind, and the remaining fields become the
//! request data.

use bytes::Bytes;
use http::StatusCode;

use crate::protocol::{Headers, Message, Protocol};

/// A representation of one message received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    protocol: Protocol,
    kind: &'static str,
    data: RequestData,
}

/// The fields of a message once its type has been stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestData {
    /// The message carries no fields, e.g. `websocket.connect`
    Empty,
    /// An HTTP body chunk
    Body { body: Bytes, more_body: bool },
    /// An HTTP response start
    Start { status: StatusCode, headers: Headers },
    /// A WebSocket frame payload
    Payload { bytes: Option<Bytes>, text: Option<String> },
    /// A WebSocket accept
    Accept { subprotocol: Option<String>, headers: Headers },
    /// A WebSocket close or disconnect
    Close { code: Option<u16> },
}

impl Request {
    pub fn new(protocol: Protocol, kind: &'static str, data: RequestData) -> Self {
        Self { protocol, kind, data }
    }

    /// Returns the protocol used to send the request.
    #[inline]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns the type of the request, without protocol prefix.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[inline]
    pub fn data(&self) -> &RequestData {
        &self.data
    }

    /// Returns the body chunk carried by an HTTP request.
    pub fn body(&self) -> Option<&Bytes> {
        match &self.data {
            RequestData::Body { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns whether more body chunks follow this one, false for anything but a body chunk.
    pub fn more_body(&self) -> bool {
        matches!(self.data, RequestData::Body { more_body: true, .. })
    }

    /// Returns the text payload of a WebSocket message.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            RequestData::Payload { text, .. } => text.as_deref(),
            _ => None,
        }
    }

    /// Returns the binary payload of a WebSocket message.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.data {
            RequestData::Payload { bytes, .. } => bytes.as_ref(),
            _ => None,
        }
    }
}

impl From<Message> for Request {
    fn from(message: Message) -> Self {
        let protocol = message.protocol();
        let kind = message.kind();

        let data = match message {
            Message::HttpRequest { body, more_body } | Message::HttpResponseBody { body, more_body } => {
                RequestData::Body { body, more_body }
            }
            Message::HttpResponseStart { status, headers } => RequestData::Start { status, headers },
            Message::WebSocketReceive { bytes, text } | Message::WebSocketSend { bytes, text } => {
                RequestData::Payload { bytes, text }
            }
            Message::WebSocketAccept { subprotocol, headers } => RequestData::Accept { subprotocol, headers },
            Message::WebSocketDisconnect { code } => RequestData::Close { code },
            Message::WebSocketClose { code } => RequestData::Close { code: Some(code) },
            Message::HttpDisconnect | Message::WebSocketConnect => RequestData::Empty,
        };

        Self { protocol, kind, data }
    }
}
