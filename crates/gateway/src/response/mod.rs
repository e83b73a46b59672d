//! Responses and their rendering into wire messages.
//!
//! Every response type implements [`Response`]. Rendering consumes the
//! response and yields a finite [`MessageStream`] that a connection sends in
//! order. Because [`Response::render_messages`] takes `self` by value, a
//! response can be rendered exactly once; streamed bodies are consumed in the
//! process.
//!
//! # Response types
//!
//! - HTTP ([`http_response`]):
//!   - [`BodyResponse`]: start message followed by a single body message
//!   - [`StreamResponse`]: start message, one body message per chunk, then an empty final body
//! - WebSocket ([`websocket_response`]):
//!   - [`AcceptResponse`], [`MessageResponse`], [`CloseResponse`]: exactly one message each
//! - Content ([`content`]):
//!   - [`ContentResponse`]: a body response whose headers carry `content-length` and
//!     `content-type`, built for plain text, HTML or JSON bodies

use futures::stream::BoxStream;

use crate::protocol::Protocol;

mod content;
mod http_response;
mod websocket_response;

pub use content::Charset;
pub use content::Content;
pub use content::ContentResponse;
pub use content::ContentResponseBuilder;
pub use content::render_headers;
pub use http_response::BodyResponse;
pub use http_response::StreamResponse;
pub use websocket_response::AcceptResponse;
pub use websocket_response::CloseResponse;
pub use websocket_response::INTERNAL_ERROR;
pub use websocket_response::MessageResponse;
pub use websocket_response::NORMAL_CLOSURE;

/// The rendered, ordered and single-use sequence of messages of a response.
pub type MessageStream = BoxStream<'static, crate::protocol::Message>;

/// A value that renders to an ordered sequence of outbound messages.
pub trait Response: Send {
    /// Returns the protocol the rendered messages belong to.
    fn protocol(&self) -> Protocol;

    /// Converts the response into the messages to send, in order.
    fn render_messages(self) -> MessageStream;
}
