use std::fmt;

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use http::StatusCode;

use crate::protocol::{Headers, Message, Protocol};
use crate::response::{MessageStream, Response};

/// A body HTTP response.
///
/// Produces two messages: the first starts the response, the second carries
/// the whole body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyResponse {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl BodyResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: Headers::new(), body: body.into() }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl Default for BodyResponse {
    fn default() -> Self {
        Self::new(StatusCode::OK, Bytes::new())
    }
}

impl Response for BodyResponse {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn render_messages(self) -> MessageStream {
        let start = Message::HttpResponseStart { status: self.status, headers: self.headers };
        let body = Message::HttpResponseBody { body: self.body, more_body: false };
        stream::iter([start, body]).boxed()
    }
}

/// A streamed HTTP response.
///
/// Produces a start message, one body message per chunk with `more_body` set,
/// and a final empty body message that completes the response.
pub struct StreamResponse {
    status: StatusCode,
    headers: Headers,
    body: BoxStream<'static, Bytes>,
}

impl StreamResponse {
    pub fn new<S>(status: StatusCode, body: S) -> Self
    where
        S: Stream<Item = Bytes> + Send + 'static,
    {
        Self { status, headers: Headers::new(), body: body.boxed() }
    }

    /// Streams the chunks of an iterator, e.g. a `Vec<Bytes>`.
    pub fn from_chunks<I>(status: StatusCode, chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        Self::new(status, stream::iter(chunks))
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }
}

impl fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse").field("status", &self.status).field("headers", &self.headers).finish_non_exhaustive()
    }
}

impl Response for StreamResponse {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn render_messages(self) -> MessageStream {
        let start = Message::HttpResponseStart { status: self.status, headers: self.headers };
        let chunks = self.body.map(|chunk| Message::HttpResponseBody { body: chunk, more_body: true });
        let end = Message::HttpResponseBody { body: Bytes::new(), more_body: false };

        stream::iter([start]).chain(chunks).chain(stream::iter([end])).boxed()
    }
}
