//! Content responses with derived headers.
//!
//! A [`ContentResponse`] is a [`BodyResponse`] whose headers are computed from
//! a name/value mapping, the rendered body and the media type of the response:
//!
//! 1. caller-supplied headers, in insertion order, names lower-cased
//! 2. `content-length`, the byte length of the rendered body
//! 3. `content-type`, the media type, with `; charset=<charset>` for `text/*`
//!
//! Header names and values are Latin-1 encoded. A body given as bytes is sent
//! unchanged, a body given as text is encoded with the response charset.

use bytes::Bytes;
use http::StatusCode;
use mime::Mime;
use serde::Serialize;

use crate::protocol::{Headers, Protocol};
use crate::response::{BodyResponse, MessageStream, Response};
use crate::utils::latin1_encode;

/// The character set used to encode text bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
}

impl Charset {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Charset::Utf8 => "utf-8",
            Charset::Latin1 => "iso-8859-1",
        }
    }

    /// Encodes text, characters the charset can't represent become `?`.
    pub fn encode(&self, text: &str) -> Bytes {
        match self {
            Charset::Utf8 => Bytes::copy_from_slice(text.as_bytes()),
            Charset::Latin1 => Bytes::from(latin1_encode(text)),
        }
    }
}

/// The body of a content response before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Bytes(Bytes),
    Text(String),
}

impl Content {
    fn render(self, charset: Charset) -> Bytes {
        match self {
            Content::Bytes(bytes) => bytes,
            Content::Text(text) => charset.encode(&text),
        }
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Content::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for Content {
    fn from(bytes: &'static [u8]) -> Self {
        Content::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_owned())
    }
}

/// Renders header name/value pairs followed by the derived content headers.
///
/// `content-length` is appended when a length is given, `content-type` when a
/// media type is given.
pub fn render_headers<I, K, V>(headers: I, content_length: Option<usize>, media_type: Option<&Mime>, charset: Charset) -> Headers
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut rendered = headers
        .into_iter()
        .map(|(name, value)| render_header(name.as_ref(), value.as_ref()))
        .collect::<Headers>();

    if let Some(length) = content_length {
        rendered.push((Bytes::from_static(b"content-length"), Bytes::from(length.to_string())));
    }

    if let Some(media_type) = media_type {
        let content_type = if media_type.type_() == mime::TEXT {
            format!("{}; charset={}", media_type.essence_str(), charset.as_str())
        } else {
            media_type.essence_str().to_owned()
        };
        rendered.push((Bytes::from_static(b"content-type"), Bytes::from(latin1_encode(&content_type))));
    }

    rendered
}

fn render_header(name: &str, value: &str) -> (Bytes, Bytes) {
    (Bytes::from(latin1_encode(&name.to_lowercase())), Bytes::from(latin1_encode(value)))
}

/// An HTTP response for plain text, HTML, JSON or any other media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentResponse {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
    media_type: Option<Mime>,
}

impl ContentResponse {
    pub fn builder() -> ContentResponseBuilder {
        ContentResponseBuilder::new()
    }

    /// A `text/plain` response with status 200.
    pub fn plain_text(body: impl Into<Content>) -> Self {
        Self::builder().media_type(mime::TEXT_PLAIN).body(body)
    }

    /// A `text/html` response with status 200.
    pub fn html(body: impl Into<Content>) -> Self {
        Self::builder().media_type(mime::TEXT_HTML).body(body)
    }

    /// An `application/json` response with status 200 and a compact JSON body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Self::builder().json(value)
    }

    /// Replaces the status, headers are unaffected.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Appends a `set-cookie` header after the rendered headers.
    pub fn add_cookie(&mut self, name: &str, value: &str) {
        let cookie = format!("{name}={value}");
        self.headers.push(render_header("set-cookie", &cookie));
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

    #[inline]
    pub fn media_type(&self) -> Option<&Mime> {
        self.media_type.as_ref()
    }
}

impl From<ContentResponse> for BodyResponse {
    fn from(response: ContentResponse) -> Self {
        BodyResponse::new(response.status, response.body).with_headers(response.headers)
    }
}

impl Response for ContentResponse {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn render_messages(self) -> MessageStream {
        BodyResponse::from(self).render_messages()
    }
}

#[derive(Debug, Clone)]
pub struct ContentResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
    media_type: Option<Mime>,
    charset: Charset,
}

impl ContentResponseBuilder {
    fn new() -> Self {
        Self { status: StatusCode::OK, headers: vec![], media_type: None, charset: Charset::default() }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    pub fn media_type(mut self, media_type: Mime) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Renders the body and the headers into the final response.
    pub fn body(self, content: impl Into<Content>) -> ContentResponse {
        let body = content.into().render(self.charset);
        let pairs = self.headers.iter().map(|(name, value)| (name, value));
        let headers = render_headers(pairs, Some(body.len()), self.media_type.as_ref(), self.charset);

        ContentResponse { status: self.status, headers, body, media_type: self.media_type }
    }

    /// Serializes `value` as compact JSON, non-ASCII characters left unescaped.
    ///
    /// The media type defaults to `application/json` unless one was set.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<ContentResponse, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.media_type.get_or_insert(mime::APPLICATION_JSON);
        Ok(self.body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;
    use futures::StreamExt;
    use serde_json::json;

    fn headers() -> Vec<(&'static str, &'static str)> {
        vec![("Server", "TestServer"), ("Cache-Control", "max-age=3600, public"), ("Etag", "pub1259380237;gz")]
    }

    fn pair(name: &'static str, value: &'static str) -> (Bytes, Bytes) {
        (Bytes::from(name), Bytes::from(value))
    }

    #[test]
    fn render_headers_without_content_headers() {
        let rendered = render_headers(headers(), None, None, Charset::Utf8);

        assert_eq!(
            rendered,
            vec![
                pair("server", "TestServer"),
                pair("cache-control", "max-age=3600, public"),
                pair("etag", "pub1259380237;gz"),
            ]
        );
    }

    #[test]
    fn render_headers_with_text_media_type() {
        let rendered =
            render_headers([("Server", "S"), ("Etag", "E")], Some("abc".len()), Some(&mime::TEXT_PLAIN), Charset::Utf8);

        assert_eq!(
            rendered,
            vec![
                pair("server", "S"),
                pair("etag", "E"),
                pair("content-length", "3"),
                pair("content-type", "text/plain; charset=utf-8"),
            ]
        );
    }

    #[test]
    fn render_headers_is_repeatable() {
        let first = render_headers(headers(), Some(13), Some(&mime::APPLICATION_JSON), Charset::Utf8);
        let second = render_headers(headers(), Some(13), Some(&mime::APPLICATION_JSON), Charset::Utf8);

        assert_eq!(first, second);
        assert_eq!(first[3], pair("content-length", "13"));
        assert_eq!(first[4], pair("content-type", "application/json"));
    }

    #[test]
    fn plain_text_defaults() {
        let response = ContentResponse::plain_text("");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &Bytes::new());
        assert_eq!(response.media_type(), Some(&mime::TEXT_PLAIN));
        assert_eq!(
            response.headers(),
            &vec![pair("content-length", "0"), pair("content-type", "text/plain; charset=utf-8")]
        );
    }

    #[test]
    fn html_with_headers() {
        let body = r#"{"message": "Created"}"#;
        let response = ContentResponse::builder()
            .status(StatusCode::CREATED)
            .headers(headers())
            .media_type(mime::TEXT_HTML)
            .body(body);

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.body(), &Bytes::from(body));
        assert_eq!(
            response.headers(),
            &vec![
                pair("server", "TestServer"),
                pair("cache-control", "max-age=3600, public"),
                pair("etag", "pub1259380237;gz"),
                pair("content-length", "22"),
                pair("content-type", "text/html; charset=utf-8"),
            ]
        );
    }

    #[test]
    fn json_body_is_compact() {
        let response = ContentResponse::builder()
            .status(StatusCode::CREATED)
            .headers(headers())
            .json(&json!({"message": "Created"}))
            .unwrap();

        assert_eq!(response.body(), &Bytes::from(r#"{"message":"Created"}"#));
        assert_eq!(response.headers()[3], pair("content-length", "21"));
        assert_eq!(response.headers()[4], pair("content-type", "application/json"));
    }

    #[test]
    fn json_keeps_non_ascii() {
        let response = ContentResponse::json(&json!({"city": "Zürich"})).unwrap();

        assert_eq!(response.body(), &Bytes::from(r#"{"city":"Zürich"}"#));
        assert_eq!(response.headers()[0], pair("content-length", "18"));
    }

    #[test]
    fn bytes_body_passes_through() {
        let response = ContentResponse::builder().media_type(mime::APPLICATION_JSON).body(&b"message: Created"[..]);

        assert_eq!(response.body(), &Bytes::from_static(b"message: Created"));
    }

    #[test]
    fn latin1_charset() {
        let response = ContentResponse::builder().media_type(mime::TEXT_PLAIN).charset(Charset::Latin1).body("café");

        assert_eq!(response.body(), &Bytes::from_static(b"caf\xe9"));
        assert_eq!(response.headers()[0], pair("content-length", "4"));
        assert_eq!(response.headers()[1], pair("content-type", "text/plain; charset=iso-8859-1"));
    }

    #[test]
    fn cookie_is_appended() {
        let mut response = ContentResponse::builder().body("");
        response.add_cookie("test", "test-cookie");

        assert_eq!(response.headers(), &vec![pair("content-length", "0"), pair("set-cookie", "test=test-cookie")]);
    }

    #[tokio::test]
    async fn renders_as_body_response() {
        let response = ContentResponse::plain_text("Not Found").with_status(StatusCode::NOT_FOUND);

        let messages = response.render_messages().collect::<Vec<_>>().await;

        assert_eq!(
            messages,
            vec![
                Message::HttpResponseStart {
                    status: StatusCode::NOT_FOUND,
                    headers: vec![pair("content-length", "9"), pair("content-type", "text/plain; charset=utf-8")],
                },
                Message::HttpResponseBody { body: Bytes::from("Not Found"), more_body: false },
            ]
        );
    }
}
