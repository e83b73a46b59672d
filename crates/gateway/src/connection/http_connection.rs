use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::Stream;
use futures::stream;
use http::StatusCode;
use serde::de::DeserializeOwned;

use crate::connection::{Connection, ConnectionCore};
use crate::ensure;
use crate::protocol::{ConnectionError, Headers, Message, Protocol, Request, Scope};
use crate::transport::{MessageReceiver, MessageSender};

/// The lifecycle of the response on an HTTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpState {
    /// No response message has been sent yet
    Open,
    /// The response has started, body messages may follow
    Closing,
    /// The final body message has been sent
    Closed,
}

/// How much of the request body the application consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestBody {
    Unread,
    /// Handed out chunk by chunk, nothing is kept
    Streamed,
    /// Read in full and kept for later reads
    Read(Bytes),
}

/// A connection for one HTTP request/response exchange.
///
/// Responses must be sent as one start message followed by body messages, the
/// last one with `more_body` unset; anything else is rejected with
/// [`ConnectionError::InvalidConnectionState`].
#[derive(Debug)]
pub struct HttpConnection {
    core: ConnectionCore,
    state: HttpState,
    body: RequestBody,
}

impl HttpConnection {
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
        Ok(Self { core, state: HttpState::Open, body: RequestBody::Unread })
    }

    /// Returns the request method exactly as the scope carries it.
    #[inline]
    pub fn method(&self) -> Option<&str> {
        self.core.scope().get_method()
    }

    #[inline]
    pub fn connection_status(&self) -> HttpState {
        self.state
    }

    /// Starts the response, only allowed while no response message was sent.
    pub async fn send_start(&mut self, status: StatusCode, headers: Headers) -> Result<(), ConnectionError> {
        ensure!(
            self.state == HttpState::Open,
            ConnectionError::invalid_connection_state(format!("cannot start a response while {:?}", self.state))
        );

        self.core.send(Message::HttpResponseStart { status, headers }).await?;
        self.state = HttpState::Closing;
        Ok(())
    }

    /// Sends one body chunk, only allowed after the response started.
    ///
    /// A chunk with `more_body` unset completes the response.
    pub async fn send_body(&mut self, body: Bytes, more_body: bool) -> Result<(), ConnectionError> {
        ensure!(
            self.state == HttpState::Closing,
            ConnectionError::invalid_connection_state(format!("cannot send a response body while {:?}", self.state))
        );

        self.core.send(Message::HttpResponseBody { body, more_body }).await?;
        if !more_body {
            self.state = HttpState::Closed;
        }
        Ok(())
    }

    /// Receives request chunks until the last one and joins their bodies.
    ///
    /// The body is kept, later calls return it without receiving anything.
    /// Fails once the body was handed out by [`Self::stream_requests`].
    pub async fn get_requests_body(&mut self) -> Result<Bytes, ConnectionError> {
        match &self.body {
            RequestBody::Read(body) => return Ok(body.clone()),
            RequestBody::Streamed => return Err(already_streamed()),
            RequestBody::Unread => {}
        }
        self.body = RequestBody::Streamed;

        let mut body = BytesMut::new();
        loop {
            let request = self.receive_request().await?;
            if let Some(chunk) = request.body() {
                body.extend_from_slice(chunk);
            }
            if !request.more_body() {
                let body = body.freeze();
                self.body = RequestBody::Read(body.clone());
                return Ok(body);
            }
        }
    }

    /// Yields the body of each request chunk, up to and including the last one.
    ///
    /// Every item pulled from the stream receives exactly one message. A body
    /// already read in full is yielded as a single chunk; a body that was
    /// streamed before yields an [`ConnectionError::InvalidConnectionState`].
    pub fn stream_requests(&mut self) -> impl Stream<Item = Result<Bytes, ConnectionError>> + Send + '_ {
        stream::try_unfold((self, false, true), |(connection, started, more_body)| async move {
            if !more_body {
                return Ok(None);
            }

            if !started {
                let kept = match &connection.body {
                    RequestBody::Read(body) => Some(body.clone()),
                    RequestBody::Streamed => return Err(already_streamed()),
                    RequestBody::Unread => None,
                };
                if let Some(body) = kept {
                    return Ok(Some((body, (connection, true, false))));
                }
                connection.body = RequestBody::Streamed;
            }

            let request = connection.receive_request().await?;
            let more_body = request.more_body();
            let body = request.body().cloned().unwrap_or_default();
            Ok(Some((body, (connection, true, more_body))))
        })
    }

    /// Deserializes the whole request body as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, ConnectionError> {
        let body = self.get_requests_body().await?;
        serde_json::from_slice(&body).map_err(ConnectionError::invalid_data)
    }

    fn expected_kind(&self) -> &'static str {
        match self.state {
            HttpState::Open => "response.start",
            HttpState::Closing | HttpState::Closed => "response.body",
        }
    }
}

fn already_streamed() -> ConnectionError {
    ConnectionError::invalid_connection_state("the request body was already streamed")
}

#[async_trait]
impl Connection for HttpConnection {
    const PROTOCOL: Protocol = Protocol::Http;

    #[inline]
    fn core(&self) -> &ConnectionCore {
        &self.core
    }

    #[inline]
    fn core_mut(&mut self) -> &mut ConnectionCore {
        &mut self.core
    }

    async fn receive_request(&mut self) -> Result<Request, ConnectionError> {
        let message = self.core.receive().await?;
        ensure!(message.kind() == "request", ConnectionError::type_mismatch("request", message.kind()));

        Ok(Request::from(message))
    }

    async fn send_message(&mut self, message: Message) -> Result<(), ConnectionError> {
        match message {
            Message::HttpResponseStart { status, headers } => self.send_start(status, headers).await,
            Message::HttpResponseBody { body, more_body } => self.send_body(body, more_body).await,
            message if message.protocol() != Self::PROTOCOL => {
                Err(ConnectionError::protocol_mismatch(Self::PROTOCOL, message.protocol()))
            }
            message => Err(ConnectionError::type_mismatch(self.expected_kind(), message.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{BodyResponse, CloseResponse, StreamResponse};
    use futures::{StreamExt, TryStreamExt};
    use serde::Deserialize;
    use tokio::sync::mpsc;

    struct Client {
        tx: mpsc::UnboundedSender<Message>,
        rx: mpsc::UnboundedReceiver<Message>,
    }

    impl Client {
        fn request(&self, body: &'static str, more_body: bool) {
            self.tx.send(Message::HttpRequest { body: Bytes::from(body), more_body }).unwrap();
        }

        fn sent(&mut self) -> Vec<Message> {
            let mut messages = vec![];
            while let Ok(message) = self.rx.try_recv() {
                messages.push(message);
            }
            messages
        }
    }

    fn connection(scope: Scope) -> (HttpConnection, Client) {
        let (client_tx, app_rx) = mpsc::unbounded_channel();
        let (app_tx, client_rx) = mpsc::unbounded_channel();
        let connection = HttpConnection::new(scope, app_rx, app_tx).unwrap();
        (connection, Client { tx: client_tx, rx: client_rx })
    }

    #[test]
    fn construction() {
        let (connection, _client) = connection(Scope::http("POST", "/create"));

        assert_eq!(connection.protocol(), Protocol::Http);
        assert_eq!(connection.method(), Some("POST"));
        assert_eq!(connection.connection_status(), HttpState::Open);
    }

    #[test]
    fn rejects_websocket_scope() {
        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        let result = HttpConnection::new(Scope::websocket("/"), rx, tx);

        assert!(matches!(result, Err(ConnectionError::ConnectionType { .. })));
    }

    #[tokio::test]
    async fn start_then_body() {
        let (mut connection, mut client) = connection(Scope::http("GET", "/"));

        connection.send_start(StatusCode::OK, vec![]).await.unwrap();
        assert_eq!(connection.connection_status(), HttpState::Closing);

        let result = connection.send_start(StatusCode::OK, vec![]).await;
        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));

        connection.send_body(Bytes::from("Hello"), true).await.unwrap();
        assert_eq!(connection.connection_status(), HttpState::Closing);

        connection.send_body(Bytes::from(" World"), false).await.unwrap();
        assert_eq!(connection.connection_status(), HttpState::Closed);

        let result = connection.send_body(Bytes::new(), false).await;
        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));

        assert_eq!(client.sent().len(), 3);
    }

    #[tokio::test]
    async fn body_before_start() {
        let (mut connection, mut client) = connection(Scope::http("GET", "/"));

        let result = connection.send_body(Bytes::from("Hello"), false).await;

        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));
        assert_eq!(connection.connection_status(), HttpState::Open);
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn receive_request() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request("Hello", false);

        let request = connection.receive_request().await.unwrap();

        assert_eq!(request.protocol(), Protocol::Http);
        assert_eq!(request.kind(), "request");
        assert_eq!(request.body(), Some(&Bytes::from("Hello")));
        assert!(!request.more_body());
    }

    #[tokio::test]
    async fn receive_disconnect_is_type_mismatch() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.tx.send(Message::HttpDisconnect).unwrap();

        let result = connection.receive_request().await;

        assert!(matches!(
            result,
            Err(ConnectionError::TypeMismatch { expected: "request", ref found }) if found == "disconnect"
        ));
    }

    #[tokio::test]
    async fn requests_body_is_joined() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request("Hello", true);
        client.request(", ", true);
        client.request("World!", false);
        client.request("never read", false);

        let body = connection.get_requests_body().await.unwrap();

        assert_eq!(body, Bytes::from("Hello, World!"));
    }

    #[tokio::test]
    async fn stream_requests_stops_at_last_chunk() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request("a", true);
        client.request("b", false);
        client.request("c", false);

        let chunks = connection.stream_requests().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(chunks, vec![Bytes::from("a"), Bytes::from("b")]);

        let request = connection.receive_request().await.unwrap();
        assert_eq!(request.body(), Some(&Bytes::from("c")));
    }

    #[tokio::test]
    async fn stream_requests_is_lazy() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request("a", true);
        client.request("b", true);

        let mut stream = Box::pin(connection.stream_requests());
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("a"));
        drop(stream);

        let request = connection.receive_request().await.unwrap();
        assert_eq!(request.body(), Some(&Bytes::from("b")));
    }

    #[tokio::test]
    async fn requests_body_is_kept() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request(r#"{"a":"#, true);
        client.request("1}", false);

        let body = connection.get_requests_body().await.unwrap();
        assert_eq!(body, Bytes::from(r#"{"a":1}"#));

        assert_eq!(connection.get_requests_body().await.unwrap(), body);
        let value = connection.json::<serde_json::Value>().await.unwrap();
        assert_eq!(value, serde_json::json!({ "a": 1 }));

        let chunks = connection.stream_requests().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(chunks, vec![body]);
    }

    #[tokio::test]
    async fn body_cannot_be_streamed_twice() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request("a", true);
        client.request("b", false);
        client.request("never read", false);

        let chunks = connection.stream_requests().try_collect::<Vec<_>>().await.unwrap();
        assert_eq!(chunks, vec![Bytes::from("a"), Bytes::from("b")]);

        let result = connection.stream_requests().try_collect::<Vec<_>>().await;
        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));

        let result = connection.get_requests_body().await;
        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));
        let result = connection.json::<serde_json::Value>().await;
        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));
    }

    #[tokio::test]
    async fn json_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Post {
            title: String,
        }

        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request(r#"{"title":"#, true);
        client.request(r#""Hello"}"#, false);

        let post: Post = connection.json().await.unwrap();
        assert_eq!(post, Post { title: "Hello".into() });
    }

    #[tokio::test]
    async fn invalid_json_body() {
        let (mut connection, client) = connection(Scope::http("POST", "/"));
        client.request("not json", false);

        let result = connection.json::<serde_json::Value>().await;
        assert!(matches!(result, Err(ConnectionError::InvalidData { .. })));
    }

    #[tokio::test]
    async fn body_response_round_trip() {
        let (mut connection, mut client) = connection(Scope::http("POST", "/"));
        let headers = vec![(Bytes::from("etag"), Bytes::from("E"))];

        connection.send_response(BodyResponse::new(StatusCode::CREATED, "body").with_headers(headers.clone())).await.unwrap();

        assert_eq!(
            client.sent(),
            vec![
                Message::HttpResponseStart { status: StatusCode::CREATED, headers },
                Message::HttpResponseBody { body: Bytes::from("body"), more_body: false },
            ]
        );
        assert_eq!(connection.connection_status(), HttpState::Closed);
    }

    #[tokio::test]
    async fn stream_response_round_trip() {
        let (mut connection, mut client) = connection(Scope::http("GET", "/"));
        let response = StreamResponse::from_chunks(StatusCode::OK, vec![Bytes::from("a"), Bytes::from("b")]);

        connection.send_response(response).await.unwrap();

        assert_eq!(client.sent().len(), 4);
        assert_eq!(connection.connection_status(), HttpState::Closed);
    }

    #[tokio::test]
    async fn second_response_is_rejected() {
        let (mut connection, _client) = connection(Scope::http("GET", "/"));

        connection.send_response(BodyResponse::default()).await.unwrap();
        let result = connection.send_response(BodyResponse::default()).await;

        assert!(matches!(result, Err(ConnectionError::InvalidConnectionState { .. })));
    }

    #[tokio::test]
    async fn websocket_response_is_rejected() {
        let (mut connection, mut client) = connection(Scope::http("GET", "/"));

        let result = connection.send_response(CloseResponse::default()).await;

        assert!(matches!(
            result,
            Err(ConnectionError::ProtocolMismatch { expected: Protocol::Http, found: Protocol::WebSocket })
        ));
        assert!(client.sent().is_empty());
    }
}
