//! The application entry point: picks the route of each inbound connection.
//!
//! The [`Router`] is the outermost recovery boundary. A failing route is
//! logged and the connection is left as the route left it; only failures to
//! create the connection or to send the not-found answer reach the gateway.

use http::StatusCode;
use micro_gateway::connection::{AnyConnection, Connection, make_connection};
use micro_gateway::protocol::{ConnectionError, PathParams, Protocol, Scope};
use micro_gateway::response::{CloseResponse, ContentResponse, NORMAL_CLOSURE};
use micro_gateway::transport::{MessageReceiver, MessageSender};
use thiserror::Error;
use tracing::{error, info};

use crate::path::PathPattern;
use crate::route::Route;

#[derive(Debug, Error)]
pub enum RouterBuildError {
    #[error("invalid route path {path:?}: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

impl RouterBuildError {
    pub fn invalid_path<S: ToString>(path: S, source: matchit::InsertError) -> Self {
        Self::InvalidPath { path: path.to_string(), source }
    }
}

/// An ordered list of routes, the first route matching the path wins.
#[derive(Debug)]
pub struct Router {
    routes: Vec<(PathPattern, Route)>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    #[inline]
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|(_, route)| route)
    }

    /// Finds the first route of the protocol matching the path, with the
    /// parameters it captured.
    pub fn at(&self, protocol: Protocol, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .filter(|(_, route)| route.protocol() == protocol)
            .find_map(|(pattern, route)| pattern.matches(path).map(|params| (route, params)))
    }

    /// Handles one inbound connection.
    ///
    /// Only routes of the connection protocol are considered. HTTP connections
    /// without a matching route are answered with `404 Not Found`, WebSocket
    /// connections are closed with code `1000`.
    pub async fn call<R, S>(&self, scope: Scope, receiver: R, sender: S) -> Result<(), ConnectionError>
    where
        R: MessageReceiver + 'static,
        S: MessageSender + 'static,
    {
        let mut connection = make_connection(scope, Box::new(receiver), Box::new(sender))?;
        let path = connection.url().path.unwrap_or_default().to_owned();

        let Some((route, params)) = self.at(connection.protocol(), &path) else {
            info!(path = %path, protocol = %connection.protocol(), "no route matches the path");
            return send_not_found(&mut connection).await;
        };

        connection.core_mut().set_path_params(params);
        if let Err(e) = route.call(&mut connection).await {
            error!(cause = %e, path = %path, protocol = %route.protocol(), "route failed");
        }
        Ok(())
    }
}

async fn send_not_found(connection: &mut AnyConnection) -> Result<(), ConnectionError> {
    match connection {
        AnyConnection::Http(connection) => {
            let response = ContentResponse::plain_text("Not Found").with_status(StatusCode::NOT_FOUND);
            connection.send_response(response).await
        }
        AnyConnection::WebSocket(connection) => connection.send_response(CloseResponse::new(NORMAL_CLOSURE)).await,
    }
}

#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<Route>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Appends a route, routes are tried in the order they were added.
    pub fn route(mut self, route: impl Into<Route>) -> Self {
        self.routes.push(route.into());
        self
    }

    /// Compiles the route paths into the router.
    pub fn build(self) -> Result<Router, RouterBuildError> {
        let routes = self
            .routes
            .into_iter()
            .map(|route| PathPattern::new(route.path()).map(|pattern| (pattern, route)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Router { routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{EndpointError, MockHttpEndpoint, MockWebSocketEndpoint, http_endpoint_fn};
    use crate::route::{HttpRoute, WebSocketRoute};
    use crate::test_support::channels;
    use bytes::Bytes;
    use futures::FutureExt;
    use micro_gateway::protocol::Message;

    fn not_found_messages() -> Vec<Message> {
        vec![
            Message::HttpResponseStart {
                status: StatusCode::NOT_FOUND,
                headers: vec![
                    (Bytes::from("content-length"), Bytes::from("9")),
                    (Bytes::from("content-type"), Bytes::from("text/plain; charset=utf-8")),
                ],
            },
            Message::HttpResponseBody { body: Bytes::from("Not Found"), more_body: false },
        ]
    }

    fn untouched_router() -> Router {
        let mut index = MockHttpEndpoint::new();
        index.expect_call().never();
        let mut create = MockHttpEndpoint::new();
        create.expect_call().never();

        Router::builder().route(HttpRoute::new("/").get(index)).route(HttpRoute::new("/create").post(create)).build().unwrap()
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let router = untouched_router();
        let (rx, tx, mut client) = channels();
        client.push(Message::HttpRequest { body: Bytes::new(), more_body: false });

        router.call(Scope::http("GET", "/unknown"), rx, tx).await.unwrap();

        assert_eq!(client.sent(), not_found_messages());
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let router = untouched_router();
        let (rx, tx, mut client) = channels();

        router.call(Scope::new("http"), rx, tx).await.unwrap();

        assert_eq!(client.sent(), not_found_messages());
    }

    #[tokio::test]
    async fn unknown_websocket_path_is_closed() {
        let mut connect = MockWebSocketEndpoint::new();
        connect.expect_call().never();
        let router = Router::builder().route(WebSocketRoute::new("/ws").on_connect(connect)).build().unwrap();
        let (rx, tx, mut client) = channels();
        client.push(Message::WebSocketConnect);

        router.call(Scope::websocket("/chat"), rx, tx).await.unwrap();

        assert_eq!(client.sent(), vec![Message::WebSocketClose { code: 1000 }]);
    }

    #[tokio::test]
    async fn websocket_scope_skips_http_routes() {
        let mut get = MockHttpEndpoint::new();
        get.expect_call().never();
        let router = Router::builder().route(HttpRoute::new("/chat").get(get)).build().unwrap();
        let (rx, tx, mut client) = channels();
        client.push(Message::WebSocketConnect);

        router.call(Scope::websocket("/chat"), rx, tx).await.unwrap();

        assert_eq!(client.sent(), vec![Message::WebSocketClose { code: 1000 }]);
    }

    #[tokio::test]
    async fn route_of_the_scope_protocol_wins() {
        let mut get = MockHttpEndpoint::new();
        get.expect_call().never();
        let router = Router::builder()
            .route(HttpRoute::new("/chat").get(get))
            .route(WebSocketRoute::new("/chat"))
            .build()
            .unwrap();
        let (rx, tx, mut client) = channels();
        client.push(Message::WebSocketConnect);

        router.call(Scope::websocket("/chat"), rx, tx).await.unwrap();

        assert_eq!(client.sent(), vec![Message::WebSocketAccept { subprotocol: None, headers: vec![] }]);
    }

    #[tokio::test]
    async fn unknown_protocol() {
        let router = untouched_router();
        let (rx, tx, mut client) = channels();

        let result = router.call(Scope::new("lifespan"), rx, tx).await;

        assert!(matches!(result, Err(ConnectionError::ProtocolUnknown { .. })));
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn first_matching_route_wins() {
        let mut first = MockHttpEndpoint::new();
        first.expect_call().times(1).returning(|_, _| Ok(()));
        let mut second = MockHttpEndpoint::new();
        second.expect_call().never();

        let router = Router::builder().route(HttpRoute::new("/").get(first)).route(HttpRoute::new("/").get(second)).build().unwrap();
        let (rx, tx, client) = channels();
        client.push(Message::HttpRequest { body: Bytes::new(), more_body: false });

        router.call(Scope::http("GET", "/"), rx, tx).await.unwrap();
    }

    #[tokio::test]
    async fn route_failure_is_contained() {
        let mut get = MockHttpEndpoint::new();
        get.expect_call().times(1).returning(|_, _| Err("boom".into()));
        let mut fallback = MockHttpEndpoint::new();
        fallback.expect_call().never();

        let router =
            Router::builder().route(HttpRoute::new("/").get(get)).route(HttpRoute::new("/").get(fallback)).build().unwrap();
        let (rx, tx, mut client) = channels();
        client.push(Message::HttpRequest { body: Bytes::new(), more_body: false });

        router.call(Scope::http("GET", "/"), rx, tx).await.unwrap();

        let sent = client.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], Message::HttpResponseBody { body: Bytes::from("Internal Server Error"), more_body: false });
    }

    #[tokio::test]
    async fn path_params_reach_the_endpoint() {
        let route = HttpRoute::new("/post/{id}").get(http_endpoint_fn(|connection, _request| {
            async move {
                let id = connection.core().path_params().get("id").unwrap_or_default().to_owned();
                connection.send_response(ContentResponse::plain_text(id)).await?;
                Ok::<_, EndpointError>(())
            }
            .boxed()
        }));
        let router = Router::builder().route(route).build().unwrap();
        let (rx, tx, mut client) = channels();
        client.push(Message::HttpRequest { body: Bytes::new(), more_body: false });

        router.call(Scope::http("GET", "/post/1"), rx, tx).await.unwrap();

        assert_eq!(client.sent()[1], Message::HttpResponseBody { body: Bytes::from("1"), more_body: false });
    }

    #[test]
    fn at_reports_params() {
        let router = Router::builder().route(HttpRoute::new("/")).route(HttpRoute::new("/post/{id}")).build().unwrap();

        let (route, params) = router.at(Protocol::Http, "/post/7").unwrap();
        assert_eq!(route.path(), "/post/{id}");
        assert_eq!(params.get("id"), Some("7"));

        let (route, params) = router.at(Protocol::Http, "/").unwrap();
        assert_eq!(route.path(), "/");
        assert!(params.is_empty());

        assert!(router.at(Protocol::Http, "/missing").is_none());
        assert!(router.at(Protocol::WebSocket, "/").is_none());
        assert_eq!(router.routes().count(), 2);
    }

    #[test]
    fn invalid_route_path() {
        let result = Router::builder().route(HttpRoute::new("/post/{id}{slug}")).build();

        assert!(matches!(result, Err(RouterBuildError::InvalidPath { ref path, .. }) if path == "/post/{id}{slug}"));
    }
}
