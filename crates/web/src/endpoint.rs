//! Endpoints: the application code a route dispatches to.
//!
//! An endpoint receives the connection together with the request that was
//! received for it, and answers through the connection. Endpoints are shared
//! read-only by every connection that hits their route.
//!
//! Plain closures become endpoints through [`http_endpoint_fn`] and
//! [`websocket_endpoint_fn`]:
//!
//! ```
//! use futures::FutureExt;
//! use micro_gateway::connection::Connection;
//! use micro_gateway::response::ContentResponse;
//! use micro_web::endpoint::{EndpointError, http_endpoint_fn};
//! use micro_web::route::HttpRoute;
//!
//! let route = HttpRoute::new("/").get(http_endpoint_fn(|connection, _request| {
//!     async move {
//!         connection.send_response(ContentResponse::plain_text("Hello World!")).await?;
//!         Ok::<_, EndpointError>(())
//!     }
//!     .boxed()
//! }));
//! ```

use std::error::Error;

use async_trait::async_trait;
use futures::future::BoxFuture;
use http::StatusCode;
use micro_gateway::connection::{Connection, HttpConnection, WebSocketConnection};
use micro_gateway::protocol::Request;
use micro_gateway::response::{AcceptResponse, BodyResponse};

/// Any failure raised by application code.
pub type EndpointError = Box<dyn Error + Send + Sync>;

/// Handles one HTTP request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpEndpoint: Send + Sync {
    async fn call(&self, connection: &mut HttpConnection, request: Request) -> Result<(), EndpointError>;
}

/// Handles one WebSocket message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSocketEndpoint: Send + Sync {
    async fn call(&self, connection: &mut WebSocketConnection, request: Request) -> Result<(), EndpointError>;
}

/// An [`HttpEndpoint`] backed by a closure.
pub struct HttpEndpointFn<F> {
    f: F,
}

/// Wraps a closure returning a boxed future as an [`HttpEndpoint`].
pub fn http_endpoint_fn<F>(f: F) -> HttpEndpointFn<F>
where
    F: for<'c> Fn(&'c mut HttpConnection, Request) -> BoxFuture<'c, Result<(), EndpointError>> + Send + Sync,
{
    HttpEndpointFn { f }
}

#[async_trait]
impl<F> HttpEndpoint for HttpEndpointFn<F>
where
    F: for<'c> Fn(&'c mut HttpConnection, Request) -> BoxFuture<'c, Result<(), EndpointError>> + Send + Sync,
{
    async fn call(&self, connection: &mut HttpConnection, request: Request) -> Result<(), EndpointError> {
        (self.f)(connection, request).await
    }
}

/// A [`WebSocketEndpoint`] backed by a closure.
pub struct WebSocketEndpointFn<F> {
    f: F,
}

/// Wraps a closure returning a boxed future as a [`WebSocketEndpoint`].
pub fn websocket_endpoint_fn<F>(f: F) -> WebSocketEndpointFn<F>
where
    F: for<'c> Fn(&'c mut WebSocketConnection, Request) -> BoxFuture<'c, Result<(), EndpointError>> + Send + Sync,
{
    WebSocketEndpointFn { f }
}

#[async_trait]
impl<F> WebSocketEndpoint for WebSocketEndpointFn<F>
where
    F: for<'c> Fn(&'c mut WebSocketConnection, Request) -> BoxFuture<'c, Result<(), EndpointError>> + Send + Sync,
{
    async fn call(&self, connection: &mut WebSocketConnection, request: Request) -> Result<(), EndpointError> {
        (self.f)(connection, request).await
    }
}

/// Answers with `405 Method Not Allowed`, the endpoint of every method a route leaves unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowed;

#[async_trait]
impl HttpEndpoint for MethodNotAllowed {
    async fn call(&self, connection: &mut HttpConnection, _request: Request) -> Result<(), EndpointError> {
        connection.send_response(BodyResponse::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")).await?;
        Ok(())
    }
}

/// Accepts the connection without subprotocol or extra headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptConnection;

#[async_trait]
impl WebSocketEndpoint for AcceptConnection {
    async fn call(&self, connection: &mut WebSocketConnection, _request: Request) -> Result<(), EndpointError> {
        connection.send_response(AcceptResponse::default()).await?;
        Ok(())
    }
}

/// Does nothing with the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreMessage;

#[async_trait]
impl WebSocketEndpoint for IgnoreMessage {
    async fn call(&self, _connection: &mut WebSocketConnection, _request: Request) -> Result<(), EndpointError> {
        Ok(())
    }
}
