//! Routes: a path bound to the endpoints of one protocol.
//!
//! - [`HttpRoute`] dispatches on the request method
//! - [`WebSocketRoute`] dispatches on the type of the received message
//!
//! A route answers a failure with a terminal response of its protocol
//! (`500`/`501` for HTTP, close code `1011` for WebSocket) and then returns the
//! failure to its caller.

use micro_gateway::connection::{AnyConnection, Connection};
use micro_gateway::protocol::{ConnectionError, Protocol};
use micro_gateway::response::Response;
use thiserror::Error;
use tracing::warn;

use crate::endpoint::EndpointError;

mod http_route;
mod websocket_route;

pub use http_route::HttpRoute;
pub use websocket_route::WebSocketEvent;
pub use websocket_route::WebSocketRoute;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("connection error: {source}")]
    Connection {
        #[from]
        source: ConnectionError,
    },

    #[error("no endpoint found for {name:?}")]
    EndpointNotFound { name: String },

    #[error("endpoint failed: {source}")]
    Endpoint { source: EndpointError },
}

impl RouteError {
    pub fn endpoint_not_found<S: ToString>(name: S) -> Self {
        Self::EndpointNotFound { name: name.to_string() }
    }

    pub fn endpoint(source: EndpointError) -> Self {
        Self::Endpoint { source }
    }
}

/// A route of any protocol.
#[derive(Debug)]
pub enum Route {
    Http(HttpRoute),
    WebSocket(WebSocketRoute),
}

impl Route {
    pub fn path(&self) -> &str {
        match self {
            Route::Http(route) => route.path(),
            Route::WebSocket(route) => route.path(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Route::Http(_) => Protocol::Http,
            Route::WebSocket(_) => Protocol::WebSocket,
        }
    }

    /// Dispatches the connection to the route.
    ///
    /// Fails with [`ConnectionError::ProtocolMismatch`] when the connection
    /// protocol differs from the route protocol, nothing is sent in that case.
    pub async fn call(&self, connection: &mut AnyConnection) -> Result<(), RouteError> {
        match (self, connection) {
            (Route::Http(route), AnyConnection::Http(connection)) => route.call(connection).await,
            (Route::WebSocket(route), AnyConnection::WebSocket(connection)) => route.call(connection).await,
            (route, connection) => Err(ConnectionError::protocol_mismatch(route.protocol(), connection.protocol()).into()),
        }
    }
}

impl From<HttpRoute> for Route {
    fn from(route: HttpRoute) -> Self {
        Route::Http(route)
    }
}

impl From<WebSocketRoute> for Route {
    fn from(route: WebSocketRoute) -> Self {
        Route::WebSocket(route)
    }
}

/// Sends a terminal response after a failure, a send failure is only logged.
async fn send_terminal_response<C, R>(connection: &mut C, response: R)
where
    C: Connection,
    R: Response + 'static,
{
    if let Err(e) = connection.send_response(response).await {
        warn!(cause = %e, "failed to send terminal response");
    }
}
