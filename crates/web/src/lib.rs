//! Routing and endpoint dispatch for gateway-driven web applications
//!
//! This crate sits on top of `micro-gateway`: the gateway hands every inbound
//! connection to a [`Router`], which creates the connection, picks the first
//! route whose path matches and lets the route dispatch to an endpoint.
//!
//! # Example
//!
//! ```no_run
//! use futures::FutureExt;
//! use micro_gateway::connection::Connection;
//! use micro_gateway::protocol::{Message, Scope};
//! use micro_gateway::response::{ContentResponse, MessageResponse};
//! use micro_web::endpoint::{EndpointError, http_endpoint_fn, websocket_endpoint_fn};
//! use micro_web::route::{HttpRoute, WebSocketRoute};
//! use micro_web::Router;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::builder()
//!         .route(HttpRoute::new("/").get(http_endpoint_fn(|connection, _request| {
//!             async move {
//!                 connection.send_response(ContentResponse::plain_text("Hello World!")).await?;
//!                 Ok::<_, EndpointError>(())
//!             }
//!             .boxed()
//!         })))
//!         .route(WebSocketRoute::new("/echo").on_receive(websocket_endpoint_fn(|connection, request| {
//!             async move {
//!                 let text = request.text().unwrap_or_default().to_owned();
//!                 connection.send_response(MessageResponse::text(text)).await?;
//!                 Ok::<_, EndpointError>(())
//!             }
//!             .boxed()
//!         })))
//!         .build()
//!         .expect("valid route paths");
//!
//!     let (client_tx, app_rx) = mpsc::unbounded_channel::<Message>();
//!     let (app_tx, _client_rx) = mpsc::unbounded_channel::<Message>();
//!     client_tx.send(Message::HttpRequest { body: Default::default(), more_body: false }).ok();
//!
//!     router.call(Scope::http("GET", "/"), app_rx, app_tx).await.expect("known protocol");
//! }
//! ```
//!
//! # Modules
//!
//! - [`endpoint`]: endpoint traits, closure adapters and the default endpoints
//! - [`route`]: HTTP and WebSocket routes
//! - [`router`]: the router and its builder
//!
//! # Failures
//!
//! Routes answer their own failures with a terminal response (`500`, `501` or
//! close code `1011`) and return them. The router logs a failed route and
//! carries on, so a misbehaving endpoint never takes the gateway down.

pub mod endpoint;
pub mod route;
pub mod router;

mod path;

#[cfg(test)]
mod test_support;

pub use path::PathPattern;
pub use route::Route;
pub use route::RouteError;
pub use router::Router;
pub use router::RouterBuildError;
pub use router::RouterBuilder;
