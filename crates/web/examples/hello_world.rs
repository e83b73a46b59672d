//! Drives a router through an in-process gateway.
//!
//! Each simulated client gets its own pair of channels, pushes its messages
//! and prints what the application answered.

use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use micro_gateway::connection::Connection;
use micro_gateway::protocol::{Message, Scope};
use micro_gateway::response::{ContentResponse, MessageResponse};
use micro_web::Router;
use micro_web::endpoint::{EndpointError, http_endpoint_fn, websocket_endpoint_fn};
use micro_web::route::{HttpRoute, WebSocketRoute};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Deserialize)]
struct NewPost {
    title: String,
}

#[derive(Debug, Serialize)]
struct Created<'a> {
    id: &'a str,
    title: String,
}

fn router() -> Router {
    let index = HttpRoute::new("/").get(http_endpoint_fn(|connection, _request| {
        async move {
            connection.send_response(ContentResponse::html("<h1>Hello World!</h1>")).await?;
            Ok::<_, EndpointError>(())
        }
        .boxed()
    }));

    let post = HttpRoute::new("/post/{id}").put(http_endpoint_fn(|connection, request| {
        async move {
            let mut body = request.body().cloned().unwrap_or_default().to_vec();
            if request.more_body() {
                body.extend_from_slice(&connection.get_requests_body().await?);
            }
            let post: NewPost = serde_json::from_slice(&body)?;

            let id = connection.core().path_params().get("id").unwrap_or_default().to_owned();
            let mut response = ContentResponse::builder()
                .status(http::StatusCode::CREATED)
                .header("Server", "micro-web")
                .json(&Created { id: &id, title: post.title })?;
            response.add_cookie("last_post", &id);

            connection.send_response(response).await?;
            Ok::<_, EndpointError>(())
        }
        .boxed()
    }));

    let echo = WebSocketRoute::new("/echo").on_connect(websocket_endpoint_fn(|connection, _request| {
        async move {
            connection.accept_connection(None, vec![]).await?;
            loop {
                let request = connection.receive_request().await?;
                if request.kind() == "disconnect" {
                    return Ok::<_, EndpointError>(());
                }
                let text = request.text().unwrap_or_default().to_owned();
                connection.send_response(MessageResponse::text(text)).await?;
            }
        }
        .boxed()
    }));

    match Router::builder().route(index).route(post).route(echo).build() {
        Ok(router) => router,
        Err(e) => panic!("invalid routes: {e}"),
    }
}

async fn run_client(router: Arc<Router>, scope: Scope, messages: Vec<Message>) {
    let label = format!("{} {}", scope.get_method().unwrap_or("WS"), scope.get_path().unwrap_or_default());
    let (client_tx, app_rx) = mpsc::channel::<Message>(16);
    let (app_tx, mut client_rx) = mpsc::channel::<Message>(16);

    let handle = tokio::spawn(async move { router.call(scope, app_rx, app_tx).await });

    for message in messages {
        if client_tx.send(message).await.is_err() {
            error!(client = %label, "application went away");
            break;
        }
    }

    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(cause = %e, client = %label, "connection failed"),
        Err(e) => error!(cause = %e, client = %label, "task panicked"),
    }

    while let Some(message) = client_rx.recv().await {
        info!(client = %label, message = ?message, "received");
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Arc::new(router());
    let request = |body: &'static str, more_body| Message::HttpRequest { body: Bytes::from(body), more_body };

    run_client(Arc::clone(&router), Scope::http("GET", "/").header("host", "localhost"), vec![request("", false)]).await;
    run_client(
        Arc::clone(&router),
        Scope::http("PUT", "/post/1").header("content-type", "application/json"),
        vec![request(r#"{"title":"#, true), request(r#""Hello"}"#, false)],
    )
    .await;
    run_client(Arc::clone(&router), Scope::http("DELETE", "/"), vec![request("", false)]).await;
    run_client(Arc::clone(&router), Scope::http("GET", "/unknown"), vec![request("", false)]).await;
    run_client(
        Arc::clone(&router),
        Scope::websocket("/echo"),
        vec![
            Message::WebSocketConnect,
            Message::WebSocketReceive { bytes: None, text: Some("ping".into()) },
            Message::WebSocketReceive { bytes: None, text: Some("pong".into()) },
            Message::WebSocketDisconnect { code: Some(1000) },
        ],
    )
    .await;
}
