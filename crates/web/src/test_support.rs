use micro_gateway::connection::{HttpConnection, WebSocketConnection};
use micro_gateway::protocol::{Message, Scope};
use tokio::sync::mpsc;

/// The gateway side of an in-memory connection.
pub(crate) struct TestClient {
    pub(crate) tx: mpsc::UnboundedSender<Message>,
    pub(crate) rx: mpsc::UnboundedReceiver<Message>,
}

impl TestClient {
    pub(crate) fn push(&self, message: Message) {
        self.tx.send(message).unwrap();
    }

    /// Drains every message the application sent so far.
    pub(crate) fn sent(&mut self) -> Vec<Message> {
        let mut messages = vec![];
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub(crate) fn channels() -> (mpsc::UnboundedReceiver<Message>, mpsc::UnboundedSender<Message>, TestClient) {
    let (client_tx, app_rx) = mpsc::unbounded_channel();
    let (app_tx, client_rx) = mpsc::unbounded_channel();
    (app_rx, app_tx, TestClient { tx: client_tx, rx: client_rx })
}

pub(crate) fn http_connection(scope: Scope) -> (HttpConnection, TestClient) {
    let (rx, tx, client) = channels();
    (HttpConnection::new(scope, rx, tx).unwrap(), client)
}

pub(crate) fn websocket_connection(scope: Scope) -> (WebSocketConnection, TestClient) {
    let (rx, tx, client) = channels();
    (WebSocketConnection::new(scope, rx, tx).unwrap(), client)
}
