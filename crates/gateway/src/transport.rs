//! The receive/send primitives supplied by the gateway.
//!
//! A connection exclusively owns one [`MessageReceiver`] and one
//! [`MessageSender`] for its whole lifetime. Both are assumed reliable and
//! ordered; a primitive that can no longer deliver reports a [`TransportError`].
//!
//! Channel halves from `tokio::sync::mpsc` implement both traits, which is how
//! an in-process gateway (or a test) drives a connection.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::{Message, TransportError};

/// Pulls the next pending message from the gateway.
#[async_trait]
pub trait MessageReceiver: Send {
    async fn receive(&mut self) -> Result<Message, TransportError>;
}

/// Hands one message to the gateway.
#[async_trait]
pub trait MessageSender: Send {
    async fn send(&mut self, message: Message) -> Result<(), TransportError>;
}

#[async_trait]
impl MessageReceiver for mpsc::Receiver<Message> {
    async fn receive(&mut self) -> Result<Message, TransportError> {
        self.recv().await.ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl MessageReceiver for mpsc::UnboundedReceiver<Message> {
    async fn receive(&mut self) -> Result<Message, TransportError> {
        self.recv().await.ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl MessageSender for mpsc::Sender<Message> {
    async fn send(&mut self, message: Message) -> Result<(), TransportError> {
        mpsc::Sender::send(self, message).await.map_err(|_e| TransportError::Closed)
    }
}

#[async_trait]
impl MessageSender for mpsc::UnboundedSender<Message> {
    async fn send(&mut self, message: Message) -> Result<(), TransportError> {
        mpsc::UnboundedSender::send(self, message).map_err(|_e| TransportError::Closed)
    }
}
