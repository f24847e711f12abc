//! Connection identities and the write half of a client connection

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::fmt;

use super::error::TransportError;
use super::messages::Notification;

/// Identity of one client connection, assigned by the hub in join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where notifications for one connection are written.
///
/// The registry owns one sink per live connection. A failed `send` is
/// terminal for that connection.
#[async_trait]
pub trait ClientSink: Send {
    async fn send(&mut self, notification: &Notification) -> Result<(), TransportError>;

    /// Best-effort close; secondary errors are swallowed
    async fn close(&mut self);
}

/// Write half of an upgraded axum WebSocket, sending JSON text frames
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn new(inner: SplitSink<WebSocket, Message>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ClientSink for WsSink {
    async fn send(&mut self, notification: &Notification) -> Result<(), TransportError> {
        let text = serde_json::to_string(notification)?;
        self.inner
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Socket(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close().await {
            tracing::trace!(error = %e, "Ignoring error while closing WebSocket");
        }
    }
}
