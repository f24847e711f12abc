//! Hub error types
//!
//! Transport errors end a single connection, protocol errors end a single
//! message, hub errors are reported back to the connection-ingress layer.

use thiserror::Error;

/// Errors surfaced by the [`Hub`](super::Hub) handle
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    /// The dispatcher is gone, nothing can be queued anymore
    #[error("Hub is shut down")]
    Closed,
}

/// Failure writing to a single client connection
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Write timed out after {0} ms")]
    Timeout(u64),
}

/// A client message that could not be turned into an action
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown action: {0:?}")]
    UnknownAction(String),
}
