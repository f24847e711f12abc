//! Data Transfer Objects
//!
//! Request and response bodies for the HTTP endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Form or JSON body for `POST /ws/send`
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Text pushed to every connected client
    #[serde(default)]
    pub payload: String,
    /// Passed through as the notification's `message_type`
    #[serde(default)]
    pub message_type: Option<String>,
}

/// Response for `POST /ws/send`
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub queued: bool,
    /// Connections admitted when the push was queued
    pub connections: usize,
}

/// Response for `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Admitted WebSocket connections
    pub connections: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    pub started_at: DateTime<Utc>,
    /// Application version
    pub version: String,
}
