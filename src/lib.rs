//! # Huddle
//!
//! Realtime fan-out hub over WebSocket. Clients send typed actions; a single
//! dispatcher decides who hears about each one, in arrival order.
//!
//! ## Modules
//!
//! - [`websocket`]: the hub itself (registry, readers, dispatcher, broadcast)
//! - [`api`]: HTTP shell with Axum (upgrade route, server push, health)
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use huddle::websocket::{ActionEvent, ActionKind, ConnectionId, Hub, HubConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The dispatcher runs on its own task until every handle is dropped
//!     let (hub, dispatcher) = Hub::start(HubConfig::default());
//!
//!     hub.submit(ActionEvent::left(ConnectionId::new(1), "amy")).await?;
//!
//!     drop(hub);
//!     dispatcher.await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod websocket;

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{
    websocket_handler, ActionEvent, ActionKind, ClientMessage, ClientSink, ConnectionId,
    Dispatcher, Hub, HubConfig, HubError, Notification, NotificationKind, Registry,
};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig};
