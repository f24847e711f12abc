//! WebSocket Connection Hub
//!
//! The handle the rest of the process holds. It admits connections, hands
//! out the inbound queue to readers and reports statistics. All state lives
//! in the [`Dispatcher`] that [`Hub::new`] returns alongside it.

use serde::Deserialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::dispatcher::Dispatcher;
use super::error::HubError;
use super::messages::{ActionEvent, Inbound, Notification};
use super::sink::{ClientSink, ConnectionId};

/// Configuration for the connection hub
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Capacity of the shared inbound queue
    #[serde(default = "default_inbound_capacity")]
    pub inbound_capacity: usize,
    /// A write slower than this counts as a failed write
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Text of the notification sent to each new connection
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
}

fn default_max_connections() -> usize {
    1000
}

fn default_inbound_capacity() -> usize {
    256
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_welcome_message() -> String {
    "Connected to server ...".to_string()
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            inbound_capacity: default_inbound_capacity(),
            write_timeout_ms: default_write_timeout_ms(),
            welcome_message: default_welcome_message(),
        }
    }
}

impl HubConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Counters shared between the hub handle and the dispatcher
#[derive(Debug, Default)]
pub struct HubStats {
    connections: AtomicUsize,
}

impl HubStats {
    /// Reserve a connection slot if fewer than `limit` are taken
    pub(crate) fn try_admit(&self, limit: usize) -> bool {
        self.connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            })
            .is_ok()
    }

    pub(crate) fn release(&self, count: usize) {
        let _ = self
            .connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(count))
            });
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Acquire)
    }
}

/// Handle to a running hub. Cheap to share behind an `Arc`.
pub struct Hub {
    inbound: mpsc::Sender<Inbound>,
    stats: Arc<HubStats>,
    next_id: AtomicU64,
    config: HubConfig,
}

impl Hub {
    /// Create a hub and the dispatcher that must be run for it to do anything
    pub fn new(config: HubConfig) -> (Self, Dispatcher) {
        let (tx, rx) = mpsc::channel(config.inbound_capacity.max(1));
        let stats = Arc::new(HubStats::default());
        let dispatcher = Dispatcher::new(rx, Arc::clone(&stats), &config);

        let hub = Self {
            inbound: tx,
            stats,
            next_id: AtomicU64::new(1),
            config,
        };
        (hub, dispatcher)
    }

    /// Create a hub and spawn its dispatcher on the current runtime
    pub fn start(config: HubConfig) -> (Arc<Self>, JoinHandle<()>) {
        let (hub, dispatcher) = Self::new(config);
        let handle = tokio::spawn(dispatcher.run());
        (Arc::new(hub), handle)
    }

    /// Admit a freshly upgraded connection.
    ///
    /// The dispatcher adds it to the registry and sends the welcome
    /// notification. Start the connection's reader after this returns.
    /// A connection over the limit gets an error frame and is closed.
    pub async fn connect(&self, mut sink: Box<dyn ClientSink>) -> Result<ConnectionId, HubError> {
        if !self.stats.try_admit(self.config.max_connections) {
            let err = HubError::TooManyConnections(self.config.max_connections);
            if let Err(e) = sink.send(&Notification::error(err.to_string())).await {
                tracing::trace!(error = %e, "Failed to send rejection to WebSocket client");
            }
            sink.close().await;
            return Err(err);
        }

        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        if self.inbound.send(Inbound::Register { id, sink }).await.is_err() {
            self.stats.release(1);
            return Err(HubError::Closed);
        }

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Sender for a connection's reader
    pub fn inbound(&self) -> mpsc::Sender<Inbound> {
        self.inbound.clone()
    }

    /// Queue an action as if a client had sent it
    pub async fn submit(&self, event: ActionEvent) -> Result<(), HubError> {
        self.inbound
            .send(Inbound::Action(event))
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Queue a server-side notification for every connection it addresses
    pub async fn publish(&self, notification: Notification) -> Result<(), HubError> {
        self.inbound
            .send(Inbound::Publish(notification))
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Whether the dispatcher is still consuming the inbound queue
    pub fn is_running(&self) -> bool {
        !self.inbound.is_closed()
    }

    /// Number of admitted connections
    pub fn connection_count(&self) -> usize {
        self.stats.connections()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }
}
