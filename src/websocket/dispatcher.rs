//! Dispatcher
//!
//! The single serialized loop behind the hub. It is the only writer of the
//! registry and the only caller of broadcast, so every event's notifications
//! reach all recipients before the next event is taken off the queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::broadcast::{self, BroadcastReport};
use super::hub::{HubConfig, HubStats};
use super::messages::{ActionEvent, ActionKind, Inbound, Notification, NotificationKind};
use super::registry::Registry;
use super::sink::{ClientSink, ConnectionId};

const ENTERED_TEXT: &str = "New user in room";

/// Used in the `left` notice when nobody ever gave the connection a name
const UNNAMED: &str = "A guest";

pub struct Dispatcher {
    registry: Registry,
    inbound: mpsc::Receiver<Inbound>,
    stats: Arc<HubStats>,
    welcome_message: String,
    write_timeout: Duration,
}

impl Dispatcher {
    pub(crate) fn new(
        inbound: mpsc::Receiver<Inbound>,
        stats: Arc<HubStats>,
        config: &HubConfig,
    ) -> Self {
        Self {
            registry: Registry::new(),
            inbound,
            stats,
            welcome_message: config.welcome_message.clone(),
            write_timeout: config.write_timeout(),
        }
    }

    /// Process inbound items until every sender is dropped
    pub async fn run(mut self) {
        tracing::info!("Dispatcher started");
        while let Some(item) = self.inbound.recv().await {
            self.handle(item).await;
        }
        tracing::info!(
            connections = self.registry.len(),
            "Inbound queue closed, dispatcher stopped"
        );
    }

    /// Fully process one inbound item, including every write it causes
    pub async fn handle(&mut self, item: Inbound) {
        match item {
            Inbound::Register { id, sink } => self.register(id, sink).await,
            Inbound::Action(event) => {
                let kind = event.kind;
                let origin = event.origin;
                if kind != ActionKind::Left && !self.registry.contains(origin) {
                    tracing::debug!(
                        connection_id = %origin,
                        action = %kind,
                        "Dropping action from a connection that is no longer registered"
                    );
                    return;
                }
                tracing::debug!(connection_id = %origin, action = %kind, "Dispatching action");
                for notification in self.apply(event) {
                    self.broadcast(&notification).await;
                }
            }
            Inbound::Publish(notification) => {
                self.broadcast(&notification).await;
            }
        }
    }

    /// Apply an event to the registry and build the notifications it causes.
    ///
    /// Nothing is written to any connection here.
    pub fn apply(&mut self, event: ActionEvent) -> Vec<Notification> {
        match event.kind {
            ActionKind::Broadcast => {
                let text = format!("{}: {}", event.display_name, event.text);
                vec![Notification::new(NotificationKind::Broadcast, text).from_origin(event.origin)]
            }
            ActionKind::Alert => vec![Notification::new(NotificationKind::Alert, event.text)
                .message_type(event.message_type)
                .from_origin(event.origin)],
            ActionKind::WhoIsHere => {
                vec![Notification::new(NotificationKind::List, event.text).from_origin(event.origin)]
            }
            ActionKind::Entered => {
                vec![Notification::new(NotificationKind::Entered, ENTERED_TEXT).skipping(event.origin)]
            }
            ActionKind::SetName => {
                if !self.registry.set_name(event.origin, event.display_name.as_str()) {
                    tracing::debug!(
                        connection_id = %event.origin,
                        "Name set for a connection that is already gone"
                    );
                }
                vec![self.user_list(event.origin)]
            }
            ActionKind::Left => {
                let name = self
                    .registry
                    .display_name(event.origin)
                    .map(str::to_owned)
                    .or_else(|| Some(event.display_name.clone()).filter(|n| !n.is_empty()))
                    .unwrap_or_else(|| UNNAMED.to_string());

                self.remove(event.origin);
                tracing::info!(connection_id = %event.origin, name = %name, "Client left");

                vec![
                    Notification::new(NotificationKind::Left, format!("{} left", name))
                        .from_origin(event.origin),
                    self.user_list(event.origin),
                ]
            }
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    async fn register(&mut self, id: ConnectionId, sink: Box<dyn ClientSink>) {
        if !self.registry.add(id, sink) {
            tracing::warn!(connection_id = %id, "Connection registered twice, keeping first");
            self.stats.release(1);
            return;
        }

        let welcome = Notification::new(NotificationKind::Connected, self.welcome_message.as_str());
        match broadcast::send_to(&mut self.registry, id, &welcome, self.write_timeout).await {
            Ok(_) => tracing::debug!(
                connection_id = %id,
                connections = self.registry.len(),
                "Connection registered"
            ),
            Err(_) => self.stats.release(1),
        }
    }

    async fn broadcast(&mut self, notification: &Notification) -> BroadcastReport {
        let report = broadcast::send(&mut self.registry, notification, self.write_timeout).await;
        if !report.evicted.is_empty() {
            self.stats.release(report.evicted.len());
        }
        report
    }

    fn remove(&mut self, id: ConnectionId) {
        if self.registry.remove(id).is_some() {
            self.stats.release(1);
        }
    }

    fn user_list(&self, origin: ConnectionId) -> Notification {
        Notification::new(NotificationKind::ListUsers, "")
            .users(self.registry.names_snapshot())
            .from_origin(origin)
    }
}
