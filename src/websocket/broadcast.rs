//! Broadcast
//!
//! Fans one notification out over a snapshot of the registry. A recipient
//! whose write fails is closed and evicted; delivery to the rest continues.

use std::time::Duration;

use super::error::TransportError;
use super::messages::Notification;
use super::registry::Registry;
use super::sink::{ClientSink, ConnectionId};

/// Outcome of one fan-out
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub evicted: Vec<ConnectionId>,
}

/// Write `notification` to every live connection it is addressed to
pub async fn send(
    registry: &mut Registry,
    notification: &Notification,
    write_timeout: Duration,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for id in registry.live_connections() {
        if !notification.is_for(id) {
            continue;
        }
        match send_to(registry, id, notification, write_timeout).await {
            Ok(true) => report.delivered += 1,
            Ok(false) => {}
            Err(_) => report.evicted.push(id),
        }
    }

    tracing::debug!(
        action = %notification.kind,
        delivered = report.delivered,
        evicted = report.evicted.len(),
        skip_origin = notification.skip_origin,
        "Broadcast notification"
    );

    report
}

/// Write `notification` to a single connection, evicting it on failure.
///
/// Returns `Ok(false)` if the connection is not in the registry.
pub async fn send_to(
    registry: &mut Registry,
    id: ConnectionId,
    notification: &Notification,
    write_timeout: Duration,
) -> Result<bool, TransportError> {
    let Some(sink) = registry.sink_mut(id) else {
        return Ok(false);
    };

    match write(sink.as_mut(), notification, write_timeout).await {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::warn!(
                connection_id = %id,
                action = %notification.kind,
                error = %e,
                "WebSocket write failed, evicting connection"
            );
            let _ = tokio::time::timeout(write_timeout, sink.close()).await;
            registry.remove(id);
            Err(e)
        }
    }
}

async fn write(
    sink: &mut dyn ClientSink,
    notification: &Notification,
    write_timeout: Duration,
) -> Result<(), TransportError> {
    match tokio::time::timeout(write_timeout, sink.send(notification)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(timeout_millis(write_timeout))),
    }
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
