//! Ingress Reader
//!
//! One reader per connection. Decodes client frames into action events and
//! queues them for the dispatcher. The reader never touches the registry:
//! when its connection dies it queues a synthetic `left` event instead.

use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};
use std::fmt;
use tokio::sync::mpsc;

use super::messages::{ActionEvent, ActionKind, Inbound};
use super::sink::ConnectionId;

/// Why a reader stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// Read error, close frame or end of stream. A synthetic `left` was queued.
    Disconnected,
    /// The client sent an explicit `left` action
    Left,
    /// The dispatcher is gone
    HubClosed,
}

/// Read frames from `stream` until the connection ends.
///
/// Queuing waits for room in the inbound channel, so a slow dispatcher
/// pushes back on readers instead of dropping events.
pub async fn run_reader<S, E>(
    id: ConnectionId,
    mut stream: S,
    inbound: mpsc::Sender<Inbound>,
) -> ReaderExit
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    // Last name this client used, so a synthetic `left` can still name it
    let mut last_name = String::new();

    while let Some(result) = stream.next().await {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "WebSocket receive error");
                break;
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(_) => {
                tracing::debug!(connection_id = %id, "Ignoring binary frame");
                continue;
            }
            // Axum answers pings itself
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => {
                tracing::debug!(connection_id = %id, "Client requested close");
                break;
            }
        };

        let event = match ActionEvent::decode(id, &text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    connection_id = %id,
                    error = %e,
                    text = %text,
                    "Ignoring invalid client message"
                );
                continue;
            }
        };

        if !event.display_name.is_empty() {
            last_name.clone_from(&event.display_name);
        }
        let leaving = event.kind == ActionKind::Left;

        if inbound.send(Inbound::Action(event)).await.is_err() {
            tracing::debug!(connection_id = %id, "Hub closed, stopping reader");
            return ReaderExit::HubClosed;
        }
        if leaving {
            return ReaderExit::Left;
        }
    }

    let _ = inbound
        .send(Inbound::Action(ActionEvent::left(id, last_name)))
        .await;
    ReaderExit::Disconnected
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::time::Duration;

    fn text(json: &str) -> Result<Message, String> {
        Ok(Message::Text(json.to_string()))
    }

    fn drain(rx: &mut mpsc::Receiver<Inbound>) -> Vec<ActionEvent> {
        let mut events = Vec::new();
        while let Ok(item) = rx.try_recv() {
            match item {
                Inbound::Action(event) => events.push(event),
                other => panic!("Unexpected inbound item: {:?}", other),
            }
        }
        events
    }

    #[tokio::test]
    async fn test_forwards_events_in_order_then_synthetic_left() {
        let id = ConnectionId::new(3);
        let (tx, mut rx) = mpsc::channel(16);
        let frames = stream::iter(vec![
            text(r#"{"action": "username", "username": "amy"}"#),
            text(r#"{"action": "broadcast", "username": "amy", "message": "hi"}"#),
            Err("connection reset".to_string()),
        ]);

        let exit = run_reader(id, frames, tx).await;
        assert_eq!(exit, ReaderExit::Disconnected);

        let events = drain(&mut rx);
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::SetName, ActionKind::Broadcast, ActionKind::Left]
        );
        assert!(events.iter().all(|e| e.origin == id));
        assert_eq!(events[2].display_name, "amy");
    }

    #[tokio::test]
    async fn test_invalid_messages_are_skipped() {
        let (tx, mut rx) = mpsc::channel(16);
        let frames = stream::iter(vec![
            text("not json"),
            text(r#"{"action": "dance"}"#),
            Ok(Message::Binary(vec![1, 2, 3])),
            Ok(Message::Ping(vec![])),
            text(r#"{"action": "who", "message": "anyone?"}"#),
        ]);

        run_reader(ConnectionId::new(1), frames, tx).await;

        let kinds: Vec<_> = drain(&mut rx).iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ActionKind::WhoIsHere, ActionKind::Left]);
    }

    #[tokio::test]
    async fn test_explicit_left_stops_without_duplicate() {
        let (tx, mut rx) = mpsc::channel(16);
        let frames = stream::iter(vec![
            text(r#"{"action": "left", "username": "bob"}"#),
            text(r#"{"action": "broadcast", "message": "ignored"}"#),
        ]);

        let exit = run_reader(ConnectionId::new(1), frames, tx).await;
        assert_eq!(exit, ReaderExit::Left);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ActionKind::Left);
        assert_eq!(events[0].display_name, "bob");
    }

    #[tokio::test]
    async fn test_close_frame_ends_reader() {
        let (tx, mut rx) = mpsc::channel(16);
        let frames = stream::iter(vec![
            Ok(Message::Close(None)),
            text(r#"{"action": "broadcast", "message": "never read"}"#),
        ]);

        run_reader(ConnectionId::new(1), frames, tx).await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ActionKind::Left);
    }

    #[tokio::test]
    async fn test_hub_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let frames = stream::iter(vec![text(r#"{"action": "who"}"#)]);

        let exit = run_reader(ConnectionId::new(1), frames, tx).await;
        assert_eq!(exit, ReaderExit::HubClosed);
    }

    #[tokio::test]
    async fn test_full_queue_suspends_reader_without_dropping() {
        let (tx, mut rx) = mpsc::channel(1);
        let frames = stream::iter(vec![
            text(r#"{"action": "alert", "message": "one"}"#),
            text(r#"{"action": "alert", "message": "two"}"#),
            text(r#"{"action": "alert", "message": "three"}"#),
        ]);
        let mut reader = tokio::spawn(run_reader(ConnectionId::new(1), frames, tx));

        // one event fits, the reader waits on the next
        let waited = tokio::time::timeout(Duration::from_millis(50), &mut reader).await;
        assert!(waited.is_err());
        assert!(!reader.is_finished());

        let mut received = Vec::new();
        while let Some(item) = rx.recv().await {
            match item {
                Inbound::Action(event) => received.push((event.kind, event.text)),
                other => panic!("Unexpected inbound item: {:?}", other),
            }
        }

        assert_eq!(
            received,
            vec![
                (ActionKind::Alert, "one".to_string()),
                (ActionKind::Alert, "two".to_string()),
                (ActionKind::Alert, "three".to_string()),
                (ActionKind::Left, String::new()),
            ]
        );
        assert_eq!(reader.await.unwrap(), ReaderExit::Disconnected);
    }
}
