//! WebSocket Fan-Out Hub
//!
//! Clients hold a WebSocket open, send typed actions and receive the
//! notifications those actions cause.
//!
//! ## Architecture
//!
//! - **Hub**: handle that admits connections and owns the inbound queue sender
//! - **Ingress**: one reader per connection, decoding frames into action events
//! - **Dispatcher**: the single loop that owns the registry and applies events
//!   in arrival order
//! - **Registry**: live connections and their display names
//! - **Broadcast**: fan-out of one notification, evicting dead connections
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8080/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({action: 'username', username: 'amy'}));
//!   ws.send(JSON.stringify({action: 'broadcast', username: 'amy', message: 'hi'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.action === 'list_users') console.log(msg.connected_users);
//! };
//! ```

mod broadcast;
mod dispatcher;
mod error;
mod handler;
mod hub;
mod ingress;
mod messages;
mod registry;
mod sink;

pub use broadcast::BroadcastReport;
pub use dispatcher::Dispatcher;
pub use error::{HubError, ProtocolError, TransportError};
pub use handler::websocket_handler;
pub use hub::{Hub, HubConfig, HubStats};
pub use ingress::{run_reader, ReaderExit};
pub use messages::{
    ActionEvent, ActionKind, ClientMessage, Inbound, Notification, NotificationKind,
};
pub use registry::{ClientEntry, Registry};
pub use sink::{ClientSink, ConnectionId, WsSink};

#[cfg(test)]
pub(crate) use sink::testing;
