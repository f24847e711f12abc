//! WebSocket Handler
//!
//! Upgrades HTTP requests, hands the write half to the hub and runs the
//! connection's ingress reader on the upgrade task.

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    response::Response,
};
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;

use super::hub::Hub;
use super::ingress::{self, ReaderExit};
use super::sink::WsSink;
use crate::api::AppState;

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub, remote))
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, hub: Arc<Hub>, remote: SocketAddr) {
    let (sender, receiver) = socket.split();

    let connection_id = match hub.connect(Box::new(WsSink::new(sender))).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(remote = %remote, error = %e, "Rejected WebSocket connection");
            return;
        }
    };
    tracing::info!(connection_id = %connection_id, remote = %remote, "Client connected");

    let exit = ingress::run_reader(connection_id, receiver, hub.inbound()).await;
    match exit {
        ReaderExit::Disconnected => {
            tracing::info!(connection_id = %connection_id, "Client disconnected")
        }
        ReaderExit::Left => tracing::info!(connection_id = %connection_id, "Client left"),
        ReaderExit::HubClosed => {
            tracing::debug!(connection_id = %connection_id, "Hub shut down under connection")
        }
    }
}
