//! WebSocket Message Types
//!
//! Wire formats for client requests and server notifications, plus the
//! internal events that travel through the hub's inbound queue.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ProtocolError;
use super::sink::{ClientSink, ConnectionId};

/// Message sent from a client.
///
/// Every field is optional on the wire; missing fields decode as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientMessage {
    pub action: String,
    pub message: String,
    pub username: String,
    pub message_type: String,
}

/// The kinds of action a client may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Broadcast,
    Alert,
    Entered,
    Left,
    SetName,
    WhoIsHere,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Broadcast => "broadcast",
            ActionKind::Alert => "alert",
            ActionKind::Entered => "entered",
            ActionKind::Left => "left",
            ActionKind::SetName => "username",
            ActionKind::WhoIsHere => "who",
        }
    }
}

impl FromStr for ActionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast" => Ok(ActionKind::Broadcast),
            "alert" => Ok(ActionKind::Alert),
            "entered" => Ok(ActionKind::Entered),
            "left" => Ok(ActionKind::Left),
            "username" => Ok(ActionKind::SetName),
            "who" => Ok(ActionKind::WhoIsHere),
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded client request, stamped with the connection it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub kind: ActionKind,
    pub text: String,
    pub display_name: String,
    pub message_type: String,
    pub origin: ConnectionId,
}

impl ActionEvent {
    /// Build an event from a decoded client message
    pub fn from_client(origin: ConnectionId, message: ClientMessage) -> Result<Self, ProtocolError> {
        let kind = message.action.parse()?;
        Ok(Self {
            kind,
            text: message.message,
            display_name: message.username,
            message_type: message.message_type,
            origin,
        })
    }

    /// Decode a raw text frame into an event
    pub fn decode(origin: ConnectionId, text: &str) -> Result<Self, ProtocolError> {
        let message: ClientMessage = serde_json::from_str(text)?;
        Self::from_client(origin, message)
    }

    /// Synthetic departure, emitted when a connection's reader stops
    pub fn left(origin: ConnectionId, display_name: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Left,
            text: String::new(),
            display_name: display_name.into(),
            message_type: String::new(),
            origin,
        }
    }
}

/// The `action` field of an outbound notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Broadcast,
    Alert,
    List,
    Entered,
    Left,
    ListUsers,
    Connected,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationKind::Broadcast => "broadcast",
            NotificationKind::Alert => "alert",
            NotificationKind::List => "list",
            NotificationKind::Entered => "entered",
            NotificationKind::Left => "left",
            NotificationKind::ListUsers => "list_users",
            NotificationKind::Connected => "connected",
            NotificationKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// Message sent from the server to some subset of connections.
///
/// Only `action`, `message`, `message_type` and `connected_users` go on the
/// wire. `connected_users` is present only for `list_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(rename = "action")]
    pub kind: NotificationKind,
    #[serde(rename = "message")]
    pub text: String,
    pub message_type: String,
    #[serde(skip)]
    pub skip_origin: bool,
    #[serde(skip)]
    pub origin: Option<ConnectionId>,
    #[serde(rename = "connected_users", skip_serializing_if = "Option::is_none")]
    pub user_list: Option<Vec<String>>,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            message_type: String::new(),
            skip_origin: false,
            origin: None,
            user_list: None,
        }
    }

    /// Error frame sent to a single connection
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, text)
    }

    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = message_type.into();
        self
    }

    /// Record the originating connection without skipping it
    pub fn from_origin(mut self, origin: ConnectionId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Deliver to everyone except `origin`
    pub fn skipping(mut self, origin: ConnectionId) -> Self {
        self.origin = Some(origin);
        self.skip_origin = true;
        self
    }

    pub fn users(mut self, users: Vec<String>) -> Self {
        self.user_list = Some(users);
        self
    }

    /// Whether this notification should be written to `connection`
    pub fn is_for(&self, connection: ConnectionId) -> bool {
        !(self.skip_origin && self.origin == Some(connection))
    }
}

/// Everything that travels through the hub's single inbound queue
pub enum Inbound {
    /// A freshly upgraded connection to add to the registry
    Register {
        id: ConnectionId,
        sink: Box<dyn ClientSink>,
    },
    /// A client action, decoded by that connection's reader
    Action(ActionEvent),
    /// A server-side push with no originating connection
    Publish(Notification),
}

impl fmt::Debug for Inbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inbound::Register { id, .. } => f.debug_struct("Register").field("id", id).finish(),
            Inbound::Action(event) => f.debug_tuple("Action").field(event).finish(),
            Inbound::Publish(notification) => f.debug_tuple("Publish").field(notification).finish(),
        }
    }
}
