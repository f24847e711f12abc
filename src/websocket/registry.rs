//! Connection Registry
//!
//! Live connections and their display names. Owned by the dispatcher, which
//! is the only code that mutates it, so there is no lock here.

use std::collections::BTreeMap;

use super::sink::{ClientSink, ConnectionId};

/// One live connection
pub struct ClientEntry {
    pub sink: Box<dyn ClientSink>,
    /// `None` until the client sets a non-empty name
    pub display_name: Option<String>,
}

/// Mapping from connection to display name and write half
#[derive(Default)]
pub struct Registry {
    clients: BTreeMap<ConnectionId, ClientEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unnamed connection.
    ///
    /// Returns false (and keeps the existing entry) if `id` is already present.
    pub fn add(&mut self, id: ConnectionId, sink: Box<dyn ClientSink>) -> bool {
        if self.clients.contains_key(&id) {
            return false;
        }
        self.clients.insert(
            id,
            ClientEntry {
                sink,
                display_name: None,
            },
        );
        true
    }

    /// Remove a connection; removing an absent one is a no-op
    pub fn remove(&mut self, id: ConnectionId) -> Option<ClientEntry> {
        self.clients.remove(&id)
    }

    /// Set or overwrite a display name. No-op if the connection is gone.
    pub fn set_name(&mut self, id: ConnectionId, name: impl Into<String>) -> bool {
        match self.clients.get_mut(&id) {
            Some(entry) => {
                let name = name.into();
                entry.display_name = if name.is_empty() { None } else { Some(name) };
                true
            }
            None => false,
        }
    }

    pub fn display_name(&self, id: ConnectionId) -> Option<&str> {
        self.clients.get(&id).and_then(|e| e.display_name.as_deref())
    }

    /// All non-empty display names, sorted ascending
    pub fn names_snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clients
            .values()
            .filter_map(|e| e.display_name.clone())
            .collect();
        names.sort();
        names
    }

    /// Point-in-time copy of the live connection ids, safe to iterate while
    /// entries are being removed
    pub fn live_connections(&self) -> Vec<ConnectionId> {
        self.clients.keys().copied().collect()
    }

    pub fn sink_mut(&mut self, id: ConnectionId) -> Option<&mut Box<dyn ClientSink>> {
        self.clients.get_mut(&id).map(|e| &mut e.sink)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
