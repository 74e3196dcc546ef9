//! The connection registry: who is connected, where their events go, and
//! which room they're in.

use std::collections::HashMap;

use raceline_protocol::{ConnectionId, RoomCode, ServerEvent};
use tokio::sync::mpsc;

/// Channel sender delivering outbound events to a connection's writer task.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

struct Entry {
    sender: EventSender,
    /// Weak back-reference: relation only, the room owns the player.
    room: Option<RoomCode>,
}

/// Tracks every live connection and its current room membership.
///
/// A connection is in at most ONE room at a time (key invariant). The
/// registry never touches sockets — it hands events to per-connection
/// mpsc channels and silently drops them if the receiver is gone (the
/// connection is tearing down).
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: HashMap<ConnectionId, Entry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection with its outbound sender.
    pub fn register(&mut self, id: ConnectionId, sender: EventSender) {
        self.entries.insert(id, Entry { sender, room: None });
        tracing::debug!(%id, connections = self.entries.len(), "connection registered");
    }

    /// Removes a connection, returning the room it was in (if any).
    pub fn unregister(&mut self, id: ConnectionId) -> Option<RoomCode> {
        let entry = self.entries.remove(&id)?;
        tracing::debug!(%id, connections = self.entries.len(), "connection unregistered");
        entry.room
    }

    /// Records which room a connection belongs to.
    pub fn set_room(&mut self, id: ConnectionId, code: RoomCode) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.room = Some(code);
        }
    }

    /// Clears a connection's room membership without unregistering it.
    pub fn clear_room(&mut self, id: ConnectionId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.room = None;
        }
    }

    /// The room a connection is currently in, if any.
    pub fn room_of(&self, id: ConnectionId) -> Option<&RoomCode> {
        self.entries.get(&id).and_then(|e| e.room.as_ref())
    }

    /// Queues an event for one connection. Silently drops if the
    /// connection is gone or its writer has stopped.
    pub fn send(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(entry) = self.entries.get(&id) {
            let _ = entry.sender.send(event);
        }
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn sender() -> (EventSender, mpsc::UnboundedReceiver<ServerEvent>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_register_and_room_membership() {
        let mut reg = ConnectionRegistry::new();
        let (tx, _rx) = sender();
        reg.register(conn(1), tx);

        assert_eq!(reg.room_of(conn(1)), None);
        reg.set_room(conn(1), RoomCode::new("AB12CD"));
        assert_eq!(reg.room_of(conn(1)), Some(&RoomCode::new("AB12CD")));

        reg.clear_room(conn(1));
        assert_eq!(reg.room_of(conn(1)), None);
    }

    #[test]
    fn test_unregister_returns_room() {
        let mut reg = ConnectionRegistry::new();
        let (tx, _rx) = sender();
        reg.register(conn(1), tx);
        reg.set_room(conn(1), RoomCode::new("AB12CD"));

        assert_eq!(reg.unregister(conn(1)), Some(RoomCode::new("AB12CD")));
        assert_eq!(reg.room_of(conn(1)), None);
        assert_eq!(reg.unregister(conn(1)), None);
    }

    #[test]
    fn test_send_delivers_to_channel() {
        let mut reg = ConnectionRegistry::new();
        let (tx, mut rx) = sender();
        reg.register(conn(1), tx);

        reg.send(conn(1), ServerEvent::RaceStarting);
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::RaceStarting);
    }

    #[test]
    fn test_send_to_unknown_or_closed_is_silent() {
        let mut reg = ConnectionRegistry::new();
        reg.send(conn(9), ServerEvent::RaceStarting); // unknown: no panic

        let (tx, rx) = sender();
        reg.register(conn(1), tx);
        drop(rx);
        reg.send(conn(1), ServerEvent::RaceStarting); // closed: no panic
    }
}
