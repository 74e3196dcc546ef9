//! The room directory: code → room, the single source of truth for
//! room existence.

use std::collections::HashMap;

use raceline_protocol::{ConnectionId, Player, RoomCode};

use crate::code::generate_code;
use crate::{Room, RoomError};

/// Outcome of removing a player from a room.
#[derive(Debug)]
pub enum Removal {
    /// The roster emptied; the room was deleted from the directory.
    RoomDeleted,
    /// The player was removed; `remaining` is the surviving roster for
    /// broadcast.
    PlayerRemoved {
        player: Player,
        remaining: Vec<Player>,
    },
}

/// Owns every live room, keyed by invite code.
///
/// Code generation and room insertion happen inside one `&mut self` call,
/// so a generated code can never be observed as free by anyone else
/// before the room lands in the map. A room with zero players is never
/// stored: [`remove_player`](Self::remove_player) deletes it in the same
/// step that empties it.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh code and inserts a new room with `host` as the
    /// sole player. Always succeeds.
    pub fn create_room(
        &mut self,
        host: ConnectionId,
        host_name: Option<String>,
    ) -> &Room {
        let code = generate_code(|c| self.rooms.contains_key(c));
        let room = Room::new(code.clone(), host, host_name);
        tracing::info!(%code, %host, "room created");
        self.rooms.entry(code).or_insert(room)
    }

    /// Looks up a room by code.
    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Looks up a room by code, mutably.
    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Adds a player to the room with the given code.
    ///
    /// Returns a clone of the created player (the roster keeps ownership).
    pub fn join(
        &mut self,
        code: &RoomCode,
        id: ConnectionId,
        name: Option<String>,
    ) -> Result<Player, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let player = room.join(id, name)?;
        Ok(player.clone())
    }

    /// Removes a player from the room, deleting the room if it empties.
    ///
    /// Returns `None` if the room or player doesn't exist.
    pub fn remove_player(
        &mut self,
        code: &RoomCode,
        id: ConnectionId,
    ) -> Option<Removal> {
        let room = self.rooms.get_mut(code)?;
        let player = room.remove(id)?;

        if room.is_empty() {
            // Dropping the room aborts any countdown still in flight.
            self.rooms.remove(code);
            tracing::info!(%code, "room deleted (last player left)");
            return Some(Removal::RoomDeleted);
        }

        let remaining = room.players().to_vec();
        Some(Removal::PlayerRemoved { player, remaining })
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All live codes (unordered).
    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}
