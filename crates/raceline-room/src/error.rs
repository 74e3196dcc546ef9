//! Error types for the room layer.
//!
//! Every variant is reported to the originating connection only, as an
//! `error` event carrying the `Display` message. None of them ever affect
//! other rooms or crash the process.

use raceline_protocol::{ConnectionId, RoomCode};

use crate::room::MAX_PLAYERS;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this code exists (or it was already deleted).
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The roster is at capacity.
    #[error("room {0} is full (max {MAX_PLAYERS} players)")]
    Full(RoomCode),

    /// The connection is already on this room's roster.
    #[error("connection {1} is already in room {0}")]
    AlreadyInRoom(RoomCode, ConnectionId),
}
