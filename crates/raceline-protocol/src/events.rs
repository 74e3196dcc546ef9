//! Named events exchanged over a connection, and broadcast routing.
//!
//! Every WebSocket text frame carries exactly one event, tagged by a
//! kebab-case `type` field with camelCase payload keys — the shape the
//! original racing client already speaks:
//!
//! ```json
//! { "type": "join-room", "roomCode": "AB12CD", "name": "Bob" }
//! { "type": "room-update", "playerCount": 2, "players": [ ... ] }
//! ```
//!
//! Unknown `type` tags fail to decode; the server ignores such frames
//! rather than rejecting the connection.

use raceline_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::types::{CountdownValue, Player, RoomCode, Vec3};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new room and become its host.
    CreateRoom {
        #[serde(default)]
        name: Option<String>,
    },

    /// Join an existing room by invite code.
    JoinRoom {
        room_code: RoomCode,
        #[serde(default)]
        name: Option<String>,
    },

    /// Start the countdown. Any room member may send this.
    StartRace,

    /// Per-tick state relay. Fire-and-forget, no acknowledgment.
    UpdatePosition {
        #[serde(default)]
        position: Vec3,
        #[serde(default)]
        rotation: Vec3,
        #[serde(default)]
        lap: u32,
        #[serde(default)]
        progress: f32,
    },

    /// Room-scoped chat.
    ChatMessage { message: String },

    /// Application-level keep-alive; answered with [`ServerEvent::Pong`].
    Ping,
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Greeting sent immediately after the connection is accepted.
    Connected {
        connection_id: ConnectionId,
        server_time: u64,
    },

    /// Reply to `create-room`, sent to the creator only.
    RoomCreated {
        room_code: RoomCode,
        player_id: ConnectionId,
        player_name: String,
        color: u32,
        is_host: bool,
    },

    /// Reply to `join-room`, sent to the joiner only. Carries the full
    /// roster in join order (first entry is the host).
    JoinedRoom {
        room_code: RoomCode,
        player_id: ConnectionId,
        players: Vec<Player>,
        is_host: bool,
    },

    /// A new player appeared; sent to everyone already in the room.
    PlayerJoined {
        player_id: ConnectionId,
        player_name: String,
        color: u32,
    },

    /// Room-wide roster snapshot, sent to all members after any change.
    RoomUpdate {
        player_count: usize,
        players: Vec<Player>,
    },

    /// The countdown is about to begin.
    RaceStarting,

    /// One countdown announcement (`5`..`1`, then `"GO!"`).
    Countdown { value: CountdownValue },

    /// The race is underway (fires one grace second after GO).
    RaceStarted,

    /// Another player's position relay. Never echoed to its sender.
    PlayerUpdate {
        player_id: ConnectionId,
        position: Vec3,
        rotation: Vec3,
        lap: u32,
        progress: f32,
    },

    /// Chat echo with the server-side timestamp (epoch ms).
    ChatMessage {
        player_name: String,
        message: String,
        timestamp: u64,
    },

    /// A player disconnected; sent to the survivors.
    PlayerLeft {
        player_id: ConnectionId,
        player_name: String,
        players: Vec<Player>,
    },

    /// Reply to `ping` (epoch ms).
    Pong { server_time: u64 },

    /// A request failed; sent to the originating connection only.
    Error { message: String },
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Specifies which connections receive an outbound event.
///
/// Room operations return `(Recipient, ServerEvent)` pairs; the dispatcher
/// resolves each recipient against the current roster and fans the event
/// out to the matching per-connection senders.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    /// The originating connection only (acks, errors).
    Connection(ConnectionId),

    /// Every current member of the room, sender included (roster changes,
    /// countdown ticks, chat echoes, room-wide snapshots).
    Room(RoomCode),

    /// Every member except the given connection (position relays, join
    /// notices to "the others").
    RoomExcept(RoomCode, ConnectionId),
}
