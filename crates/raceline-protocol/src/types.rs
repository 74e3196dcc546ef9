//! Core data types carried inside wire events.

use std::fmt;

use raceline_transport::ConnectionId;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Maximum accepted chat message length (characters). Longer messages are
/// silently dropped, never truncated.
pub const MAX_CHAT_LEN: usize = 100;

/// Maximum accepted display-name length. Longer names are cut at this
/// boundary; empty or missing names fall back to `"Driver {n}"`.
pub const MAX_NAME_LEN: usize = 24;

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// A short, human-shareable room invite code.
///
/// Normally 6 characters from `A-Z0-9` (8 under the collision fallback).
/// Comparison is case-insensitive: codes are normalized to uppercase both
/// when generated and when parsed off the wire, so a client may type
/// `ab12cd` and still land in `AB12CD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a code, normalizing to uppercase.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Manual impl so codes coming off the wire are normalized on parse.
impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(RoomCode::new(raw))
    }
}

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// A position or rotation in world space. Relayed verbatim between
/// clients; the server never simulates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player as seen on the wire: identity, appearance, and race progress.
///
/// Owned exclusively by the player's `Room`; rosters are serialized into
/// `joined-room`, `room-update`, and `player-left` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// The owning connection's identifier.
    pub id: ConnectionId,
    /// Display name shown to other players.
    pub name: String,
    /// 24-bit RGB color, assigned at join.
    pub color: u32,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
    /// Completed lap count.
    #[serde(default)]
    pub lap: u32,
    /// Progress through the current lap, in `[0, 1]`.
    #[serde(default)]
    pub progress: f32,
    #[serde(default)]
    pub nitro_count: u32,
}

impl Player {
    /// Creates a player with default race progress.
    pub fn new(id: ConnectionId, name: String, color: u32) -> Self {
        Self {
            id,
            name,
            color,
            position: Vec3::default(),
            rotation: Vec3::default(),
            lap: 0,
            progress: 0.0,
            nitro_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// CountdownValue
// ---------------------------------------------------------------------------

/// One countdown announcement: a numeric tick or the terminal GO marker.
///
/// The wire format mirrors the original client contract exactly — ticks
/// are bare numbers (`5`, `4`, …, `1`) and the terminal marker is the
/// string `"GO!"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownValue {
    /// Seconds remaining before the start.
    Tick(u32),
    /// The race begins now.
    Go,
}

impl Serialize for CountdownValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Tick(n) => serializer.serialize_u32(*n),
            Self::Go => serializer.serialize_str("GO!"),
        }
    }
}

impl<'de> Deserialize<'de> for CountdownValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = CountdownValue;

            fn expecting(
                &self,
                f: &mut fmt::Formatter<'_>,
            ) -> fmt::Result {
                f.write_str("a countdown number or the string \"GO!\"")
            }

            fn visit_u64<E: de::Error>(
                self,
                v: u64,
            ) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(CountdownValue::Tick)
                    .map_err(|_| E::custom("countdown tick out of range"))
            }

            fn visit_str<E: de::Error>(
                self,
                v: &str,
            ) -> Result<Self::Value, E> {
                if v == "GO!" {
                    Ok(CountdownValue::Go)
                } else {
                    Err(E::custom("unknown countdown marker"))
                }
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
