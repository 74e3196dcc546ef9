//! Wire protocol for Raceline.
//!
//! This crate defines the "language" that racing clients and the server
//! speak:
//!
//! - **Types** ([`RoomCode`], [`Player`], [`Vec3`], [`CountdownValue`]) —
//!   the data that travels inside events.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) — every named message
//!   in either direction, one JSON object per WebSocket text frame.
//! - **Routing** ([`Recipient`]) — which connections an outbound event is
//!   delivered to (room-inclusive, room-exclusive-self, or a single
//!   connection).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how events are converted
//!   to/from frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer sits between transport (frames) and the room core
//! (rosters, state). It doesn't know about connections or rooms — it only
//! knows how to describe and serialize messages.

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, Recipient, ServerEvent};
pub use types::{
    CountdownValue, Player, RoomCode, Vec3, MAX_CHAT_LEN, MAX_NAME_LEN,
};

// The connection identifier doubles as the player identifier everywhere
// on the wire, so re-export it here.
pub use raceline_transport::ConnectionId;
