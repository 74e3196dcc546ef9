//! Room lifecycle management for Raceline.
//!
//! This is the coordination core: rooms keyed by shareable code, each
//! owning its player roster and race state, plus the registry that maps
//! connections back to the room they're in.
//!
//! # Key types
//!
//! - [`Room`] — roster, host, and race-progress state for one session
//! - [`RaceState`] — lifecycle state machine (`Waiting → Countdown → Racing`)
//! - [`RoomDirectory`] — the single source of truth for room existence
//! - [`ConnectionRegistry`] — connection → room membership + outbound sender
//! - [`RoomError`] — the error taxonomy surfaced to clients

mod code;
mod directory;
mod error;
mod registry;
mod room;
mod state;

pub use directory::{Removal, RoomDirectory};
pub use error::RoomError;
pub use registry::{ConnectionRegistry, EventSender};
pub use room::{Room, MAX_PLAYERS};
pub use state::RaceState;
