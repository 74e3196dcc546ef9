//! The room entity: one race session and its roster.

use rand::Rng;

use raceline_countdown::CountdownHandle;
use raceline_protocol::{
    ConnectionId, Player, RoomCode, Vec3, MAX_NAME_LEN,
};

use crate::{RaceState, RoomError};

/// Maximum roster size.
pub const MAX_PLAYERS: usize = 8;

/// A logical race session grouping up to [`MAX_PLAYERS`] players.
///
/// The room exclusively owns its `Player`s; everything else in the system
/// refers to them by `ConnectionId`. Roster order is join order, so
/// `players[0]` is the host. A room is only ever reachable through the
/// [`RoomDirectory`](crate::RoomDirectory), which deletes it the moment
/// the roster empties.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    players: Vec<Player>,
    state: RaceState,
    host_id: ConnectionId,
    /// Epoch ms at the GO marker. Set exactly once.
    start_time: Option<u64>,
    /// Handle to the running countdown task, if one was started.
    /// Dropped (and thus aborted) with the room.
    countdown: Option<CountdownHandle>,
}

impl Room {
    /// Creates a room with its host as the sole roster entry.
    pub fn new(
        code: RoomCode,
        host_id: ConnectionId,
        host_name: Option<String>,
    ) -> Self {
        let name = display_name(host_name, 0);
        let host = Player::new(host_id, name, random_color());
        Self {
            code,
            players: vec![host],
            state: RaceState::Waiting,
            host_id,
            start_time: None,
            countdown: None,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    /// The creating connection. Never reassigned, even if the host leaves.
    pub fn host_id(&self) -> ConnectionId {
        self.host_id
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    /// The roster in join order. First entry is the host.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Looks up a member by connection.
    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Appends a new player to the roster.
    pub fn join(
        &mut self,
        id: ConnectionId,
        name: Option<String>,
    ) -> Result<&Player, RoomError> {
        if self.players.iter().any(|p| p.id == id) {
            return Err(RoomError::AlreadyInRoom(self.code.clone(), id));
        }
        if self.is_full() {
            return Err(RoomError::Full(self.code.clone()));
        }

        let name = display_name(name, self.players.len());
        let player = Player::new(id, name, random_color());
        self.players.push(player);

        tracing::info!(
            code = %self.code,
            %id,
            players = self.players.len(),
            "player joined"
        );
        Ok(self.players.last().expect("just pushed"))
    }

    /// Removes a member, returning the removed player.
    pub fn remove(&mut self, id: ConnectionId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == id)?;
        let player = self.players.remove(idx);
        tracing::info!(
            code = %self.code,
            %id,
            players = self.players.len(),
            "player left"
        );
        Some(player)
    }

    /// Applies a position relay to the sender's own player entry.
    ///
    /// `progress` is clamped into `[0, 1]`; the rest is trusted verbatim
    /// (anti-cheat is out of scope). Returns `false` if the connection is
    /// not on the roster.
    pub fn apply_update(
        &mut self,
        id: ConnectionId,
        position: Vec3,
        rotation: Vec3,
        lap: u32,
        progress: f32,
    ) -> bool {
        let Some(player) = self.players.iter_mut().find(|p| p.id == id)
        else {
            return false;
        };
        player.position = position;
        player.rotation = rotation;
        player.lap = lap;
        player.progress = progress.clamp(0.0, 1.0);
        true
    }

    /// Flips `Waiting → Countdown`. Returns `false` (and changes nothing)
    /// in any other state — this is the re-entrancy guard for
    /// `start-race`.
    pub fn begin_countdown(&mut self) -> bool {
        if !self.state.can_start() {
            return false;
        }
        self.state = RaceState::Countdown;
        true
    }

    /// Flips `Countdown → Racing` and records the start time (epoch ms).
    /// Returns `false` if not counting down.
    pub fn begin_racing(&mut self, start_time: u64) -> bool {
        if !self.state.can_transition_to(RaceState::Racing) {
            return false;
        }
        self.state = RaceState::Racing;
        self.start_time = Some(start_time);
        true
    }

    /// Attaches the spawned countdown task to the room.
    pub fn set_countdown(&mut self, handle: CountdownHandle) {
        self.countdown = Some(handle);
    }
}

/// Picks a random 24-bit RGB color for a new player.
fn random_color() -> u32 {
    rand::rng().random_range(0..0x100_0000)
}

/// Resolves the display name for the `n+1`-th roster entry: trimmed and
/// capped at [`MAX_NAME_LEN`] chars, defaulting to `"Driver {n+1}"`.
fn display_name(requested: Option<String>, roster_len: usize) -> String {
    let trimmed = requested
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    match trimmed {
        Some(name) => name.chars().take(MAX_NAME_LEN).collect(),
        None => format!("Driver {}", roster_len + 1),
    }
}
