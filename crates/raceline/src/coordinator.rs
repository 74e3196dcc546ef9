//! The coordinator: every room operation, expressed as a state mutation
//! plus a batch of `(Recipient, ServerEvent)` pairs to fan out.
//!
//! All mutable session state lives behind one async mutex. Handlers lock
//! it, mutate, build their outbound batch, deliver it to the per-connection
//! channels, and release — no socket I/O ever happens under the lock, so
//! a slow client can never stall an operation.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use raceline_countdown::{
    CountdownConfig, CountdownHandle, CountdownPhase, CountdownTimer,
};
use raceline_protocol::{
    ClientEvent, ConnectionId, CountdownValue, Player, Recipient, RoomCode,
    ServerEvent, Vec3, MAX_CHAT_LEN,
};
use raceline_room::{
    ConnectionRegistry, EventSender, RaceState, Removal, RoomDirectory,
};

/// An outbound batch: events paired with who should receive them.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// Current time as epoch milliseconds, the timestamp unit of the wire
/// protocol.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owns the room directory and connection registry and applies every
/// session operation against them.
///
/// Methods that react to client events return the [`Outbound`] batch they
/// produced; the caller passes it to [`deliver`](Self::deliver). Keeping
/// mutation and fan-out as separate steps makes every operation testable
/// without sockets.
#[derive(Default)]
pub struct Coordinator {
    directory: RoomDirectory,
    registry: ConnectionRegistry,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly accepted connection and returns its greeting.
    pub fn connect(&mut self, id: ConnectionId, sender: EventSender) -> Outbound {
        self.registry.register(id, sender);
        vec![(
            Recipient::Connection(id),
            ServerEvent::Connected {
                connection_id: id,
                server_time: now_ms(),
            },
        )]
    }

    /// Creates a room with the sender as host.
    ///
    /// A connection can only be in one room, so creating while already in
    /// a room leaves the old room first (with the usual departure
    /// broadcasts to its survivors).
    pub fn create_room(
        &mut self,
        id: ConnectionId,
        name: Option<String>,
    ) -> Outbound {
        let mut batch = self.leave_current_room(id);

        let room = self.directory.create_room(id, name);
        let code = room.code().clone();
        let host = room.players()[0].clone();
        self.registry.set_room(id, code.clone());

        batch.push((
            Recipient::Connection(id),
            ServerEvent::RoomCreated {
                room_code: code,
                player_id: id,
                player_name: host.name,
                color: host.color,
                is_host: true,
            },
        ));
        batch
    }

    /// Joins the sender to an existing room by code.
    ///
    /// On failure the sender gets an `error` event and nobody else sees
    /// anything. Like [`create_room`](Self::create_room), this leaves any
    /// current room first.
    pub fn join_room(
        &mut self,
        id: ConnectionId,
        code: RoomCode,
        name: Option<String>,
    ) -> Outbound {
        let mut batch = self.leave_current_room(id);

        match self.directory.join(&code, id, name) {
            Ok(player) => {
                self.registry.set_room(id, code.clone());
                let players = self.roster(&code);

                batch.push((
                    Recipient::Connection(id),
                    ServerEvent::JoinedRoom {
                        room_code: code.clone(),
                        player_id: id,
                        players: players.clone(),
                        is_host: false,
                    },
                ));
                batch.push((
                    Recipient::RoomExcept(code.clone(), id),
                    ServerEvent::PlayerJoined {
                        player_id: id,
                        player_name: player.name,
                        color: player.color,
                    },
                ));
                batch.push((
                    Recipient::Room(code),
                    ServerEvent::RoomUpdate {
                        player_count: players.len(),
                        players,
                    },
                ));
            }
            Err(err) => {
                debug!(%id, %code, error = %err, "join rejected");
                batch.push((
                    Recipient::Connection(id),
                    ServerEvent::Error {
                        message: err.to_string(),
                    },
                ));
            }
        }
        batch
    }

    /// Flips the sender's room into countdown, if it was waiting.
    ///
    /// Returns the room code when a countdown task should be spawned. A
    /// sender outside any room, or a room already counting down or racing,
    /// yields `None` and no events — `start-race` is idempotent noise
    /// after the first one.
    pub fn begin_race(&mut self, id: ConnectionId) -> Option<(RoomCode, Outbound)> {
        let code = self.registry.room_of(id)?.clone();
        let room = self.directory.get_mut(&code)?;
        if !room.begin_countdown() {
            debug!(%id, %code, state = %room.state(), "start-race ignored");
            return None;
        }

        info!(%code, starter = %id, "race countdown starting");
        let batch = vec![(Recipient::Room(code.clone()), ServerEvent::RaceStarting)];
        Some((code, batch))
    }

    /// Attaches a spawned countdown task to its room.
    pub fn attach_countdown(&mut self, code: &RoomCode, handle: CountdownHandle) {
        if let Some(room) = self.directory.get_mut(code) {
            room.set_countdown(handle);
        }
    }

    /// Applies one countdown phase to a room and broadcasts it.
    ///
    /// Returns `false` if the room no longer exists, telling the countdown
    /// task to stop.
    pub fn countdown_phase(
        &mut self,
        code: &RoomCode,
        phase: CountdownPhase,
    ) -> bool {
        let event = {
            let Some(room) = self.directory.get_mut(code) else {
                debug!(%code, "room gone mid-countdown");
                return false;
            };
            match phase {
                CountdownPhase::Tick(n) => ServerEvent::Countdown {
                    value: CountdownValue::Tick(n),
                },
                CountdownPhase::Go => {
                    room.begin_racing(now_ms());
                    ServerEvent::Countdown {
                        value: CountdownValue::Go,
                    }
                }
                CountdownPhase::Started => {
                    info!(%code, "race started");
                    ServerEvent::RaceStarted
                }
            }
        };
        self.deliver(vec![(Recipient::Room(code.clone()), event)]);
        true
    }

    /// Records a position relay and forwards it to everyone else in the
    /// sender's room. Never echoed back to the sender.
    pub fn update_position(
        &mut self,
        id: ConnectionId,
        position: Vec3,
        rotation: Vec3,
        lap: u32,
        progress: f32,
    ) -> Outbound {
        let Some(code) = self.registry.room_of(id).cloned() else {
            return Vec::new();
        };
        let Some(room) = self.directory.get_mut(&code) else {
            return Vec::new();
        };
        if !room.apply_update(id, position, rotation, lap, progress) {
            return Vec::new();
        }

        // Relay the stored (clamped) values, not the raw input.
        let Some(player) = room.player(id) else {
            return Vec::new();
        };
        vec![(
            Recipient::RoomExcept(code, id),
            ServerEvent::PlayerUpdate {
                player_id: id,
                position: player.position,
                rotation: player.rotation,
                lap: player.lap,
                progress: player.progress,
            },
        )]
    }

    /// Echoes a chat line to the sender's whole room, stamped with the
    /// server clock. Over-length messages are dropped without feedback.
    pub fn chat(&mut self, id: ConnectionId, message: &str) -> Outbound {
        let Some(code) = self.registry.room_of(id).cloned() else {
            return Vec::new();
        };
        // The length bound applies to the raw input; trimming only shapes
        // what gets echoed.
        if message.chars().count() > MAX_CHAT_LEN {
            debug!(%id, len = message.chars().count(), "chat message too long, dropped");
            return Vec::new();
        }
        let message = message.trim();
        if message.is_empty() {
            return Vec::new();
        }
        let Some(player) = self.directory.get(&code).and_then(|r| r.player(id))
        else {
            return Vec::new();
        };

        vec![(
            Recipient::Room(code),
            ServerEvent::ChatMessage {
                player_name: player.name.clone(),
                message: message.to_string(),
                timestamp: now_ms(),
            },
        )]
    }

    /// Answers an application-level ping.
    pub fn ping(&self, id: ConnectionId) -> Outbound {
        vec![(
            Recipient::Connection(id),
            ServerEvent::Pong {
                server_time: now_ms(),
            },
        )]
    }

    /// Tears down a connection: unregisters it and removes it from its
    /// room, notifying the survivors (if any).
    pub fn disconnect(&mut self, id: ConnectionId) -> Outbound {
        let Some(code) = self.registry.unregister(id) else {
            return Vec::new();
        };
        self.departure_events(&code, id)
    }

    /// Resolves recipients against the live roster and hands each event to
    /// the matching per-connection channels.
    pub fn deliver(&self, batch: Outbound) {
        for (recipient, event) in batch {
            match recipient {
                Recipient::Connection(id) => self.registry.send(id, event),
                Recipient::Room(code) => {
                    self.fan_out(&code, None, event);
                }
                Recipient::RoomExcept(code, skip) => {
                    self.fan_out(&code, Some(skip), event);
                }
            }
        }
    }

    pub fn room_count(&self) -> usize {
        self.directory.room_count()
    }

    /// Race state of a room, if it exists.
    pub fn room_state(&self, code: &RoomCode) -> Option<RaceState> {
        self.directory.get(code).map(|r| r.state())
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    fn fan_out(
        &self,
        code: &RoomCode,
        skip: Option<ConnectionId>,
        event: ServerEvent,
    ) {
        let Some(room) = self.directory.get(code) else {
            // Room vanished between batch construction and delivery only
            // if the batch itself deleted it; nothing left to notify.
            return;
        };
        for player in room.players() {
            if skip == Some(player.id) {
                continue;
            }
            self.registry.send(player.id, event.clone());
        }
    }

    /// Removes `id` from its current room (registry side is left to the
    /// caller) and returns the departure broadcasts for the survivors.
    fn leave_current_room(&mut self, id: ConnectionId) -> Outbound {
        let Some(code) = self.registry.room_of(id).cloned() else {
            return Vec::new();
        };
        warn!(%id, %code, "leaving current room to enter another");
        self.registry.clear_room(id);
        self.departure_events(&code, id)
    }

    fn departure_events(&mut self, code: &RoomCode, id: ConnectionId) -> Outbound {
        match self.directory.remove_player(code, id) {
            Some(Removal::PlayerRemoved { player, remaining }) => vec![
                (
                    Recipient::Room(code.clone()),
                    ServerEvent::PlayerLeft {
                        player_id: id,
                        player_name: player.name,
                        players: remaining.clone(),
                    },
                ),
                (
                    Recipient::Room(code.clone()),
                    ServerEvent::RoomUpdate {
                        player_count: remaining.len(),
                        players: remaining,
                    },
                ),
            ],
            // Room deleted with the departure, or nothing to remove.
            Some(Removal::RoomDeleted) | None => Vec::new(),
        }
    }

    fn roster(&self, code: &RoomCode) -> Vec<Player> {
        self.directory
            .get(code)
            .map(|r| r.players().to_vec())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Shared state and event dispatch
// ---------------------------------------------------------------------------

/// State shared by every connection task and the HTTP surface.
pub struct SharedState {
    coordinator: Mutex<Coordinator>,
    countdown: CountdownConfig,
    started_at: Instant,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self::with_countdown(CountdownConfig::default())
    }

    /// Overrides the countdown timing (tests use short intervals).
    pub fn with_countdown(countdown: CountdownConfig) -> Self {
        Self {
            coordinator: Mutex::new(Coordinator::new()),
            countdown,
            started_at: Instant::now(),
        }
    }

    pub async fn coordinator(&self) -> tokio::sync::MutexGuard<'_, Coordinator> {
        self.coordinator.lock().await
    }

    /// How long the server has been up.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub async fn room_count(&self) -> usize {
        self.coordinator.lock().await.room_count()
    }
}

/// Applies one decoded client event against the shared state.
pub async fn handle_event(
    shared: &Arc<SharedState>,
    id: ConnectionId,
    event: ClientEvent,
) {
    match event {
        ClientEvent::CreateRoom { name } => {
            let mut c = shared.coordinator.lock().await;
            let batch = c.create_room(id, name);
            c.deliver(batch);
        }
        ClientEvent::JoinRoom { room_code, name } => {
            let mut c = shared.coordinator.lock().await;
            let batch = c.join_room(id, room_code, name);
            c.deliver(batch);
        }
        ClientEvent::StartRace => {
            let mut c = shared.coordinator.lock().await;
            if let Some((code, batch)) = c.begin_race(id) {
                c.deliver(batch);
                let handle = spawn_countdown(Arc::clone(shared), code.clone());
                c.attach_countdown(&code, handle);
            }
        }
        ClientEvent::UpdatePosition {
            position,
            rotation,
            lap,
            progress,
        } => {
            let mut c = shared.coordinator.lock().await;
            let batch = c.update_position(id, position, rotation, lap, progress);
            c.deliver(batch);
        }
        ClientEvent::ChatMessage { message } => {
            let mut c = shared.coordinator.lock().await;
            let batch = c.chat(id, &message);
            c.deliver(batch);
        }
        ClientEvent::Ping => {
            let c = shared.coordinator.lock().await;
            let batch = c.ping(id);
            c.deliver(batch);
        }
    }
}

/// Spawns the countdown task for a room that just entered countdown.
///
/// The task holds no lock across its sleeps; on every phase it re-acquires
/// the coordinator and re-checks that the room still exists, so a room
/// emptied mid-countdown goes quiet instead of ticking into the void.
fn spawn_countdown(shared: Arc<SharedState>, code: RoomCode) -> CountdownHandle {
    let config = shared.countdown.clone();
    let task = tokio::spawn(async move {
        let mut timer = CountdownTimer::new(config);
        while let Some(phase) = timer.next_phase().await {
            let mut c = shared.coordinator.lock().await;
            if !c.countdown_phase(&code, phase) {
                break;
            }
        }
    });
    CountdownHandle::new(task)
}
