//! Race-start countdown timer for Raceline.
//!
//! Drives the timed transition of a room from waiting to racing. The
//! sequence is fixed: one numbered tick per second counting down from
//! `start_from`, the terminal GO marker in the same instant as the final
//! `1`, and a `Started` phase one grace second later.
//!
//! ```text
//! t+1s  Tick(5)
//! t+2s  Tick(4)
//! t+3s  Tick(3)
//! t+4s  Tick(2)
//! t+5s  Tick(1)
//! t+5s  Go
//! t+6s  Started
//! ```
//!
//! # Integration
//!
//! The timer itself is pure timing — it knows nothing about rooms or
//! broadcasts. The server drives it from a spawned task, re-checking room
//! existence on every phase:
//!
//! ```ignore
//! let mut timer = CountdownTimer::new(CountdownConfig::default());
//! while let Some(phase) = timer.next_phase().await {
//!     let Some(room) = directory.get(&code) else { break };
//!     broadcast(room, phase);
//! }
//! ```
//!
//! The spawned task's [`CountdownHandle`] is owned by the room, so tearing
//! the room down aborts any countdown still in flight.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the countdown sequence.
#[derive(Debug, Clone)]
pub struct CountdownConfig {
    /// First announced tick value. Counts down to 1.
    pub start_from: u32,
    /// Delay before each numbered tick.
    pub interval: Duration,
    /// Delay between GO and the final `Started` phase.
    pub go_grace: Duration,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            start_from: 5,
            interval: Duration::from_secs(1),
            go_grace: Duration::from_secs(1),
        }
    }
}

impl CountdownConfig {
    /// Maximum supported starting tick.
    pub const MAX_START_FROM: u32 = 10;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`CountdownTimer::new`]. `start_from` is
    /// forced into `1..=MAX_START_FROM`.
    pub fn validated(mut self) -> Self {
        if self.start_from == 0 {
            warn!("countdown start_from of 0 — clamping to 1");
            self.start_from = 1;
        }
        if self.start_from > Self::MAX_START_FROM {
            warn!(
                start_from = self.start_from,
                max = Self::MAX_START_FROM,
                "countdown start_from exceeds maximum — clamping"
            );
            self.start_from = Self::MAX_START_FROM;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// One step of the countdown sequence, yielded by
/// [`CountdownTimer::next_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    /// A numbered announcement (`start_from` down to 1).
    Tick(u32),
    /// The terminal GO marker. Fires in the same instant as `Tick(1)`;
    /// the room flips to racing on this phase.
    Go,
    /// The race is fully underway (one grace period after GO).
    Started,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

enum Stage {
    Ticking(u32),
    Go,
    Grace,
    Done,
}

/// Yields the countdown phases at their scheduled times.
///
/// One timer per race start. The timer is not re-entrant and cannot be
/// restarted; create a new one for a new race.
pub struct CountdownTimer {
    config: CountdownConfig,
    stage: Stage,
}

impl CountdownTimer {
    /// Creates a timer ready to count down from `config.start_from`.
    pub fn new(config: CountdownConfig) -> Self {
        let config = config.validated();
        debug!(
            start_from = config.start_from,
            interval_ms = config.interval.as_millis() as u64,
            "countdown timer created"
        );
        Self {
            stage: Stage::Ticking(config.start_from),
            config,
        }
    }

    /// Waits for and returns the next phase, or `None` after `Started`.
    ///
    /// Numbered ticks each wait one `interval`; `Go` resolves immediately
    /// after the final tick; `Started` waits the grace period.
    pub async fn next_phase(&mut self) -> Option<CountdownPhase> {
        match self.stage {
            Stage::Ticking(n) => {
                time::sleep(self.config.interval).await;
                self.stage = if n == 1 {
                    Stage::Go
                } else {
                    Stage::Ticking(n - 1)
                };
                Some(CountdownPhase::Tick(n))
            }
            Stage::Go => {
                self.stage = Stage::Grace;
                Some(CountdownPhase::Go)
            }
            Stage::Grace => {
                time::sleep(self.config.go_grace).await;
                self.stage = Stage::Done;
                Some(CountdownPhase::Started)
            }
            Stage::Done => None,
        }
    }

    /// Returns `true` once the full sequence has been yielded.
    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owning handle to a spawned countdown task.
///
/// Held by the room that started the countdown. Dropping the handle (room
/// teardown) aborts the task, so a countdown can never outlive its room.
/// There is no explicit cancel path besides that — a running countdown
/// completes naturally.
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Wraps the join handle of a spawned countdown task.
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
