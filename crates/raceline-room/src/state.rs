//! The race lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a room.
///
/// Transitions are strictly forward — no skipping, no going back:
///
/// ```text
/// Waiting → Countdown → Racing
/// ```
///
/// - **Waiting**: room exists, players gather, anyone may start the race.
/// - **Countdown**: the start timer is running. Entering this state is
///   what makes a second `start-race` a no-op.
/// - **Racing**: the race is underway (`start_time` is set). Terminal.
///
/// Rooms stay joinable in every state — a late joiner simply spectates
/// from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceState {
    Waiting,
    Countdown,
    Racing,
}

impl RaceState {
    /// Returns `true` if a `start-race` is accepted in this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The next state in the strict forward order, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Countdown),
            Self::Countdown => Some(Self::Racing),
            Self::Racing => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Countdown => write!(f, "countdown"),
            Self::Racing => write!(f, "racing"),
        }
    }
}
