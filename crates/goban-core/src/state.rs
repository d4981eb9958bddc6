//! Session state machine.
//!
//! ```text
//! Watching --begin_join(p)--> Joining(p) --resolve_join(true)--> Playing(p)
//!                                  |
//!                                  +-----resolve_join(false)---> Watching
//! ```
//!
//! Transitions consume the current state and return the next one, so the
//! assigned player only ever lives inside the state value.

use goban_types::{PlayerNum, StoneColor};

/// Where this client stands in a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayingState {
    /// Observing; no slot claimed.
    #[default]
    Watching,
    /// A claim on the slot is in flight.
    Joining(PlayerNum),
    /// This client owns the slot.
    Playing(PlayerNum),
}

impl PlayingState {
    /// Start claiming `player`. Only valid from `Watching`; any other state
    /// is returned unchanged.
    #[must_use]
    pub const fn begin_join(self, player: PlayerNum) -> Self {
        match self {
            Self::Watching => Self::Joining(player),
            other => other,
        }
    }

    /// Finish a claim started by [`begin_join`](Self::begin_join).
    #[must_use]
    pub const fn resolve_join(self, committed: bool) -> Self {
        match self {
            Self::Joining(player) if committed => Self::Playing(player),
            Self::Joining(_) => Self::Watching,
            other => other,
        }
    }

    /// The claimed or owned slot, if any.
    pub const fn player(self) -> Option<PlayerNum> {
        match self {
            Self::Watching => None,
            Self::Joining(player) | Self::Playing(player) => Some(player),
        }
    }

    /// Stone color of the owned slot.
    pub const fn color(self) -> Option<StoneColor> {
        match self.playing_as() {
            Some(player) => Some(player.color()),
            None => None,
        }
    }

    /// Whether no claim is held or in flight.
    pub const fn is_watching(self) -> bool {
        matches!(self, Self::Watching)
    }

    /// The owned slot, only once the claim has committed.
    pub const fn playing_as(self) -> Option<PlayerNum> {
        match self {
            Self::Playing(player) => Some(player),
            Self::Watching | Self::Joining(_) => None,
        }
    }
}

impl core::fmt::Display for PlayingState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Watching => f.write_str("watching"),
            Self::Joining(player) => write!(f, "joining as player {player}"),
            Self::Playing(player) => write!(f, "playing as player {player}"),
        }
    }
}

/// Last known token flags for both slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnTokens {
    zero: bool,
    one: bool,
}

impl TurnTokens {
    /// Nobody holds the token.
    pub const fn new() -> Self {
        Self {
            zero: false,
            one: false,
        }
    }

    /// Record whether `player` holds the token.
    pub const fn set(&mut self, player: PlayerNum, held: bool) {
        match player {
            PlayerNum::Zero => self.zero = held,
            PlayerNum::One => self.one = held,
        }
    }

    /// Whether `player` holds the token.
    pub const fn holds(self, player: PlayerNum) -> bool {
        match player {
            PlayerNum::Zero => self.zero,
            PlayerNum::One => self.one,
        }
    }

    /// The player whose turn it is. `None` unless exactly one holds it.
    pub const fn holder(self) -> Option<PlayerNum> {
        match (self.zero, self.one) {
            (true, false) => Some(PlayerNum::Zero),
            (false, true) => Some(PlayerNum::One),
            _ => None,
        }
    }
}
