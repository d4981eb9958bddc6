//! Enumeration types for Goban Sync.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Stone colors
// ---------------------------------------------------------------------------

/// Color of a stone on the goban.
///
/// Stored in the goban map as the upper-case strings `"BLACK"` and
/// `"WHITE"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum StoneColor {
    /// Played by player 0.
    Black,
    /// Played by player 1.
    White,
}

impl StoneColor {
    /// The string written to the store for this color.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "BLACK",
            Self::White => "WHITE",
        }
    }

    /// The other color.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

impl core::fmt::Display for StoneColor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A goban value that is not a known stone color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stone color: {0:?}")]
pub struct StoneColorParseError(pub String);

impl core::str::FromStr for StoneColor {
    type Err = StoneColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BLACK" => Ok(Self::Black),
            "WHITE" => Ok(Self::White),
            other => Err(StoneColorParseError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Player slots
// ---------------------------------------------------------------------------

/// One of the two player slots of a game.
///
/// Slots are addressed in store paths as `players/0` and `players/1`.
/// Player 0 plays black and player 1 plays white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerNum {
    /// The first slot (black).
    Zero,
    /// The second slot (white).
    One,
}

impl PlayerNum {
    /// Both slots, in path order.
    pub const ALL: [Self; 2] = [Self::Zero, Self::One];

    /// Numeric index of the slot (0 or 1).
    pub const fn index(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Slot for a numeric index, if it is 0 or 1.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }

    /// The path segment naming this slot.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
        }
    }

    /// The opposing slot.
    pub const fn partner(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// The stone color this slot plays.
    pub const fn color(self) -> StoneColor {
        match self {
            Self::Zero => StoneColor::Black,
            Self::One => StoneColor::White,
        }
    }
}

impl core::fmt::Display for PlayerNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}
