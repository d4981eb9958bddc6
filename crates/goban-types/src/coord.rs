//! Board coordinates and goban map keys.
//!
//! A stone at `(x, y)` lives under the goban key `"{x}-{y}"`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coord {
    /// Column, starting at 0.
    pub x: u32,
    /// Row, starting at 0.
    pub y: u32,
}

impl Coord {
    /// Create a coordinate.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The goban map key for this coordinate.
    pub fn key(self) -> String {
        format!("{}-{}", self.x, self.y)
    }

    /// Whether the coordinate lies on a board of the given size.
    pub const fn is_within(self, size: BoardSize) -> bool {
        self.x < size.get() && self.y < size.get()
    }
}

impl core::fmt::Display for Coord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.x, self.y)
    }
}

/// A goban key that is not of the form `"{x}-{y}"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid goban key: {0:?}")]
pub struct CoordParseError(pub String);

impl core::str::FromStr for Coord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordParseError(s.to_owned());
        let (x, y) = s.split_once('-').ok_or_else(err)?;
        let x = x.parse().map_err(|_e: core::num::ParseIntError| err())?;
        let y = y.parse().map_err(|_e: core::num::ParseIntError| err())?;
        Ok(Self { x, y })
    }
}

// ---------------------------------------------------------------------------
// Board size
// ---------------------------------------------------------------------------

/// A board size outside the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("board size {0} is outside {min}..={max}", min = BoardSize::MIN, max = BoardSize::MAX)]
pub struct BoardSizeError(pub u32);

/// Number of lines on each side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BoardSize(u32);

impl BoardSize {
    /// Smallest accepted size.
    pub const MIN: u32 = 2;
    /// Largest accepted size.
    pub const MAX: u32 = 25;

    /// Validate a board size.
    ///
    /// # Errors
    ///
    /// Returns [`BoardSizeError`] if `size` is outside [`Self::MIN`]..=[`Self::MAX`].
    pub const fn new(size: u32) -> Result<Self, BoardSizeError> {
        if size >= Self::MIN && size <= Self::MAX {
            Ok(Self(size))
        } else {
            Err(BoardSizeError(size))
        }
    }

    /// Lines per side.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self(9)
    }
}

impl TryFrom<u32> for BoardSize {
    type Error = BoardSizeError;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<BoardSize> for u32 {
    fn from(size: BoardSize) -> Self {
        size.0
    }
}

impl core::fmt::Display for BoardSize {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
