//! Local mirror of a game's goban.

use std::collections::BTreeMap;

use goban_types::{BoardSize, Coord, StoneColor};

/// What a click on a cell should do for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIntent {
    /// Put a stone of this color on the cell.
    Place(StoneColor),
    /// Take the opponent's stone off the cell.
    Remove,
}

/// Stones currently known to be on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardMirror {
    size: BoardSize,
    stones: BTreeMap<Coord, StoneColor>,
}

impl BoardMirror {
    /// An empty board.
    pub const fn new(size: BoardSize) -> Self {
        Self {
            size,
            stones: BTreeMap::new(),
        }
    }

    /// Board dimensions.
    pub const fn size(&self) -> BoardSize {
        self.size
    }

    /// The stone at `coord`.
    pub fn get(&self, coord: Coord) -> Option<StoneColor> {
        self.stones.get(&coord).copied()
    }

    /// Record a stone. Returns whether the cell changed.
    pub fn set(&mut self, coord: Coord, color: StoneColor) -> bool {
        self.stones.insert(coord, color) != Some(color)
    }

    /// Clear a cell, returning the stone that was there.
    pub fn remove(&mut self, coord: Coord) -> Option<StoneColor> {
        self.stones.remove(&coord)
    }

    /// Number of stones.
    pub fn len(&self) -> usize {
        self.stones.len()
    }

    /// Whether the board has no stones.
    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    /// All stones, ordered by column then row.
    pub fn stones(&self) -> impl Iterator<Item = (Coord, StoneColor)> + '_ {
        self.stones.iter().map(|(coord, color)| (*coord, *color))
    }

    /// Decide what clicking `coord` means for a player of color `mine`.
    ///
    /// A cell holding the other color is cleared; anything else gets a
    /// stone of `mine`.
    pub fn move_intent(&self, coord: Coord, mine: StoneColor) -> MoveIntent {
        match self.get(coord) {
            Some(color) if color != mine => MoveIntent::Remove,
            _ => MoveIntent::Place(mine),
        }
    }
}

impl core::fmt::Display for BoardMirror {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let size = self.size.get();
        for y in 0..size {
            for x in 0..size {
                let cell = match self.get(Coord::new(x, y)) {
                    Some(StoneColor::Black) => 'X',
                    Some(StoneColor::White) => 'O',
                    None => '.',
                };
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
