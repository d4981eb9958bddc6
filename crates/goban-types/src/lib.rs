//! Shared type definitions for Goban Sync.
//!
//! This crate is the single source of truth for the values that cross the
//! boundary between the realtime store and the game client: identifiers,
//! board coordinates, stone colors, player slots, and the store path layout.
//! Types flow downstream to `TypeScript` via `ts-rs` for the web board.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for game identifiers
//! - [`enums`] -- Stone colors and player slots
//! - [`coord`] -- Board coordinates, board size, and goban map keys
//! - [`paths`] -- Store path layout under the `games` root
//! - [`structs`] -- Records read back from the store

pub mod coord;
pub mod enums;
pub mod ids;
pub mod paths;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use coord::{BoardSize, BoardSizeError, Coord, CoordParseError};
pub use enums::{PlayerNum, StoneColor, StoneColorParseError};
pub use ids::GameId;
pub use paths::{GAMES_ROOT, GamePaths};
pub use structs::GameSummary;

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the web board.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        let _ = crate::ids::GameId::export_all();
        let _ = crate::enums::StoneColor::export_all();
        let _ = crate::coord::Coord::export_all();
        let _ = crate::structs::GameSummary::export_all();
    }
}
