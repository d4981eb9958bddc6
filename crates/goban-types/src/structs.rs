//! Records read back from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::GameId;

/// One entry of the recent-games listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameSummary {
    /// The game's identifier (its push key).
    pub id: GameId,
    /// Lines per side, as stored under `size`.
    pub size: u32,
    /// When the game was created, recovered from the identifier.
    pub created_at: Option<DateTime<Utc>>,
}
