//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Games are keyed in the store by a push key. Push keys are UUID v7
//! strings, so lexicographic key order is creation order and the
//! creation time can be recovered from the identifier itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameId(pub Uuid);

impl GameId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse an identifier from a store push key.
    ///
    /// # Errors
    ///
    /// Returns [`uuid::Error`] if the key is not a UUID.
    pub fn parse(key: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(key).map(Self)
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Creation time embedded in the identifier, if it is a v7 UUID.
    pub fn created_at(self) -> Option<DateTime<Utc>> {
        let (secs, nanos) = self.0.get_timestamp()?.to_unix();
        DateTime::from_timestamp(i64::try_from(secs).ok()?, nanos)
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for GameId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for GameId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<GameId> for Uuid {
    fn from(id: GameId) -> Self {
        id.0
    }
}
