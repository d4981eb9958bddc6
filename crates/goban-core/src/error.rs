//! Error types for the adapter and the session controller.

use goban_store::StoreError;
use goban_types::{BoardSizeError, GameId};

/// Errors from game database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store rejected or could not serve the request.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored board size is out of range.
    #[error("invalid board size: {0}")]
    BoardSize(#[from] BoardSizeError),

    /// No game exists under the identifier.
    #[error("game {0} does not exist")]
    GameNotFound(GameId),

    /// A key under `games` is not a game identifier.
    #[error("invalid game key {key:?}: {source}")]
    InvalidGameKey {
        /// The offending key.
        key: String,
        /// Why it failed to parse.
        source: uuid::Error,
    },
}

/// Errors that stop a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A game database operation failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying adapter error.
        #[from]
        source: DbError,
    },
}

impl From<StoreError> for SessionError {
    fn from(source: StoreError) -> Self {
        Self::Db {
            source: DbError::Store(source),
        }
    }
}
