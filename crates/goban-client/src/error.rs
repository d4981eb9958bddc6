//! Error types for the client binary.
//!
//! [`ClientError`] wraps every failure mode of startup and the demo game so
//! `main` can propagate with `?`.

use goban_core::{DbError, SessionError};
use goban_store::StoreError;
use goban_types::{BoardSizeError, CoordParseError};

use crate::config::ConfigError;

/// Top-level error for the client binary.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The configured board size is out of range.
    #[error("board size error: {source}")]
    BoardSize {
        /// The underlying size error.
        #[from]
        source: BoardSizeError,
    },

    /// A scripted move is not a goban key.
    #[error("demo move error: {source}")]
    Move {
        /// The underlying parse error.
        #[from]
        source: CoordParseError,
    },

    /// The store rejected a request.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// A game database operation failed.
    #[error("database error: {source}")]
    Db {
        /// The underlying adapter error.
        #[from]
        source: DbError,
    },

    /// A session stopped with an error.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: SessionError,
    },

    /// A session task panicked or was cancelled.
    #[error("session task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// A demo player never got a seat.
    #[error("{client} was not seated within {waited_ms} ms")]
    NotSeated {
        /// Which demo client.
        client: &'static str,
        /// How long the demo waited.
        waited_ms: u64,
    },
}
