//! Error types for the realtime store.
//!
//! All failures surface as [`StoreError`]. A transaction that aborts is not
//! an error: it is reported through
//! [`TransactionResult::committed`](crate::TransactionResult::committed).

use crate::path::DbPath;

/// The kind of access a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Reading or listening.
    Read,
    /// Setting, removing, pushing, or transacting.
    Write,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Errors that can occur when talking to the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store's rules rejected the request.
    #[error("permission denied: {operation} at {path}")]
    AccessDenied {
        /// What was attempted.
        operation: Operation,
        /// Where it was attempted.
        path: DbPath,
    },

    /// A path string could not be parsed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A key inside a written value contains a forbidden character.
    #[error("invalid key {0:?} in written value")]
    InvalidKey(String),

    /// A value could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A snapshot did not hold the expected type.
    #[error("cannot decode value at {path}: {source}")]
    Decode {
        /// Location of the value.
        path: DbPath,
        /// The underlying decode error.
        source: serde_json::Error,
    },

    /// The backend task has shut down.
    #[error("store backend is gone")]
    Disconnected,
}
