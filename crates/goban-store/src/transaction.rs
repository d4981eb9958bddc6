//! Transaction decisions and outcomes.
//!
//! A transaction reads the current value at one path and decides, inside the
//! backend, what to write. No other request is applied between the read and
//! the write, so two clients racing on the same path cannot both see the
//! same prior value and commit.

use serde_json::Value;

use crate::snapshot::Snapshot;

/// What a transaction's update function wants done.
#[derive(Debug, Clone, PartialEq)]
pub enum TxDecision {
    /// Leave the value as it is and report `committed: false`.
    Abort,
    /// Write this value (`null` removes the location).
    Set(Value),
}

/// The outcome of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResult {
    /// Whether the update function's value was written.
    pub committed: bool,
    /// The value at the path after the transaction.
    pub snapshot: Snapshot,
    /// The value the update function saw (`None` when absent).
    pub prior: Option<Value>,
}
