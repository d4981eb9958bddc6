//! Realtime tree store for Goban Sync.
//!
//! The game client talks to a hosted realtime database: a single JSON tree
//! addressed by slash-separated paths, with push-notified listeners, atomic
//! single-path transactions, and operations that the server runs when a
//! client disconnects. This crate provides that contract in-process so the
//! client can run and be tested without the hosted service.
//!
//! # Architecture
//!
//! ```text
//! Connection (per client) --requests--> backend task (owns the tree)
//!      ^                                     |
//!      +------ Subscription <---events-------+
//! ```
//!
//! One backend task serializes every request from every connection, so each
//! listener observes changes in the order they were applied. Replies travel
//! back on oneshot channels; listener events on unbounded channels.
//!
//! # Modules
//!
//! - [`path`] -- Validated store paths
//! - [`snapshot`] -- Point-in-time reads delivered to callers
//! - [`event`] -- Listener event kinds
//! - [`query`] -- Key-ordered limits on listened children
//! - [`rules`] -- Read/write access rules
//! - [`transaction`] -- Transaction decisions and outcomes
//! - [`connection`] -- Database handle, client connections, pending writes
//! - [`subscription`] -- Cancellable listener streams
//! - [`error`] -- Shared error types

mod backend;
pub mod connection;
pub mod error;
pub mod event;
pub mod path;
pub mod query;
pub mod rules;
pub mod snapshot;
pub mod subscription;
pub mod transaction;
mod tree;

// Re-export primary types for convenience.
pub use connection::{
    AuthData, Connection, ConnectionId, MemoryDatabase, OnDisconnect, PendingWrite,
};
pub use error::{Operation, StoreError};
pub use event::EventKind;
pub use path::DbPath;
pub use query::Query;
pub use rules::{Access, Rules};
pub use snapshot::Snapshot;
pub use subscription::Subscription;
pub use transaction::{TransactionResult, TxDecision};
