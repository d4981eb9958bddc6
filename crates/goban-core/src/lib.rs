//! Game database adapter and session controller for Goban Sync.
//!
//! The adapter ([`db`]) turns the realtime store into game operations:
//! create and list games, set and remove stones, claim player slots, pass
//! the turn token, and listen to game paths as typed streams. The session
//! controller ([`session`]) drives one client through a game: it joins a
//! free slot, relays clicks to writes, and mirrors remote changes into a
//! [`GameView`].
//!
//! # Flow
//!
//! ```text
//! UiEvent --> GameSession --> GameRef write --> store
//!                 ^                               |
//!                 +------ EventStream <-----------+
//!                 |
//!                 +--> GameView
//! ```
//!
//! # Modules
//!
//! - [`db`] -- Database adapter ([`GameDb`], [`GameRef`], [`EventStream`])
//! - [`state`] -- Playing-state machine and turn tokens
//! - [`board`] -- Local mirror of the remote goban
//! - [`view`] -- Output seam for UIs
//! - [`session`] -- The session controller
//! - [`error`] -- Shared error types

pub mod board;
pub mod db;
pub mod error;
pub mod session;
pub mod state;
pub mod view;

// Re-export primary types for convenience.
pub use board::{BoardMirror, MoveIntent};
pub use db::{EventStream, GameDb, GameRef, RECENT_GAMES_LIMIT, SlotClaim};
pub use error::{DbError, SessionError};
pub use session::{GameSession, SessionConfig, SessionSummary, UiEvent};
pub use state::{PlayingState, TurnTokens};
pub use view::{GameView, NoOpView, Presence, RecordingView, ViewUpdate};
