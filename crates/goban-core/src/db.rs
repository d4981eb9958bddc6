//! Game database adapter.
//!
//! [`GameDb`] wraps one store [`Connection`] with lobby operations and the
//! generic `on`/`once`/`read_or_init` helpers. [`GameRef`] scopes the same
//! connection to a single game and knows its path layout (see
//! [`goban_types::paths`]).
//!
//! Both turn-token operations run as one transaction on the game's
//! `players` node, so giving up the token and handing it to the partner is
//! a single atomic write.

use goban_store::{
    Connection, EventKind, PendingWrite, Query, Snapshot, StoreError, Subscription, TxDecision,
};
use goban_types::{
    BoardSize, Coord, GAMES_ROOT, GameId, GamePaths, GameSummary, PlayerNum, StoneColor,
};
use serde_json::{Map, Value, json};
use tracing::{debug, error, info, warn};

use crate::error::DbError;

/// How many games [`GameDb::recent_games`] lists.
pub const RECENT_GAMES_LIMIT: usize = 5;

/// Log a failed read the way every adapter read reports it.
fn log_read_error(err: &StoreError, path: &str, kind: EventKind) {
    if matches!(err, StoreError::AccessDenied { .. }) {
        error!(path, event = %kind, error = %err, "access denied attempting to read database");
    } else {
        warn!(path, event = %kind, error = %err, "database read failed");
    }
}

// =============================================================================
// Event streams
// =============================================================================

/// A continuous stream of snapshots for one path and event kind.
///
/// Errors are logged before they are yielded; the stream ends after an
/// error. Dropping or [cancelling](Self::cancel) it detaches the listener.
#[derive(Debug)]
pub struct EventStream {
    inner: Subscription,
    path: String,
}

impl EventStream {
    /// Wait for the next snapshot. `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<Snapshot, DbError>> {
        let item = self.inner.recv().await?;
        Some(item.map_err(|err| {
            log_read_error(&err, &self.path, self.inner.kind());
            DbError::Store(err)
        }))
    }

    /// The listened path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The listened event kind.
    pub const fn kind(&self) -> EventKind {
        self.inner.kind()
    }

    /// Stop listening.
    pub fn cancel(self) {
        self.inner.cancel();
    }
}

// =============================================================================
// Lobby-level adapter
// =============================================================================

/// Game operations over one store connection.
#[derive(Debug, Clone)]
pub struct GameDb {
    conn: Connection,
}

impl GameDb {
    /// Wrap a connection.
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// The underlying connection.
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Scope the adapter to one game.
    pub fn game(&self, id: GameId) -> GameRef {
        GameRef {
            db: self.clone(),
            id,
            paths: GamePaths::new(id),
        }
    }

    /// Create a game of the given size and return its identifier.
    pub async fn create_game(&self, size: BoardSize) -> Result<GameId, DbError> {
        let (key, write) = self.conn.push(GAMES_ROOT, json!({ "size": size.get() }))?;
        write.wait().await?;
        let id = GameId::parse(&key).map_err(|source| DbError::InvalidGameKey { key, source })?;
        info!(game = %id, size = size.get(), "game created");
        Ok(id)
    }

    /// The most recently created games, oldest first, at most
    /// [`RECENT_GAMES_LIMIT`].
    ///
    /// Entries whose key or size cannot be read are skipped.
    pub async fn recent_games(&self) -> Result<Vec<GameSummary>, DbError> {
        let query = Query::all().limit_to_last(RECENT_GAMES_LIMIT);
        let games = self
            .conn
            .once_query(GAMES_ROOT, EventKind::Value, query)
            .await
            .inspect_err(|err| log_read_error(err, GAMES_ROOT, EventKind::Value))?;

        let mut summaries = Vec::new();
        for game in games.children() {
            let key = game.key().unwrap_or_default();
            let Ok(id) = GameId::parse(key) else {
                warn!(key, "skipping game with malformed key");
                continue;
            };
            match game.child("size").val::<u32>() {
                Ok(Some(size)) => summaries.push(GameSummary {
                    id,
                    size,
                    created_at: id.created_at(),
                }),
                Ok(None) => warn!(game = %id, "skipping game without a size"),
                Err(err) => warn!(game = %id, error = %err, "skipping game with unreadable size"),
            }
        }
        Ok(summaries)
    }

    /// Listen for `kind` events at `path`.
    pub fn on(&self, path: &str, kind: EventKind) -> Result<EventStream, DbError> {
        let inner = self.conn.on(path, kind)?;
        Ok(EventStream {
            inner,
            path: path.to_owned(),
        })
    }

    /// Resolve with exactly one `kind` snapshot at `path`.
    pub async fn once(&self, path: &str, kind: EventKind) -> Result<Snapshot, DbError> {
        self.conn
            .once(path, kind)
            .await
            .inspect_err(|err| log_read_error(err, path, kind))
            .map_err(DbError::from)
    }

    /// Write `initial` at `path` only if nothing is stored there.
    ///
    /// Resolves with the value found before the transaction: `None` means
    /// the path was empty and `initial` was written.
    pub async fn read_or_init(&self, path: &str, initial: Value) -> Result<Option<Value>, DbError> {
        let result = self
            .conn
            .transaction(path, move |prior| match prior {
                None => TxDecision::Set(initial),
                Some(_) => TxDecision::Abort,
            })
            .await?;
        debug!(path, committed = result.committed, "read-or-init finished");
        Ok(result.prior)
    }
}

// =============================================================================
// Game-scoped adapter
// =============================================================================

/// Outcome of trying to claim a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClaim {
    /// The slot that was tried.
    pub player: PlayerNum,
    /// Whether this client now owns the slot.
    pub committed: bool,
}

/// Adapter operations for one game.
#[derive(Debug, Clone)]
pub struct GameRef {
    db: GameDb,
    id: GameId,
    paths: GamePaths,
}

impl GameRef {
    /// The game's identifier.
    pub const fn id(&self) -> GameId {
        self.id
    }

    /// The game's path layout.
    pub const fn paths(&self) -> &GamePaths {
        &self.paths
    }

    /// The lobby-level adapter this game was opened from.
    pub const fn db(&self) -> &GameDb {
        &self.db
    }

    /// The underlying connection.
    pub const fn connection(&self) -> &Connection {
        self.db.connection()
    }

    /// Read the game's board size.
    pub async fn size(&self) -> Result<BoardSize, DbError> {
        let snapshot = self.db.once(&self.paths.size(), EventKind::Value).await?;
        let size = snapshot.val::<u32>()?.ok_or(DbError::GameNotFound(self.id))?;
        Ok(BoardSize::new(size)?)
    }

    /// Put a stone of `color` at `coord`.
    pub fn set_stone(&self, coord: Coord, color: StoneColor) -> PendingWrite {
        debug!(game = %self.id, %coord, %color, "setting stone");
        self.connection()
            .set(&self.paths.stone(coord), Value::String(color.as_str().to_owned()))
    }

    /// Take the stone at `coord` off the board.
    pub fn remove_stone(&self, coord: Coord) -> PendingWrite {
        debug!(game = %self.id, %coord, "removing stone");
        self.connection().remove(&self.paths.stone(coord))
    }

    /// Record a player's score. Fractional scores (komi) are kept as is.
    pub fn set_score(&self, player: PlayerNum, score: f64) -> PendingWrite {
        self.connection().set(&self.paths.score(player), json!(score))
    }

    /// Try to become `player` by setting its `online` flag if it is unset.
    pub async fn claim_slot(&self, player: PlayerNum) -> Result<SlotClaim, DbError> {
        let prior = self
            .db
            .read_or_init(&self.paths.online(player), Value::Bool(true))
            .await?;
        let committed = prior.is_none();
        info!(game = %self.id, %player, committed, "slot claim finished");
        Ok(SlotClaim { player, committed })
    }

    /// Have the store clear `player`'s `online` flag when this connection
    /// closes, so another client can take the slot.
    pub async fn release_slot_on_disconnect(&self, player: PlayerNum) -> Result<(), DbError> {
        self.connection()
            .on_disconnect(&self.paths.online(player))?
            .remove()
            .await?;
        Ok(())
    }

    /// Give `player` the turn token if neither player holds it.
    ///
    /// Returns whether the token was given.
    pub async fn set_token(&self, player: PlayerNum) -> Result<bool, DbError> {
        let result = self
            .connection()
            .transaction(&self.paths.players(), move |players| {
                let mut players = players.cloned().unwrap_or(Value::Null);
                if PlayerNum::ALL.iter().any(|p| holds_token(&players, *p)) {
                    return TxDecision::Abort;
                }
                put_token(&mut players, player, true);
                TxDecision::Set(players)
            })
            .await?;
        debug!(game = %self.id, %player, given = result.committed, "token set");
        Ok(result.committed)
    }

    /// Release `player`'s token and hand it to the partner in one write.
    pub async fn switch_token(&self, player: PlayerNum) -> Result<(), DbError> {
        self.connection()
            .transaction(&self.paths.players(), move |players| {
                let mut players = players.cloned().unwrap_or(Value::Null);
                put_token(&mut players, player, false);
                put_token(&mut players, player.partner(), true);
                TxDecision::Set(players)
            })
            .await?;
        debug!(game = %self.id, from = %player, to = %player.partner(), "token switched");
        Ok(())
    }

    /// Listen for `kind` events at `path`.
    pub fn on(&self, path: &str, kind: EventKind) -> Result<EventStream, DbError> {
        self.db.on(path, kind)
    }
}

/// Whether `player` holds the token in a `players` node value.
pub(crate) fn holds_token(players: &Value, player: PlayerNum) -> bool {
    players
        .get(player.key())
        .and_then(|slot| slot.get("token"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Set or clear `player`'s token inside a `players` node value.
fn put_token(players: &mut Value, player: PlayerNum, held: bool) {
    if !players.is_object() {
        *players = Value::Object(Map::new());
    }
    let Value::Object(slots) = players else {
        return;
    };
    let slot = slots
        .entry(player.key().to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(fields) = slot {
        if held {
            fields.insert("token".to_owned(), Value::Bool(true));
        } else {
            fields.remove("token");
        }
    }
}
