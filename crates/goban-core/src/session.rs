//! The session controller.
//!
//! A [`GameSession`] drives one client through one game. It mirrors the
//! remote goban, scores, turn tokens and partner presence into a
//! [`GameView`], joins the first free player slot once signed in, and
//! turns UI events into adapter writes.
//!
//! Everything runs on a single task: [`GameSession::run`] multiplexes the
//! game's event streams and the UI channel with `tokio::select!`, and the
//! [`PlayingState`] is threaded through the handlers as a value.

use goban_store::{EventKind, Snapshot};
use goban_types::{BoardSize, Coord, GameId, PlayerNum, StoneColor};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::board::{BoardMirror, MoveIntent};
use crate::db::{EventStream, GameRef};
use crate::error::SessionError;
use crate::state::{PlayingState, TurnTokens};
use crate::view::{GameView, Presence};

/// Input from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// A board cell was clicked.
    CellClicked(Coord),
    /// The player passes the turn.
    SkipTurn,
    /// Leave the game.
    Quit,
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the share link; the game id is appended.
    pub share_base_url: String,
}

impl SessionConfig {
    /// The link that opens `game_id`.
    pub fn share_link(&self, game_id: GameId) -> String {
        format!("{}/{game_id}", self.share_base_url.trim_end_matches('/'))
    }
}

/// What a finished session leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// The game that was played.
    pub game_id: GameId,
    /// State when the session ended.
    pub final_state: PlayingState,
    /// Stones on the mirrored board when the session ended.
    pub stones: usize,
}

/// Drives one client through one game.
#[derive(Debug)]
pub struct GameSession<V: GameView> {
    game: GameRef,
    board: BoardMirror,
    config: SessionConfig,
    view: V,
    tokens: TurnTokens,
}

/// Wait for the next snapshot from `slot`.
///
/// When the stream errors or ends the slot is emptied and the future never
/// resolves, so a dead stream simply drops out of the `select!`.
async fn next_snapshot(slot: &mut Option<EventStream>) -> Snapshot {
    if let Some(stream) = slot.as_mut() {
        if let Some(Ok(snapshot)) = stream.next().await {
            return snapshot;
        }
        debug!(path = stream.path(), "event stream ended");
        *slot = None;
    }
    std::future::pending().await
}

impl<V: GameView> GameSession<V> {
    /// A session on a game whose board size is already known.
    pub const fn new(game: GameRef, size: BoardSize, config: SessionConfig, view: V) -> Self {
        Self {
            game,
            board: BoardMirror::new(size),
            config,
            view,
            tokens: TurnTokens::new(),
        }
    }

    /// A session on an existing game, reading its board size first.
    pub async fn open(game: GameRef, config: SessionConfig, view: V) -> Result<Self, SessionError> {
        let size = game.size().await?;
        Ok(Self::new(game, size, config, view))
    }

    /// The mirrored board.
    pub const fn board(&self) -> &BoardMirror {
        &self.board
    }

    /// The game this session plays.
    pub const fn game(&self) -> &GameRef {
        &self.game
    }

    /// Run until the UI channel closes or sends [`UiEvent::Quit`].
    pub async fn run(
        mut self,
        mut ui: mpsc::Receiver<UiEvent>,
    ) -> Result<SessionSummary, SessionError> {
        let game_id = self.game.id();
        let paths = self.game.paths().clone();
        info!(game = %game_id, "session starting");

        self.view.share_link(&self.config.share_link(game_id));

        // Stones already on the board, then every later change.
        let existing = self.game.db().once(&paths.goban(), EventKind::Value).await?;
        for stone in existing.children() {
            self.stone_added(&stone);
        }
        let mut added = Some(self.game.on(&paths.goban(), EventKind::ChildAdded)?);
        let mut removed = Some(self.game.on(&paths.goban(), EventKind::ChildRemoved)?);

        let mut score0 = Some(self.game.on(&paths.score(PlayerNum::Zero), EventKind::Value)?);
        let mut score1 = Some(self.game.on(&paths.score(PlayerNum::One), EventKind::Value)?);
        let mut token0 = Some(self.game.on(&paths.token(PlayerNum::Zero), EventKind::Value)?);
        let mut token1 = Some(self.game.on(&paths.token(PlayerNum::One), EventKind::Value)?);

        // Slots are only contested once signed in.
        let mut auth = self.game.connection().on_auth();
        let mut auth_open = true;
        let mut online0: Option<EventStream> = None;
        let mut online1: Option<EventStream> = None;
        let mut signed_in = auth.borrow_and_update().is_some();
        let mut online_started = false;
        self.view.login_prompt(!signed_in);

        let mut state = PlayingState::Watching;
        self.view.playing_state(state);

        loop {
            if signed_in && !online_started {
                online0 = Some(self.game.on(&paths.online(PlayerNum::Zero), EventKind::Value)?);
                online1 = Some(self.game.on(&paths.online(PlayerNum::One), EventKind::Value)?);
                online_started = true;
            }

            tokio::select! {
                biased;

                changed = auth.changed(), if auth_open => {
                    if changed.is_err() {
                        auth_open = false;
                        continue;
                    }
                    signed_in = auth.borrow_and_update().is_some();
                    debug!(game = %game_id, signed_in, "auth state changed");
                    self.view.login_prompt(!signed_in);
                }
                snapshot = next_snapshot(&mut online0) => {
                    state = self.on_online(state, PlayerNum::Zero, &snapshot).await;
                }
                snapshot = next_snapshot(&mut online1) => {
                    state = self.on_online(state, PlayerNum::One, &snapshot).await;
                }
                snapshot = next_snapshot(&mut added) => self.stone_added(&snapshot),
                snapshot = next_snapshot(&mut removed) => self.stone_removed(&snapshot),
                snapshot = next_snapshot(&mut score0) => {
                    self.on_score(PlayerNum::Zero, &snapshot);
                }
                snapshot = next_snapshot(&mut score1) => {
                    self.on_score(PlayerNum::One, &snapshot);
                }
                snapshot = next_snapshot(&mut token0) => {
                    self.on_token(PlayerNum::Zero, &snapshot);
                }
                snapshot = next_snapshot(&mut token1) => {
                    self.on_token(PlayerNum::One, &snapshot);
                }
                event = ui.recv() => {
                    match event {
                        Some(UiEvent::Quit) | None => break,
                        Some(event) => self.on_ui(state, event).await,
                    }
                }
            }
        }

        info!(game = %game_id, state = %state, stones = self.board.len(), "session finished");
        Ok(SessionSummary {
            game_id,
            final_state: state,
            stones: self.board.len(),
        })
    }

    // =========================================================================
    // Join protocol and presence
    // =========================================================================

    async fn on_online(
        &mut self,
        state: PlayingState,
        player: PlayerNum,
        snapshot: &Snapshot,
    ) -> PlayingState {
        let state = if snapshot.exists() || !state.is_watching() {
            state
        } else {
            self.try_to_join(state, player).await
        };
        if state.player() != Some(player) {
            self.show_presence(Presence::from_online(snapshot.value()));
        }
        state
    }

    async fn try_to_join(&mut self, state: PlayingState, player: PlayerNum) -> PlayingState {
        let state = state.begin_join(player);
        self.view.playing_state(state);

        let committed = match self.game.claim_slot(player).await {
            Ok(claim) => claim.committed,
            Err(err) => {
                warn!(game = %self.game.id(), %player, error = %err, "slot claim failed");
                false
            }
        };
        let state = state.resolve_join(committed);
        if committed {
            self.start_playing(player).await;
        }
        self.view.playing_state(state);
        state
    }

    /// Seat this client. The slot release is queued before anything else
    /// can fail, so a dropped connection always frees the slot.
    async fn start_playing(&mut self, player: PlayerNum) {
        let game = self.game.id();
        info!(%game, %player, "joined game");
        if let Err(err) = self.game.release_slot_on_disconnect(player).await {
            error!(%game, %player, error = %err, "could not queue slot release on disconnect");
        }
        if let Err(err) = self.game.set_token(player).await {
            warn!(%game, %player, error = %err, "could not take the turn token");
        }
        self.view.player_assigned(player);
    }

    fn show_presence(&mut self, presence: Presence) {
        debug!(game = %self.game.id(), presence = presence.label(), "partner presence");
        self.view.presence(presence);
    }

    // =========================================================================
    // Remote changes
    // =========================================================================

    fn stone_added(&mut self, snapshot: &Snapshot) {
        let Some((coord, color)) = self.parse_stone(snapshot) else {
            return;
        };
        if self.board.set(coord, color) {
            self.view.stone_placed(coord, color);
        }
    }

    fn stone_removed(&mut self, snapshot: &Snapshot) {
        let Some(coord) = self.parse_coord(snapshot) else {
            return;
        };
        if self.board.remove(coord).is_some() {
            self.view.stone_removed(coord);
        }
    }

    fn parse_coord(&self, snapshot: &Snapshot) -> Option<Coord> {
        let key = snapshot.key().unwrap_or_default();
        match key.parse::<Coord>() {
            Ok(coord) if coord.is_within(self.board.size()) => Some(coord),
            Ok(coord) => {
                warn!(game = %self.game.id(), %coord, "ignoring stone outside the board");
                None
            }
            Err(err) => {
                warn!(game = %self.game.id(), error = %err, "ignoring malformed goban key");
                None
            }
        }
    }

    fn parse_stone(&self, snapshot: &Snapshot) -> Option<(Coord, StoneColor)> {
        let coord = self.parse_coord(snapshot)?;
        match snapshot.val::<StoneColor>() {
            Ok(Some(color)) => Some((coord, color)),
            Ok(None) => None,
            Err(err) => {
                warn!(game = %self.game.id(), %coord, error = %err, "ignoring malformed stone");
                None
            }
        }
    }

    fn on_score(&mut self, player: PlayerNum, snapshot: &Snapshot) {
        match snapshot.val::<f64>() {
            Ok(Some(score)) => self.view.score(player, score),
            Ok(None) => {}
            Err(err) => {
                warn!(game = %self.game.id(), %player, error = %err, "ignoring malformed score");
            }
        }
    }

    fn on_token(&mut self, player: PlayerNum, snapshot: &Snapshot) {
        let before = self.tokens.holder();
        self.tokens.set(player, matches!(snapshot.value(), Value::Bool(true)));
        let after = self.tokens.holder();
        if before != after {
            self.view.turn(after);
        }
    }

    // =========================================================================
    // Local input
    // =========================================================================

    // Rejected writes are logged and the session keeps running.

    async fn on_ui(&mut self, state: PlayingState, event: UiEvent) {
        let Some(player) = state.playing_as() else {
            debug!(game = %self.game.id(), ?event, %state, "ignoring input while not playing");
            return;
        };
        match event {
            UiEvent::CellClicked(coord) => self.play_cell(player, coord).await,
            UiEvent::SkipTurn => self.skip(player).await,
            UiEvent::Quit => {}
        }
    }

    async fn play_cell(&mut self, player: PlayerNum, coord: Coord) {
        let game = self.game.id();
        if !coord.is_within(self.board.size()) {
            warn!(%game, %coord, "ignoring click outside the board");
            return;
        }
        match self.board.move_intent(coord, player.color()) {
            MoveIntent::Remove => {
                if let Err(err) = self.game.remove_stone(coord).wait().await {
                    error!(%game, %player, %coord, error = %err, "stone removal rejected");
                }
            }
            MoveIntent::Place(color) => {
                if let Err(err) = self.game.set_stone(coord, color).wait().await {
                    error!(%game, %player, %coord, error = %err, "stone placement rejected");
                    return;
                }
                if let Err(err) = self.game.switch_token(player).await {
                    error!(%game, %player, error = %err, "could not pass the turn token");
                }
            }
        }
    }

    async fn skip(&mut self, player: PlayerNum) {
        let game = self.game.id();
        info!(%game, %player, "skipping turn");
        if let Err(err) = self.game.switch_token(player).await {
            error!(%game, %player, error = %err, "could not pass the turn token");
        }
    }
}
