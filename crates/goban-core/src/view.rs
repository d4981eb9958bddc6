//! Output seam between the session controller and a UI.
//!
//! The controller never renders anything itself. It reports every visible
//! change to a [`GameView`]; UIs implement the trait, tests use
//! [`RecordingView`], and headless runs use [`NoOpView`].

use std::sync::Arc;

use goban_types::{Coord, PlayerNum, StoneColor};
use tokio::sync::watch;

use crate::state::PlayingState;

/// Partner presence indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The partner's slot is held.
    PartnerOnline,
    /// The partner's slot is free.
    PartnerIdle,
}

impl Presence {
    /// Indicator from an `online` value. Absent and `false` mean idle.
    pub const fn from_online(online: &serde_json::Value) -> Self {
        let truthy = match online {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(online) => *online,
            _ => true,
        };
        if truthy {
            Self::PartnerOnline
        } else {
            Self::PartnerIdle
        }
    }

    /// Text shown next to the board.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PartnerOnline => "★ partner online",
            Self::PartnerIdle => "☆ partner idle",
        }
    }
}

/// Receives everything the session wants shown.
///
/// All methods default to doing nothing.
pub trait GameView: Send {
    /// The link other players can open to join.
    fn share_link(&mut self, _url: &str) {}

    /// Show or hide the sign-in prompt.
    fn login_prompt(&mut self, _visible: bool) {}

    /// The session state changed.
    fn playing_state(&mut self, _state: PlayingState) {}

    /// This client now plays as `player`.
    fn player_assigned(&mut self, _player: PlayerNum) {}

    /// A stone appeared.
    fn stone_placed(&mut self, _coord: Coord, _color: StoneColor) {}

    /// A stone was taken off.
    fn stone_removed(&mut self, _coord: Coord) {}

    /// A player's score changed.
    fn score(&mut self, _player: PlayerNum, _score: f64) {}

    /// The partner presence indicator changed.
    fn presence(&mut self, _presence: Presence) {}

    /// The turn moved. `None` when no single player holds the token.
    fn turn(&mut self, _holder: Option<PlayerNum>) {}
}

/// A view that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpView;

impl GameView for NoOpView {}

/// One call made on a [`GameView`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// See [`GameView::share_link`].
    ShareLink(String),
    /// See [`GameView::login_prompt`].
    LoginPrompt(bool),
    /// See [`GameView::playing_state`].
    PlayingState(PlayingState),
    /// See [`GameView::player_assigned`].
    PlayerAssigned(PlayerNum),
    /// See [`GameView::stone_placed`].
    StonePlaced(Coord, StoneColor),
    /// See [`GameView::stone_removed`].
    StoneRemoved(Coord),
    /// See [`GameView::score`].
    Score(PlayerNum, f64),
    /// See [`GameView::presence`].
    Presence(Presence),
    /// See [`GameView::turn`].
    Turn(Option<PlayerNum>),
}

/// A view that keeps every update, observable through a watch channel.
///
/// Clones share the same log, so one clone can be handed to a session while
/// another waits on [`subscribe`](Self::subscribe).
#[derive(Debug, Clone)]
pub struct RecordingView {
    log: Arc<watch::Sender<Vec<ViewUpdate>>>,
}

impl RecordingView {
    /// An empty log.
    pub fn new() -> Self {
        let (log, _) = watch::channel(Vec::new());
        Self { log: Arc::new(log) }
    }

    /// Watch the log grow.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ViewUpdate>> {
        self.log.subscribe()
    }

    /// Everything recorded so far.
    pub fn updates(&self) -> Vec<ViewUpdate> {
        self.log.borrow().clone()
    }

    fn record(&self, update: ViewUpdate) {
        self.log.send_modify(|log| log.push(update));
    }
}

impl Default for RecordingView {
    fn default() -> Self {
        Self::new()
    }
}

impl GameView for RecordingView {
    fn share_link(&mut self, url: &str) {
        self.record(ViewUpdate::ShareLink(url.to_owned()));
    }

    fn login_prompt(&mut self, visible: bool) {
        self.record(ViewUpdate::LoginPrompt(visible));
    }

    fn playing_state(&mut self, state: PlayingState) {
        self.record(ViewUpdate::PlayingState(state));
    }

    fn player_assigned(&mut self, player: PlayerNum) {
        self.record(ViewUpdate::PlayerAssigned(player));
    }

    fn stone_placed(&mut self, coord: Coord, color: StoneColor) {
        self.record(ViewUpdate::StonePlaced(coord, color));
    }

    fn stone_removed(&mut self, coord: Coord) {
        self.record(ViewUpdate::StoneRemoved(coord));
    }

    fn score(&mut self, player: PlayerNum, score: f64) {
        self.record(ViewUpdate::Score(player, score));
    }

    fn presence(&mut self, presence: Presence) {
        self.record(ViewUpdate::Presence(presence));
    }

    fn turn(&mut self, holder: Option<PlayerNum>) {
        self.record(ViewUpdate::Turn(holder));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn presence_follows_truthiness() {
        assert_eq!(Presence::from_online(&json!(true)), Presence::PartnerOnline);
        assert_eq!(Presence::from_online(&json!("yes")), Presence::PartnerOnline);
        assert_eq!(Presence::from_online(&json!(false)), Presence::PartnerIdle);
        assert_eq!(Presence::from_online(&serde_json::Value::Null), Presence::PartnerIdle);
        assert_eq!(Presence::PartnerIdle.label(), "☆ partner idle");
    }

    #[test]
    fn recording_view_clones_share_log() {
        let view = RecordingView::new();
        let mut handle = view.clone();
        handle.score(PlayerNum::One, 6.5);
        handle.turn(Some(PlayerNum::Zero));
        assert_eq!(
            view.updates(),
            vec![
                ViewUpdate::Score(PlayerNum::One, 6.5),
                ViewUpdate::Turn(Some(PlayerNum::Zero)),
            ]
        );
    }
}
