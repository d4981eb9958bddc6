//! A [`GameView`] that reports to the log.

use goban_core::{GameView, PlayingState, Presence};
use goban_types::{Coord, PlayerNum, StoneColor};
use tokio::sync::watch;
use tracing::info;

/// Logs every view update, tagged with the client's name.
///
/// The assigned seat is also published on a watch channel so the demo can
/// wait for both players before scripting moves.
#[derive(Debug)]
pub struct ConsoleView {
    client: &'static str,
    seat: watch::Sender<Option<PlayerNum>>,
}

impl ConsoleView {
    /// A view for the named client and a receiver for its seat.
    pub fn new(client: &'static str) -> (Self, watch::Receiver<Option<PlayerNum>>) {
        let (seat, rx) = watch::channel(None);
        (Self { client, seat }, rx)
    }
}

impl GameView for ConsoleView {
    fn share_link(&mut self, url: &str) {
        info!(client = self.client, url, "share this game");
    }

    fn login_prompt(&mut self, visible: bool) {
        if visible {
            info!(client = self.client, "sign in to play");
        }
    }

    fn playing_state(&mut self, state: PlayingState) {
        info!(client = self.client, %state, "state");
    }

    fn player_assigned(&mut self, player: PlayerNum) {
        info!(client = self.client, %player, color = %player.color(), "seated");
        self.seat.send_replace(Some(player));
    }

    fn stone_placed(&mut self, coord: Coord, color: StoneColor) {
        info!(client = self.client, %coord, %color, "stone placed");
    }

    fn stone_removed(&mut self, coord: Coord) {
        info!(client = self.client, %coord, "stone removed");
    }

    fn score(&mut self, player: PlayerNum, score: f64) {
        info!(client = self.client, %player, score, "score");
    }

    fn presence(&mut self, presence: Presence) {
        info!(client = self.client, presence = presence.label(), "presence");
    }

    fn turn(&mut self, holder: Option<PlayerNum>) {
        match holder {
            Some(player) => info!(client = self.client, %player, "turn"),
            None => info!(client = self.client, "turn undecided"),
        }
    }
}
