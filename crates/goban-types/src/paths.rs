//! Store path layout for a game.
//!
//! | Path | Value |
//! |------|-------|
//! | `games/{id}/size` | board size |
//! | `games/{id}/goban/{x}-{y}` | `"BLACK"` or `"WHITE"` |
//! | `games/{id}/players/{0,1}/online` | `true` or absent |
//! | `games/{id}/players/{0,1}/token` | `true` or absent |
//! | `games/{id}/players/{0,1}/score` | number |
//!
//! Older clients also wrote stones under `games/{id}/board`. That path is
//! no longer read or written; `goban` is the only stone map.

use crate::coord::Coord;
use crate::enums::PlayerNum;
use crate::ids::GameId;

/// Root node holding every game.
pub const GAMES_ROOT: &str = "games";

/// Builds store paths for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePaths {
    root: String,
}

impl GamePaths {
    /// Paths for the given game.
    pub fn new(game_id: GameId) -> Self {
        Self {
            root: format!("{GAMES_ROOT}/{game_id}"),
        }
    }

    /// `games/{id}`
    pub fn root(&self) -> &str {
        &self.root
    }

    /// `games/{id}/size`
    pub fn size(&self) -> String {
        format!("{}/size", self.root)
    }

    /// `games/{id}/goban`
    pub fn goban(&self) -> String {
        format!("{}/goban", self.root)
    }

    /// `games/{id}/goban/{x}-{y}`
    pub fn stone(&self, coord: Coord) -> String {
        format!("{}/goban/{}", self.root, coord.key())
    }

    /// `games/{id}/players`
    pub fn players(&self) -> String {
        format!("{}/players", self.root)
    }

    /// `games/{id}/players/{n}`
    pub fn player(&self, player: PlayerNum) -> String {
        format!("{}/players/{}", self.root, player.key())
    }

    /// `games/{id}/players/{n}/online`
    pub fn online(&self, player: PlayerNum) -> String {
        format!("{}/online", self.player(player))
    }

    /// `games/{id}/players/{n}/token`
    pub fn token(&self, player: PlayerNum) -> String {
        format!("{}/token", self.player(player))
    }

    /// `games/{id}/players/{n}/score`
    pub fn score(&self, player: PlayerNum) -> String {
        format!("{}/score", self.player(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_game() {
        let id = GameId::new();
        let paths = GamePaths::new(id);
        assert_eq!(paths.root(), format!("games/{id}"));
        assert_eq!(paths.stone(Coord::new(3, 4)), format!("games/{id}/goban/3-4"));
        assert_eq!(
            paths.online(PlayerNum::One),
            format!("games/{id}/players/1/online")
        );
        assert_eq!(
            paths.token(PlayerNum::Zero),
            format!("games/{id}/players/0/token")
        );
        assert_eq!(
            paths.score(PlayerNum::Zero),
            format!("games/{id}/players/0/score")
        );
    }
}
