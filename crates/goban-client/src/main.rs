//! Client binary for Goban Sync.
//!
//! Starts an in-process realtime store, creates a game and seats two
//! console clients in it, then plays the scripted demo moves from the
//! configuration, alternating black and white. Every view update is
//! logged, so the run shows both clients mirroring each other.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `goban-config.yaml`
//! 3. Start the store with the configured access rules
//! 4. Create the game and list recent games
//! 5. Start the black and white sessions and wait for both seats
//! 6. Play the scripted moves
//! 7. Quit both sessions and log the final board

mod config;
mod console_view;
mod error;

use std::path::Path;
use std::time::Duration;

use goban_core::{
    BoardMirror, GameDb, GameSession, SessionConfig, SessionError, SessionSummary, UiEvent,
};
use goban_store::{EventKind, MemoryDatabase};
use goban_types::{BoardSize, Coord, GameId, GamePaths, PlayerNum};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ClientConfig;
use crate::console_view::ConsoleView;
use crate::error::ClientError;

/// How long a demo client may take to get a seat.
const SEAT_TIMEOUT: Duration = Duration::from_secs(5);

/// Application entry point for the client.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("goban-client starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        share_base_url = config.share_base_url,
        board_size = config.board_size,
        moves = config.demo.moves.len(),
        read_requires_auth = config.store.read_requires_auth,
        write_requires_auth = config.store.write_requires_auth,
        "Configuration loaded"
    );

    run_demo(&config).await?;

    info!("goban-client shut down cleanly");
    Ok(())
}

/// One seated demo client.
struct Player {
    name: &'static str,
    ui: mpsc::Sender<UiEvent>,
    task: JoinHandle<Result<SessionSummary, SessionError>>,
}

async fn run_demo(config: &ClientConfig) -> Result<(), ClientError> {
    let size = BoardSize::new(config.board_size)?;
    let moves = config
        .demo
        .moves
        .iter()
        .map(|key| key.parse::<Coord>())
        .collect::<Result<Vec<_>, _>>()?;

    // 3. Start the store.
    let db = MemoryDatabase::start(config.store.rules());

    // 4. Create the game.
    let lobby = GameDb::new(db.connect());
    lobby.connection().authenticate("host")?;
    let game_id = lobby.create_game(size).await?;
    for game in lobby.recent_games().await? {
        info!(game = %game.id, size = game.size, created_at = ?game.created_at, "recent game");
    }

    // 5. Seat both players. Black goes first so it takes slot 0.
    let session_config = SessionConfig {
        share_base_url: config.share_base_url.clone(),
    };
    let black = start_player(&db, game_id, size, &session_config, "black").await?;
    let white = start_player(&db, game_id, size, &session_config, "white").await?;

    // 6. Play.
    let delay = Duration::from_millis(config.demo.step_delay_ms);
    for (coord, player) in moves.iter().zip([&black, &white].into_iter().cycle()) {
        if !coord.is_within(size) {
            warn!(client = player.name, %coord, "scripted move is off the board");
        }
        if player.ui.send(UiEvent::CellClicked(*coord)).await.is_err() {
            warn!(client = player.name, "session ended early; stopping the demo");
            break;
        }
        tokio::time::sleep(delay).await;
    }

    // 7. Wrap up.
    for player in [black, white] {
        let name = player.name;
        let summary = quit(player).await?;
        info!(
            client = name,
            game = %summary.game_id,
            state = %summary.final_state,
            stones = summary.stones,
            "session finished"
        );
    }
    log_final_board(&lobby, game_id, size).await
}

async fn start_player(
    db: &MemoryDatabase,
    game_id: GameId,
    size: BoardSize,
    config: &SessionConfig,
    name: &'static str,
) -> Result<Player, ClientError> {
    let conn = db.connect();
    let (view, seat) = ConsoleView::new(name);
    let (ui, rx) = mpsc::channel(16);
    let game = GameDb::new(conn.clone()).game(game_id);
    let session = GameSession::new(game, size, config.clone(), view);
    let task = tokio::spawn(session.run(rx));

    // Signing in after the session starts takes the login-prompt path.
    conn.authenticate(name)?;
    wait_for_seat(name, seat).await?;
    Ok(Player { name, ui, task })
}

async fn wait_for_seat(
    name: &'static str,
    mut seat: watch::Receiver<Option<PlayerNum>>,
) -> Result<(), ClientError> {
    let not_seated = || ClientError::NotSeated {
        client: name,
        waited_ms: u64::try_from(SEAT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
    };
    match tokio::time::timeout(SEAT_TIMEOUT, seat.wait_for(Option::is_some)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) | Err(_) => Err(not_seated()),
    }
}

async fn quit(player: Player) -> Result<SessionSummary, ClientError> {
    // The session may already be gone; its result says why.
    let _ = player.ui.send(UiEvent::Quit).await;
    Ok(player.task.await??)
}

async fn log_final_board(
    lobby: &GameDb,
    game_id: GameId,
    size: BoardSize,
) -> Result<(), ClientError> {
    let goban = lobby
        .once(&GamePaths::new(game_id).goban(), EventKind::Value)
        .await?;
    let mut board = BoardMirror::new(size);
    for stone in goban.children() {
        let coord = stone.key().and_then(|key| key.parse::<Coord>().ok());
        match (coord, stone.val()) {
            (Some(coord), Ok(Some(color))) => {
                board.set(coord, color);
            }
            _ => warn!(key = ?stone.key(), "skipping unreadable stone"),
        }
    }
    info!(game = %game_id, stones = board.len(), "final board\n{board}");
    Ok(())
}

/// Load configuration from `goban-config.yaml`.
///
/// Falls back to defaults if the file does not exist.
fn load_config() -> Result<ClientConfig, ClientError> {
    let config_path = Path::new("goban-config.yaml");
    if config_path.exists() {
        let config = ClientConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        let mut config = ClientConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}
