//! Integration tests for the adapter and the session controller.
//!
//! Every test starts an in-process store and runs one or more sessions
//! against it, each on its own connection, the way separate browsers would
//! share a game.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::time::Duration;

use goban_core::{
    DbError, GameDb, GameSession, PlayingState, Presence, RECENT_GAMES_LIMIT, RecordingView,
    SessionConfig, SessionError, SessionSummary, UiEvent, ViewUpdate,
};
use goban_store::{Access, Connection, EventKind, MemoryDatabase, Rules, StoreError};
use goban_types::{BoardSize, Coord, GameId, GamePaths, PlayerNum, StoneColor};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(2);

/// One running session and the handles a test needs to drive it.
struct Client {
    conn: Connection,
    view: RecordingView,
    ui: mpsc::Sender<UiEvent>,
    task: JoinHandle<Result<SessionSummary, SessionError>>,
}

impl Client {
    async fn quit(self) -> SessionSummary {
        self.ui.send(UiEvent::Quit).await.unwrap();
        let summary = self.task.await.unwrap().unwrap();
        drop(self.conn);
        summary
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        share_base_url: "https://goban.test/play/".to_owned(),
    }
}

async fn new_game(db: &MemoryDatabase) -> GameId {
    GameDb::new(db.connect())
        .create_game(BoardSize::default())
        .await
        .unwrap()
}

/// Start a session on its own connection, signed in when `uid` is given.
fn spawn_client(db: &MemoryDatabase, game: GameId, uid: Option<&str>) -> Client {
    let conn = db.connect();
    if let Some(uid) = uid {
        conn.authenticate(uid).unwrap();
    }
    let view = RecordingView::new();
    let (ui, rx) = mpsc::channel(16);
    let session = GameSession::new(
        GameDb::new(conn.clone()).game(game),
        BoardSize::default(),
        config(),
        view.clone(),
    );
    let task = tokio::spawn(session.run(rx));
    Client {
        conn,
        view,
        ui,
        task,
    }
}

/// Wait until the view has recorded `update` at least `times` times.
async fn wait_for_nth(view: &RecordingView, update: &ViewUpdate, times: usize) {
    let mut log = view.subscribe();
    let seen = tokio::time::timeout(
        WAIT,
        log.wait_for(|log| log.iter().filter(|u| *u == update).count() >= times),
    )
    .await
    .map(|result| result.is_ok());
    assert!(
        matches!(seen, Ok(true)),
        "view never showed {update:?} {times} time(s); got {:?}",
        view.updates()
    );
}

/// Wait until the view has recorded `update`.
async fn wait_for(view: &RecordingView, update: &ViewUpdate) {
    wait_for_nth(view, update, 1).await;
}

fn presences(view: &RecordingView) -> Vec<Presence> {
    view.updates()
        .into_iter()
        .filter_map(|update| match update {
            ViewUpdate::Presence(presence) => Some(presence),
            _ => None,
        })
        .collect()
}

fn scores(view: &RecordingView) -> Vec<(PlayerNum, f64)> {
    view.updates()
        .into_iter()
        .filter_map(|update| match update {
            ViewUpdate::Score(player, score) => Some((player, score)),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Adapter
// =============================================================================

#[tokio::test]
async fn created_game_has_its_size() {
    let db = MemoryDatabase::start(Rules::open());
    let games = GameDb::new(db.connect());

    let id = games.create_game(BoardSize::new(13).unwrap()).await.unwrap();
    assert_eq!(games.game(id).size().await.unwrap().get(), 13);

    let missing = games.game(GameId::new()).size().await;
    assert!(matches!(missing, Err(DbError::GameNotFound(_))));
}

#[tokio::test]
async fn recent_games_lists_the_newest_five() {
    let db = MemoryDatabase::start(Rules::open());
    let games = GameDb::new(db.connect());

    let mut created = Vec::new();
    for _ in 0..7 {
        created.push(games.create_game(BoardSize::default()).await.unwrap());
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let recent = games.recent_games().await.unwrap();
    assert_eq!(recent.len(), RECENT_GAMES_LIMIT);
    let ids: Vec<GameId> = recent.iter().map(|game| game.id).collect();
    assert_eq!(ids, created[2..].to_vec());
    assert!(recent.iter().all(|game| game.size == 9 && game.created_at.is_some()));
}

#[tokio::test]
async fn read_or_init_reports_the_prior_value() {
    let db = MemoryDatabase::start(Rules::open());
    let games = GameDb::new(db.connect());

    let first = games.read_or_init("games/g/players/0/online", json!(true)).await.unwrap();
    assert_eq!(first, None);

    let second = games.read_or_init("games/g/players/0/online", json!(true)).await.unwrap();
    assert_eq!(second, Some(json!(true)));
}

#[tokio::test]
async fn slot_claims_are_exclusive() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;

    let mut claims = Vec::new();
    for _ in 0..8 {
        let game = GameDb::new(db.connect()).game(id);
        claims.push(tokio::spawn(async move { game.claim_slot(PlayerNum::One).await }));
    }
    let mut winners = 0;
    for claim in claims {
        if claim.await.unwrap().unwrap().committed {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn token_is_held_by_exactly_one_player() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let game = GameDb::new(db.connect()).game(id);
    let paths = GamePaths::new(id);

    assert!(game.set_token(PlayerNum::Zero).await.unwrap());
    assert!(!game.set_token(PlayerNum::One).await.unwrap());

    for player in [PlayerNum::Zero, PlayerNum::One, PlayerNum::Zero] {
        game.switch_token(player).await.unwrap();
        let players = game.db().once(&paths.players(), EventKind::Value).await.unwrap();
        let holder = players.child(player.partner().key()).child("token");
        let other = players.child(player.key()).child("token");
        assert_eq!(holder.value(), &json!(true));
        assert!(!other.exists());
    }
}

#[tokio::test]
async fn denied_reads_fail_once_and_end_streams() {
    let rules = Rules::with_defaults(Access::Authenticated, Access::Authenticated);
    let db = MemoryDatabase::start(rules);
    let games = GameDb::new(db.connect());

    let once = games.once("games", EventKind::Value).await;
    assert!(matches!(
        once,
        Err(DbError::Store(StoreError::AccessDenied { .. }))
    ));

    let mut stream = games.on("games", EventKind::ChildAdded).unwrap();
    let first = tokio::time::timeout(WAIT, stream.next()).await.unwrap();
    assert!(matches!(first, Some(Err(_))));
    assert!(tokio::time::timeout(WAIT, stream.next()).await.unwrap().is_none());
}

// =============================================================================
// Mirroring
// =============================================================================

#[tokio::test]
async fn remote_stone_is_mirrored() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let writer = GameDb::new(db.connect()).game(id);

    let mut goban = writer.on(&writer.paths().goban(), EventKind::ChildAdded).unwrap();
    let watcher = spawn_client(&db, id, None);
    wait_for(&watcher.view, &ViewUpdate::LoginPrompt(true)).await;

    writer
        .set_stone(Coord::new(3, 3), StoneColor::Black)
        .wait()
        .await
        .unwrap();

    let added = tokio::time::timeout(WAIT, goban.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(added.key(), Some("3-3"));
    assert_eq!(added.value(), &json!("BLACK"));

    wait_for(
        &watcher.view,
        &ViewUpdate::StonePlaced(Coord::new(3, 3), StoneColor::Black),
    )
    .await;
    let summary = watcher.quit().await;
    assert_eq!(summary.stones, 1);
    assert_eq!(summary.final_state, PlayingState::Watching);
}

#[tokio::test]
async fn existing_stones_load_and_removals_clear() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let writer = GameDb::new(db.connect()).game(id);
    writer
        .set_stone(Coord::new(0, 1), StoneColor::White)
        .wait()
        .await
        .unwrap();

    let watcher = spawn_client(&db, id, None);
    let stone = ViewUpdate::StonePlaced(Coord::new(0, 1), StoneColor::White);
    wait_for(&watcher.view, &stone).await;

    writer.remove_stone(Coord::new(0, 1)).wait().await.unwrap();
    wait_for(&watcher.view, &ViewUpdate::StoneRemoved(Coord::new(0, 1))).await;

    let placed = watcher
        .view
        .updates()
        .into_iter()
        .filter(|update| *update == stone)
        .count();
    assert_eq!(placed, 1, "initial load and child_added reported twice");
    assert_eq!(watcher.quit().await.stones, 0);
}

#[tokio::test]
async fn null_scores_are_ignored() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let writer = GameDb::new(db.connect()).game(id);
    let watcher = spawn_client(&db, id, None);

    writer.set_score(PlayerNum::Zero, 5.0).wait().await.unwrap();
    wait_for(&watcher.view, &ViewUpdate::Score(PlayerNum::Zero, 5.0)).await;

    writer
        .connection()
        .remove(&writer.paths().score(PlayerNum::Zero))
        .wait()
        .await
        .unwrap();
    writer.set_score(PlayerNum::One, 2.0).wait().await.unwrap();
    wait_for(&watcher.view, &ViewUpdate::Score(PlayerNum::One, 2.0)).await;

    assert_eq!(
        scores(&watcher.view),
        vec![(PlayerNum::Zero, 5.0), (PlayerNum::One, 2.0)]
    );
    watcher.quit().await;
}

#[tokio::test]
async fn fractional_scores_reach_the_view() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let paths = GamePaths::new(id);
    let watcher = spawn_client(&db, id, None);

    // Komi leaves white with a half point; integers still decode too.
    let writer = db.connect();
    writer.set(&paths.score(PlayerNum::One), json!(6.5)).wait().await.unwrap();
    writer.set(&paths.score(PlayerNum::Zero), json!(3)).wait().await.unwrap();
    wait_for(&watcher.view, &ViewUpdate::Score(PlayerNum::One, 6.5)).await;
    wait_for(&watcher.view, &ViewUpdate::Score(PlayerNum::Zero, 3.0)).await;

    // The two score streams interleave in no fixed order.
    let seen = scores(&watcher.view);
    assert_eq!(seen.len(), 2, "unexpected scores: {seen:?}");
    assert!(seen.contains(&(PlayerNum::One, 6.5)));
    assert!(seen.contains(&(PlayerNum::Zero, 3.0)));
    watcher.quit().await;
}

// =============================================================================
// Join protocol and presence
// =============================================================================

#[tokio::test]
async fn signing_in_joins_the_first_free_slot() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let client = spawn_client(&db, id, None);

    wait_for(&client.view, &ViewUpdate::LoginPrompt(true)).await;
    assert!(!client.view.updates().iter().any(|u| matches!(u, ViewUpdate::PlayerAssigned(_))));

    client.conn.authenticate("alice").unwrap();
    wait_for(&client.view, &ViewUpdate::LoginPrompt(false)).await;
    wait_for(&client.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;
    wait_for(
        &client.view,
        &ViewUpdate::PlayingState(PlayingState::Playing(PlayerNum::Zero)),
    )
    .await;
    wait_for(&client.view, &ViewUpdate::ShareLink(format!("https://goban.test/play/{id}"))).await;

    assert_eq!(client.quit().await.final_state, PlayingState::Playing(PlayerNum::Zero));
}

#[tokio::test]
async fn two_clients_get_different_slots() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let alice = spawn_client(&db, id, Some("alice"));
    let bob = spawn_client(&db, id, Some("bob"));

    let mut assigned = Vec::new();
    for client in [&alice, &bob] {
        let mut log = client.view.subscribe();
        let update = tokio::time::timeout(
            WAIT,
            log.wait_for(|log| log.iter().any(|u| matches!(u, ViewUpdate::PlayerAssigned(_)))),
        )
        .await
        .unwrap()
        .unwrap()
        .iter()
        .find_map(|u| match u {
            ViewUpdate::PlayerAssigned(player) => Some(*player),
            _ => None,
        });
        assigned.push(update.unwrap());
    }
    assigned.sort();
    assert_eq!(assigned, vec![PlayerNum::Zero, PlayerNum::One]);

    alice.quit().await;
    bob.quit().await;
}

#[tokio::test]
async fn presence_reflects_only_the_partner() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let paths = GamePaths::new(id);
    let alice = spawn_client(&db, id, Some("alice"));

    wait_for(&alice.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;
    wait_for(&alice.view, &ViewUpdate::Presence(Presence::PartnerIdle)).await;

    let other = db.connect();
    other.set(&paths.online(PlayerNum::Zero), json!(false)).wait().await.unwrap();
    other.set(&paths.online(PlayerNum::One), json!(true)).wait().await.unwrap();
    wait_for(&alice.view, &ViewUpdate::Presence(Presence::PartnerOnline)).await;

    assert_eq!(
        presences(&alice.view),
        vec![Presence::PartnerIdle, Presence::PartnerOnline]
    );
    alice.quit().await;
}

#[tokio::test]
async fn disconnect_frees_the_slot_for_a_watcher() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let alice = spawn_client(&db, id, Some("alice"));
    wait_for(&alice.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;
    let bob = spawn_client(&db, id, Some("bob"));
    wait_for(&bob.view, &ViewUpdate::PlayerAssigned(PlayerNum::One)).await;

    let carol = spawn_client(&db, id, Some("carol"));
    wait_for(&carol.view, &ViewUpdate::Presence(Presence::PartnerOnline)).await;
    assert!(!carol.view.updates().iter().any(|u| matches!(u, ViewUpdate::PlayerAssigned(_))));

    alice.quit().await;
    wait_for(&carol.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;

    bob.quit().await;
    carol.quit().await;
}

// =============================================================================
// Moves
// =============================================================================

#[tokio::test]
async fn moves_write_stones_and_pass_the_turn() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let alice = spawn_client(&db, id, Some("alice"));
    wait_for(&alice.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;
    wait_for(&alice.view, &ViewUpdate::Turn(Some(PlayerNum::Zero))).await;
    let bob = spawn_client(&db, id, Some("bob"));
    wait_for(&bob.view, &ViewUpdate::PlayerAssigned(PlayerNum::One)).await;

    alice.ui.send(UiEvent::CellClicked(Coord::new(2, 2))).await.unwrap();
    wait_for(&bob.view, &ViewUpdate::StonePlaced(Coord::new(2, 2), StoneColor::Black)).await;
    wait_for(&bob.view, &ViewUpdate::Turn(Some(PlayerNum::One))).await;

    // White clicking a black stone takes it off.
    bob.ui.send(UiEvent::CellClicked(Coord::new(2, 2))).await.unwrap();
    wait_for(&alice.view, &ViewUpdate::StoneRemoved(Coord::new(2, 2))).await;

    bob.ui.send(UiEvent::SkipTurn).await.unwrap();
    wait_for_nth(&alice.view, &ViewUpdate::Turn(Some(PlayerNum::Zero)), 2).await;

    let players = GameDb::new(db.connect())
        .once(&GamePaths::new(id).players(), EventKind::Value)
        .await
        .unwrap();
    assert_eq!(players.child("0").child("token").value(), &json!(true));
    assert!(!players.child("1").child("token").exists());

    alice.quit().await;
    bob.quit().await;
}

#[tokio::test]
async fn clicks_off_the_board_or_while_watching_are_ignored() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let watcher = spawn_client(&db, id, None);
    let alice = spawn_client(&db, id, Some("alice"));
    wait_for(&alice.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;

    watcher.ui.send(UiEvent::CellClicked(Coord::new(1, 1))).await.unwrap();
    alice.ui.send(UiEvent::CellClicked(Coord::new(9, 9))).await.unwrap();
    alice.ui.send(UiEvent::CellClicked(Coord::new(0, 0))).await.unwrap();
    wait_for(&watcher.view, &ViewUpdate::StonePlaced(Coord::new(0, 0), StoneColor::Black)).await;

    let goban = GameDb::new(db.connect())
        .once(&GamePaths::new(id).goban(), EventKind::Value)
        .await
        .unwrap();
    assert_eq!(goban.value(), &json!({"0-0": "BLACK"}));

    assert_eq!(watcher.quit().await.final_state, PlayingState::Watching);
    alice.quit().await;
}

#[tokio::test]
async fn session_ends_when_the_ui_closes() {
    let db = MemoryDatabase::start(Rules::open());
    let id = new_game(&db).await;
    let game = GameDb::new(db.connect()).game(id);
    let session = GameSession::open(game, config(), RecordingView::new()).await.unwrap();
    assert_eq!(session.board().size().get(), 9);

    let (ui, rx) = mpsc::channel(1);
    drop(ui);
    let summary = tokio::time::timeout(WAIT, session.run(rx)).await.unwrap().unwrap();
    assert_eq!(summary.game_id, id);
    assert_eq!(summary.stones, 0);
}

// =============================================================================
// Rejected writes
// =============================================================================

#[tokio::test]
async fn rejected_move_keeps_the_session_running() {
    let db = MemoryDatabase::start(Rules::with_defaults(Access::Public, Access::Authenticated));
    let host = GameDb::new(db.connect());
    host.connection().authenticate("host").unwrap();
    let id = host.create_game(BoardSize::default()).await.unwrap();
    let paths = GamePaths::new(id);

    let alice = spawn_client(&db, id, Some("alice"));
    wait_for(&alice.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;

    alice.conn.sign_out().unwrap();
    wait_for(&alice.view, &ViewUpdate::LoginPrompt(true)).await;
    alice.ui.send(UiEvent::CellClicked(Coord::new(1, 1))).await.unwrap();

    alice.conn.authenticate("alice").unwrap();
    alice.ui.send(UiEvent::CellClicked(Coord::new(2, 2))).await.unwrap();
    wait_for(&alice.view, &ViewUpdate::StonePlaced(Coord::new(2, 2), StoneColor::Black)).await;

    let goban = host.once(&paths.goban(), EventKind::Value).await.unwrap();
    assert_eq!(goban.value(), &json!({"2-2": "BLACK"}));
    assert!(!alice.task.is_finished());

    let summary = alice.quit().await;
    assert_eq!(summary.final_state, PlayingState::Playing(PlayerNum::Zero));
    assert_eq!(summary.stones, 1);
}

#[tokio::test]
async fn slot_is_released_even_when_the_token_cannot_be_taken() {
    let id = GameId::new();
    let paths = GamePaths::new(id);
    let rules = Rules::open()
        .with_rule(&paths.players(), Access::Public, Access::Denied)
        .unwrap()
        .with_rule(&paths.online(PlayerNum::Zero), Access::Public, Access::Public)
        .unwrap();
    let db = MemoryDatabase::start(rules);

    let alice = spawn_client(&db, id, Some("alice"));
    wait_for(&alice.view, &ViewUpdate::PlayerAssigned(PlayerNum::Zero)).await;
    assert!(!alice.task.is_finished());

    let summary = alice.quit().await;
    assert_eq!(summary.final_state, PlayingState::Playing(PlayerNum::Zero));

    let online = GameDb::new(db.connect())
        .once(&paths.online(PlayerNum::Zero), EventKind::Value)
        .await
        .unwrap();
    assert!(!online.exists(), "slot still held: {:?}", online.value());
}
