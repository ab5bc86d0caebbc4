//! Tests for the SQLite record store.

use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;

use strictly_gomoku::{
    Command, CommandKind, Dispatcher, EngineConfig, HeuristicEvaluator, RecordOutcome, RecordStore, RetryingRecordStore,
    SqliteRecordStore, leaderboard,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready store.
fn setup_test_db() -> (NamedTempFile, SqliteRecordStore) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let store = SqliteRecordStore::open(db_path).expect("Failed to open store");
    (db_file, store)
}

#[test]
fn test_get_unknown_player() {
    let (_db, store) = setup_test_db();
    let found = store.get("nobody").expect("Query failed");
    assert!(found.is_none());
}

#[test]
fn test_update_creates_record() {
    let (_db, store) = setup_test_db();
    let record = store.update("alice", RecordOutcome::Win).expect("Update failed");
    assert_eq!(record.player_id(), "alice");
    assert_eq!(*record.wins(), 1);
    assert_eq!(*record.streak(), 1);

    let stored = store.get("alice").expect("Query failed").expect("Record missing");
    assert_eq!(stored, record);
}

#[test]
fn test_updates_accumulate() {
    let (_db, store) = setup_test_db();
    store.update("bob", RecordOutcome::Win).expect("Update failed");
    store.update("bob", RecordOutcome::Win).expect("Update failed");
    store.update("bob", RecordOutcome::Draw).expect("Update failed");
    let record = store.update("bob", RecordOutcome::Loss).expect("Update failed");

    assert_eq!(*record.wins(), 2);
    assert_eq!(*record.draws(), 1);
    assert_eq!(*record.losses(), 1);
    assert_eq!(*record.streak(), -1);
    assert_eq!(record.total_games(), 4);
}

#[test]
fn test_all_ordered_by_player_id() {
    let (_db, store) = setup_test_db();
    store.update("carol", RecordOutcome::Win).expect("Update failed");
    store.update("alice", RecordOutcome::Loss).expect("Update failed");
    store.update("bob", RecordOutcome::Draw).expect("Update failed");

    let ids: Vec<String> = store
        .all()
        .expect("List failed")
        .into_iter()
        .map(|r| r.player_id().clone())
        .collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);
}

#[test]
fn test_records_survive_reopen() {
    let (db, store) = setup_test_db();
    store.update("dave", RecordOutcome::Win).expect("Update failed");
    drop(store);

    let path = db.path().to_str().expect("Invalid path").to_string();
    let reopened = SqliteRecordStore::open(path).expect("Reopen failed");
    let record = reopened.get("dave").expect("Query failed").expect("Record missing");
    assert_eq!(*record.wins(), 1);
}

#[test]
fn test_leaderboard_from_store() {
    let (_db, store) = setup_test_db();
    for _ in 0..3 {
        store.update("erin", RecordOutcome::Win).expect("Update failed");
    }
    store.update("frank", RecordOutcome::Win).expect("Update failed");
    store.update("frank", RecordOutcome::Loss).expect("Update failed");

    let board = leaderboard(store.all().expect("List failed"), 10);
    assert_eq!(board[0].player_id, "erin");
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[1].player_id, "frank");
}

#[test]
fn test_unreachable_database_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("records.db");
    let result = SqliteRecordStore::open(path.to_str().expect("Invalid path").to_string());
    assert!(result.is_err(), "Opening under a missing directory should fail");
}

#[test]
fn test_finished_game_lands_in_sqlite() {
    let (_db, store) = setup_test_db();
    let records: Arc<dyn RecordStore> =
        Arc::new(RetryingRecordStore::new(store.clone(), 3, Duration::from_millis(1)));
    let dispatcher = Dispatcher::new(
        EngineConfig::default(),
        Arc::new(HeuristicEvaluator::new()),
        records,
    );

    dispatcher
        .dispatch(Command::new("room", "alice", CommandKind::NewGame { vs_ai: false, force: false }))
        .expect("New game failed");
    dispatcher
        .dispatch(Command::new("room", "bob", CommandKind::Join))
        .expect("Join failed");
    let done = dispatcher
        .dispatch(Command::new("room", "bob", CommandKind::Surrender))
        .expect("Surrender failed");
    assert!(done.outcome.is_some());

    let alice = store.get("alice").expect("Query failed").expect("Record missing");
    let bob = store.get("bob").expect("Query failed").expect("Record missing");
    assert_eq!(*alice.wins(), 1);
    assert_eq!(*bob.losses(), 1);
}
