//! Tests for the session registry.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use strictly_gomoku::{
    CreateMode, HeuristicEvaluator, InMemoryRecordStore, Phase, Position, RegistryError,
    SessionConfig, SessionError, SessionRegistry, Stone,
};

fn registry() -> SessionRegistry {
    SessionRegistry::new(
        Arc::new(HeuristicEvaluator::new()),
        Arc::new(InMemoryRecordStore::new()),
        Duration::from_secs(300),
        Duration::from_secs(30),
    )
}

fn hvh(creator: &str) -> SessionConfig {
    SessionConfig::human_vs_human(creator, 15)
}

#[test]
fn test_create_refuses_active_session() {
    let reg = registry();
    reg.get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("First create failed");
    let err = reg
        .get_or_create("room", hvh("bob"), CreateMode::Create)
        .expect_err("Second create should fail");
    assert_eq!(err, RegistryError::SessionAlreadyActive("room".to_string()));
}

#[test]
fn test_get_or_create_reuses_active_session() {
    let reg = registry();
    let first = reg
        .get_or_create("room", hvh("alice"), CreateMode::GetOrCreate)
        .expect("Create failed");
    let second = reg
        .get_or_create("room", hvh("bob"), CreateMode::GetOrCreate)
        .expect("Lookup failed");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_force_restart_replaces() {
    let reg = registry();
    let first = reg
        .get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    let second = reg
        .get_or_create("room", hvh("bob"), CreateMode::ForceRestart)
        .expect("Restart failed");
    assert!(!Arc::ptr_eq(&first, &second));
    let creator = reg
        .with_session("room", |s| Ok(s.creator().to_string()))
        .expect("Lookup failed");
    assert_eq!(creator, "bob");
}

#[test]
fn test_finished_session_is_replaced_by_create() {
    let reg = registry();
    reg.get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    reg.with_session("room", |s| {
        s.join("bob")?;
        s.surrender("alice")
    })
    .expect("Surrender failed");

    reg.get_or_create("room", hvh("carol"), CreateMode::Create)
        .expect("Finished game should be replaceable");
}

#[test]
fn test_ai_game_starts_immediately() {
    let reg = registry();
    reg.get_or_create(
        "room",
        SessionConfig::human_vs_ai("alice", "AI", Stone::White, 15),
        CreateMode::Create,
    )
    .expect("Create failed");
    let (phase, moves) = reg
        .with_session("room", |s| Ok((s.phase(), s.moves().len())))
        .expect("Lookup failed");
    assert_eq!(phase, Phase::InProgress);
    assert_eq!(moves, 1);
}

#[test]
fn test_with_session_unknown_context() {
    let reg = registry();
    let err = reg.with_session("nowhere", |_| Ok(())).expect_err("Should fail");
    assert_eq!(err, RegistryError::NoSession("nowhere".to_string()));
}

#[test]
fn test_session_errors_pass_through() {
    let reg = registry();
    reg.get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    let err = reg
        .with_session("room", |s| s.place_stone("alice", Position::new(7, 7)))
        .expect_err("Waiting game should refuse moves");
    assert_eq!(err, RegistryError::Session(SessionError::NotStarted));
    assert_eq!(reg.contexts().expect("contexts"), vec!["room".to_string()]);
}

#[test]
fn test_invariant_violation_removes_session() {
    let reg = registry();
    reg.get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    let err = reg
        .with_session("room", |_| -> Result<(), SessionError> {
            Err(SessionError::InvariantViolation("corrupted".to_string()))
        })
        .expect_err("Should fail");
    assert!(matches!(err, RegistryError::Session(SessionError::InvariantViolation(_))));
    assert!(reg.get("room").expect("get").is_none());
}

#[test]
fn test_poisoned_session_is_removed() {
    let reg = registry();
    let handle = reg
        .get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    let poisoner = Arc::clone(&handle);
    let _ = thread::spawn(move || {
        let _guard = poisoner.lock().expect("lock");
        panic!("boom");
    })
    .join();

    let err = reg.with_session("room", |_| Ok(())).expect_err("Should fail");
    assert_eq!(err, RegistryError::Poisoned("room".to_string()));
    assert!(reg.get("room").expect("get").is_none());
}

#[test]
fn test_end_removes_session() {
    let reg = registry();
    reg.get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    assert!(reg.end("room").expect("end").is_some());
    assert!(reg.end("room").expect("end").is_none());
    assert!(reg.contexts().expect("contexts").is_empty());
}

#[test]
fn test_lobby_lists_waiting_games() {
    let reg = registry();
    reg.get_or_create("b-room", hvh("bob"), CreateMode::Create)
        .expect("Create failed");
    reg.get_or_create("a-room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    reg.get_or_create(
        "ai-room",
        SessionConfig::human_vs_ai("carol", "AI", Stone::Black, 15),
        CreateMode::Create,
    )
    .expect("Create failed");

    let lobby = reg.lobby().expect("lobby");
    let listed: Vec<_> = lobby
        .iter()
        .map(|e| (e.context_id.as_str(), e.creator.as_str()))
        .collect();
    assert_eq!(listed, vec![("a-room", "alice"), ("b-room", "bob")]);

    reg.with_session("a-room", |s| s.join("dave")).expect("Join failed");
    assert_eq!(reg.lobby().expect("lobby").len(), 1);
}

#[test]
fn test_expire_stale_sweeps_timeouts() {
    let reg = registry();
    reg.get_or_create("waiting", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    reg.get_or_create("playing", hvh("bob"), CreateMode::Create)
        .expect("Create failed");
    reg.with_session("playing", |s| {
        s.join("carol")?;
        s.offer_draw("bob")
    })
    .expect("Offer failed");

    let soon = reg.expire_stale(Instant::now()).expect("sweep");
    assert!(soon.expired_games.is_empty());
    assert!(soon.lapsed_offers.is_empty());

    let later = Instant::now() + Duration::from_secs(301);
    let report = reg.expire_stale(later).expect("sweep");
    assert_eq!(report.expired_games, vec!["waiting".to_string()]);
    assert_eq!(report.lapsed_offers, vec!["playing".to_string()]);
    assert_eq!(reg.contexts().expect("contexts"), vec!["playing".to_string()]);
    let phase = reg.with_session("playing", |s| Ok(s.phase())).expect("Lookup failed");
    assert_eq!(phase, Phase::InProgress);
}

#[test]
fn test_contexts_run_in_parallel() {
    let reg = registry();
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let reg = reg.clone();
            thread::spawn(move || {
                let ctx = format!("room-{}", i);
                reg.get_or_create(
                    &ctx,
                    SessionConfig::human_vs_ai(format!("p{}", i), "AI", Stone::Black, 15),
                    CreateMode::Create,
                )
                .expect("Create failed");
                for col in 0..3 {
                    let pos = Position::new(i % 15, col * 5);
                    let _ = reg.with_session(&ctx, |s| s.place_stone(&format!("p{}", i), pos));
                }
                reg.with_session(&ctx, |s| s.check_invariants()).expect("Invariant broken");
            })
        })
        .collect();
    for w in workers {
        w.join().expect("Worker panicked");
    }
    assert_eq!(reg.contexts().expect("contexts").len(), 8);
}

#[test]
fn test_sweep_and_lobby_skip_busy_session() {
    let reg = registry();
    let busy = reg
        .get_or_create("busy", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    reg.get_or_create("idle", hvh("bob"), CreateMode::Create)
        .expect("Create failed");

    let _guard = busy.lock().expect("lock");
    let later = Instant::now() + Duration::from_secs(301);
    let report = reg.expire_stale(later).expect("sweep");
    assert_eq!(report.expired_games, vec!["idle".to_string()]);
    assert!(reg.lobby().expect("lobby").is_empty());
    assert_eq!(reg.contexts().expect("contexts"), vec!["busy".to_string()]);
}

#[test]
fn test_create_elsewhere_while_session_locked() {
    let reg = registry();
    let held = reg
        .get_or_create("room-a", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    let guard = held.lock().expect("lock");

    let worker = {
        let reg = reg.clone();
        thread::spawn(move || {
            reg.get_or_create("room-b", hvh("bob"), CreateMode::Create)
                .map(|_| ())
        })
    };
    let deadline = Instant::now() + Duration::from_secs(5);
    while !worker.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert!(worker.is_finished(), "room-b waited on room-a");
    drop(guard);
    worker.join().expect("Worker panicked").expect("Create failed");
}

#[test]
fn test_end_if_keeps_session_when_check_fails() {
    let reg = registry();
    reg.get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    reg.with_session("room", |s| s.join("bob")).expect("Join failed");

    let err = reg
        .end_if("room", |s| {
            if s.is_waiting() {
                Ok(())
            } else {
                Err(RegistryError::Session(SessionError::AlreadyStarted))
            }
        })
        .expect_err("Started game must stay");
    assert_eq!(err, RegistryError::Session(SessionError::AlreadyStarted));
    assert_eq!(reg.contexts().expect("contexts"), vec!["room".to_string()]);

    reg.end_if("room", |_| Ok::<(), RegistryError>(()))
        .expect("End failed");
    assert!(reg.contexts().expect("contexts").is_empty());
}

#[test]
fn test_operation_on_removed_session_reports_missing() {
    let reg = registry();
    let handle = reg
        .get_or_create("room", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    let guard = handle.lock().expect("lock");

    let worker = {
        let reg = reg.clone();
        thread::spawn(move || reg.with_session("room", |s| s.join("bob")))
    };
    thread::sleep(Duration::from_millis(50));
    reg.end("room").expect("end");
    drop(guard);

    let result = worker.join().expect("Worker panicked");
    assert_eq!(result, Err(RegistryError::NoSession("room".to_string())));
}

#[test]
fn test_player_cannot_sit_in_two_games() {
    let reg = registry();
    reg.get_or_create("room-1", hvh("alice"), CreateMode::Create)
        .expect("Create failed");
    reg.get_or_create("room-2", hvh("carol"), CreateMode::Create)
        .expect("Create failed");

    let busy = RegistryError::PlayerBusy {
        player_id: "alice".to_string(),
        context_id: "room-1".to_string(),
    };
    assert_eq!(
        reg.get_or_create("room-3", hvh("alice"), CreateMode::Create)
            .map(|_| ()),
        Err(busy.clone())
    );
    assert_eq!(reg.join("room-2", "alice"), Err(busy));

    assert_eq!(reg.join("room-1", "bob"), Ok(Stone::White));
    assert_eq!(reg.active_context("bob").expect("lookup"), Some("room-1".to_string()));

    reg.with_session("room-1", |s| s.surrender("alice").map(drop))
        .expect("Surrender failed");
    assert_eq!(reg.active_context("alice").expect("lookup"), None);
    assert_eq!(reg.join("room-2", "alice"), Ok(Stone::White));
}
