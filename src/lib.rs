//! Strictly Gomoku library - multi-session gomoku engine
//!
//! Hosts any number of concurrent five-in-a-row games, one per context
//! (a chat channel, a terminal, a test). Each game enforces turn order,
//! legality and win/draw detection, supports undo, draw offers and
//! surrender, and can pit a human against a heuristic AI. Finished games
//! feed persistent player records and a leaderboard.
//!
//! # Architecture
//!
//! - **Games**: board, rules and the heuristic evaluator
//! - **Session**: the per-game phase machine
//! - **Registry**: context → session map with per-session locking
//! - **Dispatch**: closed command enum routed to sessions and records
//! - **Records**: record store trait, retry wrapper, leaderboard; SQLite backend in `db`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use strictly_gomoku::{
//!     Command, CommandKind, Dispatcher, EngineConfig, HeuristicEvaluator, InMemoryRecordStore,
//!     Position,
//! };
//!
//! # fn example() -> anyhow::Result<()> {
//! let dispatcher = Dispatcher::new(
//!     EngineConfig::default(),
//!     Arc::new(HeuristicEvaluator::new()),
//!     Arc::new(InMemoryRecordStore::new()),
//! );
//! dispatcher.dispatch(Command::new("room", "alice", CommandKind::NewGame { vs_ai: true, force: false }))?;
//! dispatcher.dispatch(Command::new("room", "alice", CommandKind::Place(Position::new(7, 7))))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod db;
mod dispatch;
mod games;
mod records;
mod registry;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, EngineConfig};

// Crate-level exports - Persistence
pub use db::{MIGRATIONS, PlayerRecordRow, SqliteRecordStore};

// Crate-level exports - Dispatch
pub use dispatch::{Command, CommandKind, DispatchError, Dispatched, Dispatcher, PlayerStats, Reply};

// Crate-level exports - Game types
pub use games::gomoku::{
    Board, BoardError, Cell, HeuristicEvaluator, MAX_SIZE, MIN_SIZE, Move, MoveEvaluator, Outcome,
    Phase, Position, STANDARD_SIZE, Stone, rules,
};

// Crate-level exports - Records
pub use records::{
    InMemoryRecordStore, LeaderboardEntry, Record, RecordError, RecordOutcome, RecordStore,
    RetryingRecordStore, leaderboard,
};

// Crate-level exports - Session registry
pub use registry::{CreateMode, ExpiryReport, LobbyEntry, RegistryError, SessionHandle, SessionRegistry};

// Crate-level exports - Sessions
pub use session::{
    BoardSnapshot, ContextId, GameSession, OutcomeNotification, Player, PlayerId, PlayerKind,
    SessionConfig, SessionError,
};
