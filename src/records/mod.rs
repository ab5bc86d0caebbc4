//! Player records: the win/loss/draw counters behind the rankings.
//!
//! The game core only talks to the [`RecordStore`] trait. Concrete
//! backends live elsewhere ([`InMemoryRecordStore`] here, the SQLite store
//! in `db`).

mod error;
mod leaderboard;
mod memory;
mod retry;

pub use error::RecordError;
pub use leaderboard::{LeaderboardEntry, leaderboard};
pub use memory::InMemoryRecordStore;
pub use retry::RetryingRecordStore;

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Game result from one player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordOutcome {
    /// Player won.
    Win,
    /// Player lost.
    Loss,
    /// Game was drawn.
    Draw,
}

impl RecordOutcome {
    /// Converts outcome to its stored string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Draw => "draw",
        }
    }

    /// Parses an outcome from its stored string.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the string is not a valid outcome value.
    #[instrument(skip(s), fields(s = %s))]
    pub fn parse(s: &str) -> Result<Self, RecordError> {
        match s {
            "win" => Ok(Self::Win),
            "loss" => Ok(Self::Loss),
            "draw" => Ok(Self::Draw),
            _ => Err(RecordError::new(format!("Invalid outcome: '{}'", s))),
        }
    }
}

impl std::fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one player.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Record {
    player_id: String,
    wins: i32,
    losses: i32,
    draws: i32,
    /// Positive for consecutive wins, negative for consecutive losses.
    streak: i32,
}

impl Record {
    /// An empty record for a player with no finished games.
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            wins: 0,
            losses: 0,
            draws: 0,
            streak: 0,
        }
    }

    /// Rebuilds a record from stored counters.
    pub fn from_parts(player_id: String, wins: i32, losses: i32, draws: i32, streak: i32) -> Self {
        Self {
            player_id,
            wins,
            losses,
            draws,
            streak,
        }
    }

    /// Folds one game result into the counters.
    pub fn apply(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Win => {
                self.wins += 1;
                self.streak = self.streak.max(0) + 1;
            }
            RecordOutcome::Loss => {
                self.losses += 1;
                self.streak = self.streak.min(0) - 1;
            }
            RecordOutcome::Draw => {
                self.draws += 1;
                self.streak = 0;
            }
        }
    }

    /// Total finished games.
    pub fn total_games(&self) -> i32 {
        self.wins + self.losses + self.draws
    }

    /// Win rate as a percentage (0.0-100.0).
    pub fn win_rate(&self) -> f64 {
        if self.total_games() == 0 {
            0.0
        } else {
            (self.wins as f64 / self.total_games() as f64) * 100.0
        }
    }
}

/// Storage for player records.
///
/// Calls may block. Implementations are expected to be independently
/// retryable; callers never roll back a finished game because a store call
/// failed.
pub trait RecordStore: std::fmt::Debug + Send + Sync {
    /// Returns the record for a player, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the backend is unavailable.
    fn get(&self, player_id: &str) -> Result<Option<Record>, RecordError>;

    /// Applies one game result and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the backend is unavailable.
    fn update(&self, player_id: &str, outcome: RecordOutcome) -> Result<Record, RecordError>;

    /// Returns every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the backend is unavailable.
    fn all(&self) -> Result<Vec<Record>, RecordError>;
}
