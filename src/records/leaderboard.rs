//! Ranking of player records.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::instrument;

use super::Record;

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player identifier.
    pub player_id: String,
    /// Games won.
    pub wins: i32,
    /// Games lost.
    pub losses: i32,
    /// Games drawn.
    pub draws: i32,
    /// 1-based position.
    pub rank: usize,
}

/// Orders records by wins (descending), then win rate (descending), then
/// player id (ascending), and keeps the first `limit`.
#[instrument(skip(records), fields(count = records.len()))]
pub fn leaderboard(mut records: Vec<Record>, limit: usize) -> Vec<LeaderboardEntry> {
    records.sort_by(compare);
    records
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| LeaderboardEntry {
            player_id: r.player_id().clone(),
            wins: *r.wins(),
            losses: *r.losses(),
            draws: *r.draws(),
            rank: i + 1,
        })
        .collect()
}

fn compare(a: &Record, b: &Record) -> Ordering {
    b.wins()
        .cmp(a.wins())
        .then_with(|| compare_win_rate(b, a))
        .then_with(|| a.player_id().cmp(b.player_id()))
}

/// Compares wins/total exactly by cross-multiplying. No games counts as 0.
fn compare_win_rate(a: &Record, b: &Record) -> Ordering {
    let lhs = i64::from(*a.wins()) * i64::from(b.total_games().max(1));
    let rhs = i64::from(*b.wins()) * i64::from(a.total_games().max(1));
    lhs.cmp(&rhs)
}
