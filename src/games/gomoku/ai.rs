//! Heuristic move selection for the automated opponent.
//!
//! No tree search is performed. Each candidate cell is scored once from the
//! lines it would form for both colours, which keeps the reply time bounded
//! by the number of candidates.

use super::rules::{Axis, Run, WIN_LENGTH, run_through};
use super::{Board, Cell, Position, Stone};
use std::collections::BTreeSet;
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

/// Picks moves and answers draw offers for an automated player.
///
/// Implementations must return a position that is empty on `board`, or
/// `None` only when the board has no empty cell. Callers still validate the
/// answer and fall back to a legal move if an implementation misbehaves.
pub trait MoveEvaluator: std::fmt::Debug + Send + Sync {
    /// Chooses the next move for `stone`.
    fn select_move(&self, board: &Board, stone: Stone) -> Option<Position>;

    /// Decides whether `stone` accepts a draw offered by its opponent.
    fn accepts_draw(&self, board: &Board, stone: Stone) -> bool {
        let _ = (board, stone);
        false
    }
}

/// Own five in a row. Dominates every other term.
const WIN_SCORE: i64 = 1_000_000_000;
/// Blocks an opponent five. Dominates all line and centre terms.
const BLOCK_SCORE: i64 = 100_000_000;

const OPEN_FOUR: i64 = 100_000;
const CLOSED_FOUR: i64 = 10_000;
const OPEN_THREE: i64 = 5_000;
const CLOSED_THREE: i64 = 500;
const OPEN_TWO: i64 = 200;
const CLOSED_TWO: i64 = 50;
const OPEN_ONE: i64 = 10;
const CLOSED_ONE: i64 = 2;

/// Line evaluator restricted to cells near existing stones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicEvaluator {
    radius: usize,
}

impl HeuristicEvaluator {
    /// Default candidate radius around existing stones.
    pub const DEFAULT_RADIUS: usize = 2;

    /// Creates an evaluator with the default candidate radius.
    pub fn new() -> Self {
        Self {
            radius: Self::DEFAULT_RADIUS,
        }
    }

    /// Creates an evaluator with a custom candidate radius.
    pub fn with_radius(radius: usize) -> Self {
        Self { radius }
    }

    /// Empty cells within the radius of any stone, in row-major order.
    /// On an empty board the centre is the only candidate.
    pub fn candidates(&self, board: &Board) -> Vec<Position> {
        if board.is_empty() {
            return vec![board.center()];
        }
        let mut found = BTreeSet::new();
        for (idx, cell) in board.cells().iter().enumerate() {
            if *cell == Cell::Empty {
                continue;
            }
            let stone_at = Position::new(idx / board.size(), idx % board.size());
            found.extend(
                board
                    .neighbours_within(stone_at, self.radius)
                    .filter(|&p| board.is_empty_at(p)),
            );
        }
        found.into_iter().collect()
    }

    /// Scores placing `stone` at `pos`.
    pub fn score(&self, board: &Board, pos: Position, stone: Stone) -> i64 {
        let own: Vec<Run> = Axis::iter().map(|a| run_through(board, pos, a, stone)).collect();
        if own.iter().any(|r| r.length >= WIN_LENGTH) {
            return WIN_SCORE;
        }

        let theirs: Vec<Run> = Axis::iter()
            .map(|a| run_through(board, pos, a, stone.opponent()))
            .collect();
        let block = if theirs.iter().any(|r| r.length >= WIN_LENGTH) {
            BLOCK_SCORE
        } else {
            0
        };

        let attack: i64 = own.iter().map(|r| line_value(*r)).sum();
        let defence: i64 = theirs.iter().map(|r| line_value(*r)).sum::<i64>() / 2;
        let centre = (2 * board.size()) as i64 - pos.manhattan(board.center()) as i64;

        block + attack + defence + centre
    }

    /// Best candidate and its score, lowest (row, col) on ties.
    fn best(&self, board: &Board, stone: Stone) -> Option<(Position, i64)> {
        let mut best: Option<(Position, i64)> = None;
        for pos in self.candidates(board) {
            let score = self.score(board, pos, stone);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((pos, score));
            }
        }
        best
    }
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveEvaluator for HeuristicEvaluator {
    #[instrument(skip(self, board), fields(stones = board.stone_count()))]
    fn select_move(&self, board: &Board, stone: Stone) -> Option<Position> {
        let choice = self.best(board, stone);
        debug!(?choice, "Evaluated candidates");
        choice.map(|(pos, _)| pos)
    }

    /// Accepts when the opponent's best move outscores its own.
    #[instrument(skip(self, board), fields(stones = board.stone_count()))]
    fn accepts_draw(&self, board: &Board, stone: Stone) -> bool {
        let own = self.best(board, stone).map_or(0, |(_, s)| s);
        let theirs = self.best(board, stone.opponent()).map_or(0, |(_, s)| s);
        debug!(own, theirs, "Weighed draw offer");
        theirs > own
    }
}

fn line_value(run: Run) -> i64 {
    match (run.length.min(4), run.open_ends) {
        (_, 0) => 0,
        (4, 2) => OPEN_FOUR,
        (4, _) => CLOSED_FOUR,
        (3, 2) => OPEN_THREE,
        (3, _) => CLOSED_THREE,
        (2, 2) => OPEN_TWO,
        (2, _) => CLOSED_TWO,
        (_, 2) => OPEN_ONE,
        _ => CLOSED_ONE,
    }
}
