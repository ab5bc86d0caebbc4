//! Win detection logic for gomoku.
//!
//! Only the four lines through the last placed stone are scanned, so the
//! cost of a check is bounded by the board edge and independent of how many
//! moves have been played.

use super::super::{Board, Cell, Position, Stone};
use strum::IntoEnumIterator;
use tracing::instrument;

/// Stones in a row needed to win. Longer runs also win.
pub const WIN_LENGTH: usize = 5;

/// One of the four lines through a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum Axis {
    /// Along a row.
    Horizontal,
    /// Along a column.
    Vertical,
    /// Top-left to bottom-right.
    Diagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl Axis {
    /// (row, col) step along the axis.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Axis::Horizontal => (0, 1),
            Axis::Vertical => (1, 0),
            Axis::Diagonal => (1, 1),
            Axis::AntiDiagonal => (1, -1),
        }
    }
}

/// A contiguous run of one colour along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Stones in the run, including the origin cell.
    pub length: usize,
    /// How many of the two cells bounding the run are empty (0-2).
    pub open_ends: u8,
}

/// Measures the run through `pos` along `axis`, treating `pos` itself as
/// holding `stone` whatever it currently contains.
pub fn run_through(board: &Board, pos: Position, axis: Axis, stone: Stone) -> Run {
    let (dr, dc) = axis.delta();
    let mut length = 1;
    let mut open_ends = 0;

    for sign in [1isize, -1] {
        let mut step = 1isize;
        loop {
            let cell = offset(pos, dr * sign * step, dc * sign * step).and_then(|p| board.get(p));
            match cell {
                Some(c) if c.holds(stone) => {
                    length += 1;
                    step += 1;
                }
                Some(Cell::Empty) => {
                    open_ends += 1;
                    break;
                }
                _ => break,
            }
        }
    }

    Run { length, open_ends }
}

/// Returns true if placing `stone` at (row, col) completes five or more in a
/// row on at least one axis.
#[instrument(skip(board))]
pub fn check_win(board: &Board, row: usize, col: usize, stone: Stone) -> bool {
    if !board.in_bounds(row, col) {
        return false;
    }
    let pos = Position::new(row, col);
    Axis::iter().any(|axis| run_through(board, pos, axis, stone).length >= WIN_LENGTH)
}

fn offset(pos: Position, dr: isize, dc: isize) -> Option<Position> {
    let row = pos.row.checked_add_signed(dr)?;
    let col = pos.col.checked_add_signed(dc)?;
    Some(Position::new(row, col))
}
