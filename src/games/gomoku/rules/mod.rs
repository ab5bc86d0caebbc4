//! Game rules for gomoku.
//!
//! Pure functions over a [`Board`](super::Board): move legality,
//! five-in-a-row detection and full-board draws. Rules are kept apart from
//! board storage so the evaluator and the session share one definition.

pub mod draw;
pub mod win;

pub use draw::{check_draw, is_full};
pub use win::{Axis, Run, WIN_LENGTH, check_win, run_through};

use super::Board;

/// A move is legal when it is on the board and the cell is empty.
pub fn is_legal_move(board: &Board, row: usize, col: usize) -> bool {
    board.cell_at(row, col) == Some(super::Cell::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::gomoku::Stone;

    #[test]
    fn test_legality() {
        let mut board = Board::standard();
        assert!(is_legal_move(&board, 0, 0));
        assert!(!is_legal_move(&board, 0, 15));
        board.place(0, 0, Stone::Black).unwrap();
        assert!(!is_legal_move(&board, 0, 0));
    }
}
