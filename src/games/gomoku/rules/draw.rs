//! Draw detection logic for gomoku.

use super::super::{Board, Position, Stone};
use super::win::check_win;
use tracing::instrument;

/// Checks if the board is full (every cell occupied).
pub fn is_full(board: &Board) -> bool {
    board.is_full()
}

/// Returns true if the move `stone` just played at `last` filled the board
/// without completing five in a row. A win on the filling move takes
/// precedence over the draw.
#[instrument(skip(board))]
pub fn check_draw(board: &Board, last: Position, stone: Stone) -> bool {
    is_full(board) && !check_win(board, last.row, last.col, stone)
}

/// Colour of (row, col) in a tiling that never puts three stones of one
/// colour in a row on any axis. Black gets 113 of the 225 cells on a
/// 15x15 board, so the tiling is reachable by alternating play.
#[cfg(test)]
pub(crate) fn drawn_tiling(row: usize, col: usize) -> Stone {
    if (col / 2 + row) % 2 == 0 {
        Stone::Black
    } else {
        Stone::White
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiled_board(size: usize) -> Board {
        let mut board = Board::new(size);
        for row in 0..size {
            for col in 0..size {
                board.place(row, col, drawn_tiling(row, col)).unwrap();
            }
        }
        board
    }

    #[test]
    fn test_empty_board_not_full() {
        assert!(!is_full(&Board::standard()));
    }

    #[test]
    fn test_tiling_has_no_five() {
        let board = tiled_board(15);
        for row in 0..15 {
            for col in 0..15 {
                assert!(!check_win(&board, row, col, drawn_tiling(row, col)));
            }
        }
    }

    #[test]
    fn test_tiling_is_balanced_for_alternating_play() {
        let black = (0..15)
            .flat_map(|r| (0..15).map(move |c| (r, c)))
            .filter(|&(r, c)| drawn_tiling(r, c) == Stone::Black)
            .count();
        assert_eq!(black, 113);
    }

    #[test]
    fn test_full_board_without_five_is_draw() {
        let board = tiled_board(15);
        assert!(check_draw(&board, Position::new(14, 14), drawn_tiling(14, 14)));
    }

    #[test]
    fn test_not_draw_if_filling_move_wins() {
        let mut board = Board::new(5);
        for row in 0..5 {
            for col in 0..5 {
                let stone = if row == 0 { Stone::Black } else { drawn_tiling(row, col) };
                board.place(row, col, stone).unwrap();
            }
        }
        assert!(is_full(&board));
        assert!(!check_draw(&board, Position::new(0, 4), Stone::Black));
    }

    #[test]
    fn test_partial_board_not_draw() {
        let mut board = Board::standard();
        board.place(7, 7, Stone::Black).unwrap();
        assert!(!check_draw(&board, Position::new(7, 7), Stone::Black));
    }
}
