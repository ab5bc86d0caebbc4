//! Tests for the heuristic move evaluator.

use strictly_gomoku::{Board, HeuristicEvaluator, MoveEvaluator, Position, Stone};

fn board_with(size: usize, black: &[(usize, usize)], white: &[(usize, usize)]) -> Board {
    let mut board = Board::new(size);
    for &(r, c) in black {
        board.place(r, c, Stone::Black).expect("Black placement failed");
    }
    for &(r, c) in white {
        board.place(r, c, Stone::White).expect("White placement failed");
    }
    board
}

#[test]
fn test_takes_own_win_lowest_cell() {
    let board = board_with(
        15,
        &[(0, 0), (0, 1), (0, 2), (0, 3), (5, 0), (5, 1), (5, 2), (5, 3)],
        &[(10, 10), (10, 11), (11, 10), (11, 11), (12, 12), (13, 13)],
    );
    let choice = HeuristicEvaluator::new().select_move(&board, Stone::Black);
    assert_eq!(choice, Some(Position::new(0, 4)));
}

#[test]
fn test_prefers_win_over_block() {
    let board = board_with(
        15,
        &[(9, 3), (9, 4), (9, 5), (9, 6)],
        &[(2, 3), (2, 4), (2, 5), (2, 6), (14, 14)],
    );
    let choice = HeuristicEvaluator::new().select_move(&board, Stone::White);
    assert!(
        choice == Some(Position::new(2, 2)) || choice == Some(Position::new(2, 7)),
        "expected a winning cell, got {:?}",
        choice
    );
}

#[test]
fn test_blocks_opponent_five() {
    let board = board_with(15, &[(3, 3), (4, 4), (5, 5), (6, 6)], &[(3, 4), (0, 14), (14, 0)]);
    let choice = HeuristicEvaluator::new().select_move(&board, Stone::White);
    assert!(
        choice == Some(Position::new(2, 2)) || choice == Some(Position::new(7, 7)),
        "expected a block, got {:?}",
        choice
    );
}

#[test]
fn test_extends_own_line_on_quiet_board() {
    let board = board_with(15, &[(7, 7), (7, 8)], &[(0, 0)]);
    let choice = HeuristicEvaluator::new()
        .select_move(&board, Stone::Black)
        .expect("Board has empty cells");
    assert_eq!(choice.row, 7, "expected to extend the row, got {}", choice);
}

#[test]
fn test_never_selects_occupied_cell() {
    let eval = HeuristicEvaluator::new();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    for _ in 0..20 {
        let mut board = Board::new(9);
        let mut stone = Stone::Black;
        for _ in 0..40 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let idx = (seed >> 33) as usize % 81;
            if board.place(idx / 9, idx % 9, stone).is_ok() {
                stone = stone.opponent();
            }
        }
        if let Some(pos) = eval.select_move(&board, stone) {
            assert!(board.is_empty_at(pos), "{} is occupied", pos);
        } else {
            assert!(board.is_full());
        }
    }
}

#[test]
fn test_declines_draw_when_ahead() {
    let board = board_with(15, &[(7, 5), (7, 6), (7, 7)], &[(0, 0)]);
    let eval = HeuristicEvaluator::new();
    assert!(!eval.accepts_draw(&board, Stone::Black));
    assert!(eval.accepts_draw(&board, Stone::White));
}
