//! Gomoku: board, rules, phases and the heuristic opponent.

mod action;
mod ai;
mod phases;
mod position;
pub mod rules;
mod types;

pub use action::Move;
pub use ai::{HeuristicEvaluator, MoveEvaluator};
pub use phases::{Outcome, Phase};
pub use position::Position;
pub use types::{Board, BoardError, Cell, MAX_SIZE, MIN_SIZE, STANDARD_SIZE, Stone};
