//! First-class move records for gomoku.
//!
//! The ordered list of moves is the replay log of a game. Its sequence
//! index is the unit of undo.

use super::{Position, Stone};
use serde::{Deserialize, Serialize};

/// A stone placed by one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Where the stone went.
    pub position: Position,
    /// Which colour was placed.
    pub stone: Stone,
    /// Zero-based index in the move log.
    pub seq: usize,
}

impl Move {
    /// Creates a new move.
    pub fn new(position: Position, stone: Stone, seq: usize) -> Self {
        Self {
            position,
            stone,
            seq,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} -> {}", self.seq + 1, self.stone, self.position)
    }
}
