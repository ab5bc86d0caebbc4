//! Board coordinates and their text notation.
//!
//! Rows are labelled with letters (`A` is row 0) and columns with
//! 1-based numbers, so `H8` is the centre of a 15x15 board.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A zero-based (row, col) coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row index, 0 at the top.
    pub row: usize,
    /// Column index, 0 at the left.
    pub col: usize,
}

impl Position {
    /// Creates a position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Letter for a row index (`A` is row 0).
    pub fn row_letter(row: usize) -> char {
        char::from(b'A' + (row % 26) as u8)
    }

    /// Text label such as `H8`.
    pub fn label(self) -> String {
        format!("{}{}", Self::row_letter(self.row), self.col + 1)
    }

    /// Parses a label such as `h8` or `H8` for a board of the given size.
    ///
    /// Returns `None` for malformed text or coordinates off the board.
    #[instrument]
    pub fn from_label(s: &str, size: usize) -> Option<Self> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let row = (letter as u8 - b'A') as usize;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let col = digits.parse::<usize>().ok()?.checked_sub(1)?;
        (row < size && col < size).then_some(Self { row, col })
    }

    /// Manhattan distance to another position.
    pub fn manhattan(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
