//! Core domain types for gomoku.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::position::Position;

/// Standard board edge length.
pub const STANDARD_SIZE: usize = 15;

/// Smallest board on which five-in-a-row is still possible.
pub const MIN_SIZE: usize = 5;

/// Largest board the letter row notation can address (A-Z).
pub const MAX_SIZE: usize = 26;

/// Stone colour. Black moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Stone {
    /// First player.
    Black,
    /// Second player.
    White,
}

impl Stone {
    /// Returns the opposing colour.
    pub fn opponent(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }

    /// Single-character symbol used in text rendering.
    pub fn symbol(self) -> char {
        match self {
            Stone::Black => 'X',
            Stone::White => 'O',
        }
    }
}

/// A single intersection on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    /// No stone.
    Empty,
    /// Holds a stone.
    Occupied(Stone),
}

impl Cell {
    /// Returns true if the cell holds the given stone.
    pub fn holds(self, stone: Stone) -> bool {
        self == Cell::Occupied(stone)
    }
}

/// Errors raised by direct board mutation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum BoardError {
    /// Coordinates fall outside the grid.
    #[display("({row}, {col}) is outside the {size}x{size} board")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Board edge length.
        size: usize,
    },
    /// Target cell already holds a stone.
    #[display("({row}, {col}) is already occupied")]
    CellOccupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// Removal requested on an empty cell.
    #[display("({row}, {col}) is already empty")]
    CellAlreadyEmpty {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
}

/// Square gomoku board stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    stones: usize,
}

impl Board {
    /// Creates an empty board with the given edge length.
    #[instrument]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Empty; size * size],
            stones: 0,
        }
    }

    /// Creates an empty 15x15 board.
    pub fn standard() -> Self {
        Self::new(STANDARD_SIZE)
    }

    /// Edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.stones
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells grouped by row.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    /// Returns true if (row, col) lies on the board.
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Returns the cell at (row, col), or `None` if out of bounds.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<Cell> {
        self.in_bounds(row, col)
            .then(|| self.cells[row * self.size + col])
    }

    /// Returns the cell at the given position.
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.cell_at(pos.row, pos.col)
    }

    /// Returns true if the position is on the board and empty.
    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos) == Some(Cell::Empty)
    }

    /// Returns true if no stone has been placed.
    pub fn is_empty(&self) -> bool {
        self.stones == 0
    }

    /// Returns true when every cell holds a stone.
    pub fn is_full(&self) -> bool {
        self.stones == self.cells.len()
    }

    /// Centre intersection (rounded towards the origin on even sizes).
    pub fn center(&self) -> Position {
        Position::new(self.size / 2, self.size / 2)
    }

    /// Places a stone and returns the updated stone count.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfBounds`] or [`BoardError::CellOccupied`].
    #[instrument(skip(self), fields(size = self.size))]
    pub fn place(&mut self, row: usize, col: usize, stone: Stone) -> Result<usize, BoardError> {
        let idx = self.index(row, col)?;
        if self.cells[idx] != Cell::Empty {
            return Err(BoardError::CellOccupied { row, col });
        }
        self.cells[idx] = Cell::Occupied(stone);
        self.stones += 1;
        Ok(self.stones)
    }

    /// Clears a cell and returns the stone that was there.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfBounds`] or [`BoardError::CellAlreadyEmpty`].
    #[instrument(skip(self), fields(size = self.size))]
    pub fn remove(&mut self, row: usize, col: usize) -> Result<Stone, BoardError> {
        let idx = self.index(row, col)?;
        match self.cells[idx] {
            Cell::Empty => Err(BoardError::CellAlreadyEmpty { row, col }),
            Cell::Occupied(stone) => {
                self.cells[idx] = Cell::Empty;
                self.stones -= 1;
                Ok(stone)
            }
        }
    }

    /// Empty positions within `radius` (Chebyshev distance) of `pos`, excluding `pos`.
    pub fn neighbours_within(&self, pos: Position, radius: usize) -> impl Iterator<Item = Position> + '_ {
        let rows = pos.row.saturating_sub(radius)..=(pos.row + radius).min(self.size - 1);
        rows.flat_map(move |row| {
            let cols = pos.col.saturating_sub(radius)..=(pos.col + radius).min(self.size - 1);
            cols.map(move |col| Position::new(row, col))
        })
        .filter(move |&p| p != pos)
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        if self.in_bounds(row, col) {
            Ok(row * self.size + col)
        } else {
            Err(BoardError::OutOfBounds {
                row,
                col,
                size: self.size,
            })
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_returns_stone_count() {
        let mut board = Board::standard();
        assert_eq!(board.place(7, 7, Stone::Black), Ok(1));
        assert_eq!(board.place(7, 8, Stone::White), Ok(2));
        assert_eq!(board.cell_at(7, 7), Some(Cell::Occupied(Stone::Black)));
    }

    #[test]
    fn test_place_out_of_bounds() {
        let mut board = Board::standard();
        let err = board.place(15, 0, Stone::Black).unwrap_err();
        assert_eq!(
            err,
            BoardError::OutOfBounds {
                row: 15,
                col: 0,
                size: 15
            }
        );
        assert_eq!(board.stone_count(), 0);
    }

    #[test]
    fn test_place_on_occupied_cell() {
        let mut board = Board::standard();
        board.place(3, 4, Stone::Black).unwrap();
        let err = board.place(3, 4, Stone::White).unwrap_err();
        assert_eq!(err, BoardError::CellOccupied { row: 3, col: 4 });
        assert_eq!(board.cell_at(3, 4), Some(Cell::Occupied(Stone::Black)));
    }

    #[test]
    fn test_remove() {
        let mut board = Board::standard();
        board.place(0, 0, Stone::White).unwrap();
        assert_eq!(board.remove(0, 0), Ok(Stone::White));
        assert_eq!(board.cell_at(0, 0), Some(Cell::Empty));
        assert_eq!(board.stone_count(), 0);
        assert_eq!(
            board.remove(0, 0),
            Err(BoardError::CellAlreadyEmpty { row: 0, col: 0 })
        );
    }

    #[test]
    fn test_is_full_tracks_stone_count() {
        let mut board = Board::new(5);
        for row in 0..5 {
            for col in 0..5 {
                assert!(!board.is_full());
                board.place(row, col, Stone::Black).unwrap();
            }
        }
        assert!(board.is_full());
        assert_eq!(board.stone_count(), 25);
    }

    #[test]
    fn test_neighbours_clipped_at_corner() {
        let board = Board::standard();
        let around: Vec<_> = board.neighbours_within(Position::new(0, 0), 2).collect();
        assert_eq!(around.len(), 8);
        assert!(!around.contains(&Position::new(0, 0)));
    }
}
