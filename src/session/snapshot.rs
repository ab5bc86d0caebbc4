//! Read-only views of a session for display and notification.

use crate::games::gomoku::{Cell, Move, Outcome, Phase, Position, Stone};
use serde::{Deserialize, Serialize};

/// Complete state of one session at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Conversation or channel the session belongs to.
    pub context_id: String,
    /// Board edge length.
    pub size: usize,
    /// Grid rows, top to bottom. `None` is an empty cell.
    pub grid: Vec<Vec<Option<Stone>>>,
    /// Most recent move, if any.
    pub last_move: Option<Move>,
    /// Side to move. `None` unless the game is in progress.
    pub to_move: Option<Stone>,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Number of moves in the log.
    pub move_count: usize,
    /// Player bound to Black.
    pub black_id: Option<String>,
    /// Player bound to White.
    pub white_id: Option<String>,
}

impl BoardSnapshot {
    /// Builds a snapshot grid from row-major cells.
    pub(crate) fn grid_from<'a>(rows: impl Iterator<Item = &'a [Cell]>) -> Vec<Vec<Option<Stone>>> {
        rows.map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Empty => None,
                    Cell::Occupied(stone) => Some(*stone),
                })
                .collect()
        })
        .collect()
    }

    /// Outcome of a finished game.
    pub fn outcome(&self) -> Option<Outcome> {
        self.phase.outcome()
    }

    /// Renders the board as text.
    ///
    /// Rows are labelled `A`, `B`, ... and columns `1`, `2`, ...; the last
    /// move is bracketed. A status line follows the grid.
    pub fn render(&self) -> String {
        let last = self.last_move.map(|m| m.position);
        let header: String = (1..=self.size).map(|col| format!("{:>3}", col)).collect();
        let mut out = format!("   {}\n", header);

        for (row, cells) in self.grid.iter().enumerate() {
            let line: String = cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let symbol = cell.map_or('.', Stone::symbol);
                    if last == Some(Position::new(row, col)) {
                        format!("[{}]", symbol)
                    } else {
                        format!(" {} ", symbol)
                    }
                })
                .collect();
            out.push_str(&format!("{:>2} {}\n", Position::row_letter(row), line));
        }

        let status = match self.phase {
            Phase::WaitingForPlayers => "Waiting for a second player".to_string(),
            Phase::InProgress => self
                .to_move
                .map(|stone| format!("Move {}: {} to play", self.move_count + 1, stone))
                .unwrap_or_default(),
            Phase::DrawOffered { by } => format!("{} offers a draw", by),
            Phase::Finished(outcome) => format!("Game over: {}", outcome),
        };
        out.push_str(&status);
        out
    }
}

/// Emitted once when a game reaches a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeNotification {
    /// Context the game ran in.
    pub context_id: String,
    /// How it ended.
    pub outcome: Outcome,
    /// Player who had Black.
    pub black_id: String,
    /// Player who had White.
    pub white_id: String,
}

impl OutcomeNotification {
    /// Id of the winning player, if any.
    pub fn winner_id(&self) -> Option<&str> {
        self.outcome.winner().map(|stone| match stone {
            Stone::Black => self.black_id.as_str(),
            Stone::White => self.white_id.as_str(),
        })
    }
}

impl std::fmt::Display for OutcomeNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.winner_id() {
            Some(winner) => write!(f, "{} ({})", self.outcome, winner),
            None => write!(f, "{} between {} and {}", self.outcome, self.black_id, self.white_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_last(last: Option<Move>) -> BoardSnapshot {
        let mut grid = vec![vec![None; 5]; 5];
        if let Some(m) = last {
            grid[m.position.row][m.position.col] = Some(m.stone);
        }
        BoardSnapshot {
            context_id: "ctx".to_string(),
            size: 5,
            grid,
            last_move: last,
            to_move: Some(Stone::White),
            phase: Phase::InProgress,
            move_count: 1,
            black_id: Some("alice".to_string()),
            white_id: Some("bob".to_string()),
        }
    }

    #[test]
    fn test_render_marks_last_move() {
        let m = Move::new(Position::new(2, 2), Stone::Black, 0);
        let text = snapshot_with_last(Some(m)).render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[3].starts_with(" C "));
        assert!(lines[3].contains("[X]"));
        assert!(lines[6].contains("White to play"));
    }

    #[test]
    fn test_render_header_and_finished_status() {
        let mut snapshot = snapshot_with_last(None);
        snapshot.phase = Phase::Finished(Outcome::Draw);
        snapshot.to_move = None;
        let text = snapshot.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "     1  2  3  4  5");
        assert_eq!(lines[1], " A  .  .  .  .  . ");
        assert!(lines[6].starts_with("Game over:"));
    }

    #[test]
    fn test_notification_winner() {
        let note = OutcomeNotification {
            context_id: "ctx".to_string(),
            outcome: Outcome::Surrender { loser: Stone::Black },
            black_id: "alice".to_string(),
            white_id: "bob".to_string(),
        };
        assert_eq!(note.winner_id(), Some("bob"));
    }
}
