//! Session phases and terminal outcomes.

use super::Stone;
use serde::{Deserialize, Serialize};

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Black made five in a row.
    BlackWin,
    /// White made five in a row.
    WhiteWin,
    /// Full board or agreed draw.
    Draw,
    /// One side resigned.
    Surrender {
        /// The side that resigned.
        loser: Stone,
    },
}

impl Outcome {
    /// Outcome for a five-in-a-row by `stone`.
    pub fn five_in_a_row(stone: Stone) -> Self {
        match stone {
            Stone::Black => Outcome::BlackWin,
            Stone::White => Outcome::WhiteWin,
        }
    }

    /// Returns the winning side, if there is one.
    pub fn winner(&self) -> Option<Stone> {
        match self {
            Outcome::BlackWin => Some(Stone::Black),
            Outcome::WhiteWin => Some(Stone::White),
            Outcome::Draw => None,
            Outcome::Surrender { loser } => Some(loser.opponent()),
        }
    }

    /// Returns true if the game was drawn.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::BlackWin => write!(f, "Black wins"),
            Outcome::WhiteWin => write!(f, "White wins"),
            Outcome::Draw => write!(f, "Draw"),
            Outcome::Surrender { loser } => {
                write!(f, "{} resigned, {} wins", loser, loser.opponent())
            }
        }
    }
}

/// Lifecycle phase of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Created, second participant not bound yet.
    WaitingForPlayers,
    /// Moves are being played.
    InProgress,
    /// In progress with a pending draw offer.
    DrawOffered {
        /// The side that offered.
        by: Stone,
    },
    /// Terminal. The session is read-only.
    Finished(Outcome),
}

impl Phase {
    /// Returns true once the game has ended.
    pub fn is_finished(&self) -> bool {
        matches!(self, Phase::Finished(_))
    }

    /// Returns the outcome of a finished game.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Phase::Finished(outcome) => Some(*outcome),
            _ => None,
        }
    }
}
