//! Errors raised by game session operations.

use crate::games::gomoku::BoardError;

/// Error returned when a session rejects an operation.
///
/// Every variant except [`SessionError::InvariantViolation`] leaves the
/// session unchanged.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum SessionError {
    /// The caller is a participant but the other side is to move.
    #[display("Not your turn")]
    NotYourTurn,

    /// The board rejected the placement.
    #[display("Illegal move: {}", _0)]
    #[from]
    IllegalMove(BoardError),

    /// The caller is not bound to either side.
    #[display("You are not a player in this game")]
    NotAPlayer,

    /// The game is still waiting for a second player.
    #[display("Game has not started")]
    NotStarted,

    /// Moves are blocked until the pending draw offer is answered.
    #[display("A draw offer is pending")]
    DrawOfferPending,

    /// The game has ended and is read-only.
    #[display("Game is already finished")]
    GameAlreadyFinished,

    /// There is no move of the requester to retract.
    #[display("Nothing to undo")]
    NothingToUndo,

    /// Undo is refused while a draw offer is pending.
    #[display("Undo is not allowed while a draw offer is pending")]
    UndoNotAllowed,

    /// The caller already has an open draw offer.
    #[display("You have already offered a draw")]
    DrawAlreadyOffered,

    /// There is no draw offer to answer.
    #[display("There is no draw offer to answer")]
    NoDrawOffer,

    /// The offering side tried to answer its own offer.
    #[display("You cannot answer your own draw offer")]
    CannotRespondToOwnOffer,

    /// A side is still unbound.
    #[display("Both sides must be bound before the game starts")]
    MissingPlayer,

    /// The game has already left the waiting phase.
    #[display("Game has already started")]
    AlreadyStarted,

    /// Both seats are taken.
    #[display("Game already has two players")]
    SessionFull,

    /// The creator tried to take the second seat.
    #[display("You cannot join your own game")]
    CannotJoinOwnGame,

    /// Internal state is inconsistent. The session must be discarded.
    #[display("Invariant violation: {}", _0)]
    InvariantViolation(String),
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::IllegalMove(e) => Some(e),
            _ => None,
        }
    }
}
