//! Game sessions: one gomoku game bound to one context.
//!
//! A [`GameSession`] owns the board, the move log and the phase machine.
//! Every mutating operation validates first and only then changes state, so
//! a rejected command leaves the session exactly as it was. When the side to
//! move is the automated player its reply is played inside the same call.

mod error;
mod snapshot;

pub use error::SessionError;
pub use snapshot::{BoardSnapshot, OutcomeNotification};

use crate::games::gomoku::{
    Board, Move, MoveEvaluator, Outcome, Phase, Position, Stone, rules,
};
use crate::records::{RecordOutcome, RecordStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Identifier of the conversation or channel a session lives in.
pub type ContextId = String;

/// Identifier of a participant.
pub type PlayerId = String;

/// Who controls a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// A person issuing commands.
    Human,
    /// The built-in evaluator.
    Ai,
}

/// A participant bound to one colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Participant id.
    pub id: PlayerId,
    /// Human or automated.
    pub kind: PlayerKind,
    /// Colour played.
    pub stone: Stone,
}

impl Player {
    /// Creates a human player.
    pub fn human(id: impl Into<PlayerId>, stone: Stone) -> Self {
        Self {
            id: id.into(),
            kind: PlayerKind::Human,
            stone,
        }
    }

    /// Creates an automated player.
    pub fn ai(id: impl Into<PlayerId>, stone: Stone) -> Self {
        Self {
            id: id.into(),
            kind: PlayerKind::Ai,
            stone,
        }
    }

    /// Returns true for the automated player.
    pub fn is_ai(&self) -> bool {
        self.kind == PlayerKind::Ai
    }
}

/// Parameters for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Board edge length.
    pub board_size: usize,
    /// Player who created the game.
    pub creator: PlayerId,
    /// Colour of the creator.
    pub creator_stone: Stone,
    /// Automated opponent id, or `None` for an open seat.
    pub ai_opponent: Option<PlayerId>,
}

impl SessionConfig {
    /// Human game: the creator plays Black and White stays open until joined.
    pub fn human_vs_human(creator: impl Into<PlayerId>, board_size: usize) -> Self {
        Self {
            board_size,
            creator: creator.into(),
            creator_stone: Stone::Black,
            ai_opponent: None,
        }
    }

    /// Game against the automated player.
    pub fn human_vs_ai(
        human: impl Into<PlayerId>,
        ai_id: impl Into<PlayerId>,
        human_stone: Stone,
        board_size: usize,
    ) -> Self {
        Self {
            board_size,
            creator: human.into(),
            creator_stone: human_stone,
            ai_opponent: Some(ai_id.into()),
        }
    }
}

/// One gomoku game.
#[derive(Debug)]
pub struct GameSession {
    context_id: ContextId,
    board: Board,
    moves: Vec<Move>,
    black: Option<Player>,
    white: Option<Player>,
    creator: PlayerId,
    phase: Phase,
    created_at: Instant,
    draw_offered_at: Option<Instant>,
    evaluator: Arc<dyn MoveEvaluator>,
    records: Arc<dyn RecordStore>,
    notification: Option<OutcomeNotification>,
    reported: bool,
}

impl GameSession {
    /// Creates a session in [`Phase::WaitingForPlayers`].
    ///
    /// The creator is bound to its colour; an automated opponent is bound to
    /// the other one. Call [`GameSession::start`] or [`GameSession::join`]
    /// to begin play.
    #[instrument(skip(config, evaluator, records), fields(creator = %config.creator, size = config.board_size))]
    pub fn new(
        context_id: impl Into<ContextId> + std::fmt::Debug,
        config: SessionConfig,
        evaluator: Arc<dyn MoveEvaluator>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let context_id = context_id.into();
        let creator = Player::human(config.creator.clone(), config.creator_stone);
        let opponent = config
            .ai_opponent
            .map(|id| Player::ai(id, config.creator_stone.opponent()));
        let (black, white) = match config.creator_stone {
            Stone::Black => (Some(creator), opponent),
            Stone::White => (opponent, Some(creator)),
        };
        info!(context_id = %context_id, "Creating game session");
        Self {
            context_id,
            board: Board::new(config.board_size),
            moves: Vec::new(),
            black,
            white,
            creator: config.creator,
            phase: Phase::WaitingForPlayers,
            created_at: Instant::now(),
            draw_offered_at: None,
            evaluator,
            records,
            notification: None,
            reported: false,
        }
    }

    /// Context this session belongs to.
    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Current board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Move log, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Player who created the game.
    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Player bound to Black.
    pub fn black(&self) -> Option<&Player> {
        self.black.as_ref()
    }

    /// Player bound to White.
    pub fn white(&self) -> Option<&Player> {
        self.white.as_ref()
    }

    /// When the session was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns true until the game finishes.
    pub fn is_active(&self) -> bool {
        !self.phase.is_finished()
    }

    /// Returns true while the second seat is open.
    pub fn is_waiting(&self) -> bool {
        self.phase == Phase::WaitingForPlayers
    }

    /// Returns true if one side is the automated player.
    pub fn is_ai_game(&self) -> bool {
        self.seats().any(Player::is_ai)
    }

    /// Colour played by `player_id`, if bound.
    pub fn player_stone(&self, player_id: &str) -> Option<Stone> {
        self.seats().find(|p| p.id == player_id).map(|p| p.stone)
    }

    /// Side to move, derived from the parity of the move log.
    pub fn side_to_move(&self) -> Stone {
        if self.moves.len() % 2 == 0 {
            Stone::Black
        } else {
            Stone::White
        }
    }

    /// Binds the second player to the open seat and starts the game.
    ///
    /// # Errors
    ///
    /// [`SessionError::CannotJoinOwnGame`], [`SessionError::SessionFull`],
    /// [`SessionError::GameAlreadyFinished`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn join(&mut self, player_id: &str) -> Result<Stone, SessionError> {
        if self.phase.is_finished() {
            return Err(SessionError::GameAlreadyFinished);
        }
        if player_id == self.creator {
            warn!(player_id, "Creator tried to join own game");
            return Err(SessionError::CannotJoinOwnGame);
        }
        let stone = match (&self.black, &self.white) {
            (None, _) => Stone::Black,
            (_, None) => Stone::White,
            _ => {
                warn!(player_id, "Join rejected, both seats taken");
                return Err(SessionError::SessionFull);
            }
        };
        let player = Player::human(player_id, stone);
        match stone {
            Stone::Black => self.black = Some(player),
            Stone::White => self.white = Some(player),
        }
        info!(player_id, %stone, "Player joined");
        self.start()?;
        Ok(stone)
    }

    /// Leaves the waiting phase once both sides are bound. Black moves first;
    /// if Black is the automated player its opening move is played and
    /// returned.
    ///
    /// # Errors
    ///
    /// [`SessionError::MissingPlayer`], [`SessionError::AlreadyStarted`],
    /// [`SessionError::GameAlreadyFinished`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn start(&mut self) -> Result<Vec<Move>, SessionError> {
        match self.phase {
            Phase::WaitingForPlayers => {}
            Phase::Finished(_) => return Err(SessionError::GameAlreadyFinished),
            Phase::InProgress | Phase::DrawOffered { .. } => {
                return Err(SessionError::AlreadyStarted);
            }
        }
        if self.black.is_none() || self.white.is_none() {
            return Err(SessionError::MissingPlayer);
        }
        self.phase = Phase::InProgress;
        info!("Game started");

        let mut played = Vec::new();
        if self.ai_to_move() {
            played.push(self.play_ai_reply()?);
        }
        Ok(played)
    }

    /// Places a stone for `player_id`.
    ///
    /// Returns the moves played by this call: the player's move, followed by
    /// the automated reply when the opponent is the AI and the game goes on.
    ///
    /// # Errors
    ///
    /// [`SessionError::GameAlreadyFinished`], [`SessionError::NotAPlayer`],
    /// [`SessionError::NotStarted`], [`SessionError::DrawOfferPending`],
    /// [`SessionError::NotYourTurn`], [`SessionError::IllegalMove`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn place_stone(&mut self, player_id: &str, pos: Position) -> Result<Vec<Move>, SessionError> {
        let stone = self.participant(player_id)?;
        match self.phase {
            Phase::InProgress => {}
            Phase::DrawOffered { .. } => return Err(SessionError::DrawOfferPending),
            Phase::WaitingForPlayers => return Err(SessionError::NotStarted),
            Phase::Finished(_) => return Err(SessionError::GameAlreadyFinished),
        }
        if stone != self.side_to_move() {
            debug!(player_id, %stone, "Move out of turn");
            return Err(SessionError::NotYourTurn);
        }
        // Board::place validates before mutating, so a rejected move leaves no trace.
        let mut played = vec![self.apply_move(pos, stone)?];
        if self.ai_to_move() {
            played.push(self.play_ai_reply()?);
        }
        Ok(played)
    }

    /// Retracts moves on behalf of `player_id` and returns them, most
    /// recent first.
    ///
    /// Against the AI this goes back to the requester's previous turn, which
    /// usually removes the AI reply and the requester's last move. Between
    /// humans the single most recent move is retracted, whoever played it.
    ///
    /// # Errors
    ///
    /// [`SessionError::NothingToUndo`], [`SessionError::UndoNotAllowed`],
    /// [`SessionError::GameAlreadyFinished`], [`SessionError::NotStarted`],
    /// [`SessionError::NotAPlayer`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn undo(&mut self, player_id: &str) -> Result<Vec<Move>, SessionError> {
        let stone = self.participant(player_id)?;
        match self.phase {
            Phase::InProgress => {}
            Phase::DrawOffered { .. } => return Err(SessionError::UndoNotAllowed),
            Phase::WaitingForPlayers => return Err(SessionError::NotStarted),
            Phase::Finished(_) => return Err(SessionError::GameAlreadyFinished),
        }

        let count = if self.is_ai_game() {
            match self.moves.iter().rposition(|m| m.stone == stone) {
                Some(idx) => self.moves.len() - idx,
                None => return Err(SessionError::NothingToUndo),
            }
        } else {
            if self.moves.is_empty() {
                return Err(SessionError::NothingToUndo);
            }
            1
        };

        let mut retracted = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(m) = self.moves.pop() else {
                return Err(self.violation("move log emptied during undo"));
            };
            if let Err(e) = self.board.remove(m.position.row, m.position.col) {
                return Err(self.violation(&format!("undo of {} failed: {}", m, e)));
            }
            retracted.push(m);
        }
        self.check_invariants()?;
        info!(player_id, retracted = retracted.len(), "Moves retracted");
        Ok(retracted)
    }

    /// Offers a draw. If the opponent already has an offer open this accepts
    /// it. The automated player answers immediately.
    ///
    /// Returns the resulting phase.
    ///
    /// # Errors
    ///
    /// [`SessionError::DrawAlreadyOffered`], [`SessionError::NotStarted`],
    /// [`SessionError::GameAlreadyFinished`], [`SessionError::NotAPlayer`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn offer_draw(&mut self, player_id: &str) -> Result<Phase, SessionError> {
        let stone = self.participant(player_id)?;
        match self.phase {
            Phase::WaitingForPlayers => return Err(SessionError::NotStarted),
            Phase::Finished(_) => return Err(SessionError::GameAlreadyFinished),
            Phase::DrawOffered { by } if by == stone => {
                return Err(SessionError::DrawAlreadyOffered);
            }
            Phase::DrawOffered { .. } => {
                info!(player_id, "Crossing draw offers, accepting");
                self.finish(Outcome::Draw);
                return Ok(self.phase);
            }
            Phase::InProgress => {}
        }

        self.phase = Phase::DrawOffered { by: stone };
        self.draw_offered_at = Some(Instant::now());
        info!(player_id, %stone, "Draw offered");

        if self.seat(stone.opponent()).is_some_and(Player::is_ai) {
            if self.evaluator.accepts_draw(&self.board, stone.opponent()) {
                info!("AI accepted draw");
                self.finish(Outcome::Draw);
            } else {
                info!("AI declined draw");
                self.clear_draw_offer();
            }
        }
        Ok(self.phase)
    }

    /// Answers the opponent's pending draw offer.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoDrawOffer`], [`SessionError::CannotRespondToOwnOffer`],
    /// [`SessionError::NotStarted`], [`SessionError::GameAlreadyFinished`],
    /// [`SessionError::NotAPlayer`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn respond_draw(&mut self, player_id: &str, accept: bool) -> Result<Phase, SessionError> {
        let stone = self.participant(player_id)?;
        match self.phase {
            Phase::DrawOffered { by } if by == stone => Err(SessionError::CannotRespondToOwnOffer),
            Phase::DrawOffered { .. } => {
                if accept {
                    info!(player_id, "Draw accepted");
                    self.finish(Outcome::Draw);
                } else {
                    info!(player_id, "Draw declined");
                    self.clear_draw_offer();
                }
                Ok(self.phase)
            }
            Phase::InProgress => Err(SessionError::NoDrawOffer),
            Phase::WaitingForPlayers => Err(SessionError::NotStarted),
            Phase::Finished(_) => Err(SessionError::GameAlreadyFinished),
        }
    }

    /// Resigns on behalf of `player_id`. The other side wins.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotStarted`], [`SessionError::GameAlreadyFinished`],
    /// [`SessionError::NotAPlayer`].
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn surrender(&mut self, player_id: &str) -> Result<Outcome, SessionError> {
        let stone = self.participant(player_id)?;
        match self.phase {
            Phase::InProgress | Phase::DrawOffered { .. } => {}
            Phase::WaitingForPlayers => return Err(SessionError::NotStarted),
            Phase::Finished(_) => return Err(SessionError::GameAlreadyFinished),
        }
        let outcome = Outcome::Surrender { loser: stone };
        self.finish(outcome);
        Ok(outcome)
    }

    /// Withdraws a draw offer that has been open for at least `timeout`.
    /// Returns true if an offer lapsed.
    #[instrument(skip(self), fields(context_id = %self.context_id))]
    pub fn expire_draw_offer(&mut self, now: Instant, timeout: Duration) -> bool {
        let lapsed = matches!(self.phase, Phase::DrawOffered { .. })
            && self
                .draw_offered_at
                .is_some_and(|at| now.saturating_duration_since(at) >= timeout);
        if lapsed {
            info!("Draw offer lapsed");
            self.clear_draw_offer();
        }
        lapsed
    }

    /// Returns true if the game has waited for a second player for at least
    /// `timeout`.
    pub fn join_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.is_waiting() && now.saturating_duration_since(self.created_at) >= timeout
    }

    /// Current state for display.
    pub fn snapshot(&self) -> BoardSnapshot {
        let to_move = match self.phase {
            Phase::InProgress | Phase::DrawOffered { .. } => Some(self.side_to_move()),
            Phase::WaitingForPlayers | Phase::Finished(_) => None,
        };
        BoardSnapshot {
            context_id: self.context_id.clone(),
            size: self.board.size(),
            grid: BoardSnapshot::grid_from(self.board.rows()),
            last_move: self.moves.last().copied(),
            to_move,
            phase: self.phase,
            move_count: self.moves.len(),
            black_id: self.black.as_ref().map(|p| p.id.clone()),
            white_id: self.white.as_ref().map(|p| p.id.clone()),
        }
    }

    /// Takes the outcome notification. Yields `Some` at most once per game.
    pub fn take_notification(&mut self) -> Option<OutcomeNotification> {
        self.notification.take()
    }

    /// Verifies the board and the move log agree.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvariantViolation`] when they do not.
    pub fn check_invariants(&self) -> Result<(), SessionError> {
        if self.board.stone_count() != self.moves.len() {
            return Err(self.violation(&format!(
                "board holds {} stones but the log has {} moves",
                self.board.stone_count(),
                self.moves.len()
            )));
        }
        Ok(())
    }

    fn seats(&self) -> impl Iterator<Item = &Player> {
        self.black.iter().chain(self.white.iter())
    }

    fn seat(&self, stone: Stone) -> Option<&Player> {
        match stone {
            Stone::Black => self.black.as_ref(),
            Stone::White => self.white.as_ref(),
        }
    }

    fn participant(&self, player_id: &str) -> Result<Stone, SessionError> {
        if self.phase.is_finished() {
            return Err(SessionError::GameAlreadyFinished);
        }
        self.player_stone(player_id).ok_or_else(|| {
            debug!(player_id, "Command from non-participant");
            SessionError::NotAPlayer
        })
    }

    fn ai_to_move(&self) -> bool {
        self.phase == Phase::InProgress && self.seat(self.side_to_move()).is_some_and(Player::is_ai)
    }

    fn violation(&self, detail: &str) -> SessionError {
        error!(context_id = %self.context_id, detail, "Session invariant violated");
        SessionError::InvariantViolation(detail.to_string())
    }

    /// Places a validated stone, logs it, and settles win or draw.
    fn apply_move(&mut self, pos: Position, stone: Stone) -> Result<Move, SessionError> {
        self.board.place(pos.row, pos.col, stone)?;
        let m = Move::new(pos, stone, self.moves.len());
        self.moves.push(m);
        self.check_invariants()?;
        debug!(%m, "Stone placed");

        if rules::check_win(&self.board, pos.row, pos.col, stone) {
            self.finish(Outcome::five_in_a_row(stone));
        } else if rules::check_draw(&self.board, pos, stone) {
            self.finish(Outcome::Draw);
        }
        Ok(m)
    }

    #[instrument(skip(self), fields(context_id = %self.context_id, moves = self.moves.len()))]
    fn play_ai_reply(&mut self) -> Result<Move, SessionError> {
        let stone = self.side_to_move();
        let pos = match self.evaluator.select_move(&self.board, stone) {
            Some(pos) if self.board.is_empty_at(pos) => pos,
            choice => {
                warn!(?choice, "Evaluator returned no legal move, using fallback");
                nearest_empty_to_centre(&self.board)
                    .ok_or_else(|| self.violation("AI to move on a full board"))?
            }
        };
        self.apply_move(pos, stone)
    }

    fn clear_draw_offer(&mut self) {
        self.phase = Phase::InProgress;
        self.draw_offered_at = None;
    }

    /// Enters the terminal phase, reports the result once, and queues the
    /// notification.
    fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Finished(outcome);
        self.draw_offered_at = None;
        info!(context_id = %self.context_id, %outcome, moves = self.moves.len(), "Game finished");

        if self.reported {
            return;
        }
        self.reported = true;
        self.report(outcome);

        if let (Some(black), Some(white)) = (&self.black, &self.white) {
            self.notification = Some(OutcomeNotification {
                context_id: self.context_id.clone(),
                outcome,
                black_id: black.id.clone(),
                white_id: white.id.clone(),
            });
        }
    }

    /// Store failures are logged; the outcome stands regardless.
    fn report(&self, outcome: Outcome) {
        for player in self.seats().filter(|p| !p.is_ai()) {
            let result = match outcome.winner() {
                None => RecordOutcome::Draw,
                Some(winner) if winner == player.stone => RecordOutcome::Win,
                Some(_) => RecordOutcome::Loss,
            };
            match self.records.update(&player.id, result) {
                Ok(record) => debug!(player_id = %player.id, %result, wins = record.wins(), "Record updated"),
                Err(e) => error!(player_id = %player.id, %result, error = %e, "Failed to record result"),
            }
        }
    }
}

/// Empty cell closest to the centre, lowest (row, col) on ties.
fn nearest_empty_to_centre(board: &Board) -> Option<Position> {
    let centre = board.center();
    (0..board.size())
        .flat_map(|row| (0..board.size()).map(move |col| Position::new(row, col)))
        .filter(|&p| board.is_empty_at(p))
        .min_by_key(|&p| (p.manhattan(centre), p))
}
