//! Command dispatch: the single entry point for chat or terminal front ends.
//!
//! Front ends translate user input into a [`Command`]; the [`Dispatcher`]
//! routes it to the registry, the owning session or the record store, and
//! answers with a [`Reply`]. Stale sessions are swept before each command.

use crate::config::EngineConfig;
use crate::games::gomoku::{MoveEvaluator, Position, Stone};
use crate::records::{LeaderboardEntry, Record, RecordError, RecordStore, leaderboard};
use crate::registry::{CreateMode, LobbyEntry, RegistryError, SessionRegistry};
use crate::session::{
    BoardSnapshot, ContextId, GameSession, OutcomeNotification, PlayerId, SessionConfig,
    SessionError,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// What a user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Start a game in the context.
    NewGame {
        /// Play the automated opponent instead of waiting for a human.
        vs_ai: bool,
        /// Replace an unfinished game.
        force: bool,
    },
    /// Take the open seat.
    Join,
    /// Withdraw a game nobody has joined.
    Cancel,
    /// Place a stone.
    Place(Position),
    /// Retract the last move (and the AI reply).
    Undo,
    /// Resign.
    Surrender,
    /// Offer a draw.
    OfferDraw,
    /// Answer the opponent's draw offer.
    RespondDraw {
        /// Accept or decline.
        accept: bool,
    },
    /// Show the board.
    ViewBoard,
    /// Abandon a game against the automated player without recording it.
    EndAiGame,
    /// List games waiting for an opponent.
    Lobby,
    /// Show the rankings.
    Leaderboard,
    /// Show one player's record.
    Stats(PlayerId),
}

/// A command from one player in one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Conversation or channel.
    pub context_id: ContextId,
    /// Issuing player.
    pub player_id: PlayerId,
    /// Requested action.
    pub kind: CommandKind,
}

impl Command {
    /// Creates a command.
    pub fn new(context_id: impl Into<ContextId>, player_id: impl Into<PlayerId>, kind: CommandKind) -> Self {
        Self {
            context_id: context_id.into(),
            player_id: player_id.into(),
            kind,
        }
    }
}

/// A player's record with derived figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    /// Stored counters.
    pub record: Record,
    /// Total finished games.
    pub games: i32,
    /// Win rate in percent.
    pub win_rate: f64,
}

impl From<Record> for PlayerStats {
    fn from(record: Record) -> Self {
        Self {
            games: record.total_games(),
            win_rate: record.win_rate(),
            record,
        }
    }
}

/// Answer to a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Reply {
    /// Board after the command.
    Board(BoardSnapshot),
    /// The waiting game was withdrawn.
    Cancelled,
    /// The game against the AI was abandoned.
    Ended,
    /// Games waiting for an opponent.
    Lobby(Vec<LobbyEntry>),
    /// Rankings.
    Leaderboard(Vec<LeaderboardEntry>),
    /// One player's record.
    Stats(PlayerStats),
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Direct answer.
    pub reply: Reply,
    /// Set when this command ended the game.
    pub outcome: Option<OutcomeNotification>,
}

impl From<Reply> for Dispatched {
    fn from(reply: Reply) -> Self {
        Self { reply, outcome: None }
    }
}

/// Dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum DispatchError {
    /// The registry or session rejected the command.
    #[display("{}", _0)]
    #[from]
    Registry(RegistryError),

    /// The record store failed.
    #[display("{}", _0)]
    #[from]
    Record(RecordError),

    /// `EndAiGame` in a game between humans.
    #[display("This game is not against the AI")]
    NotAnAiGame,

    /// Only the creator may cancel a waiting game.
    #[display("Only the player who created the game can cancel it")]
    NotCreator,
}

impl From<SessionError> for DispatchError {
    fn from(e: SessionError) -> Self {
        DispatchError::Registry(RegistryError::Session(e))
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Registry(e) => Some(e),
            DispatchError::Record(e) => Some(e),
            DispatchError::NotAnAiGame | DispatchError::NotCreator => None,
        }
    }
}

impl DispatchError {
    /// The session error behind this failure, if any.
    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            DispatchError::Registry(RegistryError::Session(e)) => Some(e),
            _ => None,
        }
    }
}

/// Routes commands to sessions and the record store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: SessionRegistry,
    records: Arc<dyn RecordStore>,
    config: EngineConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with a fresh registry.
    #[instrument(skip_all)]
    pub fn new(config: EngineConfig, evaluator: Arc<dyn MoveEvaluator>, records: Arc<dyn RecordStore>) -> Self {
        let registry = SessionRegistry::from_config(&config, evaluator, Arc::clone(&records));
        Self {
            registry,
            records,
            config,
        }
    }

    /// The session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the command is rejected. Rejected
    /// commands leave every session unchanged.
    #[instrument(skip(self, command), fields(context_id = %command.context_id, player_id = %command.player_id, kind = ?command.kind))]
    pub fn dispatch(&self, command: Command) -> Result<Dispatched, DispatchError> {
        self.registry.expire_stale(Instant::now())?;
        let Command {
            context_id,
            player_id,
            kind,
        } = command;
        let ctx = context_id.as_str();
        let player = player_id.as_str();

        let dispatched = match kind {
            CommandKind::NewGame { vs_ai, force } => self.new_game(ctx, player, vs_ai, force)?,
            CommandKind::Join => {
                self.registry.join(ctx, player)?;
                self.on_session(ctx, |_| Ok(()))?
            }
            CommandKind::Cancel => self.cancel(ctx, player)?,
            CommandKind::Place(pos) => self.on_session(ctx, |s| s.place_stone(player, pos).map(drop))?,
            CommandKind::Undo => self.on_session(ctx, |s| s.undo(player).map(drop))?,
            CommandKind::Surrender => self.on_session(ctx, |s| s.surrender(player).map(drop))?,
            CommandKind::OfferDraw => self.on_session(ctx, |s| s.offer_draw(player).map(drop))?,
            CommandKind::RespondDraw { accept } => {
                self.on_session(ctx, |s| s.respond_draw(player, accept).map(drop))?
            }
            CommandKind::ViewBoard => self.on_session(ctx, |_| Ok(()))?,
            CommandKind::EndAiGame => self.end_ai_game(ctx, player)?,
            CommandKind::Lobby => Reply::Lobby(self.registry.lobby()?).into(),
            CommandKind::Leaderboard => Reply::Leaderboard(self.leaderboard()?).into(),
            CommandKind::Stats(target) => Reply::Stats(self.stats(&target)?).into(),
        };

        if let Some(note) = &dispatched.outcome {
            info!(outcome = %note, "Game concluded");
        }
        Ok(dispatched)
    }

    /// Runs `op` on the context's session, then snapshots it and collects
    /// any outcome notification.
    fn on_session(
        &self,
        ctx: &str,
        op: impl FnOnce(&mut GameSession) -> Result<(), SessionError>,
    ) -> Result<Dispatched, DispatchError> {
        let (snapshot, outcome) = self.registry.with_session(ctx, |session| {
            op(session)?;
            Ok((session.snapshot(), session.take_notification()))
        })?;
        Ok(Dispatched {
            reply: Reply::Board(snapshot),
            outcome,
        })
    }

    fn new_game(&self, ctx: &str, player: &str, vs_ai: bool, force: bool) -> Result<Dispatched, DispatchError> {
        let size = *self.config.board_size();
        let config = if vs_ai {
            SessionConfig::human_vs_ai(player, self.config.ai_player_id().as_str(), Stone::Black, size)
        } else {
            SessionConfig::human_vs_human(player, size)
        };
        let mode = if force {
            CreateMode::ForceRestart
        } else {
            CreateMode::Create
        };
        self.registry.get_or_create(ctx, config, mode)?;
        debug!(vs_ai, force, "New game created");
        self.on_session(ctx, |_| Ok(()))
    }

    fn cancel(&self, ctx: &str, player: &str) -> Result<Dispatched, DispatchError> {
        self.registry.end_if(ctx, |s| {
            if s.creator() != player {
                warn!("Cancel from non-creator");
                return Err(DispatchError::NotCreator);
            }
            if !s.is_waiting() {
                return Err(SessionError::AlreadyStarted.into());
            }
            Ok(())
        })?;
        Ok(Reply::Cancelled.into())
    }

    fn end_ai_game(&self, ctx: &str, player: &str) -> Result<Dispatched, DispatchError> {
        self.registry.end_if(ctx, |s| {
            if !s.is_ai_game() {
                return Err(DispatchError::NotAnAiGame);
            }
            if s.player_stone(player).is_none() {
                return Err(SessionError::NotAPlayer.into());
            }
            Ok(())
        })?;
        info!("AI game abandoned without recording");
        Ok(Reply::Ended.into())
    }

    fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DispatchError> {
        let ai_id = self.config.ai_player_id();
        let records = self
            .records
            .all()?
            .into_iter()
            .filter(|r| r.player_id() != ai_id)
            .collect();
        Ok(leaderboard(records, *self.config.leaderboard_limit()))
    }

    fn stats(&self, player_id: &str) -> Result<PlayerStats, DispatchError> {
        let record = self
            .records
            .get(player_id)?
            .unwrap_or_else(|| Record::new(player_id));
        Ok(record.into())
    }
}
