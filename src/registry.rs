//! Session registry: maps each context to its game.
//!
//! The map lock is held only to look up, insert or remove a handle, and
//! nothing waits on a session lock while holding it. Session operations run
//! under the per-session lock, so games in different contexts never wait on
//! each other. When both locks are needed the session lock is taken first.
//! Sweeps and listings use `try_lock` and skip sessions that are busy.

use crate::config::EngineConfig;
use crate::games::gomoku::{MoveEvaluator, Stone};
use crate::records::RecordStore;
use crate::session::{ContextId, GameSession, PlayerId, SessionConfig, SessionError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// How [`SessionRegistry::get_or_create`] treats an existing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Reuse an active session, otherwise create one.
    GetOrCreate,
    /// Create, failing if an active session exists.
    Create,
    /// Replace whatever is there.
    ForceRestart,
}

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum RegistryError {
    /// An unfinished game already occupies the context.
    #[display("A game is already in progress in {}", _0)]
    SessionAlreadyActive(ContextId),

    /// No game exists in the context.
    #[display("No game in {}", _0)]
    NoSession(ContextId),

    /// A session panicked mid-operation and was discarded.
    #[display("Game in {} was aborted after an internal failure", _0)]
    Poisoned(ContextId),

    /// The player already sits in an unfinished game elsewhere.
    #[display("{} is already playing in {}", player_id, context_id)]
    PlayerBusy {
        /// Player asking for a second seat.
        player_id: PlayerId,
        /// Context of the game they are in.
        context_id: ContextId,
    },

    /// The session rejected the operation.
    #[display("{}", _0)]
    #[from]
    Session(SessionError),
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Session(e) => Some(e),
            _ => None,
        }
    }
}

/// A game waiting for its second player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyEntry {
    /// Context the game lives in.
    pub context_id: ContextId,
    /// Player waiting for an opponent.
    pub creator: PlayerId,
    /// Seconds since the game was created.
    pub waiting_secs: u64,
}

/// What a sweep removed or reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiryReport {
    /// Waiting games dropped after the join timeout.
    pub expired_games: Vec<ContextId>,
    /// Games whose draw offer lapsed.
    pub lapsed_offers: Vec<ContextId>,
}

/// Owns every live session.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<ContextId, SessionHandle>>>,
    seats: Arc<Mutex<HashMap<PlayerId, ContextId>>>,
    evaluator: Arc<dyn MoveEvaluator>,
    records: Arc<dyn RecordStore>,
    join_timeout: Duration,
    draw_offer_timeout: Duration,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument(skip(evaluator, records))]
    pub fn new(
        evaluator: Arc<dyn MoveEvaluator>,
        records: Arc<dyn RecordStore>,
        join_timeout: Duration,
        draw_offer_timeout: Duration,
    ) -> Self {
        info!("Creating session registry");
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            seats: Arc::new(Mutex::new(HashMap::new())),
            evaluator,
            records,
            join_timeout,
            draw_offer_timeout,
        }
    }

    /// Creates an empty registry with timeouts from `config`.
    pub fn from_config(
        config: &EngineConfig,
        evaluator: Arc<dyn MoveEvaluator>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self::new(evaluator, records, config.join_timeout(), config.draw_offer_timeout())
    }

    fn map(&self) -> Result<MutexGuard<'_, HashMap<ContextId, SessionHandle>>, RegistryError> {
        self.sessions.lock().map_err(|_| {
            error!("Registry lock poisoned");
            RegistryError::Poisoned("registry".to_string())
        })
    }

    fn seat_map(&self) -> Result<MutexGuard<'_, HashMap<PlayerId, ContextId>>, RegistryError> {
        self.seats.lock().map_err(|_| {
            error!("Seat index lock poisoned");
            RegistryError::Poisoned("registry".to_string())
        })
    }

    /// Returns the session for `context_id`, creating it as `mode` allows.
    ///
    /// Games against the automated player are started immediately; games
    /// between humans wait for a second player.
    ///
    /// # Errors
    ///
    /// [`RegistryError::SessionAlreadyActive`] in [`CreateMode::Create`]
    /// when an unfinished game exists, [`RegistryError::PlayerBusy`] when the
    /// creator is in an unfinished game in another context.
    #[instrument(skip(self, config), fields(creator = %config.creator))]
    pub fn get_or_create(
        &self,
        context_id: &str,
        config: SessionConfig,
        mode: CreateMode,
    ) -> Result<SessionHandle, RegistryError> {
        let creator = config.creator.clone();
        self.ensure_free(&creator, context_id)?;

        loop {
            let existing = self.get(context_id)?;
            if let Some(handle) = &existing {
                let active = handle.lock().map(|s| s.is_active()).unwrap_or(false);
                match (mode, active) {
                    (CreateMode::GetOrCreate, true) => {
                        debug!("Reusing active session");
                        return Ok(Arc::clone(handle));
                    }
                    (CreateMode::Create, true) => {
                        warn!("Refusing to replace active session");
                        return Err(RegistryError::SessionAlreadyActive(context_id.to_string()));
                    }
                    (CreateMode::ForceRestart, true) => info!("Force restarting active session"),
                    (_, false) => debug!("Replacing finished session"),
                }
            }

            let is_ai = config.ai_opponent.is_some();
            let mut session = GameSession::new(
                context_id,
                config.clone(),
                Arc::clone(&self.evaluator),
                Arc::clone(&self.records),
            );
            if is_ai {
                session.start()?;
            }
            let handle = Arc::new(Mutex::new(session));

            let mut map = self.map()?;
            let unchanged = match (map.get(context_id), &existing) {
                (None, None) => true,
                (Some(current), Some(seen)) => Arc::ptr_eq(current, seen),
                _ => false,
            };
            if !unchanged {
                debug!("Context changed while creating, retrying");
                continue;
            }
            map.insert(context_id.to_string(), Arc::clone(&handle));
            info!(sessions = map.len(), "Session registered");
            drop(map);

            self.seat(&creator, context_id)?;
            return Ok(handle);
        }
    }

    /// Seats `player_id` in the waiting game in `context_id`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::PlayerBusy`] when the player is in an unfinished
    /// game elsewhere, otherwise as [`SessionRegistry::with_session`].
    #[instrument(skip(self))]
    pub fn join(&self, context_id: &str, player_id: &str) -> Result<Stone, RegistryError> {
        self.ensure_free(player_id, context_id)?;
        let stone = self.with_session(context_id, |s| s.join(player_id))?;
        self.seat(player_id, context_id)?;
        Ok(stone)
    }

    /// Context of the unfinished game `player_id` sits in, if any.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Poisoned`] if a registry lock is poisoned.
    pub fn active_context(&self, player_id: &str) -> Result<Option<ContextId>, RegistryError> {
        let Some(context_id) = self.seat_map()?.get(player_id).cloned() else {
            return Ok(None);
        };
        let seated = match self.get(&context_id)? {
            Some(handle) => handle
                .lock()
                .map(|s| s.is_active() && s.player_stone(player_id).is_some())
                .unwrap_or(false),
            None => false,
        };
        if seated {
            return Ok(Some(context_id));
        }

        let mut seats = self.seat_map()?;
        if seats.get(player_id) == Some(&context_id) {
            seats.remove(player_id);
        }
        Ok(None)
    }

    fn ensure_free(&self, player_id: &str, context_id: &str) -> Result<(), RegistryError> {
        match self.active_context(player_id)? {
            Some(elsewhere) if elsewhere != context_id => {
                warn!(player_id, elsewhere = %elsewhere, "Player already seated in another game");
                Err(RegistryError::PlayerBusy {
                    player_id: player_id.to_string(),
                    context_id: elsewhere,
                })
            }
            _ => Ok(()),
        }
    }

    fn seat(&self, player_id: &str, context_id: &str) -> Result<(), RegistryError> {
        self.seat_map()?
            .insert(player_id.to_string(), context_id.to_string());
        Ok(())
    }

    /// Returns the session for `context_id`, if any.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn get(&self, context_id: &str) -> Result<Option<SessionHandle>, RegistryError> {
        Ok(self.map()?.get(context_id).cloned())
    }

    /// Removes and returns the session for `context_id`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Poisoned`] if the registry lock is poisoned.
    #[instrument(skip(self))]
    pub fn end(&self, context_id: &str) -> Result<Option<SessionHandle>, RegistryError> {
        let removed = self.map()?.remove(context_id);
        if removed.is_some() {
            info!("Session ended");
        }
        Ok(removed)
    }

    /// Contexts with a registered session, sorted.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn contexts(&self) -> Result<Vec<ContextId>, RegistryError> {
        let mut ids: Vec<_> = self.map()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Runs `op` under the session lock for `context_id`.
    ///
    /// A session that reports an invariant violation, or whose lock was
    /// poisoned by a panic, is removed from the registry. A session removed
    /// while the caller waited for its lock is reported as missing.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NoSession`], [`RegistryError::Poisoned`], or the
    /// session's own error.
    #[instrument(skip(self, op))]
    pub fn with_session<T>(
        &self,
        context_id: &str,
        op: impl FnOnce(&mut GameSession) -> Result<T, SessionError>,
    ) -> Result<T, RegistryError> {
        let handle = self
            .get(context_id)?
            .ok_or_else(|| RegistryError::NoSession(context_id.to_string()))?;

        let Ok(mut session) = handle.lock() else {
            error!("Session lock poisoned, aborting game");
            self.discard(context_id, &handle)?;
            return Err(RegistryError::Poisoned(context_id.to_string()));
        };
        if !self.is_registered(context_id, &handle)? {
            debug!("Session was removed while waiting for its lock");
            return Err(RegistryError::NoSession(context_id.to_string()));
        }

        let result = op(&mut *session);
        if let Err(SessionError::InvariantViolation(detail)) = &result {
            error!(detail = %detail, "Aborting inconsistent session");
            self.discard(context_id, &handle)?;
        }
        result.map_err(RegistryError::from)
    }

    /// Removes the session for `context_id` if `check` passes, all under the
    /// session lock so no other operation can run in between.
    ///
    /// # Errors
    ///
    /// Whatever `check` returns, or [`RegistryError::NoSession`] and
    /// [`RegistryError::Poisoned`] converted into `E`.
    #[instrument(skip(self, check))]
    pub fn end_if<E>(
        &self,
        context_id: &str,
        check: impl FnOnce(&GameSession) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<RegistryError>,
    {
        let handle = self
            .get(context_id)?
            .ok_or_else(|| RegistryError::NoSession(context_id.to_string()))?;

        let Ok(session) = handle.lock() else {
            error!("Session lock poisoned, aborting game");
            self.discard(context_id, &handle)?;
            return Err(RegistryError::Poisoned(context_id.to_string()).into());
        };
        if !self.is_registered(context_id, &handle)? {
            return Err(RegistryError::NoSession(context_id.to_string()).into());
        }
        check(&*session)?;

        self.discard(context_id, &handle)?;
        info!("Session ended");
        Ok(())
    }

    fn is_registered(&self, context_id: &str, handle: &SessionHandle) -> Result<bool, RegistryError> {
        Ok(self
            .map()?
            .get(context_id)
            .is_some_and(|h| Arc::ptr_eq(h, handle)))
    }

    /// Removes `handle` if it is still the session registered for
    /// `context_id`.
    fn discard(&self, context_id: &str, handle: &SessionHandle) -> Result<(), RegistryError> {
        let mut map = self.map()?;
        if map.get(context_id).is_some_and(|h| Arc::ptr_eq(h, handle)) {
            map.remove(context_id);
            debug!(context_id, "Session removed");
        }
        Ok(())
    }

    /// Handles paired with their context, taken under the map lock.
    fn handles(&self) -> Result<Vec<(ContextId, SessionHandle)>, RegistryError> {
        let mut handles: Vec<_> = self
            .map()?
            .iter()
            .map(|(id, h)| (id.clone(), Arc::clone(h)))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(handles)
    }

    /// Games waiting for a second player, ordered by context. Sessions busy
    /// with another operation are left out of this listing.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Poisoned`] if the registry lock is poisoned.
    #[instrument(skip(self))]
    pub fn lobby(&self) -> Result<Vec<LobbyEntry>, RegistryError> {
        let now = Instant::now();
        let entries: Vec<_> = self
            .handles()?
            .into_iter()
            .filter_map(|(context_id, handle)| {
                let session = handle.try_lock().ok()?;
                session.is_waiting().then(|| LobbyEntry {
                    context_id,
                    creator: session.creator().to_string(),
                    waiting_secs: now.saturating_duration_since(session.created_at()).as_secs(),
                })
            })
            .collect();
        debug!(waiting = entries.len(), "Lobby listed");
        Ok(entries)
    }

    /// Drops waiting games past the join timeout and lapses draw offers past
    /// the offer timeout, as of `now`. Poisoned sessions are dropped too.
    /// Sessions busy with another operation are skipped until the next sweep.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Poisoned`] if the registry lock is poisoned.
    #[instrument(skip(self, now))]
    pub fn expire_stale(&self, now: Instant) -> Result<ExpiryReport, RegistryError> {
        let mut report = ExpiryReport::default();
        let mut doomed = Vec::new();

        for (context_id, handle) in self.handles()? {
            match handle.try_lock() {
                Ok(mut session) => {
                    if session.join_expired(now, self.join_timeout) {
                        doomed.push((context_id, handle.clone()));
                    } else if session.expire_draw_offer(now, self.draw_offer_timeout) {
                        report.lapsed_offers.push(context_id);
                    }
                }
                Err(TryLockError::WouldBlock) => debug!(context_id = %context_id, "Session busy, skipped"),
                Err(TryLockError::Poisoned(_)) => doomed.push((context_id, handle.clone())),
            }
        }

        for (context_id, handle) in doomed {
            self.discard(&context_id, &handle)?;
            report.expired_games.push(context_id);
        }
        if !report.expired_games.is_empty() {
            let live = self.contexts()?;
            self.seat_map()?
                .retain(|_, ctx| live.binary_search(ctx).is_ok());
        }
        if !report.expired_games.is_empty() || !report.lapsed_offers.is_empty() {
            info!(
                expired = report.expired_games.len(),
                lapsed = report.lapsed_offers.len(),
                "Swept stale sessions"
            );
        }
        Ok(report)
    }

    /// Record store shared with every session.
    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }
}
