//! Retry with exponential backoff around another store.

use std::time::Duration;
use tracing::{instrument, warn};

use super::{Record, RecordError, RecordOutcome, RecordStore};

/// Wraps a store and retries failed calls, doubling the delay each time.
#[derive(Debug, Clone)]
pub struct RetryingRecordStore<S> {
    inner: S,
    attempts: u32,
    base_delay: Duration,
}

impl<S: RecordStore> RetryingRecordStore<S> {
    /// Wraps `inner`, trying each call at most `attempts` times (minimum 1).
    pub fn new(inner: S, attempts: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn retry<T>(&self, op: &str, mut call: impl FnMut(&S) -> Result<T, RecordError>) -> Result<T, RecordError> {
        let mut delay = self.base_delay;
        let mut attempt = 1;
        loop {
            match call(&self.inner) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    warn!(op, attempt, error = %e, delay_ms = delay.as_millis() as u64, "Record store call failed, retrying");
                    std::thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<S: RecordStore> RecordStore for RetryingRecordStore<S> {
    #[instrument(skip(self))]
    fn get(&self, player_id: &str) -> Result<Option<Record>, RecordError> {
        self.retry("get", |store| store.get(player_id))
    }

    #[instrument(skip(self))]
    fn update(&self, player_id: &str, outcome: RecordOutcome) -> Result<Record, RecordError> {
        self.retry("update", |store| store.update(player_id, outcome))
    }

    #[instrument(skip(self))]
    fn all(&self) -> Result<Vec<Record>, RecordError> {
        self.retry("all", |store| store.all())
    }
}
