//! Process-local record store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument};

use super::{Record, RecordError, RecordOutcome, RecordStore};

/// Records kept in memory for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<Mutex<HashMap<String, Record>>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Record>>, RecordError> {
        self.records
            .lock()
            .map_err(|_| RecordError::new("Record map lock poisoned"))
    }
}

impl RecordStore for InMemoryRecordStore {
    #[instrument(skip(self))]
    fn get(&self, player_id: &str) -> Result<Option<Record>, RecordError> {
        Ok(self.lock()?.get(player_id).cloned())
    }

    #[instrument(skip(self))]
    fn update(&self, player_id: &str, outcome: RecordOutcome) -> Result<Record, RecordError> {
        let mut records = self.lock()?;
        let record = records
            .entry(player_id.to_string())
            .or_insert_with(|| Record::new(player_id));
        record.apply(outcome);
        debug!(wins = record.wins(), losses = record.losses(), draws = record.draws(), "Record updated");
        Ok(record.clone())
    }

    #[instrument(skip(self))]
    fn all(&self) -> Result<Vec<Record>, RecordError> {
        Ok(self.lock()?.values().cloned().collect())
    }
}
