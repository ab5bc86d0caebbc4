//! SQLite-backed record store.

use chrono::Utc;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{PlayerRecordRow, schema};
use crate::records::{Record, RecordError, RecordOutcome, RecordStore};

/// Schema migrations bundled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Record store persisting to a SQLite database file.
///
/// A connection is opened per call, so the store is cheap to clone and
/// safe to share between threads.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    db_path: String,
}

impl SqliteRecordStore {
    /// Opens (creating if needed) the database at `db_path` and applies any
    /// pending migrations.
    ///
    /// Use `":memory:"` only for throwaway checks: every call opens a fresh
    /// connection, so an in-memory database does not persist between calls.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, RecordError> {
        info!("Opening SQLite record store");
        let store = Self { db_path };
        let mut conn = store.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| RecordError::new(format!("Migration failed: {}", e)))?;
        info!(migrations = applied.len(), "Record store ready");
        Ok(store)
    }

    /// Path of the backing database.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, RecordError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| RecordError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }
}

impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self))]
    fn get(&self, player_id: &str) -> Result<Option<Record>, RecordError> {
        let mut conn = self.connection()?;
        let row = schema::player_records::table
            .find(player_id)
            .select(PlayerRecordRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(query_error)?;
        debug!(found = row.is_some(), "Record lookup");
        Ok(row.map(Record::from))
    }

    #[instrument(skip(self))]
    fn update(&self, player_id: &str, outcome: RecordOutcome) -> Result<Record, RecordError> {
        let mut conn = self.connection()?;
        let record = conn
            .transaction::<Record, diesel::result::Error, _>(|conn| {
                let existing = schema::player_records::table
                    .find(player_id)
                    .select(PlayerRecordRow::as_select())
                    .first(conn)
                    .optional()?;
                let mut record = existing
                    .map(Record::from)
                    .unwrap_or_else(|| Record::new(player_id));
                record.apply(outcome);

                let row = PlayerRecordRow::from_record(&record, Utc::now().naive_utc());
                diesel::replace_into(schema::player_records::table)
                    .values(&row)
                    .execute(conn)?;
                Ok(record)
            })
            .map_err(query_error)?;

        info!(
            wins = record.wins(),
            losses = record.losses(),
            draws = record.draws(),
            streak = record.streak(),
            "Record updated"
        );
        Ok(record)
    }

    #[instrument(skip(self))]
    fn all(&self) -> Result<Vec<Record>, RecordError> {
        let mut conn = self.connection()?;
        let rows = schema::player_records::table
            .order(schema::player_records::player_id.asc())
            .select(PlayerRecordRow::as_select())
            .load(&mut conn)
            .map_err(query_error)?;
        debug!(count = rows.len(), "Records loaded");
        Ok(rows.into_iter().map(Record::from).collect())
    }
}

#[track_caller]
fn query_error(err: diesel::result::Error) -> RecordError {
    RecordError::new(format!("Diesel error: {}", err))
}
