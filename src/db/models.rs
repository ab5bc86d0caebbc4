//! Database models for player records.

use chrono::NaiveDateTime;
use derive_new::new;
use diesel::prelude::*;

use crate::db::schema;
use crate::records::Record;

/// Stored row of the `player_records` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, new)]
#[diesel(table_name = schema::player_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlayerRecordRow {
    player_id: String,
    wins: i32,
    losses: i32,
    draws: i32,
    streak: i32,
    updated_at: NaiveDateTime,
}

impl PlayerRecordRow {
    /// Builds a row from a domain record, stamped with `updated_at`.
    pub fn from_record(record: &Record, updated_at: NaiveDateTime) -> Self {
        Self::new(
            record.player_id().clone(),
            *record.wins(),
            *record.losses(),
            *record.draws(),
            *record.streak(),
            updated_at,
        )
    }
}

impl From<PlayerRecordRow> for Record {
    fn from(row: PlayerRecordRow) -> Self {
        Record::from_parts(row.player_id, row.wins, row.losses, row.draws, row.streak)
    }
}
