//! SQLite persistence for player records.

mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use models::PlayerRecordRow;
pub use repository::{MIGRATIONS, SqliteRecordStore};
