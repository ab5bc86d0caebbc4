//! Record store error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Record store error with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Record store error: {} at {}:{}", message, file, line)]
pub struct RecordError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RecordError {
    /// Creates a new record store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
