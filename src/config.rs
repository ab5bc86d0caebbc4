//! Engine configuration loaded from TOML.

use crate::games::gomoku::{MAX_SIZE, MIN_SIZE, STANDARD_SIZE};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Tunables for sessions, the AI player and record keeping.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct EngineConfig {
    /// Board edge length.
    board_size: usize,

    /// Seconds a new game waits for a second player before it is dropped.
    join_timeout_secs: u64,

    /// Seconds a draw offer stays open.
    draw_offer_timeout_secs: u64,

    /// Player id used for the automated opponent.
    #[setters(into)]
    ai_player_id: String,

    /// Maximum leaderboard rows.
    leaderboard_limit: usize,

    /// Attempts per record store call.
    record_retry_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    record_retry_backoff_ms: u64,

    /// SQLite database path for player records.
    #[setters(into)]
    db_path: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_size: STANDARD_SIZE,
            join_timeout_secs: 300,
            draw_offer_timeout_secs: 30,
            ai_player_id: "AI".to_string(),
            leaderboard_limit: 10,
            record_retry_attempts: 3,
            record_retry_backoff_ms: 50,
            db_path: "gomoku.db".to_string(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or holds
    /// out-of-range values.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(board_size = config.board_size, "Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on malformed TOML or out-of-range values.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first offending field.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.board_size) {
            return Err(ConfigError::new(format!(
                "board_size must be between {} and {}, got {}",
                MIN_SIZE, MAX_SIZE, self.board_size
            )));
        }
        if self.ai_player_id.trim().is_empty() {
            return Err(ConfigError::new("ai_player_id must not be empty"));
        }
        Ok(())
    }

    /// Join timeout as a duration.
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    /// Draw offer timeout as a duration.
    pub fn draw_offer_timeout(&self) -> Duration {
        Duration::from_secs(self.draw_offer_timeout_secs)
    }

    /// Initial record store retry delay.
    pub fn record_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.record_retry_backoff_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = EngineConfig::from_toml("").expect("defaults are valid");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(*config.board_size(), 15);
        assert_eq!(config.draw_offer_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml("board_size = 19\nai_player_id = \"bot\"\n")
            .expect("valid config");
        assert_eq!(*config.board_size(), 19);
        assert_eq!(config.ai_player_id(), "bot");
        assert_eq!(*config.leaderboard_limit(), 10);
    }

    #[test]
    fn test_rejects_tiny_board() {
        let err = EngineConfig::from_toml("board_size = 4").unwrap_err();
        assert!(err.message.contains("board_size"));
    }

    #[test]
    fn test_setters() {
        let config = EngineConfig::default().with_board_size(9).with_db_path("x.db");
        assert_eq!(*config.board_size(), 9);
        assert_eq!(config.db_path(), "x.db");
    }
}
