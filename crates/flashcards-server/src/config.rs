// ABOUTME: Configuration loading and validation for the flashcards server.
// ABOUTME: Reads FLASHCARDS_* environment variables and applies defaults for anything unset.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FLASHCARDS_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database: PathBuf,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub google_client_id: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - FLASHCARDS_BIND: socket address to bind (default: 0.0.0.0:8080)
    /// - FLASHCARDS_DB: SQLite database file (default: database.db)
    /// - FLASHCARDS_ACCESS_TTL_MINUTES: access token lifetime (default: 120)
    /// - FLASHCARDS_REFRESH_TTL_DAYS: refresh token lifetime (default: 30)
    /// - FLASHCARDS_GOOGLE_CLIENT_ID: audience for Google sign-in (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_str =
            std::env::var("FLASHCARDS_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let database = std::env::var("FLASHCARDS_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("database.db"));

        let access_minutes = positive_var("FLASHCARDS_ACCESS_TTL_MINUTES", 120)?;
        let refresh_days = positive_var("FLASHCARDS_REFRESH_TTL_DAYS", 30)?;

        let google_client_id = std::env::var("FLASHCARDS_GOOGLE_CLIENT_ID")
            .ok()
            .filter(|id| !id.is_empty());

        Ok(Self {
            bind,
            database,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
            google_client_id,
        })
    }
}

fn positive_var(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(var) {
        Ok(value) => match value.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
        Err(_) => Ok(default),
    }
}
