//! Core error types for studify-core.
//!
//! This module defines the error hierarchy using thiserror. Timer transitions
//! never fail; errors come from configuration, storage, and the session log
//! sinks.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studify-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session log sink errors
    #[error("Session log error: {0}")]
    Sink(#[from] SinkError),

    /// Remote backend errors
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Unrecognised timer mode name
    #[error("Unknown timer mode '{0}' (expected focus, short or long)")]
    UnknownMode(String),
}

/// Failure to persist a session log.
///
/// Reported to the caller as an event; the timer keeps advancing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// Local store write failed
    #[error("session store write failed: {0}")]
    Store(String),

    /// Remote store refused the record
    #[error("session store rejected record (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Remote store could not be reached
    #[error("session store unreachable: {0}")]
    Unreachable(String),

    /// Background dispatcher is no longer running
    #[error("session dispatcher closed")]
    Closed,
}

/// Errors from the remote backend (stats endpoint, REST store).
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Base URL missing or malformed
    #[error("Invalid backend URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Missing or expired token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token valid but belongs to another user
    #[error("Forbidden: stats belong to another user")]
    Forbidden,

    /// Any other non-success status
    #[error("Backend error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<DatabaseError> for SinkError {
    fn from(err: DatabaseError) -> Self {
        SinkError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        SinkError::Unreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_error_converts_into_sink_error() {
        let err: SinkError = DatabaseError::Locked.into();
        assert_eq!(err, SinkError::Store("Database is locked".into()));
    }

    #[test]
    fn rejected_sink_error_mentions_status() {
        let err = SinkError::Rejected {
            status: 401,
            body: "JWT expired".into(),
        };
        assert!(err.to_string().contains("HTTP 401"));
    }
}
