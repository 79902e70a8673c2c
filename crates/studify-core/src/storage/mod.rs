mod config;
pub mod database;

pub use config::{AccountConfig, BackendConfig, BackendMode, Config, Theme, TimerConfig, UiConfig};
pub use database::{Database, FocusStats, LocalStore, StoredSession};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Studify data directory, creating it if needed.
///
/// `STUDIFY_DATA_DIR` wins when set. Otherwise `~/.config/studify`, or
/// `~/.config/studify-dev` with `STUDIFY_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STUDIFY_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDIFY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studify-dev")
            } else {
                base_dir.join("studify")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
