//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus timer durations and long-break cadence
//! - The signed-in account used to attribute session logs
//! - Where session logs go (local SQLite or the hosted backend)
//! - Appearance
//!
//! Configuration is stored at `~/.config/studify/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::TimerDurations;

/// Timer durations, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u32,
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: u32,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: u32,
    #[serde(default = "default_long_break_every")]
    pub long_break_every: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Session logs go to the local SQLite database.
    Local,
    /// Session logs go to the hosted REST store.
    Remote,
}

/// Hosted backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_mode")]
    pub mode: BackendMode,
    /// Base URL of the hosted database (REST endpoints live under `/rest/v1`).
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
    /// User access token. `STUDIFY_ACCESS_TOKEN` overrides it.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Base URL of the stats service.
    #[serde(default = "default_stats_url")]
    pub stats_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: Theme,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studify/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

// Default functions
fn default_focus_secs() -> u32 {
    25 * 60
}
fn default_short_break_secs() -> u32 {
    5 * 60
}
fn default_long_break_secs() -> u32 {
    15 * 60
}
fn default_long_break_every() -> u32 {
    4
}
fn default_user_id() -> String {
    "local".into()
}
fn default_backend_mode() -> BackendMode {
    BackendMode::Local
}
fn default_stats_url() -> String {
    "http://localhost:3001".into()
}
fn default_theme() -> Theme {
    Theme::Light
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_secs: default_focus_secs(),
            short_break_secs: default_short_break_secs(),
            long_break_secs: default_long_break_secs(),
            long_break_every: default_long_break_every(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: default_backend_mode(),
            supabase_url: None,
            anon_key: None,
            access_token: None,
            stats_url: default_stats_url(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

impl BackendConfig {
    /// Access token from `STUDIFY_ACCESS_TOKEN`, falling back to the file.
    pub fn resolved_access_token(&self) -> Option<String> {
        std::env::var("STUDIFY_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.access_token.clone())
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // "" clears optional strings; required ones fail to deserialize.
                    _ if value.is_empty() => serde_json::Value::Null,
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the
    /// configured timer values are invalid.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// for the key's type, or the resulting config is invalid. On error
    /// `self` is left unchanged.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// # Errors
    ///
    /// Returns an error if any timer duration or the cadence is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.durations().map(|_| ())
    }

    /// Timer durations from the `[timer]` section.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is zero.
    pub fn durations(&self) -> Result<TimerDurations, ConfigError> {
        TimerDurations::new(
            self.timer.focus_secs,
            self.timer.short_break_secs,
            self.timer.long_break_secs,
            self.timer.long_break_every,
        )
        .map_err(|e| ConfigError::InvalidValue {
            key: "timer".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.focus_secs, 1500);
        assert_eq!(parsed.backend.mode, BackendMode::Local);
        assert!(parsed.backend.supabase_url.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\nfocus_secs = 3000\n").unwrap();
        assert_eq!(parsed.timer.focus_secs, 3000);
        assert_eq!(parsed.timer.short_break_secs, 300);
        assert_eq!(parsed.timer.long_break_secs, 900);
        assert_eq!(parsed.account.user_id, "local");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.focus_secs").as_deref(), Some("1500"));
        assert_eq!(cfg.get("backend.mode").as_deref(), Some("local"));
        assert_eq!(cfg.get("ui.theme").as_deref(), Some("light"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_value_updates_number() {
        let mut cfg = Config::default();
        cfg.set_value("timer.short_break_secs", "240").unwrap();
        assert_eq!(cfg.timer.short_break_secs, 240);
        assert_eq!(cfg.durations().unwrap().short_break_secs, 240);
    }

    #[test]
    fn set_value_fills_optional_string() {
        let mut cfg = Config::default();
        cfg.set_value("backend.supabase_url", "https://db.example.com").unwrap();
        assert_eq!(
            cfg.backend.supabase_url.as_deref(),
            Some("https://db.example.com")
        );
        cfg.set_value("backend.supabase_url", "").unwrap();
        assert!(cfg.backend.supabase_url.is_none());
    }

    #[test]
    fn set_value_checks_enum_values() {
        let mut cfg = Config::default();
        cfg.set_value("backend.mode", "remote").unwrap();
        assert_eq!(cfg.backend.mode, BackendMode::Remote);
        assert!(cfg.set_value("ui.theme", "sepia").is_err());
        assert_eq!(cfg.ui.theme, Theme::Light);
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("timer.focus_secs", "soon").is_err());
        assert_eq!(cfg.timer.focus_secs, 1500);
    }

    #[test]
    fn set_value_rejects_zero_duration() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("timer.focus_secs", "0").is_err());
        assert_eq!(cfg.timer.focus_secs, 1500);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.timer.long_break_every, 4);

        let mut cfg = cfg;
        cfg.set_value("account.user_id", "student-42").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.account.user_id, "student-42");
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 12").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
