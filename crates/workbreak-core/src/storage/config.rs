//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Display and reminder-check tick periods
//! - Reminder delivery (speech command, locale, message)
//! - Whether saving a session closes the open interval
//!
//! Configuration is stored at `~/.config/workbreak/config.toml`.
//! The reminder threshold itself is fixed and not configurable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::{ConfigError, ReminderError};
use crate::reminder::Utterance;
use crate::timer::TickPeriods;

/// Tick period configuration, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicksConfig {
    #[serde(default = "default_display_ms")]
    pub display_ms: u64,
    #[serde(default = "default_notification_check_ms")]
    pub notification_check_ms: u64,
}

/// Reminder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_message")]
    pub message: String,
    /// Base64 of the percent-encoded message. Takes precedence over `message`.
    #[serde(default)]
    pub encoded_message: Option<String>,
    /// Speech command line with `{locale}` and `{message}` placeholders.
    /// Unset means the platform default (`say` or `espeak`).
    /// Split on whitespace only: quotes are not interpreted, so arguments
    /// cannot contain spaces. `{message}` is always substituted whole.
    #[serde(default)]
    pub command: Option<String>,
}

/// Session behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Append the still-open interval to the log when the session is saved.
    #[serde(default)]
    pub close_open_interval_on_save: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/workbreak/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ticks: TicksConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_display_ms() -> u64 {
    10
}
fn default_notification_check_ms() -> u64 {
    20_000
}
fn default_true() -> bool {
    true
}
fn default_locale() -> String {
    "en-US".into()
}
fn default_message() -> String {
    "Twenty minutes of work. Look away from the monitor for twenty seconds.".into()
}

impl Default for TicksConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display_ms(),
            notification_check_ms: default_notification_check_ms(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: default_locale(),
            message: default_message(),
            encoded_message: None,
            command: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            close_open_interval_on_save: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ticks: TicksConfig::default(),
            reminder: ReminderConfig::default(),
            session: SessionConfig::default(),
        }
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
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

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the resulting config is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
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

    /// Reject values the session tickers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks.display_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ticks.display_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.ticks.notification_check_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ticks.notification_check_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn tick_periods(&self) -> TickPeriods {
        TickPeriods {
            display: Duration::from_millis(self.ticks.display_ms),
            notification_check: Duration::from_millis(self.ticks.notification_check_ms),
        }
    }

    /// The reminder payload, decoding `encoded_message` when present.
    pub fn utterance(&self) -> Result<Utterance, ReminderError> {
        match &self.reminder.encoded_message {
            Some(encoded) => Utterance::from_encoded(self.reminder.locale.clone(), encoded),
            None => Ok(Utterance::new(
                self.reminder.locale.clone(),
                self.reminder.message.clone(),
            )),
        }
    }
}
