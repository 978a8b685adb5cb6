//! Core error types for workbreak-core.
//!
//! The accounting engine itself is total; these errors cover the surfaces
//! around it: configuration files, the reminder payload and the speech sink.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for workbreak-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reminder payload or sink errors
    #[error("Reminder error: {0}")]
    Reminder(#[from] ReminderError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine where the config lives
    #[error("Could not resolve configuration directory: {0}")]
    NoConfigDir(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the config tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while preparing or delivering a reminder.
#[derive(Error, Debug)]
pub enum ReminderError {
    /// The encoded message is not valid base64
    #[error("Encoded reminder message is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The decoded message is not valid percent-encoded UTF-8
    #[error("Encoded reminder message is not valid UTF-8: {0}")]
    InvalidText(String),

    /// The speech command could not be spawned
    #[error("Failed to spawn reminder command '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
