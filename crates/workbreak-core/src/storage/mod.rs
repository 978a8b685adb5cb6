mod config;

pub use config::{Config, ReminderConfig, SessionConfig, TicksConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/workbreak[-dev]/` based on WORKBREAK_ENV.
///
/// Set WORKBREAK_ENV=dev to use the development directory, or
/// WORKBREAK_CONFIG_DIR to use an explicit one.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("WORKBREAK_CONFIG_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("WORKBREAK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("workbreak-dev")
            } else {
                base_dir.join("workbreak")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::NoConfigDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
