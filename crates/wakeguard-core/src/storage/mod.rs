mod config;

pub use config::{ClockConfig, Config, DisplayConfig, LockConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/wakeguard[-dev]/` based on WAKEGUARD_ENV.
///
/// Set WAKEGUARD_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WAKEGUARD_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("wakeguard-dev")
    } else {
        base_dir.join("wakeguard")
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DataDir)?;
    Ok(dir)
}
