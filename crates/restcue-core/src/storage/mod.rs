mod config;

pub use config::{Config, ConfigStore, MealsConfig, PomodoroConfig, WaterConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/restcue[-dev]/` based on RESTCUE_ENV.
///
/// Set RESTCUE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(".config");

    let env = std::env::var("RESTCUE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("restcue-dev")
    } else {
        base_dir.join("restcue")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Default location of the config document.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(data_dir()?.join("config.toml"))
}
