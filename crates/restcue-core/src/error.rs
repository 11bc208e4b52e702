//! Core error types for restcue-core.
//!
//! Nothing in the reminder core is fatal: every error defined here is caught
//! at the scheduler boundary, logged, and the loop moves on to the next tick.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for restcue-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine the configuration directory
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Errors reported by a presentation adapter. They are logged by the
/// scheduler and never abort a tick.
#[derive(Error, Debug)]
pub enum PresentationError {
    /// A window or overlay could not be created or updated
    #[error("Failed to render {surface}: {message}")]
    RenderFailed { surface: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
