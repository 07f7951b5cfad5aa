//! Core error types for breaktime-core.
//!
//! The scheduler itself has no fallible I/O; errors come from loading and
//! validating configuration and from display collaborators that fail to
//! put a popup on screen.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::EventKind;

/// Core error type for breaktime-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse errors
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No preset with that name
    #[error("Unknown work method preset: {0}")]
    UnknownPreset(String),

    /// Could not determine where the configuration lives
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Unrecognized reminder kind name
    #[error("Unknown reminder kind '{0}' (expected big_break, small_break, eye_exercise or water_reminder)")]
    UnknownKind(String),

    /// Time of day not in HH:MM form
    #[error("Invalid time of day '{0}': expected HH:MM")]
    InvalidTimeOfDay(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// A display collaborator could not put a popup on screen.
///
/// The coordinator treats this exactly like the popup being closed.
#[derive(Error, Debug)]
#[error("Failed to display {kind} popup: {message}")]
pub struct DisplayError {
    pub kind: EventKind,
    pub message: String,
}

impl DisplayError {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
