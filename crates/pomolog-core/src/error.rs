//! Core error types for pomolog-core.
//!
//! Follows a small thiserror hierarchy: one top-level [`CoreError`] with
//! dedicated enums for configuration and log-store failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomolog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Log destination errors
    #[error("Log store error: {0}")]
    LogStore(#[from] LogStoreError),

    /// Logging is enabled but no destination could be resolved
    #[error("No log destination available: {0}")]
    NoDestination(String),

    /// A session was requested for a mode that has no duration
    #[error("Cannot start a session in mode: {0}")]
    InvalidMode(String),

    /// Custom session lengths must be positive
    #[error("Invalid session length: {0}")]
    InvalidDuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised by a [`crate::log::LogStore`] implementation.
#[derive(Error, Debug)]
pub enum LogStoreError {
    #[error("Failed to create {path}: {source}")]
    CreateFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No such log: {0}")]
    NotFound(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
