//! Core error types for wakeguard-core.
//!
//! Lock lifecycle failures, platform capability failures and configuration
//! failures each get their own `thiserror` enum. [`CoreError`] is what the
//! CLI commands return.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lock::LockState;

/// Core error type for wakeguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session loop went away while a command was in flight
    #[error("session loop stopped")]
    SessionStopped,

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Failure reported by a platform capability (lock request, lock release).
///
/// Mirrors the `name: message` shape platform errors are displayed with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct PlatformError {
    pub name: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The request was refused because the user has not interacted with the page.
    pub fn not_allowed(message: impl Into<String>) -> Self {
        Self::new("NotAllowedError", message)
    }

    /// The request was aborted, typically because the page went to the background.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new("AbortError", message)
    }
}

/// Lock lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The platform has no screen lock capability.
    #[error("screen lock is not supported on this platform")]
    NotSupported,

    /// The platform refused the lock request.
    #[error("screen lock request denied: {0}")]
    Denied(PlatformError),

    /// The release request itself failed; the lock is still held.
    #[error("screen lock release failed: {0}")]
    ReleaseFailed(PlatformError),

    /// The gesture-gated retry failed; automatic retries are over.
    #[error("retry after user activation failed: {0}")]
    PollingExhausted(PlatformError),

    /// Operation issued while the lock was in the wrong state.
    #[error("cannot {op} while lock is {state}")]
    InvalidState { op: &'static str, state: LockState },
}

impl LockError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LockError::NotSupported => ErrorKind::NotSupported,
            LockError::Denied(_) => ErrorKind::Denied,
            LockError::ReleaseFailed(_) => ErrorKind::ReleaseFailed,
            LockError::PollingExhausted(_) => ErrorKind::PollingExhausted,
            LockError::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// Whether this failure ends automatic acquisition for the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LockError::NotSupported | LockError::PollingExhausted(_))
    }
}

/// Error classification handed to the error-reporting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotSupported,
    Denied,
    ReleaseFailed,
    PollingExhausted,
    InvalidState,
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

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
