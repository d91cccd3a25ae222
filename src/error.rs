// src/error.rs

//! Unified error handling for the page watcher.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch did not finish before the deadline
    #[error("timeout: {url}")]
    Timeout { url: String },

    /// Server answered with a client or server error status
    #[error("{url}: ({status}) - {message}")]
    Remote {
        url: String,
        status: u16,
        message: String,
    },

    /// Server closed the response without sending a body
    #[error("Response was empty: {url}")]
    EmptyResponse { url: String },

    /// Selection and filters reduced the page to nothing
    #[error("Update was empty, the selection is probably wrong. URL: {url}")]
    EmptySelection { url: String },

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Regular expression compilation failed
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Reading or writing persisted state failed
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Notification dispatch failed
    #[error("Notification error: {0}")]
    Notify(String),

    /// A spawned check task panicked or was cancelled
    #[error("Task error for {context}: {message}")]
    Task { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a pattern compilation error.
    pub fn pattern(pattern: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error for the given path.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Create a task error with context.
    pub fn task(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Task {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error points at a likely misconfigured target rather than
    /// a transient network problem.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyResponse { .. }
                | Self::EmptySelection { .. }
                | Self::Selector { .. }
                | Self::Pattern { .. }
        )
    }
}
