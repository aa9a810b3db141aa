// src/error.rs

//! Unified error handling for the notifier.
//!
//! Each poll stage reports failures through its own variant so the poll loop
//! can decide, per kind, whether to skip the cycle, carry on, or abort.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Page could not be fetched (network, timeout, bad status)
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Page content could not be turned into candidates
    #[error("Extract error: {0}")]
    Extract(String),

    /// Persisted state exists but cannot be parsed
    #[error("Corrupt state in {path:?}: {message}")]
    CorruptState { path: PathBuf, message: String },

    /// A single notification could not be delivered
    #[error("Notify error for {identifier}: {message}")]
    Notify { identifier: String, message: String },

    /// Messaging endpoint rejected a message
    #[error("Delivery rejected ({status}): {description}")]
    Delivery { status: u16, description: String },

    /// Persisted state could not be read or written
    #[error("Persistence error for {path:?}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Storage location could not be established at startup
    #[error("Cannot initialise storage at {path:?}: {message}")]
    StorageInit { path: PathBuf, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for the given URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error.
    pub fn extract(message: impl Into<String>) -> Self {
        Self::Extract(message.into())
    }

    /// Create a corrupt state error.
    pub fn corrupt_state(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::CorruptState {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a notification error for one item.
    pub fn notify(identifier: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Notify {
            identifier: identifier.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage initialisation error.
    pub fn storage_init(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::StorageInit {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error should stop the process.
    ///
    /// Everything raised inside a poll cycle is recoverable; only failing to
    /// set up storage or configuration at startup is not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StorageInit { .. } | Self::Validation(_)
        )
    }
}
