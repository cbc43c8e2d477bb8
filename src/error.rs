// src/error.rs

//! Unified error handling for the sync pipeline.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Collection code could not be resolved to a remote category
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote markup no longer matches the parser's expectations
    #[error("Page structure changed: {0}")]
    StructureChanged(String),

    /// Network or HTTP failure for a single page or record
    #[error("Fetch failed for {url}: {message}")]
    TransientFetch { url: String, message: String },

    /// Link discovery produced no records
    #[error("No records found for {0}")]
    NoRecordsFound(String),

    /// Writing or reading persisted state failed
    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },

    /// The run was cancelled before it could finish
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client failed
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

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a structure-changed error.
    pub fn structure_changed(message: impl Into<String>) -> Self {
        Self::StructureChanged(message.into())
    }

    /// Create a transient fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::TransientFetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error for a path.
    pub fn storage(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::Storage {
            path: path.as_ref().display().to_string(),
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

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error should stop every remaining collection in a batch,
    /// not just the one being processed.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
