//! Error types for the reward probe
//!
//! This module provides structured error definitions using thiserror.
//! Every error is fatal to the feedback driver; the variants exist so the
//! binary can report what went wrong, not to drive recovery.

use thiserror::Error;

/// Main error type for reward probe operations
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Configuration value failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Dataset is structurally invalid (too few columns, non-numeric cell, ...)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Delimited-text reader failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("Endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// Response did not match the expected message schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Label and prediction arity differ
    #[error("Shape mismatch: expected {expected} prediction value(s), got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Driver is already running
    #[error("Feedback driver is already running")]
    AlreadyRunning,

    /// Second shutdown signal arrived while a pass was in flight
    #[error("Interrupted before the current pass finished")]
    Interrupted,

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for reward probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Convert anyhow::Error to ProbeError
impl From<anyhow::Error> for ProbeError {
    fn from(err: anyhow::Error) -> Self {
        ProbeError::Other(err.to_string())
    }
}
