//! Error types for jotbook-core

use thiserror::Error;

/// Result type alias using jotbook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jotbook-core operations outside the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistent client storage error
    #[error("Storage error: {0}")]
    Storage(String),
}
