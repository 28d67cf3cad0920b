//! Error types for microhub-core

use thiserror::Error;

/// Result type alias using microhub-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in microhub-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// An entity with the same id already exists in the collection
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// Invalid input, rejected before any mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
