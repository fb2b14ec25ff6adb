//! Storage error types.
//!
//! Defines errors that can occur during storage operations:
//! - `Io`: Underlying backend failures (database, network, injected chaos)
//! - `Serialization`: Blob could not be encoded or decoded
//! - `UnknownCategory`: Key-bag category name not recognised
//! - `Config`: Invalid store configuration

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// I/O error (database, remote store, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Category name is not one of the protocol's key-bag categories
    #[error("unknown key category: {0}")]
    UnknownCategory(String),

    /// Configuration rejected
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
