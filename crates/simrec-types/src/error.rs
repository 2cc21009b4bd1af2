//! Error types shared across the simrec workspace.

use thiserror::Error;

/// Unified error type for domain-level operations.
#[derive(Debug, Error)]
pub enum SimrecError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store record could not be mapped to an `Item`
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
