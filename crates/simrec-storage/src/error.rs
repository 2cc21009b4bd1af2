//! Storage layer error types.

use thiserror::Error;

/// Errors raised by item sources and recommendation caches.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The item store could not be reached
    #[error("Item source unavailable: {0}")]
    SourceUnavailable(String),

    /// The cache could not be reached
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store payload could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Call did not finish within its deadline
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Blocking task failed to complete
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Task(err.to_string())
    }
}
