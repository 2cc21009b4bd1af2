//! RocksDB-backed recommendation cache.
//!
//! Single-key puts are atomic in RocksDB, so a reader always sees either
//! the previous list or the new one. Calls run on the blocking pool. When
//! the caller drops a `set` (for example on timeout) before its put has
//! started, the put is skipped; a put already inside RocksDB cannot be
//! recalled.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{Direction, IteratorMode, Options, DB};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::RecommendationCache;
use crate::column_families::{build_cf_descriptors, CF_RECOMMENDATIONS};
use crate::error::StorageError;

/// Persistent cache stored in a local RocksDB instance.
#[derive(Clone)]
pub struct RocksCache {
    db: Arc<DB>,
    path: String,
}

impl RocksCache {
    /// Open the cache at `path`, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening recommendation cache at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(2);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;

        Ok(Self {
            db: Arc::new(db),
            path: path.display().to_string(),
        })
    }

    /// Synchronous write, used by the async wrapper.
    pub fn put_sync(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let cf = self
            .db
            .cf_handle(CF_RECOMMENDATIONS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECOMMENDATIONS.to_string()))?;
        self.db.put_cf(&cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    /// Synchronous read, used by the async wrapper.
    pub fn get_sync(&self, key: &str) -> Result<Option<String>, StorageError> {
        let cf = self
            .db
            .cf_handle(CF_RECOMMENDATIONS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECOMMENDATIONS.to_string()))?;
        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Count keys starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let cf = self
            .db
            .cf_handle(CF_RECOMMENDATIONS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_RECOMMENDATIONS.to_string()))?;

        let mut count = 0;
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(prefix.as_bytes(), Direction::Forward),
        );
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Flush memtables to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl RecommendationCache for RocksCache {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let cache = self.clone();
        let (key, value) = (key.to_string(), value.to_string());

        // Cancelled when this future is dropped, including after completion
        let abandoned = CancellationToken::new();
        let _abandon_on_drop = abandoned.clone().drop_guard();

        tokio::task::spawn_blocking(move || {
            if abandoned.is_cancelled() {
                debug!(key = %key, "Cache write abandoned before it started");
                return Err(StorageError::CacheUnavailable(format!(
                    "write to {} abandoned by caller",
                    key
                )));
            }
            cache.put_sync(&key, &value)
        })
        .await?
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let cache = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || cache.get_sync(&key)).await?
    }

    fn describe(&self) -> String {
        format!("rocksdb:{}", self.path)
    }
}
