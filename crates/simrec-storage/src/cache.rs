//! Key-value cache that recommendation lists are published to.
//!
//! Consumers read `similar_items:<id>` keys directly; this crate only
//! provides the write side plus a read for diagnostics and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StorageError;

/// Writable string cache.
///
/// A `set` either replaces the whole value for `key` or leaves the previous
/// value untouched. Implementations never expose half-written values.
#[async_trait]
pub trait RecommendationCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Read the current value for `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// In-process cache backed by a concurrent map.
///
/// Supports per-key write stalls and a global outage switch so publishing
/// behavior can be exercised without a real backend.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>,
    stalls: DashMap<String, Duration>,
    unavailable: std::sync::atomic::AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write to `key` by `delay` before applying it.
    pub fn stall_writes(&self, key: impl Into<String>, delay: Duration) {
        self.stalls.insert(key.into(), delay);
    }

    /// Remove all configured stalls.
    pub fn clear_stalls(&self) {
        self.stalls.clear();
    }

    /// Reject every operation (or stop rejecting).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }

    /// Point-in-time copy of all entries.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StorageError::CacheUnavailable(
                "memory cache marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecommendationCache for MemoryCache {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;
        // Copy out so no map guard is held across the await
        let stall = self.stalls.get(key).map(|d| *d);
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
