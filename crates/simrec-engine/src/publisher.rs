//! Turns index neighbors into per-item recommendation lists and writes
//! them to the cache.

use std::time::Duration;

use serde::Serialize;
use simrec_storage::{RecommendationCache, StorageError};
use simrec_types::{CorpusEntry, Recommendation};
use simrec_vector::{NeighborIndex, VectorError};
use tracing::{debug, warn};

use crate::error::RebuildError;

/// Outcome of writing one cycle's recommendations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishStats {
    pub attempted: usize,
    pub written: usize,
    pub failed_writes: usize,
}

/// Compute the recommendation list for every entry.
///
/// `vectors[p]` must be the vector of `entries[p]` and the index must have
/// been built from `vectors` in the same order. Each entry asks the index
/// for `k + 1` neighbors, drops every neighbor carrying its own id, then
/// keeps the nearest `k`.
pub fn recommend<I>(
    entries: &[CorpusEntry],
    index: &I,
    vectors: &[Vec<f32>],
    k: usize,
) -> Result<Vec<Recommendation>, VectorError>
where
    I: NeighborIndex + ?Sized,
{
    if entries.len() <= 1 || k == 0 {
        return Ok(entries
            .iter()
            .map(|entry| Recommendation::empty(entry.item_id.clone()))
            .collect());
    }

    let neighbor_lists = index.query_batch(vectors, k + 1)?;

    Ok(entries
        .iter()
        .zip(neighbor_lists)
        .map(|(entry, neighbors)| {
            let similar_ids = neighbors
                .into_iter()
                .filter_map(|n| entries.get(n.position))
                .filter(|candidate| candidate.item_id != entry.item_id)
                .take(k)
                .map(|candidate| candidate.item_id.clone())
                .collect();
            Recommendation::new(entry.item_id.clone(), similar_ids)
        })
        .collect())
}

/// Write every recommendation under its `similar_items:<id>` key.
///
/// Each write is bounded by `timeout`. A failed write leaves that key's
/// previous value in place and does not stop the remaining writes.
///
/// # Errors
///
/// `RebuildError::CacheUnavailable` when there was at least one write and
/// all of them failed.
pub async fn publish(
    cache: &dyn RecommendationCache,
    recommendations: &[Recommendation],
    timeout: Duration,
) -> Result<PublishStats, RebuildError> {
    let mut stats = PublishStats {
        attempted: recommendations.len(),
        ..Default::default()
    };
    let mut last_error = None;

    for rec in recommendations {
        let key = rec.cache_key();
        let value = rec.cache_value();

        let result = match tokio::time::timeout(timeout, cache.set(&key, &value)).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(timeout)),
        };

        match result {
            Ok(()) => {
                debug!(item_id = %rec.item_id, similar = rec.similar_ids.len(), "Published");
                stats.written += 1;
            }
            Err(e) => {
                warn!(item_id = %rec.item_id, key = %key, error = %e, "Cache write failed");
                stats.failed_writes += 1;
                last_error = Some(e.to_string());
            }
        }
    }

    if stats.attempted > 0 && stats.written == 0 {
        return Err(RebuildError::CacheUnavailable {
            attempted: stats.attempted,
            last_error: last_error.unwrap_or_default(),
        });
    }

    Ok(stats)
}
