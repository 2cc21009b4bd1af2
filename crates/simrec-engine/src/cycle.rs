//! One full rebuild: corpus, vectors, index, publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use simrec_types::{CorpusEntry, Recommendation};
use simrec_vector::{fit_vectors, FlatIndex};
use tracing::{info, warn};

use crate::context::EngineContext;
use crate::corpus::{build_corpus, CorpusStats};
use crate::error::RebuildError;
use crate::publisher::{publish, recommend, PublishStats};

/// Summary of a completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    pub cycle: u64,
    pub corpus: CorpusStats,
    pub entries: usize,
    pub dimensions: usize,
    pub publish: PublishStats,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Runs rebuild cycles against a shared context.
///
/// Each call to [`RebuildCycle::run`] owns its corpus, vectors and index
/// exclusively and drops them on return. Callers are responsible for not
/// running two cycles at once.
#[derive(Debug)]
pub struct RebuildCycle {
    ctx: Arc<EngineContext>,
    cycles: AtomicU64,
}

impl RebuildCycle {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Number of cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Run one cycle. On error nothing has been written this cycle, except
    /// for `CacheUnavailable` where writes were attempted and all failed.
    pub async fn run(&self) -> Result<RebuildReport, RebuildError> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        let settings = &self.ctx.settings;
        let timeout = settings.query_timeout();

        info!(cycle, "Starting rebuild cycle");

        let (entries, corpus) =
            build_corpus(self.ctx.source.as_ref(), &self.ctx.normalizer, timeout).await?;

        if entries.is_empty() {
            warn!(cycle, "No active items; nothing to publish");
            return Err(RebuildError::DegenerateCorpus { documents: 0 });
        }

        let min_df = settings.min_document_frequency;
        let top_k = settings.top_k;
        let (recommendations, dimensions) = if entries.len() == 1 {
            (vec![Recommendation::empty(entries[0].item_id.clone())], 0)
        } else {
            tokio::task::spawn_blocking(move || compute(&entries, min_df, top_k))
                .await
                .map_err(|e| RebuildError::Compute(e.to_string()))??
        };

        let publish_stats = publish(self.ctx.cache.as_ref(), &recommendations, timeout).await?;

        let report = RebuildReport {
            cycle,
            corpus,
            entries: recommendations.len(),
            dimensions,
            publish: publish_stats,
            duration: started.elapsed(),
        };

        info!(
            cycle,
            entries = report.entries,
            dimensions,
            written = publish_stats.written,
            failed_writes = publish_stats.failed_writes,
            duration_ms = report.duration.as_millis() as u64,
            "Rebuild cycle complete"
        );
        Ok(report)
    }
}

/// CPU-bound part of the cycle.
fn compute(
    entries: &[CorpusEntry],
    min_document_frequency: f64,
    top_k: usize,
) -> Result<(Vec<Recommendation>, usize), RebuildError> {
    let space = fit_vectors(entries, min_document_frequency)?;
    let dimensions = space.dimension();
    let vectors = space.into_vectors();
    let index = FlatIndex::build(dimensions, &vectors)?;
    let recommendations = recommend(entries, &index, &vectors, top_k)?;
    Ok((recommendations, dimensions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use simrec_storage::{MemoryCache, MemorySource, RecommendationCache};
    use simrec_types::Settings;

    fn cycle_with(records: Vec<serde_json::Value>) -> (RebuildCycle, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        let ctx = EngineContext::new(
            Settings::default(),
            Arc::new(MemorySource::new(records)),
            cache.clone(),
        );
        (RebuildCycle::new(Arc::new(ctx)), cache)
    }

    #[tokio::test]
    async fn test_cycle_publishes_every_entry() {
        let (cycle, cache) = cycle_with(vec![
            json!({"id": "1", "title": "red hammer", "status": "ACTIVE"}),
            json!({"id": "2", "title": "red wrench", "status": "ACTIVE"}),
            json!({"id": "3", "title": "blue shovel", "status": "ACTIVE"}),
        ]);

        let report = cycle.run().await.unwrap();
        assert_eq!(report.cycle, 1);
        assert_eq!(report.entries, 3);
        assert_eq!(report.publish.written, 3);
        assert_eq!(cache.len(), 3);

        let first = cache.get("similar_items:1").await.unwrap().unwrap();
        assert!(first.starts_with('2'));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_degenerate() {
        let (cycle, cache) = cycle_with(vec![]);
        let result = cycle.run().await;
        assert!(matches!(
            result,
            Err(RebuildError::DegenerateCorpus { documents: 0 })
        ));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_single_item_publishes_empty_value() {
        let (cycle, cache) = cycle_with(vec![json!({"id": "solo", "status": "ACTIVE"})]);
        let report = cycle.run().await.unwrap();
        assert_eq!(report.dimensions, 0);
        assert_eq!(
            cache.get("similar_items:solo").await.unwrap(),
            Some(String::new())
        );
    }

    #[tokio::test]
    async fn test_degenerate_vocabulary_writes_nothing() {
        let (cycle, cache) = cycle_with(vec![
            json!({"id": "1", "title": "the", "status": "ACTIVE"}),
            json!({"id": "2", "title": "a", "status": "ACTIVE"}),
        ]);
        assert!(matches!(
            cycle.run().await,
            Err(RebuildError::DegenerateCorpus { documents: 2 })
        ));
        assert!(cache.is_empty());
        assert_eq!(cycle.cycles_started(), 1);
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let (cycle, _cache) = cycle_with(vec![
            json!({"id": "1", "title": "lamp", "status": "ACTIVE"}),
            json!({"id": "2", "title": "lamp shade", "status": "ACTIVE"}),
        ]);
        let report = cycle.run().await.unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["entries"], 2);
        assert!(value["duration"].is_u64());
    }
}
