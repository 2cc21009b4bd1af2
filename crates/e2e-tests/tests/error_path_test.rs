//! Error path E2E tests: malformed records, outages, stalls, degenerate corpora.
//!
//! Every failure here abandons at most one cycle and leaves previously
//! published keys readable.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{item, settings_with_top_k, TestHarness};
use simrec_engine::{publish, RebuildError};
use simrec_storage::{RecommendationCache, RocksCache};
use simrec_types::{Recommendation, Settings};

/// A record without an id is skipped; the rest of the catalog publishes.
#[tokio::test]
async fn test_record_missing_id_is_skipped() {
    let harness = TestHarness::with_settings(
        vec![
            item("1", "red hammer", "tools"),
            json!({"title": "mystery box", "category": "tools", "status": "ACTIVE"}),
            item("2", "red wrench", "tools"),
        ],
        settings_with_top_k(16),
    );

    let report = harness.cycle.run().await.unwrap();
    assert_eq!(report.corpus.received, 3);
    assert_eq!(report.corpus.skipped_malformed, 1);
    assert_eq!(report.entries, 2);

    assert_eq!(harness.raw("1").await.as_deref(), Some("2"));
    assert_eq!(harness.raw("2").await.as_deref(), Some("1"));
    assert_eq!(harness.cache.len(), 2);
}

/// A single active item gets a present-but-empty value.
#[tokio::test]
async fn test_single_item_publishes_empty_value() {
    let harness = TestHarness::new(vec![item("solo", "walnut bookshelf", "furniture")]);

    let report = harness.cycle.run().await.unwrap();
    assert_eq!(report.entries, 1);
    assert_eq!(harness.raw("solo").await, Some(String::new()));
    assert_eq!(harness.similar("solo").await, Some(Vec::<String>::new()));
}

/// One stalled cache write times out; the other keys are written and the
/// stalled key keeps its previous value.
#[tokio::test]
async fn test_cache_write_timeout_keeps_previous_value() {
    let settings = Settings {
        top_k: 2,
        query_timeout_ms: 300,
        ..Default::default()
    };
    let harness = TestHarness::with_settings(
        vec![
            item("1", "red hammer", "tools"),
            item("2", "red wrench", "tools"),
            item("3", "blue shovel", "tools"),
        ],
        settings,
    );
    harness.cycle.run().await.unwrap();
    let previous = harness.raw("2").await;
    assert!(previous.is_some());

    harness.source.set_records(vec![
        item("1", "red hammer", "tools"),
        item("2", "red wrench", "tools"),
        item("3", "blue shovel", "tools"),
        item("4", "red wrench set", "tools"),
    ]);
    harness
        .cache
        .stall_writes("similar_items:2", Duration::from_secs(10));

    let report = harness.cycle.run().await.unwrap();
    assert_eq!(report.publish.attempted, 4);
    assert_eq!(report.publish.written, 3);
    assert_eq!(report.publish.failed_writes, 1);

    assert_eq!(harness.raw("2").await, previous);
    assert!(harness.raw("4").await.is_some());
    let first = harness.similar("1").await.unwrap();
    assert!(first.contains(&"4".to_string()) || first.contains(&"2".to_string()));
}

/// An unreachable item store abandons the cycle without touching the cache.
#[tokio::test]
async fn test_source_outage_leaves_cache_untouched() {
    let harness = TestHarness::with_settings(
        vec![
            item("1", "red hammer", "tools"),
            item("2", "red wrench", "tools"),
        ],
        settings_with_top_k(16),
    );
    harness.cycle.run().await.unwrap();
    let before = harness.cache.snapshot();

    harness.source.set_unavailable(true);
    let result = harness.cycle.run().await;
    assert!(matches!(result, Err(RebuildError::DataSource(_))));
    assert_eq!(result.unwrap_err().kind(), "data_source");
    assert_eq!(harness.cache.snapshot(), before);

    harness.source.set_unavailable(false);
    harness.cycle.run().await.unwrap();
}

/// No term survives normalization: nothing is written.
#[tokio::test]
async fn test_degenerate_corpus_writes_nothing() {
    let harness = TestHarness::new(vec![
        item("1", "the and", "of"),
        item("2", "a an", "it"),
        item("3", "", ""),
    ]);

    let result = harness.cycle.run().await;
    assert!(matches!(
        result,
        Err(RebuildError::DegenerateCorpus { documents: 3 })
    ));
    assert!(harness.cache.is_empty());
}

/// No active items at all.
#[tokio::test]
async fn test_empty_catalog_is_degenerate() {
    let mut sold = item("1", "red hammer", "tools");
    sold["status"] = "SOLD".into();
    let harness = TestHarness::new(vec![sold]);

    let result = harness.cycle.run().await;
    assert!(matches!(
        result,
        Err(RebuildError::DegenerateCorpus { documents: 0 })
    ));
    assert!(harness.cache.is_empty());
}

/// Every write failing is reported as the cache being unavailable.
#[tokio::test]
async fn test_cache_down_is_cache_unavailable() {
    let harness = TestHarness::with_settings(
        vec![
            item("1", "red hammer", "tools"),
            item("2", "red wrench", "tools"),
        ],
        settings_with_top_k(16),
    );
    harness.cache.set_unavailable(true);

    let result = harness.cycle.run().await;
    assert!(matches!(
        result,
        Err(RebuildError::CacheUnavailable { attempted: 2, .. })
    ));
}

/// A RocksDB write that times out before it starts never lands, so the
/// previous list survives a cycle reported as cache-unavailable.
#[test]
fn test_timed_out_rocks_write_keeps_previous_value() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(1)
        .build()
        .unwrap();

    runtime.block_on(async {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let cache = RocksCache::open(temp_dir.path()).unwrap();
        cache.set("similar_items:1", "old").await.unwrap();

        // Hold the only blocking thread so the publish write queues
        let (release, wait) = std::sync::mpsc::channel::<()>();
        let blocker = tokio::task::spawn_blocking(move || {
            let _ = wait.recv();
        });

        let recs = vec![Recommendation::new("1", vec!["2".to_string()])];
        let result = publish(&cache, &recs, Duration::from_millis(50)).await;
        assert!(matches!(
            result,
            Err(RebuildError::CacheUnavailable { attempted: 1, .. })
        ));

        release.send(()).unwrap();
        blocker.await.unwrap();

        assert_eq!(
            cache.get("similar_items:1").await.unwrap(),
            Some("old".to_string())
        );
    });
}
