//! End-to-end test infrastructure for simrec.
//!
//! Provides a shared TestHarness and helper functions for tests covering
//! the full item store -> cache pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use simrec_engine::{EngineContext, RebuildCycle};
use simrec_storage::{
    JsonFileSource, MemoryCache, MemorySource, RecommendationCache, RocksCache,
};
use simrec_types::{parse_similar_ids, similar_items_key, Settings};

/// Shared test harness for E2E tests.
///
/// Wires an in-memory item source and cache into a rebuild cycle. Tests
/// mutate the catalog or stall the cache between cycles.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub source: Arc<MemorySource>,
    pub cache: Arc<MemoryCache>,
    pub cycle: Arc<RebuildCycle>,
}

impl TestHarness {
    /// Harness over `records` with default settings.
    pub fn new(records: Vec<Value>) -> Self {
        Self::with_settings(records, Settings::default())
    }

    /// Harness over `records` with explicit settings.
    pub fn with_settings(records: Vec<Value>, settings: Settings) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let source = Arc::new(MemorySource::new(records));
        let cache = Arc::new(MemoryCache::new());
        let ctx = EngineContext::new(settings, source.clone(), cache.clone());

        Self {
            _temp_dir: temp_dir,
            source,
            cache,
            cycle: Arc::new(RebuildCycle::new(Arc::new(ctx))),
        }
    }

    /// Published ids for `item_id`, or `None` if the key was never written.
    pub async fn similar(&self, item_id: &str) -> Option<Vec<String>> {
        read_similar(self.cache.as_ref(), item_id).await
    }

    /// Raw published value for `item_id`.
    pub async fn raw(&self, item_id: &str) -> Option<String> {
        self.cache
            .get(&similar_items_key(item_id))
            .await
            .expect("memory cache read failed")
    }
}

/// Harness variant backed by a JSON export and a RocksDB cache on disk.
pub struct DiskHarness {
    pub _temp_dir: tempfile::TempDir,
    pub items_path: PathBuf,
    pub cache_path: PathBuf,
}

impl DiskHarness {
    /// Write `records` as JSON Lines into a fresh temp directory.
    pub fn new(records: &[Value]) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let items_path = temp_dir.path().join("items.jsonl");
        let cache_path = temp_dir.path().join("cache");

        let lines: Vec<String> = records.iter().map(Value::to_string).collect();
        std::fs::write(&items_path, lines.join("\n")).expect("Failed to write item export");
        std::fs::create_dir_all(&cache_path).expect("Failed to create cache dir");

        Self {
            _temp_dir: temp_dir,
            items_path,
            cache_path,
        }
    }

    /// Replace the item export.
    pub fn rewrite(&self, records: &[Value]) {
        let lines: Vec<String> = records.iter().map(Value::to_string).collect();
        std::fs::write(&self.items_path, lines.join("\n")).expect("Failed to write item export");
    }

    /// Build a cycle reading the export and publishing to `cache`.
    pub fn cycle(&self, settings: Settings, cache: Arc<RocksCache>) -> RebuildCycle {
        let source = Arc::new(JsonFileSource::new(&self.items_path));
        RebuildCycle::new(Arc::new(EngineContext::new(settings, source, cache)))
    }

    pub fn open_cache(&self) -> Arc<RocksCache> {
        Arc::new(RocksCache::open(&self.cache_path).expect("Failed to open cache"))
    }
}

/// Read and split the published list for `item_id`.
pub async fn read_similar(cache: &dyn RecommendationCache, item_id: &str) -> Option<Vec<String>> {
    cache
        .get(&similar_items_key(item_id))
        .await
        .expect("cache read failed")
        .map(|value| parse_similar_ids(&value))
}

/// An ACTIVE item record.
pub fn item(id: &str, title: &str, category: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "category": category,
        "status": "ACTIVE",
    })
}

/// Settings with a given top-k and short timeouts.
pub fn settings_with_top_k(top_k: usize) -> Settings {
    Settings {
        top_k,
        query_timeout_ms: 1_000,
        ..Default::default()
    }
}

/// A catalog of `count` active items drawn from a few product families, so
/// every family shares vocabulary and neighbors are well defined.
pub fn generated_catalog(count: usize) -> Vec<Value> {
    const COLORS: &[&str] = &["red", "blue", "green", "black", "white"];
    const NOUNS: &[&str] = &["hammer", "wrench", "shovel", "drill", "saw", "ladder"];
    const CATEGORIES: &[&str] = &["tools", "garden", "hardware"];

    (0..count)
        .map(|i| {
            item(
                &format!("item-{}", i),
                &format!("{} {}", COLORS[i % COLORS.len()], NOUNS[i % NOUNS.len()]),
                CATEGORIES[i % CATEGORIES.len()],
            )
        })
        .collect()
}
