//! Process-wide collaborators for rebuild cycles.

use std::sync::Arc;

use simrec_storage::{ItemSource, RecommendationCache};
use simrec_text::TextNormalizer;
use simrec_types::Settings;

/// Everything a rebuild cycle needs, built once at startup and shared by
/// reference. Nothing in here changes between cycles.
#[derive(Clone)]
pub struct EngineContext {
    pub settings: Settings,
    pub source: Arc<dyn ItemSource>,
    pub cache: Arc<dyn RecommendationCache>,
    pub normalizer: Arc<TextNormalizer>,
}

impl EngineContext {
    pub fn new(
        settings: Settings,
        source: Arc<dyn ItemSource>,
        cache: Arc<dyn RecommendationCache>,
    ) -> Self {
        Self {
            settings,
            source,
            cache,
            normalizer: Arc::new(TextNormalizer::english()),
        }
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("settings", &self.settings)
            .field("source", &self.source.describe())
            .field("cache", &self.cache.describe())
            .finish()
    }
}
