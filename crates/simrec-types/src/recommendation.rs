//! Corpus entries, recommendations, and the cache key/value format.

use serde::{Deserialize, Serialize};

/// Prefix of every recommendation key written to the cache.
pub const SIMILAR_ITEMS_PREFIX: &str = "similar_items:";

/// Separator between ids in a cached recommendation value.
pub const ID_SEPARATOR: char = ',';

/// One active item prepared for vectorization.
///
/// Entries belong to a single rebuild cycle and are never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub item_id: String,
    pub combined_text: String,
    pub normalized_text: String,
}

/// The similar-items list published for one subject item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: String,
    /// Nearest first. Never contains `item_id`.
    pub similar_ids: Vec<String>,
}

impl Recommendation {
    pub fn new(item_id: impl Into<String>, similar_ids: Vec<String>) -> Self {
        Self {
            item_id: item_id.into(),
            similar_ids,
        }
    }

    /// An empty list for `item_id`.
    pub fn empty(item_id: impl Into<String>) -> Self {
        Self::new(item_id, Vec::new())
    }

    /// Cache key for this recommendation.
    pub fn cache_key(&self) -> String {
        similar_items_key(&self.item_id)
    }

    /// Cache value: ids joined by commas, empty string for no ids.
    pub fn cache_value(&self) -> String {
        self.similar_ids.join(",")
    }
}

/// Build the cache key `similar_items:<item_id>`.
pub fn similar_items_key(item_id: &str) -> String {
    format!("{}{}", SIMILAR_ITEMS_PREFIX, item_id)
}

/// Split a cached value back into ids. An empty value yields no ids.
pub fn parse_similar_ids(value: &str) -> Vec<String> {
    value
        .split(ID_SEPARATOR)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
