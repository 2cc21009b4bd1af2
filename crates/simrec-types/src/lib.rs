//! # simrec-types
//!
//! Shared domain types for the item-similarity engine.
//!
//! - Items: catalog records validated at the store boundary
//! - Corpus entries and recommendations produced by a rebuild cycle
//! - The `similar_items:<id>` cache key and comma-separated value format
//! - Settings: layered configuration

pub mod config;
pub mod error;
pub mod item;
pub mod recommendation;

pub use config::Settings;
pub use error::SimrecError;
pub use item::{Item, ItemStatus};
pub use recommendation::{
    parse_similar_ids, similar_items_key, CorpusEntry, Recommendation, SIMILAR_ITEMS_PREFIX,
};
