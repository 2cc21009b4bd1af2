//! # simrec-storage
//!
//! Item source and recommendation cache adapters for simrec.
//!
//! ## Features
//! - `ItemSource` trait with JSON export and in-memory implementations
//! - `RecommendationCache` trait with RocksDB and in-memory implementations
//! - Atomic per-key replacement of published neighbor lists

pub mod cache;
pub mod column_families;
pub mod error;
pub mod rocks;
pub mod source;

pub use cache::{MemoryCache, RecommendationCache};
pub use error::StorageError;
pub use rocks::RocksCache;
pub use source::{is_active_record, parse_records, ItemSource, JsonFileSource, MemorySource};
