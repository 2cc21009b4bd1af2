//! # simrec-engine
//!
//! Rebuild pipeline: item store -> corpus -> TF-IDF vectors -> exact
//! nearest-neighbor index -> `similar_items:<id>` cache keys.

pub mod context;
pub mod corpus;
pub mod cycle;
pub mod error;
pub mod publisher;

pub use context::EngineContext;
pub use corpus::{build_corpus, corpus_entry, corpus_from_records, CorpusStats};
pub use cycle::{RebuildCycle, RebuildReport};
pub use error::RebuildError;
pub use publisher::{publish, recommend, PublishStats};
