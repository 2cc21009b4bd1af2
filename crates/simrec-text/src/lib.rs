//! # simrec-text
//!
//! Deterministic text normalization for item similarity.
//!
//! Turns free-text item fields into a token-normalized string: lowercase,
//! unit and currency rewrites, stopword removal and noun lemmatization.
//! `normalize` is pure and idempotent.
//!
//! ```
//! use simrec_text::normalize;
//!
//! assert_eq!(normalize("Two Hammers, 16 oz"), "two hammer 16 ounce");
//! ```

pub mod lemma;
pub mod normalizer;
pub mod stopwords;

pub use lemma::Lemmatizer;
pub use normalizer::{normalize, terms, TextNormalizer};
pub use stopwords::StopWords;
