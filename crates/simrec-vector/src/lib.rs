//! # simrec-vector
//!
//! TF-IDF vector space and exact nearest-neighbor index for item similarity.
//!
//! ## Features
//! - Vocabulary rebuilt per cycle with a minimum document-frequency cutoff
//! - Raw count x idf weights paired with squared Euclidean distance
//! - Brute-force index with deterministic (distance, position) ordering
//! - Row-parallel fitting and batch queries via rayon

pub mod error;
pub mod flat;
pub mod index;
pub mod space;

pub use error::VectorError;
pub use flat::{squared_l2, FlatIndex};
pub use index::{IndexStats, Neighbor, NeighborIndex};
pub use space::{fit_vectors, VectorSpace};
