//! Nearest-neighbor index trait and types.
//!
//! Defines the interface the publisher queries for similar items.

use crate::error::VectorError;

/// One neighbor returned by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Squared Euclidean distance to the query (lower = more similar)
    pub distance: f32,
    /// Row position in the vector set the index was built from
    pub position: usize,
}

impl Neighbor {
    pub fn new(distance: f32, position: usize) -> Self {
        Self { distance, position }
    }
}

/// Index statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of vectors in the index
    pub vector_count: usize,
    /// Vector dimension
    pub dimension: usize,
}

/// Trait for immutable nearest-neighbor indexes.
///
/// Implementations must be thread-safe for concurrent read access.
pub trait NeighborIndex: Send + Sync {
    /// Get the vector dimension
    fn dimension(&self) -> usize;

    /// Get the number of vectors in the index
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Search for the `k` nearest neighbors of `query`.
    ///
    /// Results are sorted by ascending distance, ties by ascending position.
    fn query(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Run several queries. Result `i` answers `queries[i]`.
    fn query_batch(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, VectorError> {
        queries.iter().map(|q| self.query(q, k)).collect()
    }

    /// Get index statistics
    fn stats(&self) -> IndexStats {
        IndexStats {
            vector_count: self.len(),
            dimension: self.dimension(),
        }
    }
}
