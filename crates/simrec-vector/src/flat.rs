//! Exact brute-force index under squared Euclidean distance.
//!
//! Stores rows contiguously and scans all of them per query. Catalogs in the
//! thousands make a linear scan cheap enough, and the result is exact and
//! reproducible: same rows and same query give the same ordered output.

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::debug;

use crate::error::VectorError;
use crate::index::{Neighbor, NeighborIndex};

/// Flat (exhaustive) L2 index, immutable once built.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major storage, `len * dimension` values
    data: Vec<f32>,
    len: usize,
}

impl FlatIndex {
    /// Build an index over `vectors`, all of which must have `dimension`
    /// components.
    pub fn build(dimension: usize, vectors: &[Vec<f32>]) -> Result<Self, VectorError> {
        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        debug!(vectors = vectors.len(), dimension, "Built flat index");
        Ok(Self {
            dimension,
            data,
            len: vectors.len(),
        })
    }

    /// Row stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        (position < self.len)
            .then(|| &self.data[position * self.dimension..(position + 1) * self.dimension])
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics; a zero-dimension index has only empty rows
        let width = self.dimension.max(1);
        self.data
            .chunks_exact(width)
            .chain(std::iter::repeat(&[][..]))
            .take(self.len)
    }

    fn check_dimension(&self, query: &[f32]) -> Result<(), VectorError> {
        if query.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        Ok(())
    }
}

impl NeighborIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.len
    }

    fn query(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        self.check_dimension(query)?;
        if k == 0 || self.len == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .rows()
            .enumerate()
            .map(|(position, row)| Neighbor::new(squared_l2(query, row), position))
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, by_distance_then_position);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(by_distance_then_position);
        Ok(neighbors)
    }

    fn query_batch(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, VectorError> {
        queries.par_iter().map(|q| self.query(q, k)).collect()
    }
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn by_distance_then_position(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.position.cmp(&b.position))
}
