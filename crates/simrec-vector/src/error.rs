//! Vector space and index error types.

use thiserror::Error;

/// Errors that can occur while fitting vectors or querying the index.
#[derive(Debug, Error)]
pub enum VectorError {
    /// The fitted vocabulary is empty, or there were no documents at all.
    /// Recoverable: the cycle publishes nothing.
    #[error("Degenerate corpus: {documents} documents produced an empty vocabulary")]
    DegenerateCorpus { documents: usize },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Minimum document frequency outside (0.0, 1.0]
    #[error("Invalid minimum document frequency: {0}")]
    InvalidThreshold(f64),
}
