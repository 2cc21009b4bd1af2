//! Rebuild cycle error types.

use simrec_storage::StorageError;
use thiserror::Error;

/// Why a rebuild cycle was abandoned.
///
/// None of these stop the process; the scheduler logs the error and tries
/// again on the next tick. The cache keeps whatever it held before.
#[derive(Error, Debug)]
pub enum RebuildError {
    /// Item store unreachable, too slow, or returned unusable data
    #[error("Item source error: {0}")]
    DataSource(#[source] StorageError),

    /// No usable vocabulary (or no documents) this cycle
    #[error("Degenerate corpus of {documents} documents: no term meets the frequency threshold")]
    DegenerateCorpus { documents: usize },

    /// Every cache write in the cycle failed
    #[error("Cache unavailable: all {attempted} writes failed (last error: {last_error})")]
    CacheUnavailable { attempted: usize, last_error: String },

    /// Vectorizing or indexing failed unexpectedly
    #[error("Compute error: {0}")]
    Compute(String),
}

impl RebuildError {
    /// Short label for logs and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            RebuildError::DataSource(_) => "data_source",
            RebuildError::DegenerateCorpus { .. } => "degenerate_corpus",
            RebuildError::CacheUnavailable { .. } => "cache_unavailable",
            RebuildError::Compute(_) => "compute",
        }
    }
}

impl From<simrec_vector::VectorError> for RebuildError {
    fn from(err: simrec_vector::VectorError) -> Self {
        match err {
            simrec_vector::VectorError::DegenerateCorpus { documents } => {
                RebuildError::DegenerateCorpus { documents }
            }
            other => RebuildError::Compute(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let errors = [
            RebuildError::DataSource(StorageError::SourceUnavailable("down".into())),
            RebuildError::DegenerateCorpus { documents: 3 },
            RebuildError::CacheUnavailable {
                attempted: 2,
                last_error: "timeout".into(),
            },
            RebuildError::Compute("boom".into()),
        ];
        let kinds: Vec<_> = errors.iter().map(RebuildError::kind).collect();
        assert_eq!(
            kinds,
            vec!["data_source", "degenerate_corpus", "cache_unavailable", "compute"]
        );
    }

    #[test]
    fn test_vector_error_conversion() {
        let err: RebuildError = simrec_vector::VectorError::DegenerateCorpus { documents: 4 }.into();
        assert!(matches!(err, RebuildError::DegenerateCorpus { documents: 4 }));
        assert_eq!(err.kind(), "degenerate_corpus");

        let err: RebuildError = simrec_vector::VectorError::InvalidThreshold(2.0).into();
        assert!(matches!(err, RebuildError::Compute(_)));
    }
}
