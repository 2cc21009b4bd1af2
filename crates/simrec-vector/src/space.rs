//! TF-IDF vector space fitted over one corpus snapshot.
//!
//! weight(term, doc) = count(term, doc) * ln(N / df(term))
//!
//! Terms present in fewer than `min_document_frequency * N` documents are
//! dropped from the vocabulary entirely. Vectors are left unnormalized and
//! are meant to be compared with (squared) Euclidean distance.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use simrec_text::terms;
use simrec_types::CorpusEntry;
use tracing::debug;

use crate::error::VectorError;

/// Absolute tolerance applied to the document-count threshold so that
/// e.g. `0.07 * 100` admits terms found in exactly 7 documents.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Vocabulary plus one vector per document, valid for a single rebuild cycle.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    /// term -> dimension, dimensions assigned in lexicographic term order
    vocabulary: BTreeMap<String, usize>,
    /// ln(N / df) per dimension
    idf: Vec<f32>,
    /// One row per document, in corpus order
    vectors: Vec<Vec<f32>>,
}

impl VectorSpace {
    /// Fit over already-normalized documents.
    ///
    /// # Errors
    ///
    /// - `VectorError::InvalidThreshold` if `min_document_frequency` is not
    ///   in (0.0, 1.0].
    /// - `VectorError::DegenerateCorpus` if there are no documents or no term
    ///   meets the threshold.
    pub fn fit<S>(documents: &[S], min_document_frequency: f64) -> Result<Self, VectorError>
    where
        S: AsRef<str> + Sync,
    {
        if !(min_document_frequency > 0.0 && min_document_frequency <= 1.0) {
            return Err(VectorError::InvalidThreshold(min_document_frequency));
        }

        let n = documents.len();
        if n == 0 {
            return Err(VectorError::DegenerateCorpus { documents: 0 });
        }

        let counts: Vec<HashMap<&str, u32>> = documents
            .par_iter()
            .map(|doc| term_counts(doc.as_ref()))
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *document_frequency.entry(*term).or_insert(0) += 1;
            }
        }

        let min_documents = min_document_frequency * n as f64;
        let retained: BTreeSet<&str> = document_frequency
            .iter()
            .filter(|&(_, &df)| df as f64 + THRESHOLD_EPSILON >= min_documents)
            .map(|(&term, _)| term)
            .collect();

        if retained.is_empty() {
            return Err(VectorError::DegenerateCorpus { documents: n });
        }

        let vocabulary: BTreeMap<String, usize> = retained
            .iter()
            .enumerate()
            .map(|(dim, term)| (term.to_string(), dim))
            .collect();

        let idf: Vec<f32> = retained
            .iter()
            .map(|term| (n as f64 / document_frequency[term] as f64).ln() as f32)
            .collect();

        let vectors: Vec<Vec<f32>> = counts
            .par_iter()
            .map(|doc| weigh(doc, &vocabulary, &idf))
            .collect();

        debug!(
            documents = n,
            terms_seen = document_frequency.len(),
            dimensions = vocabulary.len(),
            "Fitted vector space"
        );

        Ok(Self {
            vocabulary,
            idf,
            vectors,
        })
    }

    /// Number of dimensions (vocabulary size).
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Dimension index for `term`, if retained.
    pub fn dimension_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    /// Vectors in corpus order.
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Consume the space, keeping only the vectors.
    pub fn into_vectors(self) -> Vec<Vec<f32>> {
        self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Fit a vector space over the normalized text of `entries`.
pub fn fit_vectors(
    entries: &[CorpusEntry],
    min_document_frequency: f64,
) -> Result<VectorSpace, VectorError> {
    let documents: Vec<&str> = entries
        .iter()
        .map(|entry| entry.normalized_text.as_str())
        .collect();
    VectorSpace::fit(&documents, min_document_frequency)
}

fn term_counts(text: &str) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for term in terms(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn weigh(
    counts: &HashMap<&str, u32>,
    vocabulary: &BTreeMap<String, usize>,
    idf: &[f32],
) -> Vec<f32> {
    let mut vector = vec![0.0f32; vocabulary.len()];
    for (term, &count) in counts {
        if let Some(&dim) = vocabulary.get(*term) {
            vector[dim] = count as f32 * idf[dim];
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_weights_are_count_times_idf() {
        let docs = ["red hammer tool", "red wrench tool", "blue shovel tool"];
        let space = VectorSpace::fit(&docs, 0.07).unwrap();

        assert_eq!(space.dimension(), 6);
        assert_eq!(space.len(), 3);

        let red = space.dimension_of("red").unwrap();
        let hammer = space.dimension_of("hammer").unwrap();
        let tool = space.dimension_of("tool").unwrap();

        let first = &space.vectors()[0];
        assert!(approx(first[red], (3.0f32 / 2.0).ln()));
        assert!(approx(first[hammer], 3.0f32.ln()));
        // Present in every document: idf is zero
        assert!(approx(first[tool], 0.0));
    }

    #[test]
    fn test_repeated_terms_scale_weight() {
        let docs = ["lamp lamp lamp", "chair", "table"];
        let space = VectorSpace::fit(&docs, 0.07).unwrap();
        let lamp = space.dimension_of("lamp").unwrap();
        assert!(approx(space.vectors()[0][lamp], 3.0 * 3.0f32.ln()));
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let docs = ["zebra apple", "mango apple"];
        let space = VectorSpace::fit(&docs, 0.07).unwrap();
        let terms: Vec<_> = space.vocabulary().keys().cloned().collect();
        assert_eq!(terms, vec!["apple", "mango", "zebra"]);
        assert_eq!(space.dimension_of("apple"), Some(0));
        assert_eq!(space.dimension_of("zebra"), Some(2));
    }

    #[test]
    fn test_min_document_frequency_drops_rare_terms() {
        // "rare" appears in 1 of 4 documents; threshold 0.5 needs 2
        let docs = ["common rare", "common", "common shared", "shared"];
        let space = VectorSpace::fit(&docs, 0.5).unwrap();
        assert!(space.dimension_of("rare").is_none());
        assert!(space.dimension_of("common").is_some());
        assert!(space.dimension_of("shared").is_some());
        assert_eq!(space.dimension(), 2);
    }

    #[test]
    fn test_threshold_admits_exact_fraction() {
        // 7 of 100 documents at 0.07 is retained
        let mut docs: Vec<String> = (0..100).map(|i| format!("filler{}", i % 2)).collect();
        for doc in docs.iter_mut().take(7) {
            doc.push_str(" exact");
        }
        let space = VectorSpace::fit(&docs, 0.07).unwrap();
        assert!(space.dimension_of("exact").is_some());
    }

    #[test]
    fn test_empty_corpus_is_degenerate() {
        let docs: [&str; 0] = [];
        let result = VectorSpace::fit(&docs, 0.07);
        assert!(matches!(
            result,
            Err(VectorError::DegenerateCorpus { documents: 0 })
        ));
    }

    #[test]
    fn test_empty_vocabulary_is_degenerate() {
        let docs = ["", "", "a b"];
        let result = VectorSpace::fit(&docs, 0.07);
        assert!(matches!(
            result,
            Err(VectorError::DegenerateCorpus { documents: 3 })
        ));
    }

    #[test]
    fn test_too_diverse_corpus_is_degenerate() {
        let docs = ["alpha", "beta", "gamma", "delta"];
        let result = VectorSpace::fit(&docs, 0.5);
        assert!(matches!(result, Err(VectorError::DegenerateCorpus { .. })));
    }

    #[test]
    fn test_invalid_threshold() {
        let docs = ["a"];
        assert!(matches!(
            VectorSpace::fit(&docs, 0.0),
            Err(VectorError::InvalidThreshold(_))
        ));
        assert!(matches!(
            VectorSpace::fit(&docs, 1.01),
            Err(VectorError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_empty_document_is_zero_vector() {
        let docs = ["hammer", "", "wrench"];
        let space = VectorSpace::fit(&docs, 0.07).unwrap();
        assert!(space.vectors()[1].iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_fit_vectors_uses_normalized_text() {
        let entries = vec![
            CorpusEntry {
                item_id: "1".into(),
                combined_text: "Red Hammers".into(),
                normalized_text: "red hammer".into(),
            },
            CorpusEntry {
                item_id: "2".into(),
                combined_text: "Blue Hammers".into(),
                normalized_text: "blue hammer".into(),
            },
        ];
        let space = fit_vectors(&entries, 0.07).unwrap();
        assert!(space.dimension_of("hammer").is_some());
        assert!(space.dimension_of("hammers").is_none());
    }

    proptest! {
        #[test]
        fn prop_rare_terms_never_weighted(
            docs in proptest::collection::vec("[a-e]{2}( [a-e]{2}){0,4}", 1..30),
            min_df in 0.05f64..0.9
        ) {
            if let Ok(space) = VectorSpace::fit(&docs, min_df) {
                let n = docs.len() as f64;
                for term in space.vocabulary().keys() {
                    let df = docs
                        .iter()
                        .filter(|d| terms(d).any(|t| t == term.as_str()))
                        .count();
                    prop_assert!(df as f64 + THRESHOLD_EPSILON >= min_df * n);
                }
                // Any term below threshold has no dimension, hence no weight
                for doc in &docs {
                    for term in terms(doc) {
                        let df = docs.iter().filter(|d| terms(d).any(|t| t == term)).count();
                        if (df as f64 + THRESHOLD_EPSILON) < min_df * n {
                            prop_assert!(space.dimension_of(term).is_none());
                        }
                    }
                }
                for v in space.vectors() {
                    prop_assert_eq!(v.len(), space.dimension());
                }
            }
        }
    }
}
