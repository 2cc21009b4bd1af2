//! Corpus construction from the item store.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use simrec_storage::{ItemSource, StorageError};
use simrec_text::TextNormalizer;
use simrec_types::{CorpusEntry, Item};
use tracing::{debug, info, warn};

use crate::error::RebuildError;

/// Counts gathered while building one corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    /// Records returned by the store
    pub received: usize,
    /// Records dropped for lacking a usable id
    pub skipped_malformed: usize,
    /// Records dropped for not being ACTIVE
    pub skipped_inactive: usize,
}

impl CorpusStats {
    /// Entries that made it into the corpus.
    pub fn accepted(&self) -> usize {
        self.received - self.skipped_malformed - self.skipped_inactive
    }
}

/// Query the store for active items and turn them into corpus entries.
///
/// The store call is bounded by `timeout`. Store order is preserved.
pub async fn build_corpus(
    source: &dyn ItemSource,
    normalizer: &TextNormalizer,
    timeout: Duration,
) -> Result<(Vec<CorpusEntry>, CorpusStats), RebuildError> {
    let records = match tokio::time::timeout(timeout, source.fetch_active()).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => return Err(RebuildError::DataSource(e)),
        Err(_) => return Err(RebuildError::DataSource(StorageError::Timeout(timeout))),
    };

    let (entries, stats) = corpus_from_records(&records, normalizer);
    info!(
        source = %source.describe(),
        received = stats.received,
        entries = entries.len(),
        skipped_malformed = stats.skipped_malformed,
        skipped_inactive = stats.skipped_inactive,
        "Built corpus"
    );
    Ok((entries, stats))
}

/// Validate raw records and normalize the survivors.
pub fn corpus_from_records(
    records: &[Value],
    normalizer: &TextNormalizer,
) -> (Vec<CorpusEntry>, CorpusStats) {
    let mut stats = CorpusStats {
        received: records.len(),
        ..Default::default()
    };
    let mut entries = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        let item = match Item::from_record(record) {
            Ok(item) => item,
            Err(e) => {
                warn!(position, error = %e, "Skipping malformed item record");
                stats.skipped_malformed += 1;
                continue;
            }
        };

        if !item.status.is_active() {
            debug!(item_id = %item.id, status = ?item.status, "Skipping inactive item");
            stats.skipped_inactive += 1;
            continue;
        }

        entries.push(corpus_entry(&item, normalizer));
    }

    (entries, stats)
}

/// Build the corpus entry for one active item.
pub fn corpus_entry(item: &Item, normalizer: &TextNormalizer) -> CorpusEntry {
    let combined_text = item.combined_text();
    let normalized_text = normalizer.normalize(&combined_text);
    CorpusEntry {
        item_id: item.id.clone(),
        combined_text,
        normalized_text,
    }
}
