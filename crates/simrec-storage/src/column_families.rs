//! Column family definitions for the recommendation cache.
//!
//! - recommendations: `similar_items:<id>` -> comma-joined neighbor ids,
//!   overwritten wholesale every rebuild cycle

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family holding published neighbor lists
pub const CF_RECOMMENDATIONS: &str = "recommendations";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_RECOMMENDATIONS];

/// Small values, overwritten every cycle
fn recommendations_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![ColumnFamilyDescriptor::new(
        CF_RECOMMENDATIONS,
        recommendations_options(),
    )]
}
