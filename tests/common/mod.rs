//! Shared helpers for enrichment scenario tests

#![allow(dead_code)]

use cluster_annotator::source::MOCK_ENTITY_PREFIX;
use cluster_annotator::{Cluster, EnrichConfig, EntityLinkings, RawRecord};
use std::path::Path;

/// Configuration with the given initial chunk size and caching disabled.
pub fn config(chunk_size: usize) -> EnrichConfig {
    let mut config = EnrichConfig::default();
    config.batching.initial_chunk_size = chunk_size;
    config.cache.enabled = false;
    config
}

/// Same as [`config`] but caching into `path`.
pub fn cached_config(chunk_size: usize, path: &Path) -> EnrichConfig {
    let mut config = config(chunk_size);
    config.cache.enabled = true;
    config.cache.path = Some(path.to_path_buf());
    config
}

/// Linkings `<prefix><i> -> Q<offset + i>` for `i` in `0..count`.
pub fn linkings(prefix: &str, offset: usize, count: usize) -> EntityLinkings {
    (0..count)
        .map(|i| (format!("{}{}", prefix, i), format!("Q{}", offset + i)))
        .collect()
}

/// Cluster of `<prefix>0 .. <prefix><count-1>`.
pub fn cluster(id: u64, prefix: &str, count: usize) -> Cluster {
    Cluster::with_entities(id, (0..count).map(|i| format!("{}{}", prefix, i)))
}

/// Remote record as the SPARQL endpoint would return it.
pub fn record(id: &str, name: &str, target: &str) -> RawRecord {
    RawRecord::triple(&format!("{}{}", MOCK_ENTITY_PREFIX, id), name, target)
}
