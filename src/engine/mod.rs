//! Concurrent enrichment engine
//!
//! A fixed pool of workers drains a pre-filled queue of clusters. Each
//! worker fetches relations batch by batch through the shared relation
//! source and folds them into per-cluster metrics.

#[allow(clippy::module_inception)]
mod engine;
mod queue;
mod worker;

pub use engine::EnrichmentEngine;
pub use queue::WorkQueue;
pub use worker::{ClusterWorker, DEFAULT_MAX_RETRIES};

use crate::cache::CacheError;
use thiserror::Error;

/// Conditions that abort an enrichment run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("worker failed: {0}")]
    Worker(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
