//! Persistent relation cache
//!
//! An in-memory map from knowledge-base id to known relations, hydrated
//! lazily from an append-only log and flushed back incrementally.

mod log;
mod store;

pub use log::{RelationLog, LOG_HEADER};
pub use store::CacheStore;

use thiserror::Error;

/// Errors reading or writing the persisted relation log
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type CacheResult<T> = Result<T, CacheError>;
