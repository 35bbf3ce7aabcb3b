//! Remote fetch collaborator: the contract remote relation sources implement

use crate::model::{KbId, RawRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Why a remote fetch produced no records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The endpoint did not answer in time (or asked us to back off).
    /// Drives the batch size down.
    #[error("remote request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RemoteError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Fetches raw relation records for a batch of knowledge-base ids.
///
/// Abstracts over transport (SPARQL over HTTP, mock) so the relation
/// source doesn't depend on how the knowledge base is reached. One call is
/// one remote request; implementations enforce their own timeout and
/// report it as [`RemoteError::Timeout`].
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Zero or more records for `ids`. Records may be malformed; the
    /// caller converts and filters them.
    async fn fetch(&self, ids: &[KbId]) -> Result<Vec<RawRecord>, RemoteError>;
}
