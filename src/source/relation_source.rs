//! RelationSource: cache-first relation lookup with adaptive remote batches

use super::batch::BatchController;
use super::remote::{RemoteError, RemoteFetcher};
use crate::cache::CacheStore;
use crate::model::{EmbeddingTag, EntityLinkings, KbId, Relation};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of asking for the relations of one batch of entities.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// At least one relation, from the cache and/or the remote source
    Relations(Vec<Relation>),
    /// Nothing failed, but no entity in the batch has known relations
    Empty,
    /// The remote request failed. `partial` holds what the cache served.
    Failed {
        partial: Vec<Relation>,
        error: RemoteError,
    },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Relations(_))
    }

    /// Relations carried by the outcome, if any
    pub fn relations(&self) -> &[Relation] {
        match self {
            Self::Relations(relations) => relations,
            Self::Failed { partial, .. } => partial,
            Self::Empty => &[],
        }
    }
}

/// Shared fetch front-end used by every worker.
///
/// Resolves embedding tags through the entity linkings, serves what it can
/// from the cache and sends the remaining ids to the remote fetcher as a
/// single request. Remote outcomes are fed back to the batch controller
/// using the size of the batch the caller asked for.
pub struct RelationSource {
    linkings: Arc<EntityLinkings>,
    fetcher: Arc<dyn RemoteFetcher>,
    controller: Arc<BatchController>,
    cache: Option<Arc<CacheStore>>,
}

impl RelationSource {
    pub fn new(
        linkings: Arc<EntityLinkings>,
        fetcher: Arc<dyn RemoteFetcher>,
        controller: Arc<BatchController>,
    ) -> Self {
        Self {
            linkings,
            fetcher,
            controller,
            cache: None,
        }
    }

    /// Serve and record relations through `cache`.
    pub fn with_cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<CacheStore>> {
        self.cache.as_ref()
    }

    pub fn controller(&self) -> &BatchController {
        &self.controller
    }

    /// Recommended number of entities for the next batch
    pub fn chunk_size(&self) -> usize {
        self.controller.current_chunk_size()
    }

    pub async fn relations_for(&self, tags: &[EmbeddingTag]) -> BatchOutcome {
        let started = Instant::now();
        let requested = tags.len();

        let mut seen = HashSet::new();
        let ids: Vec<KbId> = self
            .linkings
            .resolve(tags)
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let mut relations = Vec::new();
        let mut remote_ids = ids;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.hydrate_async().await {
                warn!(error = %e, "Cache hydration task failed");
            }
            let cached = cache.lookup(&remote_ids);
            for id in &remote_ids {
                if let Some(known) = cached.get(id) {
                    relations.extend(known.iter().cloned());
                }
            }
            remote_ids.retain(|id| !cached.contains_key(id));
        }
        let from_cache = relations.len();

        let outcome = if remote_ids.is_empty() {
            Ok(())
        } else {
            self.fetch_remote(&remote_ids, requested)
                .await
                .map(|fetched| relations.extend(fetched))
        };

        debug!(
            entities = requested,
            remote_ids = remote_ids.len(),
            from_cache,
            relations = relations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Retrieved relations for batch"
        );

        match outcome {
            Err(error) => BatchOutcome::Failed {
                partial: relations,
                error,
            },
            Ok(()) if relations.is_empty() => BatchOutcome::Empty,
            Ok(()) => BatchOutcome::Relations(relations),
        }
    }

    async fn fetch_remote(
        &self,
        ids: &[KbId],
        requested: usize,
    ) -> Result<Vec<Relation>, RemoteError> {
        let records = match self.fetcher.fetch(ids).await {
            Ok(records) => records,
            Err(error) => {
                if error.is_timeout() {
                    self.controller.report_timeout(requested);
                }
                warn!(ids = ids.len(), error = %error, "Remote fetch failed");
                return Err(error);
            }
        };

        let total = records.len();
        let relations: Vec<Relation> = records
            .iter()
            .filter_map(|record| match Relation::try_from(record) {
                Ok(relation) => Some(relation),
                Err(e) => {
                    debug!(error = %e, "Dropping malformed record");
                    None
                }
            })
            .collect();
        if relations.len() < total {
            warn!(dropped = total - relations.len(), total, "Dropped malformed records");
        }

        if !relations.is_empty() {
            self.controller.report_success(requested);
            if let Some(cache) = &self.cache {
                cache.insert(&relations);
                if let Err(e) = cache.flush_async().await {
                    warn!(error = %e, pending = cache.pending_len(), "Cache flush failed; will retry");
                }
            }
        }

        Ok(relations)
    }
}
