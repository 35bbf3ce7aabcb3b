//! EnrichmentEngine: runs the worker pool over all clusters

use super::queue::WorkQueue;
use super::worker::{ClusterWorker, DEFAULT_MAX_RETRIES};
use super::{EngineError, EngineResult};
use crate::cache::CacheStore;
use crate::config::EnrichConfig;
use crate::metrics::RelationMetrics;
use crate::model::{Cluster, EntityLinkings};
use crate::source::{BatchController, RelationSource, RemoteFetcher};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Owns the shared relation source and drives a pool of cluster workers.
///
/// All workers share one relation source, and with it one cache and one
/// batch controller.
pub struct EnrichmentEngine {
    source: Arc<RelationSource>,
    max_retries: usize,
}

impl EnrichmentEngine {
    pub fn new(source: Arc<RelationSource>) -> Self {
        Self {
            source,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Wire up controller and cache from `config` around `fetcher`.
    pub fn from_config(
        config: &EnrichConfig,
        linkings: EntityLinkings,
        fetcher: Arc<dyn RemoteFetcher>,
    ) -> Self {
        let controller = Arc::new(BatchController::new(
            config.batching.initial_chunk_size,
            config.endpoint.concurrent_requests,
        ));
        let mut source = RelationSource::new(Arc::new(linkings), fetcher, controller);
        if config.cache.enabled {
            source = source.with_cache(Arc::new(CacheStore::open(config.cache.resolved_path())));
        }
        Self::new(Arc::new(source)).with_max_retries(config.batching.max_retries)
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn source(&self) -> &Arc<RelationSource> {
        &self.source
    }

    /// Enrich every cluster using `worker_count` concurrent workers.
    ///
    /// Returns one metrics entry per cluster, in the order workers finished
    /// them. The cache is flushed once all workers are done; a flush failure
    /// aborts the run.
    pub async fn run(
        &self,
        clusters: Vec<Cluster>,
        worker_count: usize,
    ) -> EngineResult<Vec<RelationMetrics>> {
        let started = Instant::now();
        let cluster_count = clusters.len();
        // Filled before any worker starts: an empty queue means "done"
        let queue = Arc::new(WorkQueue::new(clusters));
        let worker_count = worker_count.max(1);

        info!(clusters = cluster_count, workers = worker_count, "Starting enrichment");

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = ClusterWorker::new(id, Arc::clone(&queue), Arc::clone(&self.source))
                .with_max_retries(self.max_retries);
            workers.spawn(worker.run());
        }

        let mut results = Vec::with_capacity(cluster_count);
        let mut failure = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(finished) => results.extend(finished),
                Err(e) => {
                    error!(error = %e, "Worker failed");
                    failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if let Some(cache) = self.source.cache() {
            let written = cache.flush_async().await?;
            info!(relations = written, "Final cache flush");
        }

        if let Some(reason) = failure {
            return Err(EngineError::Worker(reason));
        }

        info!(
            clusters = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enrichment finished"
        );
        Ok(results)
    }
}
