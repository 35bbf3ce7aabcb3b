//! ClusterWorker: drains the queue, enriching one cluster at a time

use super::queue::WorkQueue;
use crate::metrics::RelationMetrics;
use crate::model::Cluster;
use crate::source::{BatchOutcome, RelationSource};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Consecutive empty or failed batches before a batch is abandoned
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// One of the engine's concurrent workers.
///
/// Claims clusters from the shared queue until it is drained. Within a
/// cluster, batches are processed strictly in entity order. A batch that
/// yields no relations is retried until `max_retries` consecutive misses,
/// then skipped, so every cluster finishes in a bounded number of rounds.
pub struct ClusterWorker {
    id: usize,
    queue: Arc<WorkQueue>,
    source: Arc<RelationSource>,
    max_retries: usize,
}

impl ClusterWorker {
    pub fn new(id: usize, queue: Arc<WorkQueue>, source: Arc<RelationSource>) -> Self {
        Self {
            id,
            queue,
            source,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Process clusters until the queue is empty; returns their metrics in
    /// the order they were finished.
    pub async fn run(self) -> Vec<RelationMetrics> {
        let mut finished = Vec::new();
        while let Some(cluster) = self.queue.try_take() {
            info!(worker = self.id, cluster = cluster.id, entities = cluster.len(), "Start analyzing cluster");
            let metrics = self.enrich_cluster(&cluster).await;
            info!(
                worker = self.id,
                cluster = cluster.id,
                relations = metrics.relation_count(),
                "Finished cluster"
            );
            finished.push(metrics);
        }
        debug!(worker = self.id, clusters = finished.len(), "Queue drained");
        finished
    }

    pub async fn enrich_cluster(&self, cluster: &Cluster) -> RelationMetrics {
        let mut metrics = RelationMetrics::new(cluster);
        let entities = &cluster.entities;
        let mut index = 0;
        let mut error_streak = 0;

        while index < entities.len() {
            let size = (entities.len() - index).min(self.source.chunk_size()).max(1);
            let batch = &entities[index..index + size];
            debug!(worker = self.id, cluster = cluster.id, from = index, to = index + size, "Getting relations for batch");

            match self.source.relations_for(batch).await {
                BatchOutcome::Relations(relations) => {
                    error_streak = 0;
                    index += size;
                    metrics.extend(&relations);
                }
                outcome => {
                    error_streak += 1;
                    if error_streak >= self.max_retries {
                        warn!(
                            worker = self.id,
                            cluster = cluster.id,
                            from = index,
                            to = index + size,
                            attempts = error_streak,
                            "Abandoning batch"
                        );
                        metrics.extend(outcome.relations());
                        error_streak = 0;
                        index += size;
                    }
                }
            }
        }

        metrics
    }
}
