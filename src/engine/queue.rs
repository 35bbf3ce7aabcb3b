//! Work queue of clusters awaiting enrichment

use crate::model::Cluster;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Pre-filled queue drained by workers.
///
/// The only consuming operation is [`WorkQueue::try_take`], which never
/// blocks: `None` means the queue is drained and the worker is done. Each
/// cluster is handed to exactly one caller.
#[derive(Debug, Default)]
pub struct WorkQueue {
    clusters: Mutex<VecDeque<Cluster>>,
}

impl WorkQueue {
    pub fn new(clusters: impl IntoIterator<Item = Cluster>) -> Self {
        Self {
            clusters: Mutex::new(clusters.into_iter().collect()),
        }
    }

    fn clusters(&self) -> MutexGuard<'_, VecDeque<Cluster>> {
        self.clusters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the next cluster, or `None` if none are left.
    pub fn try_take(&self) -> Option<Cluster> {
        self.clusters().pop_front()
    }

    pub fn len(&self) -> usize {
        self.clusters().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters().is_empty()
    }
}
