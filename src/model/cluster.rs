//! Clusters of entities produced by upstream clustering

use super::linking::EmbeddingTag;
use serde::{Deserialize, Serialize};

/// Integer identifier of a cluster
pub type ClusterId = u64;

/// A group of related entities to be jointly annotated.
///
/// Immutable once handed to the engine; workers only read the entity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// Entity identifiers in the order they appeared in the input
    pub entities: Vec<EmbeddingTag>,
}

impl Cluster {
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            entities: Vec::new(),
        }
    }

    pub fn with_entities<I, T>(id: ClusterId, entities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<EmbeddingTag>,
    {
        Self {
            id,
            entities: entities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, tag: impl Into<EmbeddingTag>) {
        self.entities.push(tag.into());
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
