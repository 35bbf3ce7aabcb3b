//! Core data model: clusters, entity linkings and relation triples

mod cluster;
mod linking;
mod relation;

pub use cluster::{Cluster, ClusterId};
pub use linking::{EmbeddingTag, EntityLinkings, KbId};
pub use relation::{
    MalformedRecordError, RawRecord, Relation, NAME_FIELD, SOURCE_FIELD, TARGET_FIELD,
};
