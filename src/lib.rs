//! Cluster Annotator: enrich entity clusters with knowledge-base relations
//!
//! Takes clusters of embedding tags, links each tag to a knowledge-base id
//! and fetches the relations of those ids from a remote SPARQL endpoint.
//! The relations are aggregated per cluster into statistics describing
//! which relations and values the cluster's entities have in common.
//!
//! # Core Concepts
//!
//! - **Workers**: concurrent tasks draining a shared queue of clusters
//! - **Batches**: slices of a cluster fetched in one remote request, sized
//!   adaptively by the shared [`BatchController`]
//! - **Cache**: relations already fetched, persisted to an append-only log
//!   and loaded lazily on first use
//!
//! # Example
//!
//! ```
//! use cluster_annotator::{Cluster, EnrichmentEngine, EnrichConfig, EntityLinkings, MockFetcher};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut config = EnrichConfig::default();
//! config.cache.enabled = false;
//!
//! let linkings: EntityLinkings = [("ada", "Q7259")].into_iter().collect();
//! let fetcher = Arc::new(MockFetcher::new().with_relation("Q7259", "occupation", "mathematician"));
//! let engine = EnrichmentEngine::from_config(&config, linkings, fetcher);
//!
//! let metrics = engine.run(vec![Cluster::with_entities(1, ["ada"])], 2).await.unwrap();
//! assert_eq!(metrics[0].occurrence("occupation"), 1);
//! # });
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod input;
pub mod metrics;
mod model;
pub mod source;

pub use cache::{CacheError, CacheStore};
pub use config::{ConfigError, EnrichConfig};
pub use engine::{EngineError, EngineResult, EnrichmentEngine};
pub use input::{clusters_from_file, linkings_from_file, InputError};
pub use metrics::{write_reports, RelationMetrics};
pub use model::{
    Cluster, ClusterId, EmbeddingTag, EntityLinkings, KbId, MalformedRecordError, RawRecord,
    Relation,
};
pub use source::{
    BatchController, BatchOutcome, MockFetcher, RelationSource, RemoteError, RemoteFetcher,
    SparqlFetcher,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
