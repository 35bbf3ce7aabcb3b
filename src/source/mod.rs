//! Relation sources
//!
//! The relation source combines the shared cache, the adaptive batch
//! controller and a remote fetcher behind one "relations for this batch"
//! call that every worker uses.

mod batch;
mod mock;
mod relation_source;
mod remote;
pub mod sparql;

pub use batch::BatchController;
pub use mock::{MockFetcher, MOCK_ENTITY_PREFIX};
pub use relation_source::{BatchOutcome, RelationSource};
pub use remote::{RemoteError, RemoteFetcher};
pub use sparql::SparqlFetcher;
