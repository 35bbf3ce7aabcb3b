use super::{column, reader, InputError, InputResult};
use crate::model::{Cluster, ClusterId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

const CLUSTER_ID_COLUMN: usize = 0;
const EMBEDDING_TAG_COLUMN: usize = 1;

/// Parse `cluster_id,embedding_tag` rows into clusters.
///
/// Rows sharing a cluster id are grouped, clusters appear in the order
/// their id was first seen and entities keep their row order.
pub fn parse_clusters<R: Read>(input: R) -> InputResult<Vec<Cluster>> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut positions: HashMap<ClusterId, usize> = HashMap::new();

    for record in reader(input).records() {
        let record = record?;
        let raw_id = column(&record, CLUSTER_ID_COLUMN, "cluster_id")?;
        let tag = column(&record, EMBEDDING_TAG_COLUMN, "embedding_tag")?;
        let id: ClusterId = raw_id.parse().map_err(|_| InputError::InvalidClusterId {
            line: record.position().map_or(0, |p| p.line()),
            value: raw_id.to_string(),
        })?;

        let position = *positions.entry(id).or_insert_with(|| {
            clusters.push(Cluster::new(id));
            clusters.len() - 1
        });
        clusters[position].push(tag);
    }

    Ok(clusters)
}

pub fn clusters_from_file(path: impl AsRef<Path>) -> InputResult<Vec<Cluster>> {
    let path = path.as_ref();
    let clusters = parse_clusters(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), clusters = clusters.len(), "Loaded clusters");
    Ok(clusters)
}
