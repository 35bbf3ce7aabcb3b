use super::{column, reader, InputResult};
use crate::model::EntityLinkings;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

const EMBEDDING_TAG_COLUMN: usize = 0;
const KNOWLEDGEBASE_ID_COLUMN: usize = 1;

/// Parse `embedding_tag,knowledgebase_id` rows. A later row for the same
/// tag replaces the earlier one.
pub fn parse_linkings<R: Read>(input: R) -> InputResult<EntityLinkings> {
    let mut linkings = EntityLinkings::new();
    for record in reader(input).records() {
        let record = record?;
        let tag = column(&record, EMBEDDING_TAG_COLUMN, "embedding_tag")?;
        let id = column(&record, KNOWLEDGEBASE_ID_COLUMN, "knowledgebase_id")?;
        linkings.add(tag, id);
    }
    Ok(linkings)
}

pub fn linkings_from_file(path: impl AsRef<Path>) -> InputResult<EntityLinkings> {
    let path = path.as_ref();
    let linkings = parse_linkings(BufReader::new(File::open(path)?))?;
    debug!(path = %path.display(), linkings = linkings.len(), "Loaded entity linkings");
    Ok(linkings)
}
