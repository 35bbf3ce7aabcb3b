//! Readers for the cluster and entity linking input files
//!
//! Both files are comma separated with a header row, which is skipped.
//! Columns are addressed by position; blank lines are ignored.

mod clusters;
mod linkings;

pub use clusters::{clusters_from_file, parse_clusters};
pub use linkings::{linkings_from_file, parse_linkings};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: missing column '{column}'")]
    MissingColumn { line: u64, column: &'static str },

    #[error("line {line}: invalid cluster id '{value}'")]
    InvalidClusterId { line: u64, value: String },
}

pub type InputResult<T> = Result<T, InputError>;

pub(crate) fn reader<R: std::io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

pub(crate) fn column<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    column: &'static str,
) -> InputResult<&'r str> {
    record.get(index).ok_or_else(|| InputError::MissingColumn {
        line: record.position().map_or(0, |p| p.line()),
        column,
    })
}
