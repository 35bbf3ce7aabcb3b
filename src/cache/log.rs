//! Append-only CSV log of discovered relations
//!
//! Format: a `source,name,target` header row followed by one relation per
//! row. Fields are quoted when needed (RFC 4180), so values containing
//! commas survive a round trip. Older unquoted logs read the same way as
//! long as their values contain no commas.

use super::CacheError;
use crate::model::{KbId, Relation};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const LOG_HEADER: [&str; 3] = ["source", "name", "target"];

#[derive(Debug, Serialize, Deserialize)]
struct LogRow {
    source: String,
    name: String,
    target: String,
}

impl From<LogRow> for Relation {
    fn from(row: LogRow) -> Self {
        Relation {
            source: KbId::new(row.source),
            name: row.name,
            target: row.target,
        }
    }
}

impl From<&Relation> for LogRow {
    fn from(relation: &Relation) -> Self {
        LogRow {
            source: relation.source.to_string(),
            name: relation.name.clone(),
            target: relation.target.clone(),
        }
    }
}

/// Handle on the persisted relation log.
#[derive(Debug, Clone)]
pub struct RelationLog {
    path: PathBuf,
}

impl RelationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every relation in the log.
    ///
    /// A missing file is an empty log. Rows that do not parse are skipped
    /// with a warning; blank lines are ignored.
    pub fn read_all(&self) -> Result<Vec<Relation>, CacheError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut relations = Vec::new();
        for (line, row) in reader.deserialize::<LogRow>().enumerate() {
            match row {
                Ok(row) => relations.push(row.into()),
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    warn!(path = %self.path.display(), row = line + 1, error = %e, "Skipping unreadable cache row");
                }
            }
        }
        Ok(relations)
    }

    /// Append relations, creating the file (with header) if absent.
    ///
    /// Returns only after the data has been handed to the OS and synced.
    pub fn append(&self, relations: &[Relation]) -> Result<(), CacheError> {
        if relations.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        if !needs_header && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(LOG_HEADER)?;
        }
        for relation in relations {
            writer.serialize(LogRow::from(relation))?;
        }
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = RelationLog::new(dir.path().join("absent.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = RelationLog::new(dir.path().join("log.csv"));

        log.append(&[Relation::new("Q1", "occupation", "writer")]).unwrap();
        log.append(&[Relation::new("Q2", "occupation", "poet")]).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "source,name,target\nQ1,occupation,writer\nQ2,occupation,poet\n");
    }

    #[test]
    fn values_with_commas_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = RelationLog::new(dir.path().join("log.csv"));
        let relation = Relation::new("Q1", "award received", "Prize, First Class");

        log.append(&[relation.clone()]).unwrap();
        assert_eq!(log.read_all().unwrap(), vec![relation]);
    }

    #[test]
    fn reads_legacy_log_with_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(&path, "source,name,target\nQ1,occupation,writer\n\nQ2,country,Germany").unwrap();

        let relations = RelationLog::new(&path).read_all().unwrap();
        assert_eq!(
            relations,
            vec![
                Relation::new("Q1", "occupation", "writer"),
                Relation::new("Q2", "country", "Germany"),
            ]
        );
    }

    #[test]
    fn append_after_unterminated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(&path, "source,name,target\nQ1,occupation,writer").unwrap();

        let log = RelationLog::new(&path);
        log.append(&[Relation::new("Q2", "country", "Germany")]).unwrap();

        assert_eq!(log.read_all().unwrap().len(), 2);
    }

    #[test]
    fn short_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "source,name,target\nQ1,occupation\nQ2,country,Germany\n").unwrap();

        let relations = RelationLog::new(&path).read_all().unwrap();
        assert_eq!(relations, vec![Relation::new("Q2", "country", "Germany")]);
    }

    #[test]
    fn append_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log = RelationLog::new(dir.path().join("nested/deeper/log.csv"));
        log.append(&[Relation::new("Q1", "occupation", "writer")]).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 1);
    }
}
