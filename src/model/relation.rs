//! Relation triples and their conversion from raw remote records

use super::linking::KbId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Binding name of the relation source in a raw record
pub const SOURCE_FIELD: &str = "person";
/// Binding name of the relation name in a raw record
pub const NAME_FIELD: &str = "wdLabel";
/// Binding name of the relation target in a raw record
pub const TARGET_FIELD: &str = "ps_Label";

/// An immutable fact: `source` has relation `name` with value `target`.
///
/// Equality covers all three fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source: KbId,
    pub name: String,
    pub target: String,
}

impl Relation {
    pub fn new(source: impl Into<KbId>, name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            target: target.into(),
        }
    }
}

/// One result row from the remote source: binding name → value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    bindings: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.bindings.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.bindings.get(key).map(String::as_str)
    }

    /// Build a record with the standard source/name/target bindings.
    pub fn triple(source: &str, name: &str, target: &str) -> Self {
        Self::new()
            .with(SOURCE_FIELD, source)
            .with(NAME_FIELD, name)
            .with(TARGET_FIELD, target)
    }
}

impl FromIterator<(String, String)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// A raw record that cannot be turned into a [`Relation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecordError {
    #[error("record is missing field '{0}'")]
    MissingField(&'static str),
    #[error("record source '{0}' does not contain a knowledge-base id")]
    InvalidSource(String),
}

impl TryFrom<&RawRecord> for Relation {
    type Error = MalformedRecordError;

    fn try_from(record: &RawRecord) -> Result<Self, Self::Error> {
        let field = |key: &'static str| {
            record
                .get(key)
                .ok_or(MalformedRecordError::MissingField(key))
        };

        let raw_source = field(SOURCE_FIELD)?;
        let source = KbId::from_uri(raw_source)
            .ok_or_else(|| MalformedRecordError::InvalidSource(raw_source.to_string()))?;

        Ok(Relation {
            source,
            name: field(NAME_FIELD)?.to_string(),
            target: field(TARGET_FIELD)?.to_string(),
        })
    }
}
