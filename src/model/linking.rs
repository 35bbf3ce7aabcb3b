//! Entity linkings: embedding tag → knowledge-base id

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque entity identifier produced by upstream clustering
pub type EmbeddingTag = String;

/// Canonical knowledge-base identifier (e.g. `Q42`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KbId(String);

impl KbId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract a trailing knowledge-base id from an entity URI.
    ///
    /// Accepts both bare ids (`Q42`) and URIs ending in one
    /// (`http://www.wikidata.org/entity/Q42`). Returns `None` when the last
    /// path segment is not `Q` followed by digits.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let segment = uri.rsplit('/').next()?;
        let digits = segment.strip_prefix('Q')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(segment.to_string()))
    }
}

impl fmt::Display for KbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KbId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for KbId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lookup from embedding tag to knowledge-base id.
///
/// Not every tag is linked. Unmapped tags are simply absent; callers filter
/// them out rather than treating them as errors.
#[derive(Debug, Clone, Default)]
pub struct EntityLinkings {
    mappings: HashMap<EmbeddingTag, KbId>,
}

impl EntityLinkings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a tag, replacing any earlier link for the same tag.
    pub fn add(&mut self, tag: impl Into<EmbeddingTag>, id: impl Into<KbId>) {
        self.mappings.insert(tag.into(), id.into());
    }

    pub fn get(&self, tag: &str) -> Option<&KbId> {
        self.mappings.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.mappings.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Resolve tags in order, silently dropping unmapped ones.
    pub fn resolve<'a, I>(&self, tags: I) -> Vec<KbId>
    where
        I: IntoIterator<Item = &'a EmbeddingTag>,
    {
        tags.into_iter()
            .filter_map(|tag| self.mappings.get(tag.as_str()).cloned())
            .collect()
    }
}

impl<T: Into<EmbeddingTag>, K: Into<KbId>> FromIterator<(T, K)> for EntityLinkings {
    fn from_iter<I: IntoIterator<Item = (T, K)>>(iter: I) -> Self {
        let mut linkings = Self::new();
        for (tag, id) in iter {
            linkings.add(tag, id);
        }
        linkings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_uri_accepts_bare_and_prefixed_ids() {
        assert_eq!(KbId::from_uri("Q42"), Some(KbId::new("Q42")));
        assert_eq!(
            KbId::from_uri("http://www.wikidata.org/entity/Q1339"),
            Some(KbId::new("Q1339"))
        );
    }

    #[test]
    fn from_uri_rejects_non_entity_uris() {
        assert_eq!(KbId::from_uri("http://www.wikidata.org/entity/P31"), None);
        assert_eq!(KbId::from_uri("http://example.org/Q"), None);
        assert_eq!(KbId::from_uri("Q12a"), None);
        assert_eq!(KbId::from_uri(""), None);
    }

    #[test]
    fn resolve_drops_unmapped_tags() {
        let linkings: EntityLinkings = [("e1", "Q1"), ("e2", "Q2")].into_iter().collect();
        let tags: Vec<EmbeddingTag> = vec!["e1".into(), "e3".into(), "e2".into()];

        let resolved = linkings.resolve(&tags);
        assert_eq!(resolved, vec![KbId::new("Q1"), KbId::new("Q2")]);
    }

    #[test]
    fn later_link_replaces_earlier() {
        let mut linkings = EntityLinkings::new();
        linkings.add("e1", "Q1");
        linkings.add("e1", "Q9");
        assert_eq!(linkings.len(), 1);
        assert_eq!(linkings.get("e1"), Some(&KbId::new("Q9")));
    }
}
