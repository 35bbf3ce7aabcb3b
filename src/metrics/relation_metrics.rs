//! Per-cluster aggregation of observed relations

use crate::config::ReportConfig;
use crate::model::{Cluster, ClusterId, KbId, Relation};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Default share of cluster entities a relation must exceed to be "top"
pub const DEFAULT_MIN_RELATION_FRACTION: f64 = 0.3;
/// Default share of cluster entities a value must exceed to be "top"
pub const DEFAULT_MIN_VALUE_FRACTION: f64 = 0.1;

/// Statistics about which relations and values recur within one cluster.
///
/// A relation's occurrence is the number of *distinct sources* exhibiting
/// it, so an entity with five `occupation` facts counts once. Value counts
/// are raw: every observed `(name, target)` pair increments its counter.
///
/// Owned by a single worker while the cluster is processed, then handed
/// over read-only.
#[derive(Debug, Clone)]
pub struct RelationMetrics {
    cluster_id: ClusterId,
    entity_count: usize,
    participants: HashMap<String, HashSet<KbId>>,
    values: HashMap<String, HashMap<String, usize>>,
}

impl RelationMetrics {
    pub fn new(cluster: &Cluster) -> Self {
        Self::for_cluster(cluster.id, cluster.len())
    }

    pub fn for_cluster(cluster_id: ClusterId, entity_count: usize) -> Self {
        Self {
            cluster_id,
            entity_count,
            participants: HashMap::new(),
            values: HashMap::new(),
        }
    }

    pub fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Number of distinct relation names observed
    pub fn relation_count(&self) -> usize {
        self.participants.len()
    }

    pub fn add_relation(&mut self, relation: &Relation) {
        self.participants
            .entry(relation.name.clone())
            .or_default()
            .insert(relation.source.clone());
        *self
            .values
            .entry(relation.name.clone())
            .or_default()
            .entry(relation.target.clone())
            .or_insert(0) += 1;
    }

    pub fn extend<'a, I>(&mut self, relations: I)
    where
        I: IntoIterator<Item = &'a Relation>,
    {
        for relation in relations {
            self.add_relation(relation);
        }
    }

    /// Distinct sources that exhibited `name`
    pub fn occurrence(&self, name: &str) -> usize {
        self.participants.get(name).map_or(0, HashSet::len)
    }

    /// How often `target` was observed as the value of `name`
    pub fn value_count(&self, name: &str, target: &str) -> usize {
        self.values
            .get(name)
            .and_then(|counts| counts.get(target))
            .copied()
            .unwrap_or(0)
    }

    /// Relations whose occurrence exceeds `min_fraction` of the cluster's
    /// entities, most frequent first, at most `max_n`.
    pub fn top_relations(&self, max_n: usize, min_fraction: f64) -> Vec<(String, usize)> {
        let counts = self
            .participants
            .iter()
            .map(|(name, sources)| (name.as_str(), sources.len()));
        self.top_n(counts, max_n, min_fraction)
    }

    /// Values of `relation_name` whose frequency exceeds `min_fraction` of
    /// the cluster's entities, most frequent first, at most `max_n`.
    pub fn top_values(&self, relation_name: &str, max_n: usize, min_fraction: f64) -> Vec<(String, usize)> {
        match self.values.get(relation_name) {
            Some(counts) => {
                let counts = counts.iter().map(|(value, count)| (value.as_str(), *count));
                self.top_n(counts, max_n, min_fraction)
            }
            None => Vec::new(),
        }
    }

    fn top_n<'a>(
        &self,
        counts: impl Iterator<Item = (&'a str, usize)>,
        max_n: usize,
        min_fraction: f64,
    ) -> Vec<(String, usize)> {
        let threshold = self.entity_count as f64 * min_fraction;
        let mut top: Vec<(String, usize)> = counts
            .filter(|(_, count)| *count as f64 > threshold)
            .map(|(key, count)| (key.to_string(), count))
            .collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(max_n);
        top
    }

    /// Share of the cluster's entities, as a percentage
    pub(crate) fn percentage_of_entities(&self, count: usize) -> f64 {
        percentage(count, self.entity_count)
    }
}

pub(crate) fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

impl RelationMetrics {
    /// Plain-text listing of the top relations and their top values.
    pub fn render(&self, config: &ReportConfig) -> String {
        let mut lines = Vec::new();
        for (relation, count) in self.top_relations(config.max_relations, config.min_relation_fraction) {
            lines.push(format!("Relation: {} {:.2}%", relation, self.percentage_of_entities(count)));
            for (value, value_count) in self.top_values(&relation, config.max_values, config.min_value_fraction) {
                lines.push(format!(
                    "\t↳ {:5.2}% {}",
                    self.percentage_of_entities(value_count),
                    value
                ));
            }
        }
        lines.join("\n")
    }
}

impl fmt::Display for RelationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&ReportConfig::default()))
    }
}
