//! Rendering finished metrics as JSON and plain-text reports

use super::relation_metrics::{percentage, RelationMetrics};
use crate::config::ReportConfig;
use crate::model::ClusterId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name of the combined JSON report
pub const JSON_REPORT_FILE: &str = "enriched_clusters.json";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub id: ClusterId,
    pub entities: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueReport {
    pub name: String,
    pub absolute_occurrence: usize,
    /// Percentage of the entities exhibiting the parent relation
    pub relative_occurrence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationReport {
    pub name: String,
    pub absolute_occurrence: usize,
    /// Percentage of the cluster's entities
    pub relative_occurrence: f64,
    pub top_values: Vec<ValueReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub cluster: ClusterSummary,
    pub top_relations: Vec<RelationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub clusters: Vec<ClusterReport>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl RelationMetrics {
    pub fn report(&self, config: &ReportConfig) -> ClusterReport {
        let top_relations = self
            .top_relations(config.max_relations, config.min_relation_fraction)
            .into_iter()
            .map(|(name, occurrence)| {
                let top_values = self
                    .top_values(&name, config.max_values, config.min_value_fraction)
                    .into_iter()
                    .map(|(value, count)| ValueReport {
                        name: value,
                        absolute_occurrence: count,
                        relative_occurrence: round2(percentage(count, occurrence)),
                    })
                    .collect();
                RelationReport {
                    relative_occurrence: round2(self.percentage_of_entities(occurrence)),
                    name,
                    absolute_occurrence: occurrence,
                    top_values,
                }
            })
            .collect();

        ClusterReport {
            cluster: ClusterSummary {
                id: self.cluster_id(),
                entities: self.entity_count(),
            },
            top_relations,
        }
    }
}

/// Write `enriched_clusters.json` plus one `enriched_cluster_<id>.txt` per
/// cluster into `dir`. Returns the path of the JSON report.
pub fn write_reports(
    dir: &Path,
    metrics: &[RelationMetrics],
    config: &ReportConfig,
) -> Result<PathBuf, ReportError> {
    let document = ReportDocument {
        generated_at: Utc::now(),
        clusters: metrics.iter().map(|m| m.report(config)).collect(),
    };

    let json_path = dir.join(JSON_REPORT_FILE);
    fs::write(&json_path, serde_json::to_string_pretty(&document)?)?;

    for cluster_metrics in metrics {
        let text = format!(
            "== TOP RELATIONS FOR #{} ({} Entities) ==\n{}\n",
            cluster_metrics.cluster_id(),
            cluster_metrics.entity_count(),
            cluster_metrics.render(config)
        );
        let path = dir.join(format!("enriched_cluster_{}.txt", cluster_metrics.cluster_id()));
        fs::write(path, text)?;
    }

    info!(clusters = metrics.len(), path = %json_path.display(), "Wrote reports");
    Ok(json_path)
}
