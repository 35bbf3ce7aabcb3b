//! Relation statistics per cluster and their reports

mod relation_metrics;
mod report;

pub use relation_metrics::{
    RelationMetrics, DEFAULT_MIN_RELATION_FRACTION, DEFAULT_MIN_VALUE_FRACTION,
};
pub use report::{
    write_reports, ClusterReport, ClusterSummary, RelationReport, ReportDocument, ReportError,
    ValueReport, JSON_REPORT_FILE,
};
