//! Run configuration, loadable from YAML
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use crate::metrics::{DEFAULT_MIN_RELATION_FRACTION, DEFAULT_MIN_VALUE_FRACTION};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ENDPOINT_URL: &str = "https://query.wikidata.org/sparql";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Remote SPARQL endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    /// Requests the endpoint tolerates in flight; also the success streak
    /// the batch controller needs before growing the chunk size.
    pub concurrent_requests: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT_URL.to_string(),
            concurrent_requests: 5,
            timeout_secs: 60,
            user_agent: format!("cluster-annotator/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub initial_chunk_size: usize,
    /// Consecutive empty or failed batches before a batch is abandoned
    pub max_retries: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            initial_chunk_size: 500,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Persisted relation log; `None` uses the platform data directory
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl CacheConfig {
    /// Resolve the log path (~/.local/share/cluster-annotator/cached_relations.csv)
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
        data_dir.join("cluster-annotator").join("cached_relations.csv")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub max_relations: usize,
    pub max_values: usize,
    pub min_relation_fraction: f64,
    pub min_value_fraction: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_relations: 10,
            max_values: 5,
            min_relation_fraction: DEFAULT_MIN_RELATION_FRACTION,
            min_value_fraction: DEFAULT_MIN_VALUE_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub endpoint: EndpointConfig,
    pub batching: BatchingConfig,
    pub cache: CacheConfig,
    pub report: ReportConfig,
}

impl EnrichConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batching.initial_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "batching.initial_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.batching.max_retries == 0 {
            return Err(ConfigError::Invalid(
                "batching.max_retries must be at least 1".to_string(),
            ));
        }
        if self.endpoint.concurrent_requests == 0 {
            return Err(ConfigError::Invalid(
                "endpoint.concurrent_requests must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = EnrichConfig::from_yaml_str("").unwrap();
        assert_eq!(config.batching.initial_chunk_size, 500);
        assert_eq!(config.batching.max_retries, 3);
        assert_eq!(config.endpoint.url, DEFAULT_ENDPOINT_URL);
        assert!(config.cache.enabled);
    }

    #[test]
    fn partial_document_overrides_only_given_fields() {
        let yaml = r#"
endpoint:
  concurrent_requests: 2
cache:
  enabled: false
  path: /tmp/relations.csv
report:
  max_relations: 3
"#;
        let config = EnrichConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.endpoint.concurrent_requests, 2);
        assert_eq!(config.endpoint.timeout_secs, 60);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.resolved_path(), PathBuf::from("/tmp/relations.csv"));
        assert_eq!(config.report.max_relations, 3);
        assert_eq!(config.report.max_values, 5);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = EnrichConfig::from_yaml_str("batching:\n  initial_chunk_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = EnrichConfig::from_yaml_str("endpoint: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn default_cache_path_is_under_data_dir() {
        let path = CacheConfig::default().resolved_path();
        assert!(path.ends_with("cluster-annotator/cached_relations.csv"));
    }
}
