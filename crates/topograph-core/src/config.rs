//! Engine configuration and the shared query context

use crate::catalog::{Catalog, NodeTypeInfo};
use crate::error::{Error, Result};
use crate::limits::{
    self, DEFAULT_MAX_LEVELS, DEFAULT_MAX_RESULT_COUNT, DEFAULT_QUERY_TIME_LIMIT_SECS,
};
use crate::rules::EdgeRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Runtime limits applied to every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wall-clock budget for one query, in seconds
    #[serde(default = "default_time_limit")]
    pub query_time_limit_secs: u64,

    /// Maximum nodes in one query result
    #[serde(default = "default_max_result_count")]
    pub max_result_count: usize,

    /// Maximum recursion depth for compilation and traversal
    #[serde(default = "default_max_levels")]
    pub max_levels: u32,
}

fn default_time_limit() -> u64 {
    DEFAULT_QUERY_TIME_LIMIT_SECS
}

fn default_max_result_count() -> usize {
    DEFAULT_MAX_RESULT_COUNT
}

fn default_max_levels() -> u32 {
    DEFAULT_MAX_LEVELS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_time_limit_secs: default_time_limit(),
            max_result_count: default_max_result_count(),
            max_levels: default_max_levels(),
        }
    }
}

impl EngineConfig {
    pub fn with_time_limit(mut self, secs: u64) -> Self {
        self.query_time_limit_secs = secs;
        self
    }

    pub fn with_max_result_count(mut self, count: usize) -> Self {
        self.max_result_count = count;
        self
    }

    pub fn with_max_levels(mut self, levels: u32) -> Self {
        self.max_levels = levels;
        self
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.query_time_limit_secs)
    }

    pub fn validate(&self) -> Result<()> {
        limits::validate_time_limit(self.query_time_limit_secs)
            .and_then(|_| limits::validate_result_count(self.max_result_count))
            .and_then(|_| limits::validate_max_levels(self.max_levels))
            .map_err(|e| Error::Configuration(e.to_string()))
    }
}

/// Serializable source of a [`Catalog`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub edge_rules: Vec<EdgeRule>,

    #[serde(default)]
    pub node_types: BTreeMap<String, NodeTypeInfo>,
}

/// Everything a traversal needs besides the graph itself.
///
/// Built once, then shared read-only across queries.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    pub catalog: Catalog,
    pub config: EngineConfig,
}

impl EngineContext {
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn from_config(catalog: CatalogConfig, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(Catalog::from_config(catalog)?, config))
    }

    pub fn max_levels(&self) -> u32 {
        self.config.max_levels
    }

    pub fn max_result_count(&self) -> usize {
        self.config.max_result_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.query_time_limit_secs, 60);
        assert_eq!(config.max_result_count, 10_000);
        assert_eq!(config.max_levels, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_levels": 12}"#).unwrap();
        assert_eq!(config.max_levels, 12);
        assert_eq!(config.query_time_limit_secs, 60);
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let config = EngineConfig::default().with_max_levels(0);
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }
}
