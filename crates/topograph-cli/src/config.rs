//! CLI configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use topograph_core::{CatalogConfig, EngineConfig, EngineContext};

/// Default config file location
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topograph")
        .join("config.toml")
}

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("topograph")
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.engine.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Keys settable with `config set`
    pub fn keys() -> &'static [&'static str] {
        &[
            "data_dir",
            "engine.query_time_limit_secs",
            "engine.max_result_count",
            "engine.max_levels",
        ]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "data_dir" => self.data_dir.as_ref().map(|p| p.display().to_string()),
            "engine.query_time_limit_secs" => Some(self.engine.query_time_limit_secs.to_string()),
            "engine.max_result_count" => Some(self.engine.max_result_count.to_string()),
            "engine.max_levels" => Some(self.engine.max_levels.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "data_dir" => self.data_dir = Some(PathBuf::from(value)),
            "engine.query_time_limit_secs" => self.engine.query_time_limit_secs = value.parse()?,
            "engine.max_result_count" => self.engine.max_result_count = value.parse()?,
            "engine.max_levels" => self.engine.max_levels = value.parse()?,
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        self.engine.validate()?;
        Ok(())
    }

    /// The catalog and limits every query runs with
    pub fn engine_context(&self) -> anyhow::Result<EngineContext> {
        Ok(EngineContext::from_config(
            self.catalog.clone(),
            self.engine.clone(),
        )?)
    }
}
