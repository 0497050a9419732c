use crate::host::Environment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Dashboard id used when the dashboard file does not name one.
    pub dashboard: String,
    pub persistence: PersistenceRules,
    pub embedding: EmbeddingRules,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            dashboard: "default".to_string(),
            persistence: PersistenceRules::default(),
            embedding: EmbeddingRules::default(),
        }
    }
}

impl DashConfig {
    pub fn environment(&self) -> Environment {
        Environment {
            embedded: self.embedding.embedded,
            widget_index: self.embedding.widget_index.clone(),
            filters_param: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PersistenceRules {
    /// Save filter selections between runs
    pub save_filters: bool,
    /// JSON settings document; in-memory settings when unset
    pub settings_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmbeddingRules {
    pub embedded: bool,
    pub widget_index: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> Result<DashConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<DashConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<DashConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static DashConfig {
    static DEFAULT_CONFIG: LazyLock<DashConfig> = LazyLock::new(DashConfig::default);
    &DEFAULT_CONFIG
}
