//! Per-dashboard settings storage
//!
//! Filter state is saved under the `_filters` key of the dashboard's widget
//! settings record. Other keys of the record belong to other features and are
//! preserved untouched.

use crate::filter::FilterDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write settings file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Persist filter selections between sessions
    pub is_save_filters: bool,
}

/// The minimal persisted shape of an active filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedFilter {
    pub target_property: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub is_exclude: bool,
    #[serde(default)]
    pub is_interval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_idx: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_idx: Option<usize>,
}

impl From<&FilterDefinition> for PersistedFilter {
    fn from(flt: &FilterDefinition) -> Self {
        Self {
            target_property: flt.target_property.clone(),
            value: flt.value.clone(),
            is_exclude: flt.is_exclude,
            is_interval: flt.is_interval(),
            from_idx: flt.interval.map(|i| i.from_idx),
            to_idx: flt.interval.map(|i| i.to_idx),
        }
    }
}

/// Widget settings record of one dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WidgetsSettings {
    #[serde(rename = "_filters", default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<PersistedFilter>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Key/value settings storage keyed by dashboard id
pub trait SettingsStore {
    fn app_settings(&self) -> AppSettings;

    fn widgets_settings(&self, dashboard: &str) -> WidgetsSettings;

    fn set_widgets_settings(
        &mut self,
        settings: WidgetsSettings,
        dashboard: &str,
    ) -> Result<(), SettingsError>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn app_settings(&self) -> AppSettings {
        (**self).app_settings()
    }

    fn widgets_settings(&self, dashboard: &str) -> WidgetsSettings {
        (**self).widgets_settings(dashboard)
    }

    fn set_widgets_settings(
        &mut self,
        settings: WidgetsSettings,
        dashboard: &str,
    ) -> Result<(), SettingsError> {
        (**self).set_widgets_settings(settings, dashboard)
    }
}

/// Settings kept in memory for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    app: AppSettings,
    dashboards: HashMap<String, WidgetsSettings>,
}

impl MemorySettings {
    pub fn new(app: AppSettings) -> Self {
        Self {
            app,
            dashboards: HashMap::new(),
        }
    }

    /// Settings that persist filters
    pub fn saving_filters() -> Self {
        Self::new(AppSettings {
            is_save_filters: true,
        })
    }
}

impl SettingsStore for MemorySettings {
    fn app_settings(&self) -> AppSettings {
        self.app.clone()
    }

    fn widgets_settings(&self, dashboard: &str) -> WidgetsSettings {
        self.dashboards.get(dashboard).cloned().unwrap_or_default()
    }

    fn set_widgets_settings(
        &mut self,
        settings: WidgetsSettings,
        dashboard: &str,
    ) -> Result<(), SettingsError> {
        self.dashboards.insert(dashboard.to_string(), settings);
        Ok(())
    }
}

/// On-disk layout of [`JsonFileSettings`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct SettingsDocument {
    app: AppSettings,
    dashboards: HashMap<String, WidgetsSettings>,
}

/// Settings stored as one JSON document on disk.
///
/// A missing file reads as empty settings; every write rewrites the file.
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
    document: SettingsDocument,
}

impl JsonFileSettings {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let path_display = path.display().to_string();

        let document = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
                path: path_display.clone(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: path_display,
                source,
            })?
        } else {
            SettingsDocument::default()
        };

        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_app_settings(&mut self, app: AppSettings) -> Result<(), SettingsError> {
        self.document.app = app;
        self.flush()
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let body = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, body).map_err(|source| SettingsError::Write {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl SettingsStore for JsonFileSettings {
    fn app_settings(&self) -> AppSettings {
        self.document.app.clone()
    }

    fn widgets_settings(&self, dashboard: &str) -> WidgetsSettings {
        self.document
            .dashboards
            .get(dashboard)
            .cloned()
            .unwrap_or_default()
    }

    fn set_widgets_settings(
        &mut self,
        settings: WidgetsSettings,
        dashboard: &str,
    ) -> Result<(), SettingsError> {
        self.document
            .dashboards
            .insert(dashboard.to_string(), settings);
        self.flush()
    }
}
