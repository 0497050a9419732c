//! Dashboard definition files
//!
//! A dashboard file is JSON, either an object with a name and a filter list
//! or a bare filter list:
//!
//! ```text
//! { "name": "sales", "filters": [ { "targetProperty": "[Region]", ... } ] }
//! [ { "targetProperty": "[Region]", ... } ]
//! ```

use crate::filter::RawFilter;
use crate::host::Widget;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Failed to read dashboard file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse dashboard file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DashboardDefinition {
    pub name: Option<String>,
    pub filters: Vec<RawFilter>,
    pub widgets: Vec<Widget>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DashboardFile {
    Full(DashboardDefinition),
    Filters(Vec<RawFilter>),
}

pub fn parse_dashboard(raw: &str) -> Result<DashboardDefinition, serde_json::Error> {
    Ok(match serde_json::from_str::<DashboardFile>(raw)? {
        DashboardFile::Full(def) => def,
        DashboardFile::Filters(filters) => DashboardDefinition {
            filters,
            ..Default::default()
        },
    })
}

pub fn load_dashboard(path: impl AsRef<Path>) -> Result<DashboardDefinition, DashboardError> {
    let path = path.as_ref();
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| DashboardError::Read {
        path: path_display.clone(),
        source,
    })?;
    parse_dashboard(&raw).map_err(|source| DashboardError::Parse {
        path: path_display,
        source,
    })
}
