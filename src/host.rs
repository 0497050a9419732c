//! The embedding host and other dashboard-level collaborators
//!
//! When a single widget is embedded in another page, filter changes are
//! posted to the parent as a [`HostMessage`]. Delivery is best effort.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host rejected filter message: {0}")]
    Rejected(String),
    #[error("Host callback failed: {0}")]
    Callback(String),
    #[error("Failed to encode host message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A widget of the current dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Widget {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Map::new(),
        }
    }
}

/// Message posted to the embedding parent after a filter is applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Index of the embedded widget as given in the URL
    pub index: Option<String>,
    pub widget: Option<Widget>,
    /// Same string as the URL `FILTERS` value
    pub filters: String,
}

impl HostMessage {
    pub fn filter(index: Option<String>, widget: Option<Widget>, filters: String) -> Self {
        Self {
            kind: "filter",
            index,
            widget,
            filters,
        }
    }
}

/// One-way channel to the embedding parent
pub trait HostNotifier {
    /// Post the message to the parent context.
    fn post_message(&mut self, message: &HostMessage) -> Result<(), HostError>;

    /// Invoke a host-provided filter callback, if one was detected.
    ///
    /// Returns `Ok(false)` when the host has no callback.
    fn notify_callback(&mut self, _message: &HostMessage) -> Result<bool, HostError> {
        Ok(false)
    }
}

/// Host that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl HostNotifier for NoHost {
    fn post_message(&mut self, message: &HostMessage) -> Result<(), HostError> {
        tracing::trace!("No host attached, dropping message for '{}'", message.filters);
        Ok(())
    }
}

/// Host that keeps every posted message.
///
/// Clones share the same message log, so a clone handed to a store can be
/// inspected from outside.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    messages: Rc<RefCell<Vec<HostMessage>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<HostMessage> {
        self.messages.borrow().clone()
    }
}

impl HostNotifier for RecordingHost {
    fn post_message(&mut self, message: &HostMessage) -> Result<(), HostError> {
        self.messages.borrow_mut().push(message.clone());
        Ok(())
    }
}

/// Where the dashboard is running
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// Running as a single widget embedded in another page
    pub embedded: bool,
    /// Value of the `widget` query parameter
    pub widget_index: Option<String>,
    /// Current value of the `FILTERS` query parameter
    pub filters_param: Option<String>,
}

impl Environment {
    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn embedded(widget_index: impl Into<String>) -> Self {
        Self {
            embedded: true,
            widget_index: Some(widget_index.into()),
            filters_param: None,
        }
    }

    pub fn with_filters_param(mut self, param: Option<impl Into<String>>) -> Self {
        self.filters_param = param.map(|p| p.into());
        self
    }
}

/// Lookup of the dashboard's widgets
pub trait WidgetRegistry {
    fn all_widgets(&self) -> Vec<Widget>;

    /// Widget at the given position, parsed from a query parameter.
    fn widget_at(&self, index: &str) -> Option<Widget> {
        let idx: usize = index.trim().parse().ok()?;
        self.all_widgets().into_iter().nth(idx)
    }
}

impl WidgetRegistry for Vec<Widget> {
    fn all_widgets(&self) -> Vec<Widget> {
        self.clone()
    }
}

/// Localized UI strings
pub trait Localizer {
    fn get(&self, key: &str) -> String;
}

/// Fixed string table, falling back to the key itself
#[derive(Debug, Clone, Default)]
pub struct StaticLocalizer {
    strings: HashMap<String, String>,
}

impl StaticLocalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.strings.insert(key.into(), text.into());
        self
    }
}

impl Localizer for StaticLocalizer {
    fn get(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
