use serde::{Deserialize, Serialize};

/// Reserved widget id standing for toolbar-level filters with no explicit source.
pub const EMPTY_WIDGET: &str = "emptyWidget";

/// Path token for the "current moment" member of time dimensions.
pub const NOW_PATH: &str = "&[now]";

/// Suffix appended to a single selected token when the selection is negated.
pub const EXCLUDE_SUFFIX: &str = ".%NOT";

/// Scope keyword matching every widget.
pub const ALL_WIDGETS: &str = "*";

/// Where a filter lives on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    /// Triggered by clicking a widget
    Click,
    /// Rendered on the dashboard toolbar
    Dashboard,
    /// Attached to a widget (any other value, usually empty)
    Other(String),
    #[default]
    Unset,
}

impl Location {
    pub fn as_str(&self) -> &str {
        match self {
            Location::Click => "click",
            Location::Dashboard => "dashboard",
            Location::Other(s) => s,
            Location::Unset => "",
        }
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        match s {
            "click" => Location::Click,
            "dashboard" => Location::Dashboard,
            "" => Location::Unset,
            other => Location::Other(other.to_string()),
        }
    }
}

impl Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Location::from(raw.as_str()))
    }
}

/// A candidate value of a filter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterValue {
    /// Display label
    pub name: String,
    /// Machine-readable token (e.g. `&[East]`)
    pub path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

impl FilterValue {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            checked: false,
            default: false,
        }
    }
}

/// Range selection between two entries of `values`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub from_idx: usize,
    pub to_idx: usize,
}

/// Tagged view of what a filter currently selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Empty,
    Single,
    Multi,
    Interval,
}

/// Raw filter configuration as it appears in a dashboard definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFilter {
    pub label: String,
    pub target_property: String,
    pub target: String,
    pub source: String,
    pub location: String,
    #[serde(rename = "type")]
    pub filter_type: String,
    pub info: String,
    pub value_list: Option<String>,
    pub display_list: Option<String>,
    pub values: Vec<FilterValue>,
    pub value: String,
    pub is_exclude: bool,
    pub is_interval: bool,
    pub from_idx: Option<usize>,
    pub to_idx: Option<usize>,
}

/// A compiled, query-ready filter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub label: String,
    pub target_property: String,
    pub target: String,
    pub source: String,
    pub location: Location,
    #[serde(rename = "type")]
    pub filter_type: String,
    pub info: String,
    pub values: Vec<FilterValue>,
    pub value: String,
    pub value_display: String,
    pub is_exclude: bool,
    pub default_exclude: bool,
    pub interval: Option<Interval>,
    pub additional_params: Vec<String>,
    pub(crate) target_array: Vec<String>,
    pub(crate) source_array: Vec<String>,
}

impl FilterDefinition {
    /// Widgets this filter constrains, including the sentinel widget.
    pub fn target_array(&self) -> &[String] {
        &self.target_array
    }

    /// Widgets this filter is displayed on.
    pub fn source_array(&self) -> &[String] {
        &self.source_array
    }

    pub fn is_interval(&self) -> bool {
        self.interval.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.filter_type == "hidden"
    }

    /// Whether the filter has a selection worth encoding or persisting.
    pub fn is_active(&self) -> bool {
        !self.value.is_empty() || self.is_interval()
    }

    pub fn mode(&self) -> SelectionMode {
        if self.is_interval() {
            SelectionMode::Interval
        } else if self.value.is_empty() {
            SelectionMode::Empty
        } else if self.value.contains('|') {
            SelectionMode::Multi
        } else {
            SelectionMode::Single
        }
    }

    /// Paths of the currently checked values, in collection order.
    pub fn checked_paths(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|v| v.checked)
            .map(|v| v.path.as_str())
            .collect()
    }

    /// Resolve the display text of a single selected value.
    ///
    /// A trailing exclude marker is stripped from `value` and recorded in
    /// `is_exclude` when a matching entry is found. An exclusion recorded by
    /// an earlier pass is kept, so resolving twice yields the same state.
    pub fn resolve_display_text(&mut self) -> String {
        if self.value.is_empty() {
            return String::new();
        }

        let (token, marked) = strip_exclude_suffix(&self.value);
        let token = token.to_string();
        let is_exclude = marked || self.is_exclude;
        self.value = token.clone();

        if let Some(entry) = self.values.iter_mut().find(|v| v.path == token) {
            entry.checked = true;
            entry.default = true;
            self.default_exclude = is_exclude;
            self.is_exclude = is_exclude;
            return entry.name.clone();
        }

        String::new()
    }

    /// Rebuild the `checked` flags from the `|`-separated `value`.
    pub fn sync_checked_from_value(&mut self) {
        let selected: Vec<&str> = self
            .value
            .split('|')
            .map(|el| strip_exclude_suffix(el).0)
            .filter(|el| !el.is_empty())
            .collect();
        for entry in &mut self.values {
            entry.checked = selected.contains(&entry.path.as_str());
        }
    }

    /// Read the selection back from the `checked` flags into `value`.
    pub fn sync_value_from_checked(&mut self) {
        let checked: Vec<&FilterValue> = self.values.iter().filter(|v| v.checked).collect();
        self.value_display = checked
            .iter()
            .map(|v| v.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.value = checked
            .iter()
            .map(|v| v.path.as_str())
            .collect::<Vec<_>>()
            .join("|");
    }

    /// Display text of an interval selection, `None` if an index is out of range.
    pub fn interval_display(&self) -> Option<String> {
        let interval = self.interval?;
        let from = self.values.get(interval.from_idx)?;
        let to = self.values.get(interval.to_idx)?;
        Some(format!("{}:{}", from.name, to.name))
    }

    /// Index of the value with the given path.
    pub fn position_of(&self, path: &str) -> Option<usize> {
        self.values.iter().position(|v| v.path == path)
    }
}

/// Split a trailing case-insensitive `.%NOT` marker off a token.
pub fn strip_exclude_suffix(token: &str) -> (&str, bool) {
    let n = EXCLUDE_SUFFIX.len();
    if token.len() >= n
        && token.is_char_boundary(token.len() - n)
        && token[token.len() - n..].eq_ignore_ascii_case(EXCLUDE_SUFFIX)
    {
        (&token[..token.len() - n], true)
    } else {
        (token, false)
    }
}
