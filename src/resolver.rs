//! Which filters relate to which widget
//!
//! Three relations are kept apart:
//! - *affecting*: filters whose values a widget's query must honor
//! - *displayed*: filters whose chip renders on a widget
//! - *used*: filters a widget consumes when it issues a query

use crate::filter::{ALL_WIDGETS, EMPTY_WIDGET, FilterDefinition, Location};
use serde::Serialize;

/// Model projection of a filter displayed on a widget.
///
/// `idx` points back into the filter collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetModelFilter {
    pub idx: usize,
    pub label: String,
    pub text: String,
    pub info: String,
}

fn targets(flt: &FilterDefinition, widget: &str) -> bool {
    flt.target_array().iter().any(|w| w == widget)
}

fn sources(flt: &FilterDefinition, widget: &str) -> bool {
    flt.source_array().iter().any(|w| w == widget)
}

/// Filters that affect the given widget
pub fn filters_affecting_widget<'a>(
    filters: &'a [FilterDefinition],
    widget: &str,
) -> Vec<&'a FilterDefinition> {
    filters
        .iter()
        .filter(|f| f.target == ALL_WIDGETS || f.target == widget || targets(f, widget))
        .collect()
}

/// Filters rendered on the given widget.
///
/// For [`EMPTY_WIDGET`] these are the toolbar filters.
pub fn filters_displayed_on_widget(
    filters: &[FilterDefinition],
    widget: &str,
) -> Vec<WidgetModelFilter> {
    filters
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_hidden() && f.location != Location::Click)
        .filter(|(_, f)| {
            if widget == EMPTY_WIDGET && (f.source.is_empty() || f.location == Location::Dashboard)
            {
                return true;
            }
            if f.location == Location::Dashboard {
                return false;
            }
            f.source == ALL_WIDGETS || sources(f, widget)
        })
        .map(|(idx, f)| WidgetModelFilter {
            idx,
            label: f.label.clone(),
            text: f.value_display.clone(),
            info: f.info.clone(),
        })
        .collect()
}

/// Filters used by the given widget when it queries data
pub fn filters_used_by_widget<'a>(
    filters: &'a [FilterDefinition],
    widget: &str,
) -> Vec<&'a FilterDefinition> {
    filters
        .iter()
        .filter(|f| f.target == ALL_WIDGETS || f.target.is_empty() || targets(f, widget))
        .collect()
}

/// Target of the first click filter sourced on the given widget
pub fn click_target<'a>(filters: &'a [FilterDefinition], widget: &str) -> Option<&'a str> {
    filters
        .iter()
        .filter(|f| f.location == Location::Click)
        .find(|f| f.source.eq_ignore_ascii_case(widget) || f.source == ALL_WIDGETS)
        .map(|f| f.target.as_str())
}
