use super::annotation::{Directive, parse_label};
use super::entities::{
    ALL_WIDGETS, EMPTY_WIDGET, FilterDefinition, FilterValue, Interval, Location, NOW_PATH,
    RawFilter,
};
use super::error::CompileIssue;

/// Output of [`compile_filters`]
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    pub filters: Vec<FilterDefinition>,
    /// At least one filter lives on the toolbar rather than on a widget
    pub toolbar_filters_exist: bool,
    pub issues: Vec<CompileIssue>,
}

/// Compile raw dashboard filter configuration into query-ready filters.
pub fn compile_filters(raw: &[RawFilter]) -> CompiledFilters {
    let mut compiled = CompiledFilters::default();

    for entry in raw {
        let flt = compile_filter(entry, &mut compiled.issues);
        if flt.source.is_empty() || flt.location == Location::Dashboard {
            compiled.toolbar_filters_exist = true;
        }
        compiled.filters.push(flt);
    }

    for issue in &compiled.issues {
        tracing::warn!("{issue}");
    }

    compiled
}

/// Compile a single filter, pushing any problems onto `issues`.
pub fn compile_filter(raw: &RawFilter, issues: &mut Vec<CompileIssue>) -> FilterDefinition {
    let location = Location::from(raw.location.as_str());

    let mut values = match (&raw.value_list, &raw.display_list) {
        (Some(value_list), Some(display_list))
            if !value_list.is_empty() && !display_list.is_empty() =>
        {
            zip_value_list(&raw.target_property, value_list, display_list, issues)
        }
        _ => raw.values.clone(),
    };

    let target_array = if raw.target == ALL_WIDGETS || raw.target.is_empty() {
        Vec::new()
    } else {
        split_widgets(&raw.target)
            .chain(std::iter::once(EMPTY_WIDGET.to_string()))
            .collect()
    };

    let source_array = if raw.source == ALL_WIDGETS
        || raw.source.is_empty()
        || location == Location::Dashboard
    {
        Vec::new()
    } else {
        split_widgets(&raw.source).collect()
    };

    let annotation = parse_label(&raw.label);
    if annotation.has(&Directive::InverseOrder) {
        values.reverse();
    }
    if annotation.has(&Directive::IgnoreNow) {
        values.retain(|v| !v.path.eq_ignore_ascii_case(NOW_PATH));
    }

    let interval = compile_interval(raw, values.len(), issues);

    let mut flt = FilterDefinition {
        label: annotation.label,
        target_property: raw.target_property.clone(),
        target: raw.target.clone(),
        source: raw.source.clone(),
        location,
        filter_type: raw.filter_type.clone(),
        info: raw.info.clone(),
        values,
        value: raw.value.clone(),
        value_display: String::new(),
        is_exclude: raw.is_exclude,
        default_exclude: false,
        interval,
        additional_params: annotation.params,
        target_array,
        source_array,
    };

    flt.value_display = match flt.interval_display() {
        Some(text) => text,
        None => flt.resolve_display_text(),
    };
    flt
}

fn split_widgets(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',').map(str::to_string)
}

/// Pair the comma-separated value tokens with their display texts.
fn zip_value_list(
    target_property: &str,
    value_list: &str,
    display_list: &str,
    issues: &mut Vec<CompileIssue>,
) -> Vec<FilterValue> {
    let paths: Vec<&str> = value_list.split(',').collect();
    let names: Vec<&str> = display_list.split(',').collect();

    if paths.len() != names.len() {
        issues.push(CompileIssue::ValueListMismatch {
            target_property: target_property.to_string(),
            values: paths.len(),
            names: names.len(),
        });
        return Vec::new();
    }

    names
        .into_iter()
        .zip(paths)
        .map(|(name, path)| FilterValue::new(name, path))
        .collect()
}

fn compile_interval(
    raw: &RawFilter,
    len: usize,
    issues: &mut Vec<CompileIssue>,
) -> Option<Interval> {
    if !raw.is_interval {
        return None;
    }
    let (from_idx, to_idx) = (raw.from_idx?, raw.to_idx?);
    if from_idx >= len || to_idx >= len {
        issues.push(CompileIssue::IntervalOutOfRange {
            target_property: raw.target_property.clone(),
            from_idx,
            to_idx,
            len,
        });
        return None;
    }
    Some(Interval { from_idx, to_idx })
}
