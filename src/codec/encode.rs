use super::{FILTER_SEPARATOR, NOT_PREFIX, URI_COMPONENT};
use crate::filter::{ALL_WIDGETS, FilterDefinition};
use crate::resolver::filters_affecting_widget;
use percent_encoding::utf8_percent_encode;

/// Serialize active filter values into one percent-encoded string.
///
/// With `widget` set only the filters affecting that widget are encoded;
/// `ignore_target_all` additionally drops filters targeting every widget.
pub fn serialize_filters(
    filters: &[FilterDefinition],
    widget: Option<&str>,
    ignore_target_all: bool,
) -> String {
    let selected: Vec<&FilterDefinition> = match widget {
        Some(widget) => filters_affecting_widget(filters, widget),
        None => filters.iter().collect(),
    };

    let tokens: Vec<String> = selected
        .into_iter()
        .filter(|f| !(ignore_target_all && f.target == ALL_WIDGETS))
        .filter_map(encode_filter)
        .collect();

    utf8_percent_encode(&tokens.join(FILTER_SEPARATOR), URI_COMPONENT).to_string()
}

/// Encode one filter as `property.value`, `None` when nothing is selected.
pub fn encode_filter(flt: &FilterDefinition) -> Option<String> {
    if let Some(interval) = flt.interval {
        let (Some(from), Some(to)) = (
            flt.values.get(interval.from_idx),
            flt.values.get(interval.to_idx),
        ) else {
            tracing::warn!(
                "Skipping interval filter '{}': {}:{} is outside {} values",
                flt.target_property,
                interval.from_idx,
                interval.to_idx,
                flt.values.len()
            );
            return None;
        };
        return Some(format!("{}.{}:{}", flt.target_property, from.path, to.path));
    }

    if flt.value.is_empty() {
        return None;
    }

    let prefix = if flt.is_exclude { NOT_PREFIX } else { "" };
    if !flt.value.contains('|') {
        return Some(format!("{}.{}{}", flt.target_property, prefix, flt.value));
    }

    Some(format!(
        "{}.{}{}",
        flt.target_property,
        prefix,
        brace_set(&flt.value)
    ))
}

/// Rewrite `&[a]|&[b]` as `{&[a],&[b]}`.
///
/// The brace opens at the first `&[` marker, or at the start when there is none.
fn brace_set(value: &str) -> String {
    let members = value.replace('|', ",");
    let open = members.find("&[").unwrap_or(0);
    format!("{}{{{}}}", &members[..open], &members[open..])
}
