use super::{FILTER_SEPARATOR, UrlParameter};
use crate::filter::{ALL_WIDGETS, FilterDefinition, Interval, strip_exclude_suffix};
use percent_encoding::percent_decode_str;

/// Exclude marker as it appears between a property and its value
const NOT_MARKER: &str = ".%NOT ";

/// Apply a `FILTERS` URL parameter to the filter collection.
///
/// Tokens naming a property that is not in the affected set are ignored.
/// Returns the number of filter assignments made.
pub fn apply_url_parameter(param: &str, filters: &mut [FilterDefinition]) -> usize {
    let parsed = UrlParameter::parse(param);
    let scope = parsed.target.as_deref();
    let mut assigned = 0;

    if parsed.filter.is_empty() {
        return 0;
    }

    for raw in parsed.filter.split(FILTER_SEPARATOR) {
        let token = percent_decode_str(raw).decode_utf8_lossy();
        let mut matched = false;

        for flt in filters.iter_mut().filter(|f| in_scope(f, scope)) {
            if apply_token(flt, &token) {
                matched = true;
                assigned += 1;
            }
        }

        if !matched {
            tracing::debug!("Ignoring URL filter token '{}': no matching filter", token);
        }
    }

    assigned
}

/// Whether a filter is affected by a URL parameter scoped to `scope`.
///
/// A parameter without a `TARGET` segment only reaches wildcard filters.
fn in_scope(flt: &FilterDefinition, scope: Option<&str>) -> bool {
    match scope {
        Some(ALL_WIDGETS) => true,
        Some(widget) => {
            flt.target_array().iter().any(|w| w == widget)
                || flt.target == widget
                || flt.target == ALL_WIDGETS
        }
        None => flt.target == ALL_WIDGETS,
    }
}

/// Try to assign one decoded token to a filter.
pub fn apply_token(flt: &mut FilterDefinition, token: &str) -> bool {
    let (token, excluded) = match token.find(NOT_MARKER) {
        Some(pos) => (
            format!("{}.{}", &token[..pos], &token[pos + NOT_MARKER.len()..]),
            true,
        ),
        None => (token.to_string(), false),
    };

    if let Some(open) = token.find('{') {
        let path = &token[..open];
        let path = path.strip_suffix('.').unwrap_or(path);
        if path != flt.target_property {
            return false;
        }
        let body = &token[open + 1..];
        let body = body.rfind('}').map(|close| &body[..close]).unwrap_or(body);
        let members: Vec<&str> = body.split(',').collect();

        flt.interval = None;
        flt.is_exclude = excluded;
        flt.value = members.join("|");
        flt.value_display = members
            .iter()
            .map(|m| m.replacen("&[", "", 1).replacen(']', "", 1))
            .collect::<Vec<_>>()
            .join(",");
        flt.sync_checked_from_value();
        return true;
    }

    let Some((path, rest)) = token.split_once(".&") else {
        return false;
    };
    if path != flt.target_property {
        return false;
    }
    let value = format!("&{rest}");

    for entry in &mut flt.values {
        entry.checked = false;
    }

    if let Some(interval) = parse_interval(flt, &value) {
        flt.interval = Some(interval);
        flt.value.clear();
        flt.is_exclude = false;
        flt.value_display = flt.interval_display().unwrap_or_default();
        return true;
    }

    // a trailing `.%NOT` negates the value just like the `%NOT ` prefix
    let (value, marked) = strip_exclude_suffix(&value);
    flt.interval = None;
    flt.is_exclude = excluded || marked;
    flt.value = value.to_string();
    flt.value_display = flt.resolve_display_text();
    true
}

/// Interpret `from:to` when both ends name candidate values.
fn parse_interval(flt: &FilterDefinition, value: &str) -> Option<Interval> {
    value.match_indices(':').find_map(|(pos, _)| {
        let from_idx = flt.position_of(&value[..pos])?;
        let to_idx = flt.position_of(&value[pos + 1..])?;
        Some(Interval { from_idx, to_idx })
    })
}
