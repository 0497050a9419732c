use super::{FILTERS_PARAM, UrlParameter};
use regex::Regex;
use std::sync::LazyLock;

static TRAILING_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]FILTERS=[^&#]*(#.*)?$").expect("valid trailing filters regex")
});
static INNER_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&])FILTERS=[^&]*&").expect("valid inner filters regex"));
static PARAM_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]FILTERS=([^&#]*)").expect("valid filters value regex"));

/// Remove the `FILTERS` query parameter from a URL.
pub fn remove_query_parameter(url: &str) -> String {
    let url = TRAILING_PARAM_RE.replace(url, "$1");
    INNER_PARAM_RE.replace(&url, "$1").into_owned()
}

/// Raw value of the `FILTERS` query parameter, if the URL carries one.
pub fn filters_param_from_url(url: &str) -> Option<String> {
    PARAM_VALUE_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Build a shareable URL carrying `encoded_filters` for every widget.
///
/// Any `FILTERS` parameter already in `url` is replaced. The query separator
/// is chosen from the routed part of the URL (after `#` when present).
pub fn share_url(url: &str, encoded_filters: &str) -> String {
    let mut url = remove_query_parameter(url);
    if encoded_filters.is_empty() {
        return url;
    }

    let routed = url.split_once('#').map(|(_, fragment)| fragment).unwrap_or(url.as_str());
    let separator = if routed.contains('?') { '&' } else { '?' };
    let param = UrlParameter::new("*", encoded_filters);

    url.push(separator);
    url.push_str(FILTERS_PARAM);
    url.push('=');
    url.push_str(&param.to_string());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_trailing_parameter() {
        assert_eq!(
            remove_query_parameter("http://h/#/d?x=1&FILTERS=TARGET:*;FILTER:a"),
            "http://h/#/d?x=1"
        );
        assert_eq!(
            remove_query_parameter("http://h/p?FILTERS=TARGET:*;FILTER:a#top"),
            "http://h/p#top"
        );
    }

    #[test]
    fn test_remove_inner_parameter() {
        assert_eq!(
            remove_query_parameter("http://h/p?FILTERS=TARGET:*;FILTER:a&x=1"),
            "http://h/p?x=1"
        );
    }

    #[test]
    fn test_share_url_separator() {
        assert_eq!(share_url("http://h/p", "a"), "http://h/p?FILTERS=TARGET:*;FILTER:a");
        assert_eq!(
            share_url("http://h/p?x=1", "a"),
            "http://h/p?x=1&FILTERS=TARGET:*;FILTER:a"
        );
        assert_eq!(
            share_url("http://h/?ns=1#/dash", "a"),
            "http://h/?ns=1#/dash?FILTERS=TARGET:*;FILTER:a"
        );
    }

    #[test]
    fn test_share_url_replaces_existing_parameter() {
        let url = share_url("http://h/#/d?x=1&FILTERS=TARGET:*;FILTER:old", "new");
        assert_eq!(url, "http://h/#/d?x=1&FILTERS=TARGET:*;FILTER:new");
        assert_eq!(url.matches("FILTERS=").count(), 1);
    }

    #[test]
    fn test_share_url_without_filters() {
        assert_eq!(
            share_url("http://h/p?FILTERS=TARGET:*;FILTER:old", ""),
            "http://h/p"
        );
    }

    #[test]
    fn test_filters_param_from_url() {
        assert_eq!(
            filters_param_from_url("http://h/#/d?x=1&FILTERS=TARGET:w1;FILTER:a&y=2").as_deref(),
            Some("TARGET:w1;FILTER:a")
        );
        assert_eq!(filters_param_from_url("http://h/p?x=1"), None);
    }
}
