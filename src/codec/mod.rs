//! URL encoding of filter state
//!
//! Active filters travel in the `FILTERS` query parameter:
//!
//! ```text
//! TARGET:<scope>;FILTER:<percent-encoded tokens>
//! ```
//!
//! The scope is `*` or a widget id. Tokens are joined with `~` and take one
//! of these forms:
//!
//! ```text
//! [Region].&[East]                single value
//! [Region].%NOT &[East]           excluded single value
//! [Region].{&[East],&[West]}      value set
//! [Year].&[2020]:&[2022]          interval between two candidate values
//! ```

mod decode;
mod encode;
mod share;

pub use decode::{apply_token, apply_url_parameter};
pub use encode::{encode_filter, serialize_filters};
pub use share::{filters_param_from_url, remove_query_parameter, share_url};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

/// Name of the query parameter carrying filter state
pub const FILTERS_PARAM: &str = "FILTERS";

/// Separator between encoded filter tokens
pub const FILTER_SEPARATOR: &str = "~";

/// Marker placed before the value of an excluded filter
pub const NOT_PREFIX: &str = "%NOT ";

/// Characters escaped the way `encodeURIComponent` escapes them
pub(crate) const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The `TARGET:<scope>;FILTER:<encoded>` value of the `FILTERS` parameter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UrlParameter {
    /// Widget id, `*`, or `None` when the segment is missing
    pub target: Option<String>,
    /// Encoded filter string, still percent-encoded
    pub filter: String,
}

impl UrlParameter {
    pub fn new(target: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            filter: filter.into(),
        }
    }

    /// Parse a parameter value; unknown segments are skipped.
    pub fn parse(param: &str) -> Self {
        let mut parsed = UrlParameter::default();
        for segment in param.split(';') {
            let Some((key, rest)) = segment.split_once(':') else {
                continue;
            };
            if key.eq_ignore_ascii_case("target") {
                let widget = rest.split(':').next().unwrap_or_default();
                parsed.target = Some(widget.to_string());
            } else if key.eq_ignore_ascii_case("filter") {
                parsed.filter = rest.to_string();
            }
        }
        parsed
    }
}

impl fmt::Display for UrlParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TARGET:{};FILTER:{}",
            self.target.as_deref().unwrap_or("*"),
            self.filter
        )
    }
}
