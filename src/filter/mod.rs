//! Filter definitions and their compilation
//!
//! A dashboard ships its filters as raw configuration ([`RawFilter`]). The
//! compiler turns each entry into a [`FilterDefinition`] with derived widget
//! scopes, candidate values and resolved display text.
//!
//! # Scope strings
//!
//! ```text
//! *            every widget
//! (empty)      no widget, the filter lives on the toolbar
//! w1,w2        comma-separated widget ids
//! ```
//!
//! Targets are the widgets a filter constrains; sources are the widgets that
//! display the filter. Every explicit target list also contains the
//! [`EMPTY_WIDGET`] sentinel.
//!
//! # Label annotations
//!
//! ```text
//! Year /* inverseOrder */          reverse the candidate values
//! Year // ignoreNow                drop the &[NOW] member
//! ```

pub mod annotation;
pub mod compiler;
pub mod entities;
pub mod error;

pub use annotation::{Annotation, Directive, parse_label};
pub use compiler::{CompiledFilters, compile_filter, compile_filters};
pub use entities::{
    ALL_WIDGETS, EMPTY_WIDGET, EXCLUDE_SUFFIX, FilterDefinition, FilterValue, Interval, Location,
    NOW_PATH, RawFilter, SelectionMode, strip_exclude_suffix,
};
pub use error::CompileIssue;
