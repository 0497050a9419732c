use thiserror::Error;

/// Problems found while compiling a filter definition.
///
/// Compilation never fails on these; they are reported alongside the
/// compiled collection and the affected field is left empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileIssue {
    #[error(
        "Filter '{target_property}': valueList has {values} entries but displayList has {names}"
    )]
    ValueListMismatch {
        target_property: String,
        values: usize,
        names: usize,
    },

    #[error("Filter '{target_property}': interval {from_idx}:{to_idx} is outside {len} values")]
    IntervalOutOfRange {
        target_property: String,
        from_idx: usize,
        to_idx: usize,
        len: usize,
    },
}
