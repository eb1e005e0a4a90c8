//! Process records and the passes that build, name and order them.
//!
//! This module provides:
//! - `record`: process records and owned names with their short-name offset
//! - `index`: handle-sorted index built from a snapshot
//! - `resolver`: module-list pass that attaches names to indexed records
//! - `sorter`: report comparators and orderings

pub mod index;
pub mod record;
pub mod resolver;
pub mod sorter;

// Re-export commonly used types
pub use index::{compare_by_handle, ProcessIndex};
pub use record::{ProcessName, ProcessRecord, PATH_SEPARATORS};
pub use resolver::{resolve_names, ResolveStats};
pub use sorter::{
    cmp_ignore_ascii_case, cmp_optional_names, compare_by_name_then_pid, compare_by_pid,
    sort_records, Comparator, SortOrder,
};
