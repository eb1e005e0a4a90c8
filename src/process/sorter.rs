//! Report orderings for resolved process records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::process::record::ProcessRecord;

/// Signature shared by all record comparators.
pub type Comparator = fn(&ProcessRecord, &ProcessRecord) -> Ordering;

/// Report ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Short name (case-insensitive), then pid.
    #[default]
    Name,
    /// Pid only.
    Pid,
}

impl SortOrder {
    pub fn comparator(self) -> Comparator {
        match self {
            SortOrder::Name => compare_by_name_then_pid,
            SortOrder::Pid => compare_by_pid,
        }
    }
}

/// ASCII case-insensitive three-way compare, folding to lowercase.
pub fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Compares optional names; an absent name sorts before every present one.
pub fn cmp_optional_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp_ignore_ascii_case(a, b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare_by_pid(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    a.pid().cmp(&b.pid())
}

pub fn compare_by_name_then_pid(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    cmp_optional_names(a.short_name(), b.short_name()).then_with(|| compare_by_pid(a, b))
}

/// Reorders `records` for the report.
pub fn sort_records(records: &mut [ProcessRecord], order: SortOrder) {
    records.sort_unstable_by(order.comparator());
}
