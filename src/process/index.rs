//! Handle-ordered index over the process records of one snapshot.

use std::cmp::Ordering;
use std::ops::Range;

use tracing::debug;

use crate::error::Result;
use crate::process::record::ProcessRecord;
use crate::snapshot::{read_processes, Snapshot};

/// Three-way compare on module handle.
pub fn compare_by_handle(a: &ProcessRecord, b: &ProcessRecord) -> Ordering {
    a.module_handle().cmp(&b.module_handle())
}

/// Owns the process records and keeps them sorted by module handle until the
/// report sorter takes them over.
#[derive(Debug, Default)]
pub struct ProcessIndex {
    records: Vec<ProcessRecord>,
}

impl ProcessIndex {
    /// Sorts `records` by module handle.
    pub fn new(mut records: Vec<ProcessRecord>) -> Self {
        records.sort_unstable_by(compare_by_handle);
        Self { records }
    }

    /// Reads the process region of `snapshot` and indexes it.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let index = Self::new(read_processes(snapshot)?);
        debug!("Indexed {} processes by module handle", index.len());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// Positions of every record whose handle equals `handle`.
    pub fn handle_range(&self, handle: u16) -> Range<usize> {
        let start = self
            .records
            .partition_point(|r| r.module_handle() < handle);
        let end = start
            + self.records[start..].partition_point(|r| r.module_handle() == handle);
        start..end
    }

    /// Records whose handle equals `handle`, in index order.
    pub fn lookup(&self, handle: u16) -> &[ProcessRecord] {
        &self.records[self.handle_range(handle)]
    }

    pub(crate) fn lookup_mut(&mut self, handle: u16) -> &mut [ProcessRecord] {
        let range = self.handle_range(handle);
        &mut self.records[range]
    }

    /// Gives up the records, ending handle-ordered lookup.
    pub fn into_records(self) -> Vec<ProcessRecord> {
        self.records
    }
}
