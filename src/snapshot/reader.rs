//! Record readers over a snapshot buffer.
//!
//! Both regions are walked with an explicit offset cursor into an immutable
//! byte slice. Process records have no fixed stride: each record's size comes
//! from its own thread count. Module entries form a linked list through
//! absolute `next` offsets.

use std::borrow::Cow;

use tracing::debug;

use crate::error::{ProcsError, Result};
use crate::process::ProcessRecord;
use crate::snapshot::layout::{
    bytes_at, process_record_size, read_u16, read_u32, MODULE_HEADER_SIZE, MOD_HANDLE,
    MOD_NAME_LEN, MOD_NEXT, MOD_TYPE, PROCESS_END_INDICATOR, PROCESS_HEADER_SIZE, PROC_HMOD,
    PROC_PID, PROC_PPID, PROC_SESSION, PROC_STATUS, PROC_THREADS, PROC_TYPE,
    RECORD_TYPE_PROCESS,
};
use crate::snapshot::Snapshot;

/// Header fields of one process record as stored in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawProcess {
    pub offset: usize,
    pub pid: u32,
    pub parent_pid: u32,
    pub session_id: u32,
    pub module_handle: u16,
    pub thread_count: u16,
    pub status: u32,
}

impl RawProcess {
    /// Total size of this record including its thread descriptors.
    pub fn size(&self) -> usize {
        process_record_size(self.thread_count)
    }
}

/// Cursor over the process region, stopping at the end sentinel.
///
/// The walk is fused: after the sentinel or the first error it yields `None`.
pub struct ProcessRecords<'a> {
    buf: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> ProcessRecords<'a> {
    pub fn new(buf: &'a [u8], start: usize) -> Self {
        Self {
            buf,
            offset: start,
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<RawProcess>> {
        let at = self.offset;
        let record_type = read_u32(self.buf, at + PROC_TYPE)?;
        if record_type == PROCESS_END_INDICATOR {
            return Ok(None);
        }
        if record_type != RECORD_TYPE_PROCESS {
            return Err(ProcsError::malformed(
                at,
                format!("unknown process record type {record_type}"),
            ));
        }

        bytes_at(self.buf, at, PROCESS_HEADER_SIZE, "process record header")?;
        let raw = RawProcess {
            offset: at,
            pid: read_u32(self.buf, at + PROC_PID)?,
            parent_pid: read_u32(self.buf, at + PROC_PPID)?,
            session_id: read_u32(self.buf, at + PROC_SESSION)?,
            module_handle: read_u16(self.buf, at + PROC_HMOD)?,
            thread_count: read_u16(self.buf, at + PROC_THREADS)?,
            status: read_u32(self.buf, at + PROC_STATUS)?,
        };

        // The thread descriptors must fit before the next record can be located.
        bytes_at(self.buf, at, raw.size(), "process record with thread descriptors")?;
        self.offset = at + raw.size();
        Ok(Some(raw))
    }
}

impl Iterator for ProcessRecords<'_> {
    type Item = Result<RawProcess>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(raw)) => Some(Ok(raw)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Builds the flat process list from a snapshot.
///
/// The region is walked twice: once to count the records, then once more to
/// copy them into a vector reserved for exactly that count.
pub fn read_processes(snapshot: &Snapshot) -> Result<Vec<ProcessRecord>> {
    let count = snapshot
        .processes()?
        .try_fold(0usize, |n, raw| raw.map(|_| n + 1))?;

    let mut records = Vec::new();
    records.try_reserve_exact(count)?;

    for raw in snapshot.processes()? {
        let raw = raw?;
        records.push(ProcessRecord::new(raw.module_handle, raw.pid));
    }

    debug!("Read {} process records from snapshot", records.len());
    Ok(records)
}

/// One entry of the module list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry<'a> {
    pub offset: usize,
    pub handle: u16,
    pub module_type: u16,
    pub name: Cow<'a, str>,
}

/// Lazy walk over the module linked list.
///
/// Each step is bounded by the number of entries the buffer could possibly
/// hold, so a cyclic list is reported instead of looping forever.
pub struct ModuleEntries<'a> {
    buf: &'a [u8],
    next: Option<usize>,
    steps_left: usize,
}

impl<'a> ModuleEntries<'a> {
    pub fn new(buf: &'a [u8], head: Option<usize>) -> Self {
        Self {
            buf,
            next: head,
            steps_left: buf.len() / MODULE_HEADER_SIZE,
        }
    }

    fn read_entry(&self, at: usize) -> Result<(ModuleEntry<'a>, Option<usize>)> {
        bytes_at(self.buf, at, MODULE_HEADER_SIZE, "module entry header")?;
        let next = read_u32(self.buf, at + MOD_NEXT)? as usize;
        let handle = read_u16(self.buf, at + MOD_HANDLE)?;
        let module_type = read_u16(self.buf, at + MOD_TYPE)?;
        let name_len = usize::from(read_u16(self.buf, at + MOD_NAME_LEN)?);
        let name = bytes_at(self.buf, at + MODULE_HEADER_SIZE, name_len, "module name")?;

        let entry = ModuleEntry {
            offset: at,
            handle,
            module_type,
            name: String::from_utf8_lossy(name),
        };
        Ok((entry, (next != 0).then_some(next)))
    }
}

impl<'a> Iterator for ModuleEntries<'a> {
    type Item = Result<ModuleEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.next.take()?;
        if self.steps_left == 0 {
            return Some(Err(ProcsError::malformed(
                at,
                "module list does not terminate",
            )));
        }
        self.steps_left -= 1;

        match self.read_entry(at) {
            Ok((entry, next)) => {
                self.next = next;
                Some(Ok(entry))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
