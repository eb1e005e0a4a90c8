//! System status snapshots: the binary layout, the record readers, and the
//! sources that acquire a snapshot buffer.
//!
//! This module provides:
//! - `layout`: header and record layout constants plus bounds-checked field reads
//! - `reader`: process-record walk and module-list iteration over a buffer
//! - `builder`: encoder producing buffers in the same layout
//! - `procfs`: snapshot source backed by the Linux /proc filesystem
//! - `file`: snapshot source replaying a captured buffer from disk

pub mod builder;
pub mod file;
pub mod layout;
pub mod procfs;
pub mod reader;

use crate::error::Result;

pub use builder::{ModuleInfo, ProcessInfo, SnapshotBuilder, ThreadInfo};
pub use file::{write_capture, FileSnapshotSource};
pub use layout::SnapshotHeader;
pub use procfs::ProcfsSnapshotSource;
pub use reader::{read_processes, ModuleEntries, ModuleEntry, ProcessRecords, RawProcess};

/// One point-in-time buffer of process and module state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    buf: Vec<u8>,
}

impl Snapshot {
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn header(&self) -> Result<SnapshotHeader> {
        SnapshotHeader::parse(&self.buf)
    }

    /// Walks the process region record by record.
    pub fn processes(&self) -> Result<ProcessRecords<'_>> {
        let header = self.header()?;
        Ok(ProcessRecords::new(&self.buf, header.process_offset))
    }

    /// Walks the module list from its head entry.
    pub fn modules(&self) -> Result<ModuleEntries<'_>> {
        let header = self.header()?;
        Ok(ModuleEntries::new(&self.buf, header.module_offset))
    }
}

/// Capability that produces a snapshot with one blocking call.
pub trait SnapshotSource {
    fn acquire(&self) -> Result<Snapshot>;
}

/// Snapshot source serving a buffer that is already in memory.
#[derive(Debug, Clone)]
pub struct StaticSnapshotSource {
    snapshot: Snapshot,
}

impl StaticSnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

impl SnapshotSource for StaticSnapshotSource {
    fn acquire(&self) -> Result<Snapshot> {
        Ok(self.snapshot.clone())
    }
}
