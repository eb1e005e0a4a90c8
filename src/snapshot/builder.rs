//! Encoder producing snapshot buffers in the layout the readers walk.

use crate::error::{ProcsError, Result};
use crate::snapshot::layout::{
    process_record_size, ERROR_BUFFER_OVERFLOW, ERROR_INVALID_PARAMETER, MODULE_HEADER_SIZE,
    PROCESS_END_INDICATOR, PROCESS_HEADER_SIZE, RECORD_TYPE_PROCESS, SNAPSHOT_HEADER_SIZE,
    THREAD_DESCRIPTOR_SIZE,
};
use crate::snapshot::Snapshot;

/// Thread descriptor carried in a process record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadInfo {
    pub tid: u32,
    pub priority: u32,
    pub state: u32,
}

/// Process record to encode.
#[derive(Debug, Clone, Default)]
pub struct ProcessInfo {
    pub pid: u32,
    pub parent_pid: u32,
    pub session_id: u32,
    pub module_handle: u16,
    pub status: u32,
    pub threads: Vec<ThreadInfo>,
}

impl ProcessInfo {
    pub fn new(pid: u32, module_handle: u16) -> Self {
        Self {
            pid,
            module_handle,
            ..Self::default()
        }
    }

    /// Adds `count` placeholder threads numbered after the pid.
    pub fn with_threads(mut self, count: u16) -> Self {
        self.threads = (0..u32::from(count))
            .map(|i| ThreadInfo {
                tid: self.pid.wrapping_add(i),
                ..ThreadInfo::default()
            })
            .collect();
        self
    }
}

/// Module list entry to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub handle: u16,
    pub module_type: u16,
    pub name: String,
}

/// Collects processes and modules, then lays them out as one buffer.
///
/// Processes are written in insertion order followed by the end sentinel;
/// modules are chained in insertion order after the process region.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    processes: Vec<ProcessInfo>,
    modules: Vec<ModuleInfo>,
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

fn invalid(detail: String) -> ProcsError {
    ProcsError::SnapshotUnavailable {
        code: ERROR_INVALID_PARAMETER,
        detail,
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, process: ProcessInfo) -> &mut Self {
        self.processes.push(process);
        self
    }

    pub fn module(&mut self, handle: u16, name: impl Into<String>) -> &mut Self {
        self.modules.push(ModuleInfo {
            handle,
            module_type: 0,
            name: name.into(),
        });
        self
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Size of the buffer `build` would produce.
    pub fn encoded_len(&self) -> usize {
        let processes: usize = self
            .processes
            .iter()
            .map(|p| PROCESS_HEADER_SIZE + p.threads.len() * THREAD_DESCRIPTOR_SIZE)
            .sum();
        let modules: usize = self
            .modules
            .iter()
            .map(|m| align4(MODULE_HEADER_SIZE + m.name.len()))
            .sum();
        SNAPSHOT_HEADER_SIZE + processes + PROCESS_HEADER_SIZE + modules
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let len = self.encoded_len();
        if u32::try_from(len).is_err() {
            return Err(invalid(format!("snapshot of {len} bytes exceeds 32-bit offsets")));
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(len)?;
        buf.resize(SNAPSHOT_HEADER_SIZE, 0);

        for p in &self.processes {
            let thread_count = u16::try_from(p.threads.len()).map_err(|_| {
                invalid(format!("pid {} has {} threads", p.pid, p.threads.len()))
            })?;
            let start = buf.len();
            put_u32(&mut buf, RECORD_TYPE_PROCESS);
            put_u32(&mut buf, p.pid);
            put_u32(&mut buf, p.parent_pid);
            put_u32(&mut buf, p.session_id);
            put_u16(&mut buf, p.module_handle);
            put_u16(&mut buf, thread_count);
            put_u32(&mut buf, p.status);
            for t in &p.threads {
                put_u32(&mut buf, t.tid);
                put_u32(&mut buf, t.priority);
                put_u32(&mut buf, t.state);
                put_u32(&mut buf, 0);
            }
            debug_assert_eq!(buf.len() - start, process_record_size(thread_count));
        }

        // End sentinel occupies a full header so fixed-size reads stay in bounds.
        put_u32(&mut buf, PROCESS_END_INDICATOR);
        buf.resize(buf.len() + PROCESS_HEADER_SIZE - 4, 0);

        let module_head = if self.modules.is_empty() { 0 } else { buf.len() };
        for (i, m) in self.modules.iter().enumerate() {
            let name_len = u16::try_from(m.name.len()).map_err(|_| {
                invalid(format!("module {} name is {} bytes", m.handle, m.name.len()))
            })?;
            let entry_len = align4(MODULE_HEADER_SIZE + m.name.len());
            let next = if i + 1 < self.modules.len() {
                buf.len() + entry_len
            } else {
                0
            };
            let start = buf.len();
            put_u32(&mut buf, next as u32);
            put_u16(&mut buf, m.handle);
            put_u16(&mut buf, m.module_type);
            put_u16(&mut buf, name_len);
            put_u16(&mut buf, 0);
            buf.extend_from_slice(m.name.as_bytes());
            buf.resize(start + entry_len, 0);
        }

        let total = buf.len() as u32;
        buf[0..4].copy_from_slice(&(SNAPSHOT_HEADER_SIZE as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&(module_head as u32).to_le_bytes());
        buf[8..12].copy_from_slice(&total.to_le_bytes());
        Ok(buf)
    }

    /// Encodes, failing like the system call does when the bound is too small.
    pub fn build_bounded(&self, max_bytes: usize) -> Result<Vec<u8>> {
        let len = self.encoded_len();
        if len > max_bytes {
            return Err(ProcsError::SnapshotUnavailable {
                code: ERROR_BUFFER_OVERFLOW,
                detail: format!("snapshot needs {len} bytes, buffer holds {max_bytes}"),
            });
        }
        self.build()
    }

    pub fn build_snapshot(&self) -> Result<Snapshot> {
        self.build().map(Snapshot::from_bytes)
    }
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}
