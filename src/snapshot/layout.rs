//! Binary layout of a system status snapshot.
//!
//! All integers are little-endian. A snapshot starts with a fixed header that
//! locates two regions:
//!
//! - the process region: variable-length process records (a fixed header
//!   followed by `thread_count` thread descriptors), terminated by a record
//!   whose type field holds [`PROCESS_END_INDICATOR`];
//! - the module region: a singly-linked list of module entries (a fixed header
//!   followed by the module name), terminated by a zero `next_offset`.
//!
//! ```text
//! header   u32 process_offset | u32 module_offset | u32 total_length | u32 reserved
//! process  u32 type | u32 pid | u32 ppid | u32 session | u16 hmod | u16 threads | u32 status
//! thread   u32 tid | u32 priority | u32 state | u32 reserved
//! module   u32 next | u16 hmod | u16 type | u16 name_len | u16 reserved | name bytes
//! ```

use crate::error::{ProcsError, Result};

pub const SNAPSHOT_HEADER_SIZE: usize = 16;
pub const PROCESS_HEADER_SIZE: usize = 24;
pub const THREAD_DESCRIPTOR_SIZE: usize = 16;
pub const MODULE_HEADER_SIZE: usize = 12;

/// Record type of a live process record.
pub const RECORD_TYPE_PROCESS: u32 = 1;
/// Record type marking the end of the process region.
pub const PROCESS_END_INDICATOR: u32 = 3;

/// Buffer bound of the classic status query.
pub const HISTORICAL_BUFFER_BYTES: usize = 0xFFFF;
pub const DEFAULT_BUFFER_KB: usize = 256;
pub const MAX_BUFFER_KB: usize = 16 * 1024;

/// Status code reported when a snapshot does not fit the buffer bound.
pub const ERROR_BUFFER_OVERFLOW: i32 = 111;
/// Status code reported when a snapshot cannot be encoded at all.
pub const ERROR_INVALID_PARAMETER: i32 = 87;

// Field offsets inside a process record header.
pub(crate) const PROC_TYPE: usize = 0;
pub(crate) const PROC_PID: usize = 4;
pub(crate) const PROC_PPID: usize = 8;
pub(crate) const PROC_SESSION: usize = 12;
pub(crate) const PROC_HMOD: usize = 16;
pub(crate) const PROC_THREADS: usize = 18;
pub(crate) const PROC_STATUS: usize = 20;

// Field offsets inside a module entry header.
pub(crate) const MOD_NEXT: usize = 0;
pub(crate) const MOD_HANDLE: usize = 4;
pub(crate) const MOD_TYPE: usize = 6;
pub(crate) const MOD_NAME_LEN: usize = 8;

/// Size in bytes of a process record carrying `thread_count` thread descriptors.
pub fn process_record_size(thread_count: u16) -> usize {
    PROCESS_HEADER_SIZE + usize::from(thread_count) * THREAD_DESCRIPTOR_SIZE
}

/// Borrow `len` bytes at `offset`, or fail with the offending offset.
pub(crate) fn bytes_at<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    what: &str,
) -> Result<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| {
            ProcsError::malformed(
                offset,
                format!("{what} ({len} bytes) runs past end of {}-byte buffer", buf.len()),
            )
        })
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> Result<u16> {
    let b = bytes_at(buf, offset, 2, "u16 field")?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> Result<u32> {
    let b = bytes_at(buf, offset, 4, "u32 field")?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Decoded snapshot header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub process_offset: usize,
    pub module_offset: Option<usize>,
    pub total_length: usize,
}

impl SnapshotHeader {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        bytes_at(buf, 0, SNAPSHOT_HEADER_SIZE, "snapshot header")?;

        let process_offset = read_u32(buf, 0)? as usize;
        let module_offset = match read_u32(buf, 4)? {
            0 => None,
            off => Some(off as usize),
        };
        let total_length = read_u32(buf, 8)? as usize;

        if process_offset < SNAPSHOT_HEADER_SIZE {
            return Err(ProcsError::malformed(
                0,
                format!("process region offset {process_offset:#x} overlaps the header"),
            ));
        }

        Ok(Self {
            process_offset,
            module_offset,
            total_length,
        })
    }
}
