//! Snapshot source backed by the Linux /proc filesystem.
//!
//! Every numeric directory under the proc root becomes one process record.
//! Each distinct executable path becomes one module entry, and processes
//! share the handle of the module they run. Processes whose name cannot be
//! read (kernel threads, races with exit, permissions) get handle 0 and no
//! module entry, so they stay unresolved.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap as HashMap;
use tracing::{debug, trace, warn};

use crate::error::{ProcsError, Result};
use crate::snapshot::builder::{ProcessInfo, SnapshotBuilder, ThreadInfo};
use crate::snapshot::layout::{DEFAULT_BUFFER_KB, ERROR_BUFFER_OVERFLOW, HISTORICAL_BUFFER_BYTES};
use crate::snapshot::{Snapshot, SnapshotSource};

/// Handle given to processes without a readable executable name.
pub const UNNAMED_HANDLE: u16 = 0;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Fields of /proc/<pid>/stat used in snapshot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcStat {
    pub state: char,
    pub parent_pid: u32,
    pub session_id: u32,
    pub priority: i64,
}

/// Scans the proc root for process entries with numeric PIDs, in pid order.
pub fn collect_proc_entries(root: &Path) -> std::io::Result<Vec<ProcEntry>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        out.push(ProcEntry { pid, proc_path: p });
    }
    out.sort_by_key(|e| e.pid);
    Ok(out)
}

/// Parses the fields after the parenthesized command name of a stat line.
pub fn parse_stat(content: &str) -> Option<ProcStat> {
    // comm may itself contain ") ", so split at the last one.
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() < 16 {
        return None;
    }
    Some(ProcStat {
        state: fields[0].chars().next()?,
        parent_pid: fields[1].parse().ok()?,
        session_id: fields[3].parse().ok()?,
        priority: fields[15].parse().ok()?,
    })
}

fn read_stat(path: &Path) -> Option<ProcStat> {
    fs::read_to_string(path.join("stat"))
        .ok()
        .and_then(|s| parse_stat(&s))
}

/// Reads the executable path: exe link, then argv[0], then comm.
pub fn read_process_path(proc_path: &Path) -> Option<String> {
    if let Ok(target) = fs::read_link(proc_path.join("exe")) {
        let target = target.to_string_lossy();
        let path = target.strip_suffix(" (deleted)").unwrap_or(&target);
        if !path.is_empty() {
            return Some(path.to_string());
        }
    }

    if let Ok(content) = fs::read(proc_path.join("cmdline")) {
        if let Some(argv0) = content.split(|&b| b == 0u8).next() {
            if !argv0.is_empty() {
                return Some(String::from_utf8_lossy(argv0).into_owned());
            }
        }
    }

    if let Ok(s) = fs::read_to_string(proc_path.join("comm")) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.to_string());
        }
    }
    None
}

/// One thread descriptor per task directory, or a single one for the
/// main thread when the task list is unreadable.
fn read_threads(entry: &ProcEntry, stat: Option<&ProcStat>) -> Vec<ThreadInfo> {
    let mut threads: Vec<ThreadInfo> = match fs::read_dir(entry.proc_path.join("task")) {
        Ok(tasks) => tasks
            .flatten()
            .filter_map(|t| {
                let tid: u32 = t.file_name().to_str()?.parse().ok()?;
                let task_stat = read_stat(&t.path());
                Some(thread_info(tid, task_stat.as_ref()))
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    if threads.is_empty() {
        threads.push(thread_info(entry.pid, stat));
    }
    threads.sort_by_key(|t| t.tid);

    if threads.len() > usize::from(u16::MAX) {
        warn!(
            "pid {} has {} threads, recording the first {}",
            entry.pid,
            threads.len(),
            u16::MAX
        );
        threads.truncate(usize::from(u16::MAX));
    }
    threads
}

fn thread_info(tid: u32, stat: Option<&ProcStat>) -> ThreadInfo {
    ThreadInfo {
        tid,
        priority: stat.map_or(0, |s| s.priority.clamp(0, i64::from(u32::MAX)) as u32),
        state: stat.map_or(0, |s| u32::from(s.state)),
    }
}

/// Builds snapshots by walking a proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcfsSnapshotSource {
    proc_root: PathBuf,
    max_bytes: usize,
}

impl Default for ProcfsSnapshotSource {
    fn default() -> Self {
        Self::new("/proc", DEFAULT_BUFFER_KB * 1024)
    }
}

impl ProcfsSnapshotSource {
    pub fn new(proc_root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            proc_root: proc_root.into(),
            max_bytes,
        }
    }

    /// Collects processes and modules without encoding them.
    pub fn scan(&self) -> Result<SnapshotBuilder> {
        let entries = collect_proc_entries(&self.proc_root).map_err(|e| {
            ProcsError::snapshot_io(&e, &format!("reading {}", self.proc_root.display()))
        })?;
        debug!(
            "Found {} process entries under {}",
            entries.len(),
            self.proc_root.display()
        );

        let mut builder = SnapshotBuilder::new();
        let mut handles: HashMap<String, u16> = HashMap::new();
        let mut next_handle: u16 = 1;

        for entry in &entries {
            let stat = read_stat(&entry.proc_path);
            let module_handle = match read_process_path(&entry.proc_path) {
                Some(path) => match handles.get(&path) {
                    Some(&h) => h,
                    None => {
                        let h = next_handle;
                        next_handle = next_handle.checked_add(1).ok_or_else(|| {
                            ProcsError::SnapshotUnavailable {
                                code: ERROR_BUFFER_OVERFLOW,
                                detail: "module handles exhausted".into(),
                            }
                        })?;
                        builder.module(h, path.clone());
                        handles.insert(path, h);
                        h
                    }
                },
                None => {
                    trace!("pid {} has no readable name", entry.pid);
                    UNNAMED_HANDLE
                }
            };

            builder.process(ProcessInfo {
                pid: entry.pid,
                parent_pid: stat.map_or(0, |s| s.parent_pid),
                session_id: stat.map_or(0, |s| s.session_id),
                module_handle,
                status: stat.map_or(0, |s| u32::from(s.state)),
                threads: read_threads(entry, stat.as_ref()),
            });
        }

        Ok(builder)
    }
}

impl SnapshotSource for ProcfsSnapshotSource {
    fn acquire(&self) -> Result<Snapshot> {
        let builder = self.scan()?;
        let bytes = builder.build_bounded(self.max_bytes)?;
        debug!(
            "Encoded {} processes and {} modules into {} bytes",
            builder.process_count(),
            builder.module_count(),
            bytes.len()
        );
        if bytes.len() > HISTORICAL_BUFFER_BYTES {
            debug!("Snapshot is larger than the classic {HISTORICAL_BUFFER_BYTES:#x} byte buffer");
        }
        Ok(Snapshot::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::read_processes;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    const STAT_TAIL: &str = "S 1 42 42 0 -1 4194304 100 0 0 0 10 5 0 0 20 0 1 0 12345 12345678 1234";

    fn fake_process(root: &Path, pid: u32, exe: Option<&str>, comm: &str) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(dir.join("task").join(pid.to_string())).unwrap();
        fs::write(dir.join("stat"), format!("{pid} ({comm}) {STAT_TAIL}")).unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
        if let Some(exe) = exe {
            symlink(exe, dir.join("exe")).unwrap();
        }
    }

    #[test]
    fn test_parse_stat_fields() {
        let stat = parse_stat(&format!("42 (my (odd) proc) {STAT_TAIL}")).unwrap();
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.parent_pid, 1);
        assert_eq!(stat.session_id, 42);
        assert_eq!(stat.priority, 20);
    }

    #[test]
    fn test_parse_stat_too_short() {
        assert_eq!(parse_stat("1 (init) S 0 1"), None);
        assert_eq!(parse_stat("garbage"), None);
    }

    #[test]
    fn test_collect_proc_entries_numeric_only() {
        let dir = tempdir().expect("Failed to create temp dir");
        for name in ["12", "3", "self", "sys"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        let pids: Vec<u32> = collect_proc_entries(dir.path())
            .unwrap()
            .iter()
            .map(|e| e.pid)
            .collect();
        assert_eq!(pids, vec![3, 12]);
    }

    #[test]
    fn test_read_process_path_fallbacks() {
        let dir = tempdir().expect("Failed to create temp dir");
        fake_process(dir.path(), 1, Some("/usr/lib/systemd/systemd"), "systemd");
        fake_process(dir.path(), 2, None, "kthreadd");

        assert_eq!(
            read_process_path(&dir.path().join("1")).as_deref(),
            Some("/usr/lib/systemd/systemd")
        );
        assert_eq!(read_process_path(&dir.path().join("2")).as_deref(), Some("kthreadd"));
        assert_eq!(read_process_path(&dir.path().join("99")), None);
    }

    #[test]
    fn test_shared_executable_shares_handle() {
        let dir = tempdir().expect("Failed to create temp dir");
        fake_process(dir.path(), 10, Some("/bin/bash"), "bash");
        fake_process(dir.path(), 11, Some("/usr/sbin/sshd"), "sshd");
        fake_process(dir.path(), 12, Some("/bin/bash"), "bash");

        let source = ProcfsSnapshotSource::new(dir.path(), 64 * 1024);
        let snapshot = source.acquire().unwrap();
        let records = read_processes(&snapshot).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].module_handle(), records[2].module_handle());
        assert_ne!(records[0].module_handle(), records[1].module_handle());
        assert_eq!(snapshot.modules().unwrap().count(), 2);
    }

    #[test]
    fn test_unreadable_root_is_unavailable() {
        let source = ProcfsSnapshotSource::new("/nonexistent/proc/root", 1024);
        assert!(matches!(
            source.acquire(),
            Err(ProcsError::SnapshotUnavailable { .. })
        ));
    }

    #[test]
    fn test_buffer_bound_enforced() {
        let dir = tempdir().expect("Failed to create temp dir");
        for pid in 1..=20 {
            fake_process(dir.path(), pid, Some("/bin/sleep"), "sleep");
        }
        let source = ProcfsSnapshotSource::new(dir.path(), 128);
        match source.acquire() {
            Err(ProcsError::SnapshotUnavailable { code, .. }) => {
                assert_eq!(code, ERROR_BUFFER_OVERFLOW)
            }
            other => panic!("expected overflow, got {other:?}"),
        }
    }
}
