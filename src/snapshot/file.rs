//! Snapshot source replaying a captured buffer, and the capture writer.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ProcsError, Result};
use crate::snapshot::layout::ERROR_BUFFER_OVERFLOW;
use crate::snapshot::{Snapshot, SnapshotSource};

/// Loads a snapshot previously written with [`write_capture`].
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
    max_bytes: usize,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes,
        }
    }
}

impl SnapshotSource for FileSnapshotSource {
    fn acquire(&self) -> Result<Snapshot> {
        let what = format!("reading {}", self.path.display());
        let meta = fs::metadata(&self.path).map_err(|e| ProcsError::snapshot_io(&e, &what))?;
        if meta.len() > self.max_bytes as u64 {
            return Err(ProcsError::SnapshotUnavailable {
                code: ERROR_BUFFER_OVERFLOW,
                detail: format!(
                    "{} is {} bytes, buffer holds {}",
                    self.path.display(),
                    meta.len(),
                    self.max_bytes
                ),
            });
        }

        let bytes = fs::read(&self.path).map_err(|e| ProcsError::snapshot_io(&e, &what))?;
        info!("Loaded snapshot from: {}", self.path.display());
        Ok(Snapshot::from_bytes(bytes))
    }
}

/// Writes the raw snapshot buffer to `path`.
pub fn write_capture(snapshot: &Snapshot, path: &Path) -> Result<()> {
    fs::write(path, snapshot.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{read_processes, ProcessInfo, SnapshotBuilder};
    use tempfile::tempdir;

    #[test]
    fn test_capture_and_replay() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("procs.snap");

        let mut builder = SnapshotBuilder::new();
        builder.process(ProcessInfo::new(9, 1)).module(1, "INIT");
        write_capture(&builder.build_snapshot().unwrap(), &path).unwrap();

        let snapshot = FileSnapshotSource::new(&path, 4096).acquire().unwrap();
        let records = read_processes(&snapshot).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid(), 9);
    }

    #[test]
    fn test_missing_file_reports_os_code() {
        let source = FileSnapshotSource::new("/nonexistent/procs.snap", 4096);
        match source.acquire() {
            Err(ProcsError::SnapshotUnavailable { code, .. }) => assert_eq!(code, 2),
            other => panic!("expected SnapshotUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("big.snap");
        fs::write(&path, vec![0u8; 100]).unwrap();

        let source = FileSnapshotSource::new(&path, 64);
        assert!(matches!(
            source.acquire(),
            Err(ProcsError::SnapshotUnavailable { code: ERROR_BUFFER_OVERFLOW, .. })
        ));
    }
}
