//! Capture command implementation.
//!
//! Writes one raw snapshot to disk so it can be replayed with
//! `--snapshot-file`.

use std::path::Path;

use procs::snapshot::{write_capture, SnapshotSource};
use tracing::info;

/// Acquires a snapshot from `source` and writes it to `output`.
pub fn command_capture(
    source: &dyn SnapshotSource,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = source.acquire()?;
    let processes = snapshot.processes()?.count();
    write_capture(&snapshot, output)?;

    info!("Captured {} bytes to {}", snapshot.len(), output.display());
    println!(
        "Snapshot with {} processes written to: {}",
        processes,
        output.display()
    );
    Ok(())
}
