//! Check command implementation.
//!
//! Validates the effective configuration and probes the snapshot source.

use procs::process::{resolve_names, ProcessIndex};
use procs::snapshot::SnapshotSource;

use crate::config::{validate_effective_config, Config};

/// Validates configuration, then takes one snapshot and resolves it.
pub fn command_check(
    config: &Config,
    source: &dyn SnapshotSource,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("procs - configuration check");
    println!("===========================");

    println!("\nChecking configuration...");
    if let Err(e) = validate_effective_config(config) {
        println!("   Configuration invalid: {}", e);
        return Err(e);
    }
    println!("   Configuration is valid");

    println!("\nChecking snapshot source...");
    let snapshot = source.acquire()?;
    let mut index = ProcessIndex::from_snapshot(&snapshot)?;
    let stats = resolve_names(&mut index, snapshot.modules()?)?;
    println!(
        "   Snapshot of {} bytes: {} processes, {} modules, {} named",
        snapshot.len(),
        index.len(),
        stats.modules,
        stats.named
    );

    println!("\nAll checks passed");
    Ok(())
}
