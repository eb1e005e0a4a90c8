//! One report run: acquire, index, resolve, sort, render.

use std::io::Write;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::Result;
use crate::process::{resolve_names, sort_records, ProcessIndex, ProcessRecord};
use crate::report::{render_report, RenderSummary, ReportOptions, Terminal, TitleResolver};
use crate::snapshot::{Snapshot, SnapshotSource};

/// Builds the named, report-ordered record list from a snapshot.
///
/// The snapshot is only borrowed: names are copied out, so the buffer can be
/// dropped as soon as this returns.
pub fn collect_records(snapshot: &Snapshot, options: &ReportOptions) -> Result<Vec<ProcessRecord>> {
    let mut index = ProcessIndex::from_snapshot(snapshot)?;
    resolve_names(&mut index, snapshot.modules()?)?;

    let mut records = index.into_records();
    sort_records(&mut records, options.sort_order);
    debug!("Sorted {} records by {:?}", records.len(), options.sort_order);
    Ok(records)
}

/// Runs the whole report against the given collaborators.
///
/// Any failure before rendering aborts the run without printing records.
pub fn run_report<S, T, R, W>(
    source: &S,
    terminal: &mut T,
    titles: &R,
    options: &ReportOptions,
    out: &mut W,
) -> Result<RenderSummary>
where
    S: SnapshotSource + ?Sized,
    T: Terminal + ?Sized,
    R: TitleResolver + ?Sized,
    W: Write,
{
    let start = Instant::now();
    let records = {
        let snapshot = source.acquire()?;
        info!("Acquired snapshot of {} bytes", snapshot.len());
        collect_records(&snapshot, options)?
    };

    let summary = render_report(out, &records, options, terminal, titles)?;
    info!(
        "Listed {} of {} processes in {:.2}ms",
        summary.printed,
        records.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(summary)
}
