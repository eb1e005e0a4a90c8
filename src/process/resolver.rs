//! Attaches module names to indexed process records.

use tracing::{debug, trace};

use crate::error::Result;
use crate::process::index::ProcessIndex;
use crate::process::record::ProcessName;
use crate::snapshot::ModuleEntry;

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Module entries read from the list.
    pub modules: usize,
    /// Module entries that matched no live process.
    pub orphan_modules: usize,
    /// Process records that received a name.
    pub named: usize,
}

/// Walks `modules` once and names every process whose handle matches.
///
/// Each module entry is looked up by binary search on the handle-sorted
/// index, so module list order does not matter. A failed name allocation or
/// a malformed entry stops the pass and is returned to the caller.
pub fn resolve_names<'a, I>(index: &mut ProcessIndex, modules: I) -> Result<ResolveStats>
where
    I: IntoIterator<Item = Result<ModuleEntry<'a>>>,
{
    let mut stats = ResolveStats::default();

    for entry in modules {
        let entry = entry?;
        stats.modules += 1;

        let matches = index.lookup_mut(entry.handle);
        if matches.is_empty() {
            trace!(
                "Module {} ({}) has no live process",
                entry.handle,
                entry.name
            );
            stats.orphan_modules += 1;
            continue;
        }

        for record in matches {
            record.set_name(ProcessName::try_new(&entry.name)?);
            stats.named += 1;
        }
    }

    debug!(
        "Resolved {} process names from {} modules ({} without a process)",
        stats.named, stats.modules, stats.orphan_modules
    );
    Ok(stats)
}
