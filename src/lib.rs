//! procs library
//!
//! Lists running processes by name or process id from a single snapshot of
//! the system process table. The library holds the whole report pipeline so
//! it can run against any snapshot source, terminal and title lookup.
//!
//! # Pipeline
//!
//! 1. A [`snapshot::SnapshotSource`] produces one binary [`snapshot::Snapshot`].
//! 2. [`process::ProcessIndex`] copies the process records, sorted by module handle.
//! 3. [`process::resolve_names`] walks the module list and names each record.
//! 4. [`process::sort_records`] orders the records by name then pid, or by pid.
//! 5. [`report::render_report`] prints the paged listing.
//!
//! # Usage
//!
//! ```rust
//! use procs::pipeline::run_report;
//! use procs::report::{MapTitleResolver, ReportOptions, ScriptedTerminal};
//! use procs::snapshot::{ProcessInfo, SnapshotBuilder, StaticSnapshotSource};
//!
//! let mut builder = SnapshotBuilder::new();
//! builder
//!     .process(ProcessInfo::new(100, 5))
//!     .process(ProcessInfo::new(200, 3))
//!     .module(3, "A.EXE")
//!     .module(5, "B.EXE");
//! let source = StaticSnapshotSource::new(builder.build_snapshot().unwrap());
//!
//! let mut out = Vec::new();
//! let mut terminal = ScriptedTerminal::new(25, "");
//! let options = ReportOptions { suppress_more: true, ..ReportOptions::default() };
//! let summary = run_report(&source, &mut terminal, &MapTitleResolver::new(), &options, &mut out)
//!     .unwrap();
//! assert_eq!(summary.printed, 2);
//! ```

pub mod error;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod snapshot;

// Re-export main types for convenience
pub use error::{ProcsError, Result};
pub use pipeline::{collect_records, run_report};
pub use process::{ProcessRecord, SortOrder};
pub use report::{RenderSummary, ReportOptions};
pub use snapshot::{Snapshot, SnapshotSource};
