//! Report rendering and the collaborators it consumes.
//!
//! This module provides:
//! - `renderer`: header, starting-point filter, pagination and line format
//! - `terminal`: page size and single-key input
//! - `title`: legacy-subsystem title lookup and sanitizing

pub mod renderer;
pub mod terminal;
pub mod title;

pub use renderer::{render_report, write_header, RenderSummary, ReportOptions, LEGACY_LOADER_IDENT};
pub use terminal::{
    ConsoleTerminal, ScriptedTerminal, Terminal, DEFAULT_SCREEN_LINES, SCREEN_LINE_OVERHEAD,
};
pub use title::{
    sanitize_title, MapTitleResolver, ProcfsTitleResolver, TitleResolver, TITLE_CONTROL_LIMIT,
};
