//! Display titles for legacy-subsystem processes.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use ahash::AHashMap as HashMap;
use tracing::trace;

/// Characters below this value are treated as control characters in titles.
pub const TITLE_CONTROL_LIMIT: u32 = 0x10;

/// Looks up the title registered for a single process.
pub trait TitleResolver {
    fn resolve_title(&self, pid: u32) -> Option<String>;
}

/// Replaces control characters with spaces, never producing two spaces in a
/// row from them: a control character right after a space is dropped.
pub fn sanitize_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if u32::from(c) < TITLE_CONTROL_LIMIT {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Uses the process command line from procfs as its title.
#[derive(Debug, Clone)]
pub struct ProcfsTitleResolver {
    proc_root: PathBuf,
}

impl ProcfsTitleResolver {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl TitleResolver for ProcfsTitleResolver {
    fn resolve_title(&self, pid: u32) -> Option<String> {
        let path = self.proc_root.join(pid.to_string()).join("cmdline");
        let content = match fs::read(&path) {
            Ok(c) => c,
            Err(e) => {
                trace!("No title for pid {}: {}", pid, e);
                return None;
            }
        };

        let end = content
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        if end == 0 {
            return None;
        }
        Some(sanitize_title(&String::from_utf8_lossy(&content[..end])))
    }
}

/// Titles from a fixed table, recording every pid asked for.
#[derive(Debug, Default)]
pub struct MapTitleResolver {
    titles: HashMap<u32, String>,
    queried: RefCell<Vec<u32>>,
}

impl MapTitleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, pid: u32, title: impl Into<String>) -> Self {
        self.titles.insert(pid, title.into());
        self
    }

    /// Pids passed to `resolve_title`, in call order.
    pub fn queried(&self) -> Vec<u32> {
        self.queried.borrow().clone()
    }
}

impl TitleResolver for MapTitleResolver {
    fn resolve_title(&self, pid: u32) -> Option<String> {
        self.queried.borrow_mut().push(pid);
        self.titles.get(&pid).cloned()
    }
}
