//! Process records and their resolved names.

use std::collections::TryReserveError;

/// Characters that separate directories in a module path.
pub const PATH_SEPARATORS: [char; 2] = ['\\', '/'];

/// Owned executable path plus the start of its last path component.
///
/// The short name is always a suffix of the full name, so it is stored as an
/// offset instead of a second string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessName {
    full: String,
    short_start: usize,
}

impl ProcessName {
    /// Copies `path` into freshly reserved storage.
    pub fn try_new(path: &str) -> Result<Self, TryReserveError> {
        let mut full = String::new();
        full.try_reserve_exact(path.len())?;
        full.push_str(path);
        Ok(Self::from_owned(full))
    }

    pub fn from_owned(full: String) -> Self {
        let short_start = full
            .rfind(PATH_SEPARATORS)
            .map(|i| i + 1)
            .unwrap_or(0);
        Self { full, short_start }
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn short(&self) -> &str {
        &self.full[self.short_start..]
    }

    pub fn short_start(&self) -> usize {
        self.short_start
    }
}

/// One active process from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    module_handle: u16,
    pid: u32,
    name: Option<ProcessName>,
}

impl ProcessRecord {
    pub fn new(module_handle: u16, pid: u32) -> Self {
        Self {
            module_handle,
            pid,
            name: None,
        }
    }

    pub fn module_handle(&self) -> u16 {
        self.module_handle
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn name(&self) -> Option<&ProcessName> {
        self.name.as_ref()
    }

    pub fn full_name(&self) -> Option<&str> {
        self.name.as_ref().map(ProcessName::full)
    }

    pub fn short_name(&self) -> Option<&str> {
        self.name.as_ref().map(ProcessName::short)
    }

    pub fn is_resolved(&self) -> bool {
        self.name.is_some()
    }

    pub fn set_name(&mut self, name: ProcessName) {
        self.name = Some(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_after_last_backslash() {
        let name = ProcessName::try_new("C:\\OS2\\CMD.EXE").unwrap();
        assert_eq!(name.full(), "C:\\OS2\\CMD.EXE");
        assert_eq!(name.short(), "CMD.EXE");
    }

    #[test]
    fn test_short_name_without_separator_is_full_name() {
        let name = ProcessName::try_new("SYSINIT").unwrap();
        assert_eq!(name.short(), "SYSINIT");
        assert_eq!(name.short_start(), 0);
    }

    #[test]
    fn test_short_name_after_forward_slash() {
        let name = ProcessName::try_new("/usr/sbin/sshd").unwrap();
        assert_eq!(name.short(), "sshd");
    }

    #[test]
    fn test_trailing_separator_gives_empty_short_name() {
        let name = ProcessName::try_new("C:\\DIR\\").unwrap();
        assert_eq!(name.short(), "");
    }

    #[test]
    fn test_short_name_is_separated_suffix() {
        for path in ["A", "\\A", "C:\\X\\Y.EXE", "/bin/sh", "a/b\\c", ""] {
            let name = ProcessName::try_new(path).unwrap();
            assert!(name.full().ends_with(name.short()));
            if name.short() != name.full() {
                let before = name.full()[..name.short_start()].chars().last().unwrap();
                assert!(PATH_SEPARATORS.contains(&before), "path {path:?}");
            }
        }
    }

    #[test]
    fn test_record_starts_unresolved() {
        let mut record = ProcessRecord::new(3, 200);
        assert!(!record.is_resolved());
        assert_eq!(record.short_name(), None);

        record.set_name(ProcessName::from_owned("X:\\A.EXE".into()));
        assert_eq!(record.full_name(), Some("X:\\A.EXE"));
        assert_eq!(record.short_name(), Some("A.EXE"));
    }
}
