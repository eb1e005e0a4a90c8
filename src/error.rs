//! Error types for the process report pipeline.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ProcsError>;

/// Errors that can end a run of the report pipeline.
#[derive(Error, Debug)]
pub enum ProcsError {
    /// An allocation for records or names could not be satisfied.
    #[error("out of memory")]
    OutOfMemory,

    /// The snapshot source could not produce a buffer.
    #[error("snapshot query failed. RC: {code} ({detail})")]
    SnapshotUnavailable { code: i32, detail: String },

    /// The snapshot buffer does not follow the record layout.
    #[error("malformed snapshot at offset {offset:#x}: {reason}")]
    MalformedSnapshot { offset: usize, reason: String },

    /// Bad flag or too many positional arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Report output or capture file failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TryReserveError> for ProcsError {
    fn from(_: TryReserveError) -> Self {
        ProcsError::OutOfMemory
    }
}

impl ProcsError {
    /// Builds a `SnapshotUnavailable` from an I/O failure, keeping the OS code when there is one.
    pub fn snapshot_io(err: &std::io::Error, what: &str) -> Self {
        ProcsError::SnapshotUnavailable {
            code: err.raw_os_error().unwrap_or(-1),
            detail: format!("{what}: {err}"),
        }
    }

    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        ProcsError::MalformedSnapshot {
            offset,
            reason: reason.into(),
        }
    }
}
