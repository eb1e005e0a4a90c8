//! One-shot command implementations for procs.
//!
//! This module provides implementations for the flags that run instead of the
//! report:
//! - `check`: configuration and snapshot source validation (`--check-config`)
//! - `config`: configuration file generation (`--generate-config`)
//! - `capture`: raw snapshot capture (`--capture`)

pub mod capture;
pub mod check;
pub mod config;

// Re-export command functions
pub use capture::command_capture;
pub use check::command_check;
pub use config::command_config;
