//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::Path;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Writes the default configuration to `output`, or stdout for `-`.
pub fn command_config(output: &Path, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let content = generate_config(format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(output, content)?;
        println!("Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Default configuration text; YAML output carries a commented header.
pub fn generate_config(format: ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    let content = render_config(&Config::default(), format)?;
    Ok(match format {
        ConfigFormat::Yaml => add_config_comments(content),
        _ => content,
    })
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# procs configuration
# ====================
#
# Report
# ------
# full_names: false            # Print the full module path instead of the short name
# sort_by_pid: false           # Order by process id instead of name
# suppress_more: false         # Never pause with the More [Y,N] prompt
# legacy_ident: "SYSINIT"      # Name whose processes also show their title
#
# Terminal
# --------
# default_screen_lines: 25     # Page height when the terminal size is unknown
# screen_line_overhead: 3      # Lines kept free for the header and prompt
#
# Snapshot
# --------
# snapshot_buffer_kb: 256      # Largest snapshot accepted (max 16384)
# snapshot_file: null          # Replay a file written with --capture
# proc_root: "/proc"           # Proc filesystem to scan
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace (stderr)
"#;

    format!("{comments}\n{yaml}")
}
