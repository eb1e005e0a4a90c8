//! Configuration management for procs.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use procs::process::SortOrder;
use procs::report::{ReportOptions, DEFAULT_SCREEN_LINES, LEGACY_LOADER_IDENT, SCREEN_LINE_OVERHEAD};
use procs::snapshot::layout::{DEFAULT_BUFFER_KB, MAX_BUFFER_KB};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, level_filters::LevelFilter};

// Default configuration constants
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Locations searched when no `--config` is given, first hit wins.
pub const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/procs/procs.yaml",
    "/etc/procs/procs.json",
    "./procs.yaml",
    "./procs.yml",
    "./procs.json",
    "./procs.toml",
];

/// Effective configuration; every field may be omitted in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Report
    #[serde(alias = "full-names")]
    pub full_names: Option<bool>,
    #[serde(alias = "sort-by-pid")]
    pub sort_by_pid: Option<bool>,
    #[serde(alias = "suppress-more")]
    pub suppress_more: Option<bool>,
    /// Display name that triggers the legacy title lookup
    #[serde(alias = "legacy-ident")]
    pub legacy_ident: Option<String>,

    // Terminal
    #[serde(alias = "default-screen-lines")]
    pub default_screen_lines: Option<u16>,
    #[serde(alias = "screen-line-overhead")]
    pub screen_line_overhead: Option<u16>,

    // Snapshot
    #[serde(alias = "snapshot-buffer-kb")]
    pub snapshot_buffer_kb: Option<usize>,
    #[serde(alias = "snapshot-file")]
    pub snapshot_file: Option<PathBuf>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            full_names: Some(false),
            sort_by_pid: Some(false),
            suppress_more: Some(false),
            legacy_ident: Some(LEGACY_LOADER_IDENT.to_string()),
            default_screen_lines: Some(DEFAULT_SCREEN_LINES),
            screen_line_overhead: Some(SCREEN_LINE_OVERHEAD),
            snapshot_buffer_kb: Some(DEFAULT_BUFFER_KB),
            snapshot_file: None,
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
        }
    }
}

impl Config {
    /// Report options for one run; `starting_point` only comes from the CLI.
    pub fn report_options(&self, starting_point: Option<String>) -> ReportOptions {
        let sort_order = if self.sort_by_pid.unwrap_or(false) {
            SortOrder::Pid
        } else {
            SortOrder::Name
        };
        ReportOptions {
            full_names: self.full_names.unwrap_or(false),
            sort_order,
            suppress_more: self.suppress_more.unwrap_or(false),
            starting_point,
            legacy_ident: self
                .legacy_ident
                .clone()
                .unwrap_or_else(|| LEGACY_LOADER_IDENT.to_string()),
        }
    }

    /// Buffer bound in bytes; oversized values saturate and are rejected by
    /// `validate_effective_config`.
    pub fn buffer_bytes(&self) -> usize {
        self.snapshot_buffer_kb
            .unwrap_or(DEFAULT_BUFFER_KB)
            .saturating_mul(1024)
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn screen_lines(&self) -> (u16, u16) {
        (
            self.default_screen_lines.unwrap_or(DEFAULT_SCREEN_LINES),
            self.screen_line_overhead.unwrap_or(SCREEN_LINE_OVERHEAD),
        )
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(parse_log_level)
            .unwrap_or(LevelFilter::WARN)
    }
}

/// Maps a config log level name to a filter.
pub fn parse_log_level(name: &str) -> Option<LevelFilter> {
    match name.to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}

fn log_level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Off => "off",
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (lines, overhead) = cfg.screen_lines();
    if lines == 0 {
        return Err("default_screen_lines must be greater than 0".into());
    }
    if overhead >= lines {
        return Err(format!(
            "screen_line_overhead ({}) must be smaller than default_screen_lines ({})",
            overhead, lines
        )
        .into());
    }

    match cfg.snapshot_buffer_kb {
        Some(0) => return Err("snapshot_buffer_kb must be greater than 0".into()),
        Some(kb) if kb > MAX_BUFFER_KB => {
            return Err(format!(
                "snapshot_buffer_kb ({}) exceeds the maximum of {} KB",
                kb, MAX_BUFFER_KB
            )
            .into());
        }
        _ => {}
    }

    if let Some(ident) = cfg.legacy_ident.as_deref() {
        if ident.trim().is_empty() {
            return Err("legacy_ident must not be empty".into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if parse_log_level(level).is_none() {
            return Err(format!(
                "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                level
            )
            .into());
        }
    }

    if let Some(file) = cfg.snapshot_file.as_deref() {
        if !file.is_file() {
            return Err(format!("snapshot_file not found: {}", file.display()).into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Flags can only switch a behavior on.
    if args.full_names {
        config.full_names = Some(true);
    }
    if args.sort_by_pid {
        config.sort_by_pid = Some(true);
    }
    if args.suppress_more {
        config.suppress_more = Some(true);
    }

    if let Some(kb) = args.snapshot_buffer_kb {
        config.snapshot_buffer_kb = Some(kb);
    }
    if let Some(file) = &args.snapshot_file {
        config.snapshot_file = Some(file.clone());
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(log_level_name(level).into());
    }

    Ok(config)
}

/// Loads a config file, or the first default location that exists.
///
/// Fields missing from the file fall back to their defaults. An explicit
/// path that does not exist is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)?;

    let loaded: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(loaded.with_defaults())
}

impl Config {
    fn with_defaults(self) -> Self {
        let d = Config::default();
        Self {
            full_names: self.full_names.or(d.full_names),
            sort_by_pid: self.sort_by_pid.or(d.sort_by_pid),
            suppress_more: self.suppress_more.or(d.suppress_more),
            legacy_ident: self.legacy_ident.or(d.legacy_ident),
            default_screen_lines: self.default_screen_lines.or(d.default_screen_lines),
            screen_line_overhead: self.screen_line_overhead.or(d.screen_line_overhead),
            snapshot_buffer_kb: self.snapshot_buffer_kb.or(d.snapshot_buffer_kb),
            snapshot_file: self.snapshot_file.or(d.snapshot_file),
            proc_root: self.proc_root.or(d.proc_root),
            log_level: self.log_level.or(d.log_level),
        }
    }
}

/// Serializes a config in the requested format.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}
