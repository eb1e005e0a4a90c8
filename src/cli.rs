//! CLI arguments for procs.
//!
//! This module defines the command-line interface using the clap library and
//! the rewrite that accepts the classic `/f /i /s` option spelling.

use clap::{CommandFactory, Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "procs",
    about = "List running processes by name or process id",
    long_about = "List running processes by name or process id.\n\n\
                  Takes one snapshot of the system process table, names every process \
                  after the module it runs, and prints the list sorted by name (then pid) \
                  or by pid alone. Output pauses at each screenful unless -s is given.",
    version,
    after_help = "Options may also be written DOS style: /f /i /s"
)]
pub struct Args {
    /// ProcessName or partial ProcessName at which to start listing (not applicable with -i)
    #[arg(value_name = "STARTING_POINT")]
    pub starting_point: Option<String>,

    /// Fully qualify the process names
    #[arg(short = 'f', long)]
    pub full_names: bool,

    /// Sort by process id
    #[arg(short = 'i', long)]
    pub sort_by_pid: bool,

    /// Suppress More [Y,N] prompts
    #[arg(short = 's', long)]
    pub suppress_more: bool,

    /// Log level (logs go to stderr)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Output format for --show-config and --generate-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Read the snapshot from a captured file instead of /proc
    #[arg(long)]
    pub snapshot_file: Option<PathBuf>,

    /// Root of the proc filesystem to scan
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Upper bound for the snapshot buffer (KB)
    #[arg(long)]
    pub snapshot_buffer_kb: Option<usize>,

    /// Write the raw snapshot to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub capture: Option<PathBuf>,

    /// Write a default config file to PATH ("-" for stdout) and exit
    #[arg(long, value_name = "PATH")]
    pub generate_config: Option<PathBuf>,
}

/// Long and short spellings of every option that consumes the next token.
fn value_options() -> Vec<String> {
    Args::command()
        .get_arguments()
        .filter(|arg| !arg.is_positional() && arg.get_action().takes_values())
        .flat_map(|arg| {
            let long = arg.get_long().map(|l| format!("--{l}"));
            let short = arg.get_short().map(|c| format!("-{c}"));
            long.into_iter().chain(short)
        })
        .collect()
}

/// Rewrites DOS-style options to their clap spelling.
///
/// Only a bare `/X` or `-X` with one uppercase or lowercase letter is
/// rewritten, to `-x`. The value following an option that takes one is left
/// alone, so absolute paths pass through. Everything after `--` is left
/// alone too.
pub fn normalize_legacy_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let takes_value = value_options();
    let mut out = Vec::new();
    let mut options_done = false;
    let mut value_next = false;

    for (i, arg) in args.into_iter().enumerate() {
        let text = match arg.to_str() {
            Some(t) if i > 0 && !options_done && !value_next => t,
            _ => {
                value_next = false;
                out.push(arg);
                continue;
            }
        };

        if text == "--" {
            options_done = true;
            out.push(arg);
            continue;
        }

        let mut chars = text.chars();
        let rewritten = match (chars.next(), chars.next(), chars.next()) {
            (Some('/'), Some(letter), None) if letter.is_ascii_alphabetic() => {
                Some(format!("-{}", letter.to_ascii_lowercase()))
            }
            (Some('-'), Some(letter), None) if letter.is_ascii_uppercase() => {
                Some(format!("-{}", letter.to_ascii_lowercase()))
            }
            _ => None,
        };
        let arg = rewritten.map(OsString::from).unwrap_or(arg);
        value_next = arg
            .to_str()
            .is_some_and(|a| takes_value.iter().any(|opt| opt == a));
        out.push(arg);
    }
    out
}

/// Parses process arguments, accepting the DOS option spelling.
pub fn parse_args<I>(args: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = OsString>,
{
    Args::try_parse_from(normalize_legacy_args(args))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_normalize_slash_options() {
        let out = normalize_legacy_args(os(&["procs", "/F", "/i", "/S", "CMD"]));
        assert_eq!(out, os(&["procs", "-f", "-i", "-s", "CMD"]));
    }

    #[test]
    fn test_normalize_uppercase_dash() {
        let out = normalize_legacy_args(os(&["procs", "-F", "-I", "--full-names"]));
        assert_eq!(out, os(&["procs", "-f", "-i", "--full-names"]));
    }

    #[test]
    fn test_normalize_stops_after_double_dash() {
        let out = normalize_legacy_args(os(&["procs", "--", "/X"]));
        assert_eq!(out, os(&["procs", "--", "/X"]));
    }

    #[test]
    fn test_parse_flags_and_starting_point() {
        let args = parse_args(os(&["procs", "/f", "-S", "pm"])).unwrap();
        assert!(args.full_names);
        assert!(args.suppress_more);
        assert!(!args.sort_by_pid);
        assert_eq!(args.starting_point.as_deref(), Some("pm"));
    }

    #[test]
    fn test_option_values_keep_absolute_paths() {
        let out = normalize_legacy_args(os(&[
            "procs",
            "--snapshot-file",
            "/tmp/x.snap",
            "-c",
            "/etc/procs/procs.yaml",
            "/s",
        ]));
        assert_eq!(
            out,
            os(&["procs", "--snapshot-file", "/tmp/x.snap", "-c", "/etc/procs/procs.yaml", "-s"])
        );
    }

    #[test]
    fn test_single_letter_values_are_not_flags() {
        let out = normalize_legacy_args(os(&["procs", "--proc-root", "/p", "--capture", "/F"]));
        assert_eq!(out, os(&["procs", "--proc-root", "/p", "--capture", "/F"]));
    }

    #[test]
    fn test_parse_absolute_path_options() {
        let args = parse_args(os(&[
            "procs",
            "--snapshot-file",
            "/abs/path.snap",
            "-c",
            "/abs/procs.yaml",
            "--generate-config",
            "/abs/out.yaml",
            "/I",
        ]))
        .unwrap();
        assert_eq!(args.snapshot_file, Some(PathBuf::from("/abs/path.snap")));
        assert_eq!(args.config, Some(PathBuf::from("/abs/procs.yaml")));
        assert_eq!(args.generate_config, Some(PathBuf::from("/abs/out.yaml")));
        assert!(args.sort_by_pid);
    }

    #[test]
    fn test_longer_slash_words_stay_positional() {
        let args = parse_args(os(&["procs", "/usr"])).unwrap();
        assert_eq!(args.starting_point.as_deref(), Some("/usr"));
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        assert!(parse_args(os(&["procs", "/x"])).is_err());
    }

    #[test]
    fn test_excess_positional_is_rejected() {
        assert!(parse_args(os(&["procs", "one", "two"])).is_err());
    }
}
