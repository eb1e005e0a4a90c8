//! procs - list running processes by name or process id
//!
//! Takes one snapshot of the process table, names each process after its
//! module, sorts, and prints a paged listing. This is the main entry point
//! that parses arguments, loads configuration and dispatches the one-shot
//! commands.

mod cli;
mod commands;
mod config;

use std::io;
use std::path::Path;

use clap::error::ErrorKind;
use clap::CommandFactory;
use procs::error::ProcsError;
use procs::pipeline::run_report;
use procs::report::{ConsoleTerminal, ProcfsTitleResolver};
use procs::snapshot::{FileSnapshotSource, ProcfsSnapshotSource, SnapshotSource};
use tracing::{debug, info, level_filters::LevelFilter};

use cli::{parse_args, Args};
use commands::{command_capture, command_check, command_config};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Exit code for a failed run.
const EXIT_FAILURE: i32 = 1;
/// Exit code for arguments that could not be parsed.
const EXIT_USAGE: i32 = 2;

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so they never interleave with the listing.
fn setup_logging(level: LevelFilter) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("procs: tracing subscriber already set");
        return;
    }

    debug!("Logging initialized with level: {}", level);
}

fn banner() -> String {
    format!(
        "procs {} - list running processes by name or process id",
        env!("CARGO_PKG_VERSION")
    )
}

/// Chooses the snapshot source: a captured file when configured, else procfs.
fn snapshot_source(config: &Config) -> Box<dyn SnapshotSource> {
    match config.snapshot_file.as_deref() {
        Some(path) => {
            info!("Reading snapshot from file: {}", path.display());
            Box::new(FileSnapshotSource::new(path, config.buffer_bytes()))
        }
        None => {
            let root = config.proc_root();
            info!("Scanning processes under: {}", root.display());
            Box::new(ProcfsSnapshotSource::new(root, config.buffer_bytes()))
        }
    }
}

/// Prints the banner, the parse error and the usage text.
fn report_usage_error(err: &clap::Error) {
    let rendered = err.render().to_string();
    let reason = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ");
    let invalid = ProcsError::InvalidArgument(reason.to_string());
    eprintln!("{}", banner());
    eprintln!("procs: {}", invalid);
    eprintln!();
    eprintln!("{}", Args::command().render_help());
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(output) = args.generate_config.as_deref() {
        return command_config(output, args.config_format);
    }

    let config = resolve_config(&args).map_err(|e| ProcsError::Config(e.to_string()))?;
    setup_logging(config.level_filter());

    if args.show_config {
        return show_config(&config, args.config_format);
    }

    if args.check_config {
        return command_check(&config, snapshot_source(&config).as_ref());
    }

    validate_effective_config(&config).map_err(|e| ProcsError::Config(e.to_string()))?;
    let source = snapshot_source(&config);

    if let Some(output) = args.capture.as_deref() {
        return command_capture(source.as_ref(), output);
    }

    let options = config.report_options(args.starting_point.clone());
    let (lines, overhead) = config.screen_lines();
    let mut terminal = ConsoleTerminal::new(lines, overhead);
    let titles = ProcfsTitleResolver::new(config.proc_root());

    println!("{}", banner());
    println!();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = run_report(source.as_ref(), &mut terminal, &titles, &options, &mut out)?;
    debug!(
        "printed={} filtered={} unresolved={} prompts={} stopped_early={}",
        summary.printed, summary.filtered, summary.unresolved, summary.prompts, summary.stopped_early
    );
    Ok(())
}

fn main() {
    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                return;
            }
            _ => {
                report_usage_error(&err);
                std::process::exit(EXIT_USAGE);
            }
        },
    };

    let config_path = args.config.clone();
    if let Err(e) = run(args) {
        debug!("procs failed: {:?}", e);
        match config_path.as_deref().map(Path::display) {
            Some(path) => eprintln!("procs: {} (config: {})", e, path),
            None => eprintln!("procs: {}", e),
        }
        std::process::exit(EXIT_FAILURE);
    }
}
