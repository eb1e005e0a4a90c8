//! Paginated rendering of the sorted process list.

use std::cmp::Ordering;
use std::io::{self, Write};

use tracing::debug;

use crate::process::{cmp_optional_names, ProcessRecord, SortOrder};
use crate::report::terminal::Terminal;
use crate::report::title::TitleResolver;

/// Module name identifying processes of the legacy DOS subsystem.
pub const LEGACY_LOADER_IDENT: &str = "SYSINIT";

const MORE_PROMPT: &str = "More [Y,N]?";
const PROMPT_ERASE: &str = "\r           \r";

/// Options for one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Print fully qualified names instead of short names.
    pub full_names: bool,
    pub sort_order: SortOrder,
    /// Never stop for the more-prompt.
    pub suppress_more: bool,
    /// Name at which the listing starts; ignored when sorting by pid.
    pub starting_point: Option<String>,
    /// Display name that triggers a title lookup.
    pub legacy_ident: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            full_names: false,
            sort_order: SortOrder::Name,
            suppress_more: false,
            starting_point: None,
            legacy_ident: LEGACY_LOADER_IDENT.to_string(),
        }
    }
}

/// Counters collected while rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub printed: usize,
    /// Records skipped because they sort before the starting point.
    pub filtered: usize,
    /// Records skipped because no module named them.
    pub unresolved: usize,
    pub prompts: usize,
    /// The user answered `N` at a more-prompt.
    pub stopped_early: bool,
}

/// Writes the two header lines.
pub fn write_header<W: Write>(out: &mut W, full_names: bool) -> io::Result<()> {
    let mut name_desc = String::from("Process Name ");
    if !full_names {
        name_desc.push_str("(use -f for fully qualified names)");
    }
    let header = format!("{:<12.12} {:<63.63}", "PID(hex/dec)", name_desc);
    writeln!(out, "{}", header.trim_end())?;
    writeln!(out, "{} {}", "─".repeat(12), "─".repeat(63))
}

/// Prints `records` in their current order.
///
/// Records sorting before the starting point are skipped until the first one
/// at or after it; from then on nothing is filtered. Records without a name
/// are skipped silently. Neither kind of skip counts toward the page.
pub fn render_report<W, T, R>(
    out: &mut W,
    records: &[ProcessRecord],
    options: &ReportOptions,
    terminal: &mut T,
    titles: &R,
) -> io::Result<RenderSummary>
where
    W: Write,
    T: Terminal + ?Sized,
    R: TitleResolver + ?Sized,
{
    let mut summary = RenderSummary::default();
    let page_lines = usize::from(terminal.screen_lines().max(1));
    let mut lines = 0usize;

    let mut filter = match options.sort_order {
        SortOrder::Name => options.starting_point.as_deref(),
        SortOrder::Pid => None,
    };

    write_header(out, options.full_names)?;

    for record in records {
        if let Some(start) = filter {
            if cmp_optional_names(Some(start), record.short_name()) == Ordering::Greater {
                summary.filtered += 1;
                continue;
            }
            filter = None;
        }

        let Some(name) = record.name() else {
            summary.unresolved += 1;
            continue;
        };

        if !options.suppress_more {
            lines += 1;
            if lines > page_lines {
                write!(out, "{MORE_PROMPT}")?;
                out.flush()?;
                let key = terminal.read_key()?;
                write!(out, "{PROMPT_ERASE}")?;
                out.flush()?;
                summary.prompts += 1;

                if key.eq_ignore_ascii_case(&'n') {
                    summary.stopped_early = true;
                    break;
                }
                // The record printed below opens the new page.
                lines = 1;
            }
        }

        let display = if options.full_names {
            name.full()
        } else {
            name.short()
        };
        let pid = record.pid();
        write!(out, "{:3x}     {:3}  {}", pid, pid, display)?;

        if display.eq_ignore_ascii_case(&options.legacy_ident) {
            if let Some(title) = titles.resolve_title(pid) {
                write!(out, "( {} )", title)?;
            }
        }
        writeln!(out)?;
        summary.printed += 1;
    }

    out.flush()?;
    debug!(
        "Rendered {} records ({} before starting point, {} unresolved, {} prompts)",
        summary.printed, summary.filtered, summary.unresolved, summary.prompts
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessName;
    use crate::report::terminal::ScriptedTerminal;
    use crate::report::title::MapTitleResolver;

    fn named(pid: u32, path: &str) -> ProcessRecord {
        let mut r = ProcessRecord::new(1, pid);
        r.set_name(ProcessName::from_owned(path.to_string()));
        r
    }

    fn render(
        records: &[ProcessRecord],
        options: &ReportOptions,
        terminal: &mut ScriptedTerminal,
        titles: &MapTitleResolver,
    ) -> (String, RenderSummary) {
        let mut out = Vec::new();
        let summary = render_report(&mut out, records, options, terminal, titles).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    fn body(output: &str) -> Vec<&str> {
        output.lines().skip(2).collect()
    }

    #[test]
    fn test_header_mentions_full_name_flag() {
        let mut out = Vec::new();
        write_header(&mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("PID(hex/dec) Process Name (use -f for fully qualified names)"));

        let mut out = Vec::new();
        write_header(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next(), Some("PID(hex/dec) Process Name"));
    }

    #[test]
    fn test_line_format_hex_and_decimal() {
        let records = vec![named(0x1f, "C:\\OS2\\PMSHELL.EXE")];
        let options = ReportOptions {
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (text, _) = render(
            &records,
            &options,
            &mut ScriptedTerminal::new(20, ""),
            &MapTitleResolver::new(),
        );
        assert_eq!(body(&text), vec![" 1f      31  PMSHELL.EXE"]);
    }

    #[test]
    fn test_full_names_option() {
        let records = vec![named(3, "C:\\OS2\\CMD.EXE")];
        let options = ReportOptions {
            full_names: true,
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (text, _) = render(
            &records,
            &options,
            &mut ScriptedTerminal::new(20, ""),
            &MapTitleResolver::new(),
        );
        assert_eq!(body(&text), vec!["  3       3  C:\\OS2\\CMD.EXE"]);
    }

    #[test]
    fn test_unresolved_records_are_skipped() {
        let records = vec![ProcessRecord::new(9, 1), named(2, "A"), ProcessRecord::new(9, 3)];
        let (text, summary) = render(
            &records,
            &ReportOptions::default(),
            &mut ScriptedTerminal::new(1, ""),
            &MapTitleResolver::new(),
        );
        assert_eq!(body(&text).len(), 1);
        assert_eq!(summary.unresolved, 2);
        assert_eq!(summary.prompts, 0);
    }

    #[test]
    fn test_starting_point_skips_lower_names_once() {
        let records = vec![
            named(1, "ALPHA"),
            named(2, "beta"),
            named(3, "Cmd"),
            named(4, "Delta"),
        ];
        let options = ReportOptions {
            starting_point: Some("c".into()),
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (text, summary) = render(
            &records,
            &options,
            &mut ScriptedTerminal::new(20, ""),
            &MapTitleResolver::new(),
        );
        assert_eq!(summary.filtered, 2);
        assert_eq!(summary.printed, 2);
        assert!(body(&text)[0].ends_with("Cmd"));
    }

    #[test]
    fn test_filter_never_reactivates() {
        // Not in name order: once "M" passes, the later "A" is still printed.
        let records = vec![named(1, "B"), named(2, "M"), named(3, "A")];
        let options = ReportOptions {
            starting_point: Some("K".into()),
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (_, summary) = render(
            &records,
            &options,
            &mut ScriptedTerminal::new(20, ""),
            &MapTitleResolver::new(),
        );
        assert_eq!(summary.filtered, 1);
        assert_eq!(summary.printed, 2);
    }

    #[test]
    fn test_starting_point_ignored_in_pid_order() {
        let records = vec![named(1, "A"), named(2, "Z")];
        let options = ReportOptions {
            sort_order: SortOrder::Pid,
            starting_point: Some("ZZZ".into()),
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (_, summary) = render(
            &records,
            &options,
            &mut ScriptedTerminal::new(20, ""),
            &MapTitleResolver::new(),
        );
        assert_eq!(summary.printed, 2);
        assert_eq!(summary.filtered, 0);
    }

    #[test]
    fn test_pagination_prompts_per_page() {
        let records: Vec<_> = (1..=5).map(|pid| named(pid, "P")).collect();
        let mut terminal = ScriptedTerminal::new(2, "yy");
        let (text, summary) = render(
            &records,
            &ReportOptions::default(),
            &mut terminal,
            &MapTitleResolver::new(),
        );
        assert_eq!(summary.prompts, 2);
        assert_eq!(summary.printed, 5);
        assert!(!summary.stopped_early);
        assert_eq!(text.matches(MORE_PROMPT).count(), 2);
        assert_eq!(terminal.reads(), 2);
    }

    #[test]
    fn test_answering_n_stops_render() {
        let records: Vec<_> = (1..=5).map(|pid| named(pid, "P")).collect();
        let (_, summary) = render(
            &records,
            &ReportOptions::default(),
            &mut ScriptedTerminal::new(2, "N"),
            &MapTitleResolver::new(),
        );
        assert_eq!(summary.printed, 2);
        assert_eq!(summary.prompts, 1);
        assert!(summary.stopped_early);
    }

    #[test]
    fn test_lowercase_n_also_stops() {
        let records: Vec<_> = (1..=3).map(|pid| named(pid, "P")).collect();
        let (_, summary) = render(
            &records,
            &ReportOptions::default(),
            &mut ScriptedTerminal::new(1, "n"),
            &MapTitleResolver::new(),
        );
        assert_eq!(summary.printed, 1);
    }

    #[test]
    fn test_suppress_more_never_prompts() {
        let records: Vec<_> = (1..=10).map(|pid| named(pid, "P")).collect();
        let mut terminal = ScriptedTerminal::new(1, "n");
        let options = ReportOptions {
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (_, summary) = render(&records, &options, &mut terminal, &MapTitleResolver::new());
        assert_eq!(summary.printed, 10);
        assert_eq!(terminal.reads(), 0);
    }

    #[test]
    fn test_legacy_title_only_for_loader_ident() {
        let records = vec![
            named(0x10, "C:\\OS2\\MDOS\\sysinit"),
            named(0x11, "C:\\OS2\\SYSINIT.EXE"),
            named(0x12, "CMD.EXE"),
        ];
        let titles = MapTitleResolver::new()
            .with_title(0x10, "DOS Window")
            .with_title(0x11, "never shown");
        let options = ReportOptions {
            suppress_more: true,
            ..ReportOptions::default()
        };
        let (text, _) = render(
            &records,
            &options,
            &mut ScriptedTerminal::new(20, ""),
            &titles,
        );
        assert_eq!(titles.queried(), vec![0x10]);
        assert_eq!(body(&text)[0], " 10      16  sysinit( DOS Window )");
        assert_eq!(body(&text)[1], " 11      17  SYSINIT.EXE");
    }

    #[test]
    fn test_legacy_ident_compares_display_name() {
        // With full names the display name carries the path, so no lookup happens.
        let records = vec![named(5, "C:\\SYSINIT")];
        let titles = MapTitleResolver::new().with_title(5, "DOS");
        let options = ReportOptions {
            full_names: true,
            suppress_more: true,
            ..ReportOptions::default()
        };
        render(&records, &options, &mut ScriptedTerminal::new(20, ""), &titles);
        assert!(titles.queried().is_empty());
    }
}
