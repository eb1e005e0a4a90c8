//! Terminal geometry and single-key input for the more-prompt.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Read};

use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices};
use tracing::debug;

/// Rows assumed when the terminal size cannot be queried.
pub const DEFAULT_SCREEN_LINES: u16 = 25;
/// Rows reserved for the header and the prompt itself.
pub const SCREEN_LINE_OVERHEAD: u16 = 3;

/// Terminal capabilities the report renderer depends on.
pub trait Terminal {
    /// Number of report lines that fit on one page.
    fn screen_lines(&self) -> u16;

    /// Blocks until one key is pressed and returns it.
    fn read_key(&mut self) -> io::Result<char>;
}

/// The controlling terminal of this process.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleTerminal {
    default_lines: u16,
    overhead: u16,
}

impl Default for ConsoleTerminal {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN_LINES, SCREEN_LINE_OVERHEAD)
    }
}

impl ConsoleTerminal {
    pub fn new(default_lines: u16, overhead: u16) -> Self {
        Self {
            default_lines,
            overhead,
        }
    }
}

/// Rows of the terminal attached to stdout, if any.
fn query_rows() -> Option<u16> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    // SAFETY: TIOCGWINSZ only writes a winsize into the struct we pass.
    let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    (rc == 0 && ws.ws_row > 0).then_some(ws.ws_row)
}

/// Reads one byte with canonical mode and echo off, restoring the mode after.
fn read_raw_key() -> io::Result<char> {
    let stdin = io::stdin();
    let saved = termios::tcgetattr(&stdin)?;

    let mut raw = saved.clone();
    raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw)?;

    let mut byte = [0u8; 1];
    let read = stdin.lock().read(&mut byte);
    termios::tcsetattr(&stdin, SetArg::TCSANOW, &saved)?;

    Ok(match read? {
        0 => '\0',
        _ => char::from(byte[0]),
    })
}

/// Piped input: take the first character of the next line.
fn read_line_key() -> io::Result<char> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.chars().next().unwrap_or('\0'))
}

impl Terminal for ConsoleTerminal {
    fn screen_lines(&self) -> u16 {
        match query_rows() {
            Some(rows) => rows.saturating_sub(self.overhead),
            None => {
                debug!(
                    "Terminal size unavailable, assuming {} rows",
                    self.default_lines
                );
                self.default_lines.saturating_sub(self.overhead)
            }
        }
    }

    fn read_key(&mut self) -> io::Result<char> {
        if io::stdin().is_terminal() {
            read_raw_key()
        } else {
            read_line_key()
        }
    }
}

/// Terminal with a fixed page size that answers prompts from a script.
///
/// Once the script runs out every prompt is answered with `Y`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTerminal {
    lines: u16,
    keys: VecDeque<char>,
    reads: usize,
}

impl ScriptedTerminal {
    pub fn new(lines: u16, keys: &str) -> Self {
        Self {
            lines,
            keys: keys.chars().collect(),
            reads: 0,
        }
    }

    /// Number of keys read so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Terminal for ScriptedTerminal {
    fn screen_lines(&self) -> u16 {
        self.lines
    }

    fn read_key(&mut self) -> io::Result<char> {
        self.reads += 1;
        Ok(self.keys.pop_front().unwrap_or('Y'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_terminal_replays_keys() {
        let mut term = ScriptedTerminal::new(4, "yn");
        assert_eq!(term.screen_lines(), 4);
        assert_eq!(term.read_key().unwrap(), 'y');
        assert_eq!(term.read_key().unwrap(), 'n');
        assert_eq!(term.read_key().unwrap(), 'Y');
        assert_eq!(term.reads(), 3);
    }

    #[test]
    fn test_console_defaults() {
        let term = ConsoleTerminal::default();
        assert_eq!(term.default_lines, DEFAULT_SCREEN_LINES);
        assert_eq!(term.overhead, SCREEN_LINE_OVERHEAD);
    }
}
