//! Line format.
//!
//! ```text
//! 2026/01/21 14:30:45 main.rs:42: info: connected to peer
//! ```

use std::fmt::{self, Write};
use std::path::Path;

use chrono::{DateTime, Local};

/// Timestamp format at the start of every line.
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Render one line, newline included.
///
/// `file` is shortened to its final path component. Fails if a `Display`
/// impl inside `message` reports an error; the partial text is discarded.
pub fn render_line(
    ts: DateTime<Local>,
    tag: &str,
    file: &str,
    line: u32,
    message: fmt::Arguments<'_>,
) -> Result<String, fmt::Error> {
    let mut out = String::with_capacity(64);
    writeln!(
        out,
        "{} {}:{}: {}: {}",
        ts.format(TIMESTAMP_FORMAT),
        short_file(file),
        line,
        tag,
        message
    )?;
    Ok(out)
}

fn short_file(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

/// A line read back from a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine<'a> {
    /// `YYYY/MM/DD HH:MM:SS`
    pub ts: &'a str,
    pub file: &'a str,
    pub line: u32,
    /// Level tag such as `info`, or `console`
    pub tag: &'a str,
    pub message: &'a str,
}

impl<'a> LogLine<'a> {
    /// Parse a line produced by [`render_line`]. Returns `None` for anything
    /// else, e.g. continuation lines of a multi-line message.
    pub fn parse(text: &'a str) -> Option<Self> {
        let text = text.trim_end_matches(['\n', '\r']);
        // Timestamp is two space-separated fields of fixed width.
        if text.len() < 20 || !text.is_char_boundary(19) {
            return None;
        }
        let (ts, rest) = text.split_at(19);
        let rest = rest.strip_prefix(' ')?;

        let (location, rest) = rest.split_once(": ")?;
        let (file, line) = location.rsplit_once(':')?;
        let line = line.parse().ok()?;

        let (tag, message) = match rest.split_once(": ") {
            Some((tag, message)) => (tag, message),
            None => (rest.strip_suffix(':')?, ""),
        };
        if tag.is_empty() || tag.contains(' ') {
            return None;
        }

        Some(Self {
            ts,
            file,
            line,
            tag,
            message,
        })
    }
}
