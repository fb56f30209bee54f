//! Buffered, severity-aggregating log sessions.
//!
//! A session collects entries in order and is flushed or discarded as a
//! unit when it ends. Its header entry is the label passed to `begin`.

use crate::entry::LogEntry;
use crate::location::SourceLocation;
use crate::severity::Severity;

/// Wrap width of table lines, in characters.
pub const TABLE_LINE_WIDTH: usize = 40;

/// Data text of the header entry above a table.
pub const TABLE_BANNER: &str = "==============> Values <==============";

/// An open session: ordered entries plus their aggregated severity.
#[derive(Debug, Clone)]
pub struct LogSession {
    location: SourceLocation,
    entries: Vec<LogEntry>,
    severity: Severity,
}

impl LogSession {
    /// Open a session whose header is `{label, context, Empty, depth 0}`.
    #[must_use]
    pub fn open(label: &str, context: &str, location: SourceLocation) -> Self {
        Self {
            location,
            entries: vec![LogEntry::new(label, context, Severity::Empty, 0)],
            severity: Severity::Empty,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.severity.escalate(entry.severity);
        self.entries.push(entry);
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// True when the session must be printed under `threshold`.
    #[must_use]
    pub fn passes(&self, threshold: Severity) -> bool {
        self.severity >= threshold
    }
}

/// Entries for a table: one header at `depth`, then wrapped lines.
///
/// `elements` is split into `element_size` chunks, each rendered by
/// `format`. Lines are Empty-severity children at `depth + 1`. An empty or
/// misaligned array yields a single Warning entry instead.
#[must_use]
pub fn table_entries(
    message: &str,
    elements: &[u8],
    element_size: usize,
    depth: usize,
    format: &dyn Fn(&[u8]) -> String,
    severity: Severity,
) -> Vec<LogEntry> {
    if elements.is_empty() {
        return vec![LogEntry::new(
            "Size of logging array must be positive.",
            "",
            Severity::Warning,
            depth,
        )];
    }
    if element_size == 0 || elements.len() % element_size != 0 {
        return vec![LogEntry::new(
            "Logging array is misaligned.",
            format!("len = {}, element_size = {element_size}", elements.len()),
            Severity::Warning,
            depth,
        )];
    }

    let mut entries = vec![LogEntry::new(message, TABLE_BANNER, severity, depth)];
    entries.extend(
        table_lines(elements, element_size, format)
            .into_iter()
            .map(|line| LogEntry::new("", line, Severity::Empty, depth + 1)),
    );
    entries
}

/// Format `elements` into lines of roughly [`TABLE_LINE_WIDTH`] characters.
#[must_use]
pub fn table_lines(
    elements: &[u8],
    element_size: usize,
    format: &dyn Fn(&[u8]) -> String,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for chunk in elements.chunks_exact(element_size) {
        if !line.is_empty() {
            line.push_str("  ");
        }
        line.push_str(&format(chunk));
        if line.chars().count() >= TABLE_LINE_WIDTH {
            lines.push(std::mem::take(&mut line));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Uppercase hex formatter for one-byte elements.
#[must_use]
pub fn hex_byte(chunk: &[u8]) -> String {
    chunk.iter().map(|b| format!("{b:X}")).collect()
}
