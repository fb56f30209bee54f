//! Log entries and their text rendering.

use std::io::{self, Write};

use serde::Serialize;

use crate::location::SourceLocation;
use crate::severity::{Severity, TagStyle};

/// Banner opening a backtrace block under a depth-0 entry.
pub const TRACE_BANNER: &str = "============> STACK TRACE <=============";

/// One diagnostic line pair: a message and its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub data: String,
    pub severity: Severity,
    pub depth: usize,
}

impl LogEntry {
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        data: impl Into<String>,
        severity: Severity,
        depth: usize,
    ) -> Self {
        Self {
            message: message.into(),
            data: data.into(),
            severity,
            depth,
        }
    }

    /// Write this entry in the sink line format.
    ///
    /// Depth-0 entries carry the location and, when `frames` is given, a
    /// backtrace block. Deeper entries are tab-indented and location-free.
    pub fn render(
        &self,
        out: &mut dyn Write,
        location: &SourceLocation,
        style: TagStyle,
        frames: Option<&[String]>,
    ) -> io::Result<()> {
        let indent = "\t".repeat(self.depth);
        let tag = self.severity.styled_tag(style);
        let lead = if tag.is_empty() {
            String::new()
        } else {
            format!("{tag} ")
        };

        if self.depth == 0 {
            writeln!(
                out,
                "{lead}In {}: {}():{}: {}",
                location.file, location.function, location.line, self.message
            )?;
        } else {
            writeln!(out, "{indent}{lead}{}", self.message)?;
        }
        writeln!(out, "{indent}{}", self.data)?;
        writeln!(out)?;

        if self.depth == 0
            && let Some(frames) = frames
        {
            writeln!(out, "{TRACE_BANNER}")?;
            for frame in frames {
                writeln!(out, "{frame}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Render into a `String` (plain tags, no backtrace).
    #[must_use]
    pub fn render_plain(&self, location: &SourceLocation) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.render(&mut buf, location, TagStyle::Plain, None);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
