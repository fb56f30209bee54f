//! Ordinal severity of a diagnostic entry.
//!
//! ```text
//! Empty < Ok < Warning < Error
//! ```
//!
//! Sessions aggregate the maximum severity of their entries and compare it
//! against the closing threshold, so the derived `Ord` is load-bearing.

use serde::{Deserialize, Serialize};

const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Severity of a log entry.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    /// Untagged informational line.
    #[default]
    Empty = 0,
    /// A check that passed.
    Ok = 1,
    /// Suspicious state; always surfaced by validation sessions.
    Warning = 2,
    /// Definite failure.
    Error = 3,
}

/// How severity tags are rendered for a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStyle {
    /// Bare tags, used for files and captured writers.
    Plain,
    /// ANSI-colored tags, used for console mirrors.
    Colored,
}

impl Severity {
    /// The bare tag printed before a message. Empty severity has no tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Ok => "[OK]:",
            Self::Warning => "==> WARNING:",
            Self::Error => "!!! ERROR:",
        }
    }

    const fn color(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Ok => GREEN,
            Self::Warning => YELLOW,
            Self::Error => RED,
        }
    }

    /// Render the tag in the requested style.
    #[must_use]
    pub fn styled_tag(self, style: TagStyle) -> String {
        match (style, self) {
            (_, Self::Empty) | (TagStyle::Plain, _) => self.tag().to_string(),
            (TagStyle::Colored, _) => format!("{}{}{RESET}", self.color(), self.tag()),
        }
    }

    /// Raise `self` to `other` if `other` is more severe.
    pub fn escalate(&mut self, other: Self) {
        if other > *self {
            *self = other;
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}
