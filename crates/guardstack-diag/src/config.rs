//! Log sink configuration.
//!
//! Read from the environment by [`LogConfig::from_env`]:
//! - `GUARDSTACK_LOG_FILE`: append-mode text sink path.
//! - `GUARDSTACK_LOG_JSONL`: append-mode JSONL mirror path.
//! - `GUARDSTACK_LOG_STDOUT`, `GUARDSTACK_LOG_STDERR`: console mirrors.
//! - `GUARDSTACK_LOG_BACKTRACE`: attach backtraces to depth-0 entries
//!   (default on).
//!
//! Boolean variables accept `1|true|on|yes` and `0|false|off|no`, any case.

use std::path::PathBuf;

pub const ENV_FILE: &str = "GUARDSTACK_LOG_FILE";
pub const ENV_JSONL: &str = "GUARDSTACK_LOG_JSONL";
pub const ENV_STDOUT: &str = "GUARDSTACK_LOG_STDOUT";
pub const ENV_STDERR: &str = "GUARDSTACK_LOG_STDERR";
pub const ENV_BACKTRACE: &str = "GUARDSTACK_LOG_BACKTRACE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub jsonl: Option<PathBuf>,
    pub stdout: bool,
    pub stderr: bool,
    pub backtrace: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            jsonl: None,
            stdout: false,
            stderr: false,
            backtrace: true,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unknown or unset keys keep defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default)
        };
        Self {
            file: lookup(ENV_FILE).filter(|v| !v.is_empty()).map(PathBuf::from),
            jsonl: lookup(ENV_JSONL).filter(|v| !v.is_empty()).map(PathBuf::from),
            stdout: flag(ENV_STDOUT, defaults.stdout),
            stderr: flag(ENV_STDERR, defaults.stderr),
            backtrace: flag(ENV_BACKTRACE, defaults.backtrace),
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_jsonl(mut self, path: impl Into<PathBuf>) -> Self {
        self.jsonl = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_stdout(mut self, on: bool) -> Self {
        self.stdout = on;
        self
    }

    #[must_use]
    pub fn with_stderr(mut self, on: bool) -> Self {
        self.stderr = on;
        self
    }

    #[must_use]
    pub fn with_backtrace(mut self, on: bool) -> Self {
        self.backtrace = on;
        self
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
