//! Diagnostic I/O failures.
//!
//! These are the only failures in the workspace that are not handed back to
//! the caller: the public log entry points escalate them via [`escalate`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("jsonl encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Terminate the process after a sink failure.
pub fn escalate(err: &LogError) -> ! {
    eprintln!("Logging failed!!! The program was interrupted: {err}");
    std::process::abort()
}
