//! Severity-leveled diagnostic log for guardstack.
//!
//! Entries are written either free-standing or inside a session. A session
//! buffers its entries and is printed as a block only when its most severe
//! entry reaches the threshold given to `end`, so routine checks stay quiet
//! and a single warning surfaces the whole context around it.
//!
//! # Architecture
//!
//! - **Severity** (`severity`): `Empty < Ok < Warning < Error` and tag rendering
//! - **Location** (`location`): file/function/line tags and the [`here!`] macro
//! - **Entries** (`entry`): the text line format, with backtrace blocks
//! - **Sessions** (`session`): buffered entries, aggregation, table formatting
//! - **Sinks** (`sink`): append-mode file, console mirrors, writers, JSONL
//! - **Frames** (`trace`): optional symbolized backtraces
//! - **Engine** (`engine`): lifecycle, the session state machine, shared handle
//! - **Configuration** (`config`): environment-driven sink setup

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod location;
pub mod session;
pub mod severity;
pub mod sink;
pub mod trace;

pub use config::LogConfig;
pub use engine::{DiagnosticChannel, DiagnosticLog, Diagnostics, Silent};
pub use entry::LogEntry;
pub use error::LogError;
pub use location::SourceLocation;
pub use session::{LogSession, hex_byte};
pub use severity::{Severity, TagStyle};
pub use sink::SharedBuffer;
