//! Output sinks: append-mode file, console mirrors, extra writers, JSONL.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::entry::LogEntry;
use crate::error::LogError;
use crate::location::SourceLocation;
use crate::severity::{Severity, TagStyle};

/// Cloneable in-memory writer; every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One JSONL line mirroring a rendered entry.
#[derive(Debug, Serialize)]
pub struct LogRecord<'a> {
    pub severity: Severity,
    pub depth: usize,
    pub message: &'a str,
    pub data: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<&'a SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<&'a [String]>,
}

struct WriterSink {
    writer: Box<dyn Write + Send>,
    style: TagStyle,
}

struct FileSink {
    path: PathBuf,
    file: File,
}

/// Every active destination for rendered entries.
#[derive(Default)]
pub struct SinkSet {
    file: Option<FileSink>,
    stdout: bool,
    stderr: bool,
    writers: Vec<WriterSink>,
    jsonl: Option<Box<dyn Write + Send>>,
}

impl SinkSet {
    /// Open `path` in append mode, replacing any previous file sink.
    pub fn open_file(&mut self, path: &Path) -> Result<(), LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::OpenFile {
                path: path.display().to_string(),
                source,
            })?;
        self.file = Some(FileSink {
            path: path.to_path_buf(),
            file,
        });
        Ok(())
    }

    pub fn close_file(&mut self) {
        self.file = None;
    }

    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path.as_path())
    }

    pub fn set_stdout(&mut self, on: bool) {
        self.stdout = on;
    }

    pub fn set_stderr(&mut self, on: bool) {
        self.stderr = on;
    }

    pub fn attach_writer(&mut self, writer: Box<dyn Write + Send>, style: TagStyle) {
        self.writers.push(WriterSink { writer, style });
    }

    pub fn set_jsonl(&mut self, writer: Option<Box<dyn Write + Send>>) {
        self.jsonl = writer;
    }

    /// Open `path` in append mode as the JSONL mirror.
    pub fn open_jsonl(&mut self, path: &Path) -> Result<(), LogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LogError::OpenFile {
                path: path.display().to_string(),
                source,
            })?;
        self.jsonl = Some(Box::new(file));
        Ok(())
    }

    /// Write one entry to every active sink.
    pub fn emit(
        &mut self,
        entry: &LogEntry,
        location: &SourceLocation,
        frames: Option<&[String]>,
    ) -> Result<(), LogError> {
        if let Some(sink) = self.file.as_mut() {
            entry.render(&mut sink.file, location, TagStyle::Plain, frames)?;
            sink.file.flush()?;
        }
        if self.stdout {
            let mut out = io::stdout().lock();
            entry.render(&mut out, location, TagStyle::Colored, frames)?;
        }
        if self.stderr {
            let mut err = io::stderr().lock();
            entry.render(&mut err, location, TagStyle::Colored, frames)?;
        }
        for sink in &mut self.writers {
            entry.render(sink.writer.as_mut(), location, sink.style, frames)?;
            sink.writer.flush()?;
        }
        if let Some(jsonl) = self.jsonl.as_mut() {
            let top = entry.depth == 0;
            let record = LogRecord {
                severity: entry.severity,
                depth: entry.depth,
                message: &entry.message,
                data: &entry.data,
                location: top.then_some(location),
                frames: if top { frames } else { None },
            };
            let line = serde_json::to_string(&record)?;
            writeln!(jsonl, "{line}")?;
            jsonl.flush()?;
        }
        Ok(())
    }

    /// True when at least one destination would receive output.
    #[must_use]
    pub fn any_active(&self) -> bool {
        self.file.is_some()
            || self.stdout
            || self.stderr
            || !self.writers.is_empty()
            || self.jsonl.is_some()
    }
}
