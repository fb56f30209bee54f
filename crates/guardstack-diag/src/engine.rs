//! The diagnostic log engine and its shared handle.
//!
//! [`DiagnosticLog`] owns the sinks and the single open session.
//! [`Diagnostics`] is a cloneable handle to one engine, and is what stacks
//! hold. Both are gated by `start`/`stop`: while stopped, every call is a
//! no-op.
//!
//! Sink failures are fatal. The `try_*` methods return them; every other
//! entry point passes them to [`escalate`].

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::config::LogConfig;
use crate::entry::LogEntry;
use crate::error::{LogError, escalate};
use crate::location::SourceLocation;
use crate::session::{LogSession, table_entries};
use crate::severity::{Severity, TagStyle};
use crate::sink::SinkSet;
use crate::trace::{FrameSource, frame_source};

/// The four operations a diagnosed component consumes.
///
/// Implementors supply `write`, `begin`, `add` and `end`. `add_table` is
/// derived from `add`, and `enabled` is only a formatting hint.
pub trait DiagnosticChannel {

    /// Write one free-standing entry immediately.
    fn write(
        &self,
        message: &str,
        data: &str,
        severity: Severity,
        depth: usize,
        location: SourceLocation,
    );

    /// Open a session.
    fn begin(&self, label: &str, context: &str, location: SourceLocation);

    /// Append to the open session.
    fn add(&self, message: &str, data: &str, severity: Severity, depth: usize);

    /// Close the open session, printing it if it reached `threshold`.
    fn end(&self, threshold: Severity);

    /// False when calls would produce no output; lets callers skip formatting.
    fn enabled(&self) -> bool {
        true
    }

    /// Append a byte array as a wrapped table.
    fn add_table(
        &self,
        message: &str,
        elements: &[u8],
        element_size: usize,
        depth: usize,
        format: &dyn Fn(&[u8]) -> String,
        severity: Severity,
    ) {
        for e in table_entries(message, elements, element_size, depth, format, severity) {
            self.add(&e.message, &e.data, e.severity, e.depth);
        }
    }
}

/// Channel used when diagnostics are compiled out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Silent;

impl DiagnosticChannel for Silent {
    #[inline(always)]
    fn enabled(&self) -> bool {
        false
    }
    #[inline(always)]
    fn write(&self, _: &str, _: &str, _: Severity, _: usize, _: SourceLocation) {}
    #[inline(always)]
    fn begin(&self, _: &str, _: &str, _: SourceLocation) {}
    #[inline(always)]
    fn add(&self, _: &str, _: &str, _: Severity, _: usize) {}
    #[inline(always)]
    fn end(&self, _: Severity) {}
    #[inline(always)]
    fn add_table(
        &self,
        _: &str,
        _: &[u8],
        _: usize,
        _: usize,
        _: &dyn Fn(&[u8]) -> String,
        _: Severity,
    ) {
    }
}

/// Sinks, lifecycle flag and the one permitted open session.
pub struct DiagnosticLog {
    sinks: SinkSet,
    started: bool,
    session: Option<LogSession>,
    frames: Box<dyn FrameSource>,
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("started", &self.started)
            .field("file", &self.sinks.file_path())
            .field("open_session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl DiagnosticLog {
    /// A stopped engine with no sinks and backtraces enabled when available.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: SinkSet::default(),
            started: false,
            session: None,
            frames: frame_source(true),
        }
    }

    /// A stopped engine with the sinks described by `config` opened.
    pub fn from_config(config: &LogConfig) -> Result<Self, LogError> {
        let mut log = Self::new();
        if let Some(path) = &config.file {
            log.sinks.open_file(path)?;
        }
        if let Some(path) = &config.jsonl {
            log.sinks.open_jsonl(path)?;
        }
        log.sinks.set_stdout(config.stdout);
        log.sinks.set_stderr(config.stderr);
        log.frames = frame_source(config.backtrace);
        Ok(log)
    }

    pub fn set_file(&mut self, path: &Path) -> Result<(), LogError> {
        self.sinks.open_file(path)
    }

    pub fn remove_file(&mut self) {
        self.sinks.close_file();
    }

    pub fn set_stdout(&mut self, on: bool) {
        self.sinks.set_stdout(on);
    }

    pub fn set_stderr(&mut self, on: bool) {
        self.sinks.set_stderr(on);
    }

    pub fn attach_writer(&mut self, writer: Box<dyn Write + Send>, style: TagStyle) {
        self.sinks.attach_writer(writer, style);
    }

    pub fn set_jsonl(&mut self, writer: Option<Box<dyn Write + Send>>) {
        self.sinks.set_jsonl(writer);
    }

    pub fn set_frame_source(&mut self, frames: Box<dyn FrameSource>) {
        self.frames = frames;
    }

    #[must_use]
    pub fn sinks(&self) -> &SinkSet {
        &self.sinks
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn has_open_session(&self) -> bool {
        self.session.is_some()
    }

    /// Enable logging and announce it.
    pub fn start(&mut self) {
        self.started = true;
        self.write(
            "Logging was started...",
            "",
            Severity::Empty,
            0,
            crate::here!(),
        );
    }

    /// Close any open session, announce the stop, then disable logging.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        if self.session.is_some() {
            self.end(Severity::Empty);
        }
        self.write(
            "Logging was stopped...",
            "",
            Severity::Empty,
            0,
            crate::here!(),
        );
        self.started = false;
    }

    pub fn write(
        &mut self,
        message: &str,
        data: &str,
        severity: Severity,
        depth: usize,
        location: SourceLocation,
    ) {
        if let Err(e) = self.try_write(message, data, severity, depth, location) {
            escalate(&e);
        }
    }

    pub fn begin(&mut self, label: &str, context: &str, location: SourceLocation) {
        if let Err(e) = self.try_begin(label, context, location) {
            escalate(&e);
        }
    }

    pub fn add(&mut self, message: &str, data: &str, severity: Severity, depth: usize) {
        if let Err(e) = self.try_add(LogEntry::new(message, data, severity, depth)) {
            escalate(&e);
        }
    }

    pub fn add_table(
        &mut self,
        message: &str,
        elements: &[u8],
        element_size: usize,
        depth: usize,
        format: &dyn Fn(&[u8]) -> String,
        severity: Severity,
    ) {
        for entry in table_entries(message, elements, element_size, depth, format, severity) {
            if let Err(e) = self.try_add(entry) {
                escalate(&e);
            }
        }
    }

    pub fn end(&mut self, threshold: Severity) {
        if let Err(e) = self.try_end(threshold) {
            escalate(&e);
        }
    }

    pub fn try_write(
        &mut self,
        message: &str,
        data: &str,
        severity: Severity,
        depth: usize,
        location: SourceLocation,
    ) -> Result<(), LogError> {
        if !self.started {
            return Ok(());
        }
        let entry = LogEntry::new(message, data, severity, depth);
        let frames = if depth == 0 {
            self.frames.capture()
        } else {
            None
        };
        self.sinks.emit(&entry, &location, frames.as_deref())
    }

    /// Open a session. An already-open session is closed first, with a
    /// Warning entry appended and the Empty threshold, so it is printed.
    pub fn try_begin(
        &mut self,
        label: &str,
        context: &str,
        location: SourceLocation,
    ) -> Result<(), LogError> {
        if !self.started {
            return Ok(());
        }
        if let Some(mut stray) = self.session.take() {
            stray.push(LogEntry::new(
                "Session was not ended.",
                "",
                Severity::Warning,
                1,
            ));
            self.flush(&stray, Severity::Empty)?;
        }
        self.session = Some(LogSession::open(label, context, location));
        Ok(())
    }

    /// Append to the open session, or write immediately if none is open.
    pub fn try_add(&mut self, entry: LogEntry) -> Result<(), LogError> {
        if !self.started {
            return Ok(());
        }
        match self.session.as_mut() {
            Some(session) => {
                session.push(entry);
                Ok(())
            }
            None => self.try_write(
                &entry.message,
                &entry.data,
                entry.severity,
                entry.depth,
                SourceLocation::unknown(),
            ),
        }
    }

    pub fn try_end(&mut self, threshold: Severity) -> Result<(), LogError> {
        if !self.started {
            self.session = None;
            return Ok(());
        }
        match self.session.take() {
            Some(session) => self.flush(&session, threshold),
            None => self.try_write(
                "Session has no start point.",
                "--------------------------------------",
                Severity::Warning,
                0,
                SourceLocation::unknown(),
            ),
        }
    }

    fn flush(&mut self, session: &LogSession, threshold: Severity) -> Result<(), LogError> {
        if !session.passes(threshold) {
            return Ok(());
        }
        for entry in session.entries() {
            let frames = if entry.depth == 0 {
                self.frames.capture()
            } else {
                None
            };
            self.sinks
                .emit(entry, session.location(), frames.as_deref())?;
        }
        Ok(())
    }
}

/// Cloneable handle to one shared [`DiagnosticLog`].
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Mutex<DiagnosticLog>>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(log: DiagnosticLog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(log)),
        }
    }

    pub fn from_config(config: &LogConfig) -> Result<Self, LogError> {
        Ok(Self::new(DiagnosticLog::from_config(config)?))
    }

    /// Lock the engine for configuration or direct use.
    pub fn lock(&self) -> MutexGuard<'_, DiagnosticLog> {
        self.inner.lock()
    }

    pub fn start(&self) {
        self.lock().start();
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.lock().is_started()
    }
}

impl DiagnosticChannel for Diagnostics {
    fn enabled(&self) -> bool {
        let log = self.lock();
        log.is_started() && log.sinks().any_active()
    }

    fn write(
        &self,
        message: &str,
        data: &str,
        severity: Severity,
        depth: usize,
        location: SourceLocation,
    ) {
        self.lock().write(message, data, severity, depth, location);
    }

    fn begin(&self, label: &str, context: &str, location: SourceLocation) {
        self.lock().begin(label, context, location);
    }

    fn add(&self, message: &str, data: &str, severity: Severity, depth: usize) {
        self.lock().add(message, data, severity, depth);
    }

    fn end(&self, threshold: Severity) {
        self.lock().end(threshold);
    }

    fn add_table(
        &self,
        message: &str,
        elements: &[u8],
        element_size: usize,
        depth: usize,
        format: &dyn Fn(&[u8]) -> String,
        severity: Severity,
    ) {
        self.lock()
            .add_table(message, elements, element_size, depth, format, severity);
    }
}

impl<C: DiagnosticChannel> DiagnosticChannel for Option<C> {
    fn enabled(&self) -> bool {
        self.as_ref().is_some_and(DiagnosticChannel::enabled)
    }

    fn write(
        &self,
        message: &str,
        data: &str,
        severity: Severity,
        depth: usize,
        location: SourceLocation,
    ) {
        if let Some(c) = self {
            c.write(message, data, severity, depth, location);
        }
    }

    fn begin(&self, label: &str, context: &str, location: SourceLocation) {
        if let Some(c) = self {
            c.begin(label, context, location);
        }
    }

    fn add(&self, message: &str, data: &str, severity: Severity, depth: usize) {
        if let Some(c) = self {
            c.add(message, data, severity, depth);
        }
    }

    fn end(&self, threshold: Severity) {
        if let Some(c) = self {
            c.end(threshold);
        }
    }

    fn add_table(
        &self,
        message: &str,
        elements: &[u8],
        element_size: usize,
        depth: usize,
        format: &dyn Fn(&[u8]) -> String,
        severity: Severity,
    ) {
        if let Some(c) = self {
            c.add_table(message, elements, element_size, depth, format, severity);
        }
    }
}
