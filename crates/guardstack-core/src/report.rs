//! Glue between stack checks and the diagnostic channel.

use guardstack_diag::{DiagnosticChannel, Severity, SourceLocation, hex_byte};

/// Channel a stack reports through.
#[cfg(feature = "diagnostics")]
pub type Channel = Option<guardstack_diag::Diagnostics>;

/// Channel a stack reports through.
#[cfg(not(feature = "diagnostics"))]
pub type Channel = guardstack_diag::Silent;

/// Threshold every validation session is closed with.
pub const SESSION_THRESHOLD: Severity = Severity::Warning;

/// Formats entry data only when the channel would print it.
pub(crate) struct Reporter<'a, C: DiagnosticChannel + ?Sized> {
    channel: &'a C,
    on: bool,
}

impl<'a, C: DiagnosticChannel + ?Sized> Reporter<'a, C> {
    pub(crate) fn new(channel: &'a C) -> Self {
        Self {
            channel,
            on: channel.enabled(),
        }
    }

    pub(crate) fn begin(
        &self,
        label: &str,
        context: impl FnOnce() -> String,
        location: SourceLocation,
    ) {
        if self.on {
            self.channel.begin(label, &context(), location);
        }
    }

    pub(crate) fn add(
        &self,
        message: &str,
        data: impl FnOnce() -> String,
        severity: Severity,
        depth: usize,
    ) {
        if self.on {
            self.channel.add(message, &data(), severity, depth);
        }
    }

    /// Add `good` at Ok or `bad` at `bad_severity`; returns `ok`.
    pub(crate) fn check(
        &self,
        ok: bool,
        good: &str,
        bad: &str,
        bad_severity: Severity,
        depth: usize,
        data: impl FnOnce() -> String,
    ) -> bool {
        if ok {
            self.add(good, data, Severity::Ok, depth);
        } else {
            self.add(bad, data, bad_severity, depth);
        }
        ok
    }

    /// Byte table, one hex cell per byte.
    pub(crate) fn table(&self, message: &str, bytes: &[u8], severity: Severity, depth: usize) {
        if self.on {
            self.channel
                .add_table(message, bytes, 1, depth, &hex_byte, severity);
        }
    }

    pub(crate) fn end(&self) {
        if self.on {
            self.channel.end(SESSION_THRESHOLD);
        }
    }

    /// Free-standing Error entry outside any session.
    pub(crate) fn fail(
        &self,
        message: &str,
        data: impl FnOnce() -> String,
        location: SourceLocation,
    ) {
        if self.on {
            self.channel
                .write(message, &data(), Severity::Error, 0, location);
        }
    }
}
