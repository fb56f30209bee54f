//! Per-stack configuration.
//!
//! The process default integrity policy is set via `GUARDSTACK_INTEGRITY`:
//! - `report` (default): content violations found before an operation are
//!   reported and the operation proceeds.
//! - `reject`: any violation aborts the operation with its error.
//!
//! Structural failures (released handle, bad data buffer, broken geometry)
//! abort under both policies.

use std::sync::OnceLock;

pub const ENV_INTEGRITY: &str = "GUARDSTACK_INTEGRITY";

/// What push/pop/top do when the pre-check finds a content violation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityPolicy {
    #[default]
    Report,
    Reject,
}

impl IntegrityPolicy {
    /// Parse from string (case-insensitive). Unknown values give `Report`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "strict" | "abort" | "fail" => Self::Reject,
            _ => Self::Report,
        }
    }

    #[must_use]
    pub const fn rejects(self) -> bool {
        matches!(self, Self::Reject)
    }
}

static GLOBAL_POLICY: OnceLock<IntegrityPolicy> = OnceLock::new();

/// Process default policy (reads the env var on first call, caches thereafter).
#[must_use]
pub fn integrity_policy() -> IntegrityPolicy {
    *GLOBAL_POLICY.get_or_init(|| {
        std::env::var(ENV_INTEGRITY)
            .map(|v| IntegrityPolicy::from_str_loose(&v))
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackConfig {
    pub integrity: IntegrityPolicy,
    /// Upper bound on the slot buffer length, guards included.
    pub max_buffer_bytes: Option<usize>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            integrity: integrity_policy(),
            max_buffer_bytes: None,
        }
    }
}

impl StackConfig {
    #[must_use]
    pub fn with_integrity(mut self, integrity: IntegrityPolicy) -> Self {
        self.integrity = integrity;
        self
    }

    #[must_use]
    pub fn with_max_buffer_bytes(mut self, max: usize) -> Self {
        self.max_buffer_bytes = Some(max);
        self
    }
}
