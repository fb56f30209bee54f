//! Stack failure classes.

use serde::Serialize;
use thiserror::Error;

/// A failed integrity check, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Element size, size or capacity out of their invariants.
    Geometry,
    /// Guard words around the control block.
    ControlGuard,
    /// Guard words around the slot buffer.
    BufferGuard,
    /// Unused slots no longer hold the poison byte.
    Padding,
    /// Stored checksum differs from the recomputed one.
    Checksum,
}

impl Violation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geometry => "geometry",
            Self::ControlGuard => "control guard",
            Self::BufferGuard => "buffer guard",
            Self::Padding => "padding",
            Self::Checksum => "checksum",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack handle is released or the value region is unreadable")]
    InvalidHandle,
    #[error("stack data buffer is inconsistent with its size")]
    InvalidDataPointer,
    #[error("stack is empty")]
    Empty,
    #[error("cannot allocate {bytes} bytes for capacity {capacity}")]
    AllocationError { capacity: usize, bytes: usize },
    #[error("integrity violation: {0}")]
    IntegrityViolation(Violation),
    #[error("element size must be positive")]
    InvalidElementSize,
}

impl StackError {
    /// Failures after which the buffer cannot be indexed safely.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidHandle
                | Self::InvalidDataPointer
                | Self::IntegrityViolation(Violation::Geometry)
        )
    }

    #[must_use]
    pub const fn violation(&self) -> Option<Violation> {
        match self {
            Self::IntegrityViolation(v) => Some(*v),
            _ => None,
        }
    }
}

/// Every violation found by one inspection, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    #[must_use]
    pub fn is_intact(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<Violation> {
        self.violations.first().copied()
    }

    #[must_use]
    pub fn contains(&self, violation: Violation) -> bool {
        self.violations.contains(&violation)
    }
}
