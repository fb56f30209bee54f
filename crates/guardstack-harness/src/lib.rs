//! Scenarios behind the `guardstack` CLI.
//!
//! Each scenario builds stacks, optionally damages them through
//! [`Tamper`], and reports what the stack did. The binary only parses
//! arguments and wires sinks.

use std::io::Write;

use guardstack_core::{
    GuardSide, HardenedStack, IntegrityPolicy, IntegrityReport, StackConfig, StackError, Tamper,
};
use guardstack_diag::{Diagnostics, LogError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("stack: {0}")]
    Stack(#[from] StackError),
    #[error("log: {0}")]
    Log(#[from] LogError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown corruption kind: {0}")]
    UnknownCorruption(String),
}

/// Damage applied between the push and pop phases of a scenario.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Corruption {
    #[default]
    Checksum,
    ControlGuard,
    BufferGuard,
    Padding,
    None,
}

impl Corruption {
    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Result<Self, HarnessError> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "checksum" | "hash" => Ok(Self::Checksum),
            "control-guard" | "control" => Ok(Self::ControlGuard),
            "buffer-guard" | "buffer" => Ok(Self::BufferGuard),
            "padding" | "poison" => Ok(Self::Padding),
            "none" | "off" => Ok(Self::None),
            _ => Err(HarnessError::UnknownCorruption(s.to_string())),
        }
    }

    /// Apply to `stack`; false when the damage had nowhere to land.
    pub fn apply(self, stack: &mut HardenedStack) -> bool {
        match self {
            Self::Checksum => {
                stack.flip_checksum(u64::MAX);
                true
            }
            Self::ControlGuard => {
                stack.overwrite_control_guard(GuardSide::Left, 0);
                true
            }
            Self::BufferGuard => stack.overwrite_buffer_guard(GuardSide::Right, 0),
            Self::Padding => stack.poke_padding(0, 0),
            Self::None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub count: i32,
    pub corruption: Corruption,
    pub integrity: IntegrityPolicy,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            count: 10,
            corruption: Corruption::Checksum,
            integrity: IntegrityPolicy::Report,
        }
    }
}

/// What one pop of the demo returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PopResult {
    Value { value: i32 },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoOutcome {
    pub pushed: usize,
    pub size_after_push: usize,
    pub corruption: Corruption,
    pub corruption_applied: bool,
    pub pops: Vec<PopResult>,
    pub report_after: Option<IntegrityReport>,
    /// Error returned by the final `deconstruct`, if any.
    pub teardown_error: Option<String>,
}

/// Push `1..=count` as 4-byte integers, corrupt, then pop `count + 1` times.
///
/// Popped values are printed to `out`, one per line.
pub fn run_demo(
    options: &DemoOptions,
    diagnostics: &Diagnostics,
    out: &mut dyn Write,
) -> Result<DemoOutcome, HarnessError> {
    let mut stack = HardenedStack::construct("my_stack", 4)?
        .with_config(StackConfig::default().with_integrity(options.integrity))
        .with_diagnostics(diagnostics.clone());

    for i in 1..=options.count {
        stack.push(&i.to_le_bytes())?;
    }
    let size_after_push = stack.size_checked()?;
    writeln!(out, "Stack size = {size_after_push}")?;

    let corruption_applied = options.corruption.apply(&mut stack);

    let mut pops = Vec::new();
    let mut slot = [0u8; 4];
    for _ in 0..=options.count {
        match stack.pop(&mut slot) {
            Ok(()) => {
                let value = i32::from_le_bytes(slot);
                writeln!(out, "{value}")?;
                pops.push(PopResult::Value { value });
            }
            Err(err) => {
                writeln!(out, "pop failed: {err}")?;
                pops.push(PopResult::Failed {
                    error: err.to_string(),
                });
            }
        }
    }

    let report_after = stack.inspect().ok();
    let teardown_error = match stack.deconstruct() {
        Ok(()) => None,
        Err(err) => {
            writeln!(out, "deconstruct failed: {err}")?;
            Some(err.to_string())
        }
    };

    Ok(DemoOutcome {
        pushed: usize::try_from(options.count.max(0)).unwrap_or_default(),
        size_after_push,
        corruption: options.corruption,
        corruption_applied,
        pops,
        report_after,
        teardown_error,
    })
}

/// One capacity change observed while filling or draining a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrowthStep {
    pub phase: Phase,
    pub size: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Fill,
    Drain,
}

/// Capacity transitions over `pushes` pushes followed by as many pops.
pub fn growth_trace(element_size: usize, pushes: usize) -> Result<Vec<GrowthStep>, HarnessError> {
    let mut stack = HardenedStack::construct("growth", element_size)?;
    let value = vec![0u8; element_size];
    let mut out = vec![0u8; element_size];
    let mut steps = vec![GrowthStep {
        phase: Phase::Fill,
        size: 0,
        capacity: stack.capacity(),
    }];

    let mut record = |stack: &HardenedStack, phase| {
        if steps.last().map(|s| s.capacity) != Some(stack.capacity()) {
            steps.push(GrowthStep {
                phase,
                size: stack.size(),
                capacity: stack.capacity(),
            });
        }
    };

    for _ in 0..pushes {
        stack.push(&value)?;
        record(&stack, Phase::Fill);
    }
    for _ in 0..pushes {
        stack.pop(&mut out)?;
        record(&stack, Phase::Drain);
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_corruption_kinds() {
        assert_eq!(
            Corruption::from_str_loose("checksum").unwrap(),
            Corruption::Checksum
        );
        assert_eq!(
            Corruption::from_str_loose("Control_Guard").unwrap(),
            Corruption::ControlGuard
        );
        assert_eq!(
            Corruption::from_str_loose("poison").unwrap(),
            Corruption::Padding
        );
        assert!(Corruption::from_str_loose("bogus").is_err());
    }

    #[test]
    fn growth_trace_climbs_and_descends() {
        let steps = growth_trace(4, 300).unwrap();
        let caps: Vec<usize> = steps.iter().map(|s| s.capacity).collect();
        assert_eq!(
            caps,
            [1, 3, 7, 15, 31, 63, 127, 255, 511, 255, 127, 63, 31, 15, 7, 3, 1]
        );
        assert!(steps.iter().take(9).all(|s| s.phase == Phase::Fill));
        assert!(steps.iter().skip(9).all(|s| s.phase == Phase::Drain));
    }
}
