//! Full integrity validation of a stack.
//!
//! Checks run in a fixed order; the first failure decides the result:
//!
//! 1. handle state
//! 2. element size and size/capacity geometry
//! 3. control-block guard words
//! 4. data buffer presence and readability
//! 5. buffer guard words (non-empty stacks)
//! 6. poison fill of unused slots (non-empty stacks)
//! 7. checksum
//!
//! With diagnostics enabled one "Stack checking..." session narrates every
//! check and is printed when any of them reaches Warning.

use guardstack_diag::{DiagnosticChannel, Severity, Silent, SourceLocation};

use crate::error::{IntegrityReport, StackError, Violation};
use crate::layout::{GUARD_WORD, POISON};
use crate::probe::is_readable;
use crate::report::Reporter;
use crate::stack::{HardenedStack, Storage};

/// Ordered failures of one audit.
#[derive(Debug, Default)]
struct Findings {
    failures: Vec<StackError>,
}

impl Findings {
    fn flag(&mut self, violation: Violation) {
        let err = StackError::IntegrityViolation(violation);
        if !self.failures.contains(&err) {
            self.failures.push(err);
        }
    }

    fn first(&self) -> Option<&StackError> {
        self.failures.first()
    }

    fn first_structural(&self) -> Option<&StackError> {
        self.failures.iter().find(|e| e.is_structural())
    }
}

impl HardenedStack {
    /// Run every check and report through the attached diagnostics.
    #[track_caller]
    pub fn validate(&self) -> Result<(), StackError> {
        self.validate_at(SourceLocation::caller("validate"))
    }

    /// [`validate`](Self::validate) with an explicit location tag.
    pub fn validate_at(&self, location: SourceLocation) -> Result<(), StackError> {
        match self.audit(&self.diagnostics, location).first() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Every violation, silently. Handle and data-buffer failures are errors
    /// because nothing past them can be checked.
    pub fn inspect(&self) -> Result<IntegrityReport, StackError> {
        let findings = self.audit(&Silent, SourceLocation::unknown());
        if let Some(err) = findings
            .failures
            .iter()
            .find(|e| matches!(e, StackError::InvalidHandle | StackError::InvalidDataPointer))
        {
            return Err(err.clone());
        }
        Ok(IntegrityReport {
            violations: findings
                .failures
                .iter()
                .filter_map(StackError::violation)
                .collect(),
        })
    }

    /// Validation run ahead of push/pop/top.
    ///
    /// Returns whether the stack was intact, which gates the reseal.
    pub(crate) fn precheck(&self, location: SourceLocation) -> Result<bool, StackError> {
        let findings = self.audit(&self.diagnostics, location);
        if let Some(err) = findings.first_structural() {
            return Err(err.clone());
        }
        match findings.first() {
            None => Ok(true),
            Some(err) if self.config.integrity.rejects() => Err(err.clone()),
            Some(_) => Ok(false),
        }
    }

    fn audit<C: DiagnosticChannel + ?Sized>(
        &self,
        channel: &C,
        location: SourceLocation,
    ) -> Findings {
        let log = Reporter::new(channel);
        let name = self.name.as_str();
        let mut findings = Findings::default();

        if !self.handle.is_live() {
            log.fail("Stack handle is released!", || format!("stack {name}"), location);
            findings.failures.push(StackError::InvalidHandle);
            return findings;
        }

        log.begin("Stack checking...", || format!("stack {name}"), location);
        log.add(
            "Stack handle is live.",
            || format!("{name} = {:p}", self),
            Severity::Ok,
            1,
        );

        let element_ok = log.check(
            self.element_size > 0,
            "Element size is good.",
            "Element size incorrect!",
            Severity::Error,
            2,
            || format!("{name}.element_size = {}", self.element_size),
        );
        if !element_ok {
            findings.flag(Violation::Geometry);
        }

        let shape_ok = log.check(
            self.capacity >= 1
                && if self.size == 0 {
                    self.capacity == 1
                } else {
                    self.size < self.capacity
                },
            "Size and capacity values are good.",
            "Size or capacity incorrect!",
            Severity::Error,
            2,
            || format!("{name}.size = {}, {name}.capacity = {}", self.size, self.capacity),
        );
        if !shape_ok {
            findings.flag(Violation::Geometry);
        }

        if cfg!(feature = "guards")
            && !log.check(
                self.control_head == GUARD_WORD && self.control_tail == GUARD_WORD,
                "Control guards are good.",
                "Control guards incorrect!",
                Severity::Warning,
                2,
                || {
                    format!(
                        "{name}.head = {:x}, {name}.tail = {:x}, GUARD = {GUARD_WORD:x}",
                        self.control_head, self.control_tail
                    )
                },
            )
        {
            findings.flag(Violation::ControlGuard);
        }

        let data_ok = match (&self.storage, self.size) {
            (Storage::Unallocated, 0) => true,
            (Storage::Allocated(buf), 1..) => {
                buf.capacity() == self.capacity
                    && self
                        .layout()
                        .total_bytes(self.capacity)
                        .is_some_and(|len| is_readable(buf.bytes(), len))
            }
            _ => false,
        };
        let data_text = || match &self.storage {
            Storage::Unallocated => format!("{name}.data = unallocated"),
            Storage::Allocated(buf) => format!(
                "{name}.data = {:p}, {} bytes",
                buf.bytes().as_ptr(),
                buf.bytes().len()
            ),
        };
        if !log.check(
            data_ok,
            "Stack data is good.",
            "Stack data is bad!",
            Severity::Error,
            2,
            data_text,
        ) {
            log.end();
            findings.failures.push(StackError::InvalidDataPointer);
            return findings;
        }

        if let (Storage::Allocated(buf), true) =
            (&self.storage, self.size > 0 && element_ok && shape_ok)
        {
            if cfg!(feature = "guards")
                && !log.check(
                    buf.guards_intact(),
                    "Buffer guards are good.",
                    "Buffer guards corrupted!",
                    Severity::Warning,
                    3,
                    || {
                        format!(
                            "left = {:x}, right = {:x}, GUARD = {GUARD_WORD:x}",
                            buf.left_guard(),
                            buf.right_guard()
                        )
                    },
                )
            {
                findings.flag(Violation::BufferGuard);
            }

            if cfg!(feature = "padding") {
                let poisoned = buf.padding(self.size).iter().all(|&b| b == POISON);
                if poisoned {
                    log.table("Data isn't corrupted.", buf.slot_region(), Severity::Ok, 3);
                } else {
                    log.table("Data is corrupted!", buf.slot_region(), Severity::Warning, 3);
                    findings.flag(Violation::Padding);
                }
            }
        }

        if cfg!(feature = "checksum") {
            let computed = self.compute_checksum();
            if !log.check(
                computed == self.checksum,
                "Checksum correct.",
                "Checksum incorrect!",
                Severity::Warning,
                2,
                || format!("{name}.checksum = {:#x}, must be {computed:#x}", self.checksum),
            ) {
                findings.flag(Violation::Checksum);
            }
        }

        log.end();
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IntegrityPolicy, StackConfig};
    use crate::fault::{GuardSide, Tamper};

    fn filled(n: u8) -> HardenedStack {
        let mut s = HardenedStack::construct("v", 2)
            .unwrap()
            .with_config(StackConfig::default().with_integrity(IntegrityPolicy::Report));
        for i in 0..n {
            s.push(&[i, i]).unwrap();
        }
        s
    }

    #[test]
    fn clean_stack_validates() {
        for n in [0, 1, 2, 5, 20] {
            let s = filled(n);
            assert_eq!(s.validate(), Ok(()));
            assert!(s.inspect().unwrap().is_intact());
        }
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn flipped_checksum_is_reported() {
        let mut s = filled(3);
        s.flip_checksum(1);
        assert_eq!(
            s.validate(),
            Err(StackError::IntegrityViolation(Violation::Checksum))
        );
    }

    #[cfg(feature = "guards")]
    #[test]
    fn control_guard_comes_before_checksum() {
        let mut s = filled(3);
        s.overwrite_control_guard(GuardSide::Right, 0);
        assert_eq!(
            s.validate(),
            Err(StackError::IntegrityViolation(Violation::ControlGuard))
        );
        let report = s.inspect().unwrap();
        assert_eq!(report.first(), Some(Violation::ControlGuard));
        if cfg!(feature = "checksum") {
            assert!(report.contains(Violation::Checksum));
        }
    }

    #[cfg(feature = "guards")]
    #[test]
    fn buffer_guard_is_reported() {
        let mut s = filled(2);
        assert!(s.overwrite_buffer_guard(GuardSide::Left, 1));
        assert_eq!(
            s.validate(),
            Err(StackError::IntegrityViolation(Violation::BufferGuard))
        );
    }

    #[cfg(feature = "padding")]
    #[test]
    fn poked_padding_is_reported() {
        let mut s = filled(2);
        assert!(s.poke_padding(0, 0));
        let report = s.inspect().unwrap();
        assert_eq!(report.first(), Some(Violation::Padding));
    }

    #[test]
    fn broken_geometry_is_structural() {
        let mut s = filled(3);
        s.force_geometry(3, 3);
        assert_eq!(
            s.validate(),
            Err(StackError::IntegrityViolation(Violation::Geometry))
        );
        let mut out = [0u8; 2];
        assert_eq!(
            s.pop(&mut out),
            Err(StackError::IntegrityViolation(Violation::Geometry))
        );
    }

    #[test]
    fn detached_buffer_is_invalid_data_pointer() {
        let mut s = filled(2);
        s.detach_buffer();
        assert_eq!(s.validate(), Err(StackError::InvalidDataPointer));
        assert_eq!(s.inspect(), Err(StackError::InvalidDataPointer));
        assert_eq!(s.push(&[0, 0]), Err(StackError::InvalidDataPointer));
    }

    #[test]
    fn released_handle_is_invalid_handle() {
        let mut s = filled(1);
        s.release_handle();
        assert_eq!(s.inspect(), Err(StackError::InvalidHandle));
        let mut out = [0u8; 2];
        assert_eq!(s.top(&mut out), Err(StackError::InvalidHandle));
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn reject_policy_blocks_mutation() {
        let mut s = filled(2)
            .with_config(StackConfig::default().with_integrity(IntegrityPolicy::Reject));
        s.flip_checksum(0xFF);
        let mut out = [0u8; 2];
        assert_eq!(
            s.pop(&mut out),
            Err(StackError::IntegrityViolation(Violation::Checksum))
        );
        assert_eq!(s.size(), 2);
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn report_policy_proceeds_without_resealing() {
        let mut s = filled(2);
        s.flip_checksum(0xFF);
        let mut out = [0u8; 2];
        s.pop(&mut out).unwrap();
        assert_eq!(out, [1, 1]);
        assert_eq!(
            s.validate(),
            Err(StackError::IntegrityViolation(Violation::Checksum))
        );
    }
}
