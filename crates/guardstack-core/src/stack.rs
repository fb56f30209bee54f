//! The hardened fixed-element-size stack.
//!
//! Elements are opaque byte strings of exactly `element_size` bytes. Every
//! push/pop/top validates the whole container first (see `validate`), then
//! mutates, then reseals the checksum if the pre-check found it intact.

#[cfg(feature = "diagnostics")]
use guardstack_diag::Diagnostics;
use guardstack_diag::SourceLocation;

use crate::capacity::{grow_target, shrink_target};
use crate::checksum::hash64;
use crate::config::StackConfig;
use crate::error::StackError;
use crate::layout::{GUARD_WORD, POISON, SlotBuffer, SlotLayout};
use crate::probe::{HandleState, is_readable};
use crate::report::{Channel, Reporter};

/// Slot storage of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Storage {
    /// Sentinel held whenever the stack is empty.
    #[default]
    Unallocated,
    Allocated(SlotBuffer),
}

impl Storage {
    #[must_use]
    pub fn buffer(&self) -> Option<&SlotBuffer> {
        match self {
            Self::Unallocated => None,
            Self::Allocated(buf) => Some(buf),
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut SlotBuffer> {
        match self {
            Self::Unallocated => None,
            Self::Allocated(buf) => Some(buf),
        }
    }

    /// Stable tag folded into the control-block checksum.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Unallocated => 0,
            Self::Allocated(_) => 1,
        }
    }
}

/// Self-verifying stack of fixed-size byte elements.
#[derive(Debug)]
pub struct HardenedStack {
    pub(crate) control_head: u64,
    pub(crate) handle: HandleState,
    pub(crate) name: String,
    pub(crate) element_size: usize,
    pub(crate) size: usize,
    pub(crate) capacity: usize,
    pub(crate) storage: Storage,
    pub(crate) checksum: u64,
    pub(crate) config: StackConfig,
    pub(crate) diagnostics: Channel,
    pub(crate) control_tail: u64,
}

impl HardenedStack {
    /// An empty stack with capacity 1 and no buffer.
    pub fn construct(name: impl Into<String>, element_size: usize) -> Result<Self, StackError> {
        if element_size == 0 {
            return Err(StackError::InvalidElementSize);
        }
        let mut stack = Self {
            control_head: GUARD_WORD,
            handle: HandleState::Live,
            name: name.into(),
            element_size,
            size: 0,
            capacity: 1,
            storage: Storage::Unallocated,
            checksum: 0,
            config: StackConfig::default(),
            diagnostics: Channel::default(),
            control_tail: GUARD_WORD,
        };
        stack.reseal();
        Ok(stack)
    }

    /// Heap-allocated variant of [`construct`](Self::construct).
    pub fn create(name: impl Into<String>, element_size: usize) -> Result<Box<Self>, StackError> {
        Self::construct(name, element_size).map(Box::new)
    }

    #[must_use]
    pub fn with_config(mut self, config: StackConfig) -> Self {
        self.config = config;
        self
    }

    #[cfg(feature = "diagnostics")]
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    #[cfg(feature = "diagnostics")]
    pub fn set_diagnostics(&mut self, diagnostics: Option<Diagnostics>) {
        self.diagnostics = diagnostics;
    }

    pub fn set_config(&mut self, config: StackConfig) {
        self.config = config;
    }

    /// Copy `value` onto the top of the stack.
    ///
    /// `value` must be exactly `element_size` bytes. If growing fails the
    /// stack is left as it was.
    #[track_caller]
    pub fn push(&mut self, value: &[u8]) -> Result<(), StackError> {
        let location = SourceLocation::caller("push");
        self.check_live(location)?;
        self.check_region(value, "value", location)?;
        let intact = self.precheck(location)?;

        let target = grow_target(self.capacity, self.size + 1);
        if target != self.capacity || self.storage.buffer().is_none() {
            self.grow(target, location)?;
        }
        let slot = self.size;
        let buf = self
            .storage
            .buffer_mut()
            .ok_or(StackError::InvalidDataPointer)?;
        buf.slot_mut(slot).copy_from_slice(value);
        self.size += 1;

        if intact {
            self.reseal();
        }
        Ok(())
    }

    /// Move the top element into `out`.
    #[track_caller]
    pub fn pop(&mut self, out: &mut [u8]) -> Result<(), StackError> {
        let location = SourceLocation::caller("pop");
        self.check_live(location)?;
        self.check_region(out, "out", location)?;
        let intact = self.precheck(location)?;
        if self.size == 0 {
            return Err(StackError::Empty);
        }

        let top = self.size - 1;
        let buf = self
            .storage
            .buffer_mut()
            .ok_or(StackError::InvalidDataPointer)?;
        out.copy_from_slice(buf.slot(top));
        buf.slot_mut(top).fill(POISON);
        if top == 0 {
            self.storage = Storage::Unallocated;
            self.capacity = 1;
        } else {
            let target = shrink_target(self.capacity, top);
            if target != self.capacity {
                buf.shrink_to(target);
                self.capacity = target;
            }
        }
        self.size = top;

        if intact {
            self.reseal();
        }
        Ok(())
    }

    /// Copy the top element into `out` without removing it.
    #[track_caller]
    pub fn top(&self, out: &mut [u8]) -> Result<(), StackError> {
        let location = SourceLocation::caller("top");
        self.check_live(location)?;
        self.check_region(out, "out", location)?;
        self.precheck(location)?;
        if self.size == 0 {
            return Err(StackError::Empty);
        }
        let buf = self.storage.buffer().ok_or(StackError::InvalidDataPointer)?;
        out.copy_from_slice(buf.slot(self.size - 1));
        Ok(())
    }

    /// Free the buffer and release the handle.
    ///
    /// Teardown always happens. The result is the verdict of the final
    /// check, so corruption found on the way out is still returned. Every
    /// later call, including a second `deconstruct`, is `InvalidHandle`.
    #[track_caller]
    pub fn deconstruct(&mut self) -> Result<(), StackError> {
        self.deconstruct_at(SourceLocation::caller("deconstruct"))
    }

    /// Deconstruct and drop a heap handle from [`create`](Self::create).
    #[track_caller]
    pub fn delete(mut self: Box<Self>) -> Result<(), StackError> {
        self.deconstruct_at(SourceLocation::caller("delete"))
    }

    fn deconstruct_at(&mut self, location: SourceLocation) -> Result<(), StackError> {
        self.check_live(location)?;
        let verdict = self.validate_at(location);
        self.storage = Storage::Unallocated;
        self.size = 0;
        self.capacity = 1;
        self.handle = HandleState::Released;
        self.reseal();
        verdict
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    #[must_use]
    pub fn handle_state(&self) -> HandleState {
        self.handle
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn is_unallocated(&self) -> bool {
        self.storage.buffer().is_none()
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Size after a successful validation.
    #[track_caller]
    pub fn size_checked(&self) -> Result<usize, StackError> {
        self.validate_at(SourceLocation::caller("size"))?;
        Ok(self.size)
    }

    /// Element size after a successful validation.
    #[track_caller]
    pub fn element_size_checked(&self) -> Result<usize, StackError> {
        self.validate_at(SourceLocation::caller("element_size"))?;
        Ok(self.element_size)
    }

    #[must_use]
    pub fn layout(&self) -> SlotLayout {
        SlotLayout::new(self.element_size)
    }

    /// Fingerprint of the current state; 0 without the `checksum` feature.
    #[must_use]
    pub fn compute_checksum(&self) -> u64 {
        if !cfg!(feature = "checksum") {
            return 0;
        }
        let buffer = match (&self.storage, self.size) {
            (Storage::Allocated(buf), 1..) => hash64(buf.bytes()),
            _ => 0,
        };
        self.size as u64 ^ hash64(&self.control_bytes()) ^ buffer
    }

    /// Canonical little-endian image of every control field but the checksum.
    fn control_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(50 + self.name.len());
        out.extend_from_slice(&self.control_head.to_le_bytes());
        out.push(self.handle.tag());
        out.extend_from_slice(&(self.element_size as u64).to_le_bytes());
        out.extend_from_slice(&(self.size as u64).to_le_bytes());
        out.extend_from_slice(&(self.capacity as u64).to_le_bytes());
        out.push(self.storage.tag());
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(&self.control_tail.to_le_bytes());
        out
    }

    pub(crate) fn reseal(&mut self) {
        self.checksum = self.compute_checksum();
    }

    fn grow(&mut self, capacity: usize, location: SourceLocation) -> Result<(), StackError> {
        let budget = self.config.max_buffer_bytes;
        let grown = match &self.storage {
            Storage::Unallocated => SlotBuffer::allocate(self.layout(), capacity, budget),
            Storage::Allocated(buf) => buf.grown(capacity, budget),
        };
        match grown {
            Ok(buf) => {
                self.storage = Storage::Allocated(buf);
                self.capacity = capacity;
                Ok(())
            }
            Err(err) => {
                Reporter::new(&self.diagnostics).fail(
                    "Stack allocation failed!",
                    || format!("{}: {err}", self.name),
                    location,
                );
                Err(err)
            }
        }
    }

    pub(crate) fn check_live(&self, location: SourceLocation) -> Result<(), StackError> {
        if self.handle.is_live() {
            return Ok(());
        }
        Reporter::new(&self.diagnostics).fail(
            "Stack handle is released!",
            || format!("stack {}", self.name),
            location,
        );
        Err(StackError::InvalidHandle)
    }

    fn check_region(
        &self,
        region: &[u8],
        what: &str,
        location: SourceLocation,
    ) -> Result<(), StackError> {
        if region.len() == self.element_size && is_readable(region, self.element_size) {
            return Ok(());
        }
        Reporter::new(&self.diagnostics).fail(
            "Element region is bad!",
            || {
                format!(
                    "{}: {what} is {} bytes, element_size = {}",
                    self.name,
                    region.len(),
                    self.element_size
                )
            },
            location,
        );
        Err(StackError::InvalidHandle)
    }
}
