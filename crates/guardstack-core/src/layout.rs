//! Byte layout of the guarded slot buffer.
//!
//! ```text
//! [ left guard | slot 0 | slot 1 | ... | slot cap-1 | right guard ]
//! ```
//!
//! Guards are [`GUARD_WIDTH`] bytes each (0 without the `guards` feature).
//! Slots at or past the live size hold [`POISON`] in every byte.

use std::ops::Range;

use crate::error::StackError;

/// Magic word bracketing the control block and the slot buffer.
pub const GUARD_WORD: u64 = 0x47C0_DAB1_EC0D_EBEF;

/// Fill byte of every unused slot.
pub const POISON: u8 = 0x91;

/// Width in bytes of each buffer guard.
pub const GUARD_WIDTH: usize = if cfg!(feature = "guards") { 8 } else { 0 };

/// Offsets of guards and slots for one element size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub guard_width: usize,
    pub element_size: usize,
}

impl SlotLayout {
    #[must_use]
    pub const fn new(element_size: usize) -> Self {
        Self {
            guard_width: GUARD_WIDTH,
            element_size,
        }
    }

    /// Total buffer length for `capacity` slots, or `None` on overflow.
    #[must_use]
    pub fn total_bytes(&self, capacity: usize) -> Option<usize> {
        capacity
            .checked_mul(self.element_size)?
            .checked_add(2 * self.guard_width)
    }

    #[must_use]
    pub const fn left_guard(&self) -> Range<usize> {
        0..self.guard_width
    }

    /// Bytes of slots `from..to`.
    #[must_use]
    pub const fn slots(&self, from: usize, to: usize) -> Range<usize> {
        self.guard_width + from * self.element_size..self.guard_width + to * self.element_size
    }

    #[must_use]
    pub const fn slot(&self, index: usize) -> Range<usize> {
        self.slots(index, index + 1)
    }

    #[must_use]
    pub const fn right_guard(&self, capacity: usize) -> Range<usize> {
        let start = self.guard_width + capacity * self.element_size;
        start..start + self.guard_width
    }
}

/// Owned, guarded slot storage for exactly `capacity` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBuffer {
    layout: SlotLayout,
    capacity: usize,
    bytes: Vec<u8>,
}

impl SlotBuffer {
    /// Allocate `capacity` poisoned slots between fresh guards.
    ///
    /// `budget` caps the total byte length.
    pub fn allocate(
        layout: SlotLayout,
        capacity: usize,
        budget: Option<usize>,
    ) -> Result<Self, StackError> {
        let mut bytes = reserve(layout, capacity, budget)?;
        bytes.extend_from_slice(&guard_bytes(layout));
        bytes.resize(layout.slots(0, capacity).end, POISON);
        bytes.extend_from_slice(&guard_bytes(layout));
        Ok(Self {
            layout,
            capacity,
            bytes,
        })
    }

    /// A larger copy of this buffer.
    ///
    /// The left guard and every existing slot are carried over byte for byte,
    /// so corruption stays visible. New slots are poisoned and the right
    /// guard is rewritten at its new offset. On failure `self` is untouched.
    pub fn grown(&self, capacity: usize, budget: Option<usize>) -> Result<Self, StackError> {
        debug_assert!(capacity >= self.capacity);
        let layout = self.layout;
        let mut bytes = reserve(layout, capacity, budget)?;
        bytes.extend_from_slice(&self.bytes[..layout.slots(0, self.capacity).end]);
        bytes.resize(layout.slots(0, capacity).end, POISON);
        bytes.extend_from_slice(&guard_bytes(layout));
        Ok(Self {
            layout,
            capacity,
            bytes,
        })
    }

    /// Drop trailing slots in place and rewrite the right guard.
    pub fn shrink_to(&mut self, capacity: usize) {
        if capacity >= self.capacity {
            return;
        }
        self.bytes.truncate(self.layout.slots(0, capacity).end);
        self.bytes.extend_from_slice(&guard_bytes(self.layout));
        self.bytes.shrink_to_fit();
        self.capacity = capacity;
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> &[u8] {
        &self.bytes[self.layout.slot(index)]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut [u8] {
        let range = self.layout.slot(index);
        &mut self.bytes[range]
    }

    /// Every slot, live or not.
    #[must_use]
    pub fn slot_region(&self) -> &[u8] {
        &self.bytes[self.layout.slots(0, self.capacity)]
    }

    /// Slots from `size` to capacity, which must be poisoned.
    #[must_use]
    pub fn padding(&self, size: usize) -> &[u8] {
        self.bytes
            .get(self.layout.slots(size, self.capacity))
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn left_guard(&self) -> u64 {
        self.word_at(self.layout.left_guard())
    }

    #[must_use]
    pub fn right_guard(&self) -> u64 {
        self.word_at(self.layout.right_guard(self.capacity))
    }

    /// True when both guards hold [`GUARD_WORD`]. Always true without guards.
    #[must_use]
    pub fn guards_intact(&self) -> bool {
        let expected = guard_bytes(self.layout);
        self.bytes.get(self.layout.left_guard()) == Some(&expected[..])
            && self.bytes.get(self.layout.right_guard(self.capacity)) == Some(&expected[..])
    }

    fn word_at(&self, range: Range<usize>) -> u64 {
        self.bytes
            .get(range)
            .and_then(|b| <[u8; 8]>::try_from(b).ok())
            .map_or(GUARD_WORD, u64::from_le_bytes)
    }
}

fn guard_bytes(layout: SlotLayout) -> Vec<u8> {
    GUARD_WORD.to_le_bytes()[..layout.guard_width].to_vec()
}

fn reserve(
    layout: SlotLayout,
    capacity: usize,
    budget: Option<usize>,
) -> Result<Vec<u8>, StackError> {
    let failed = |bytes| StackError::AllocationError { capacity, bytes };
    let total = layout
        .total_bytes(capacity)
        .ok_or_else(|| failed(usize::MAX))?;
    if budget.is_some_and(|max| total > max) {
        return Err(failed(total));
    }
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(total).map_err(|_| failed(total))?;
    Ok(bytes)
}
