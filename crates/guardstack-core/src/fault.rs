//! Deliberate corruption hooks.
//!
//! Each hook bypasses the reseal so the next validation sees the damage.
//! Used by the detection tests and the harness demo.

use crate::layout::GUARD_WIDTH;
use crate::probe::HandleState;
use crate::stack::{HardenedStack, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardSide {
    Left,
    Right,
}

pub trait Tamper {
    /// XOR the stored checksum with `mask`.
    fn flip_checksum(&mut self, mask: u64);

    fn overwrite_control_guard(&mut self, side: GuardSide, word: u64);

    /// Overwrite a buffer guard; false when there is no buffer or no guards.
    fn overwrite_buffer_guard(&mut self, side: GuardSide, word: u64) -> bool;

    /// Write `byte` at `offset` into the unused-slot region; false when out of range.
    fn poke_padding(&mut self, offset: usize, byte: u8) -> bool;

    /// Set size and capacity without touching the buffer.
    fn force_geometry(&mut self, size: usize, capacity: usize);

    /// Mark the handle released without freeing anything.
    fn release_handle(&mut self);

    /// Drop the buffer without touching size or capacity.
    fn detach_buffer(&mut self);
}

impl Tamper for HardenedStack {
    fn flip_checksum(&mut self, mask: u64) {
        self.checksum ^= mask;
    }

    fn overwrite_control_guard(&mut self, side: GuardSide, word: u64) {
        match side {
            GuardSide::Left => self.control_head = word,
            GuardSide::Right => self.control_tail = word,
        }
    }

    fn overwrite_buffer_guard(&mut self, side: GuardSide, word: u64) -> bool {
        if GUARD_WIDTH == 0 {
            return false;
        }
        let Some(buf) = self.storage.buffer_mut() else {
            return false;
        };
        let layout = buf.layout();
        let range = match side {
            GuardSide::Left => layout.left_guard(),
            GuardSide::Right => layout.right_guard(buf.capacity()),
        };
        match buf.bytes_mut().get_mut(range) {
            Some(dst) => {
                dst.copy_from_slice(&word.to_le_bytes()[..GUARD_WIDTH]);
                true
            }
            None => false,
        }
    }

    fn poke_padding(&mut self, offset: usize, byte: u8) -> bool {
        let size = self.size;
        let Some(buf) = self.storage.buffer_mut() else {
            return false;
        };
        let padding = buf.layout().slots(size, buf.capacity());
        let index = padding.start + offset;
        if index >= padding.end {
            return false;
        }
        match buf.bytes_mut().get_mut(index) {
            Some(b) => {
                *b = byte;
                true
            }
            None => false,
        }
    }

    fn force_geometry(&mut self, size: usize, capacity: usize) {
        self.size = size;
        self.capacity = capacity;
    }

    fn release_handle(&mut self) {
        self.handle = HandleState::Released;
    }

    fn detach_buffer(&mut self) {
        self.storage = Storage::Unallocated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_poke_stays_inside_unused_slots() {
        let mut s = HardenedStack::construct("f", 4).unwrap();
        assert!(!s.poke_padding(0, 0));
        s.push(&[1; 4]).unwrap();
        // capacity 3, one live slot: 8 unused bytes
        assert!(s.poke_padding(7, 0));
        assert!(!s.poke_padding(8, 0));
        assert_eq!(s.storage().buffer().unwrap().slot(0), &[1; 4]);
    }

    #[test]
    fn buffer_guard_needs_a_buffer() {
        let mut s = HardenedStack::construct("f", 4).unwrap();
        assert!(!s.overwrite_buffer_guard(GuardSide::Right, 0));
    }

    #[test]
    fn flip_is_an_involution() {
        let mut s = HardenedStack::construct("f", 4).unwrap();
        let before = s.checksum();
        s.flip_checksum(0xDEAD);
        s.flip_checksum(0xDEAD);
        assert_eq!(s.checksum(), before);
    }
}
