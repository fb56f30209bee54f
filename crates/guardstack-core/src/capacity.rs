//! Slot-count growth and shrink policy.
//!
//! Below [`LINEAR_STEP`] capacities follow `2^k - 1`; from there they move
//! in steps of [`LINEAR_STEP`]:
//!
//! ```text
//! 1 -> 3 -> 7 -> 15 -> 31 -> 63 -> 127 -> 255 -> 511 -> 767 -> 1023 ...
//! ```
//!
//! Shrinking walks the same ladder downward, never closer to the live size
//! than one free slot.

/// Capacity at which growth turns linear.
pub const LINEAR_STEP: usize = 256;

/// Capacity after a push that brings the stack to `new_size` elements.
///
/// Unchanged unless `new_size` fills the last slot.
#[must_use]
pub const fn grow_target(capacity: usize, new_size: usize) -> usize {
    if new_size != capacity {
        return capacity;
    }
    if capacity < LINEAR_STEP {
        2 * capacity + 1
    } else {
        capacity + LINEAR_STEP
    }
}

/// Capacity after a pop that leaves `size` elements.
///
/// The next rung down is taken only when it still leaves a free slot above
/// `size`; otherwise `capacity` is returned. Never below 1.
#[must_use]
pub const fn shrink_target(capacity: usize, size: usize) -> usize {
    let lower = if capacity > LINEAR_STEP {
        capacity - LINEAR_STEP
    } else {
        (capacity + 1).next_power_of_two() / 2 - 1
    };
    if lower > size {
        lower
    } else if size == 0 {
        1
    } else {
        capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_ladder() {
        let mut cap = 1;
        let mut seen = vec![cap];
        while cap < 1023 {
            cap = grow_target(cap, cap);
            seen.push(cap);
        }
        assert_eq!(seen, [1, 3, 7, 15, 31, 63, 127, 255, 511, 767, 1023]);
    }

    #[test]
    fn no_growth_with_free_slots() {
        assert_eq!(grow_target(7, 5), 7);
        assert_eq!(grow_target(511, 300), 511);
    }

    #[test]
    fn shrink_ladder_mirrors_growth() {
        assert_eq!(shrink_target(1023, 10), 767);
        assert_eq!(shrink_target(767, 10), 511);
        assert_eq!(shrink_target(511, 10), 255);
        assert_eq!(shrink_target(255, 10), 127);
        assert_eq!(shrink_target(15, 2), 7);
        assert_eq!(shrink_target(7, 2), 3);
    }

    #[test]
    fn shrink_keeps_a_free_slot() {
        assert_eq!(shrink_target(7, 3), 7);
        assert_eq!(shrink_target(7, 2), 3);
        assert_eq!(shrink_target(767, 511), 767);
        assert_eq!(shrink_target(767, 510), 511);
        assert_eq!(shrink_target(3, 1), 3);
    }

    #[test]
    fn shrink_never_below_one() {
        assert_eq!(shrink_target(1, 0), 1);
        assert_eq!(shrink_target(3, 0), 1);
    }

    #[test]
    fn shrink_then_grow_round_trips() {
        for cap in [3, 7, 15, 127, 255, 511, 767, 1023] {
            let size = 1;
            let lower = shrink_target(cap, size);
            assert!(lower > size);
            let mut back = lower;
            while back < cap {
                back = grow_target(back, back);
            }
            assert_eq!(back, cap);
        }
    }
}
