//! Handle validity and best-effort region readability.

use std::hint::black_box;

/// Lifecycle state of a stack handle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
    #[default]
    Live,
    /// Deconstructed; every further operation is rejected.
    Released,
}

impl HandleState {
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Stable tag folded into the control-block checksum.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Live => 0,
            Self::Released => 1,
        }
    }
}

/// True when the first `len` bytes of `region` can be read.
///
/// Zero-length requests are rejected. With the `probe` feature every byte is
/// touched once.
#[must_use]
pub fn is_readable(region: &[u8], len: usize) -> bool {
    if len == 0 {
        return false;
    }
    let Some(window) = region.get(..len) else {
        return false;
    };
    if cfg!(feature = "probe") {
        for byte in window {
            black_box(*byte);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_is_bad() {
        assert!(!is_readable(&[1, 2, 3], 0));
        assert!(!is_readable(&[], 0));
    }

    #[test]
    fn short_region_is_bad() {
        assert!(!is_readable(&[1, 2, 3], 4));
    }

    #[test]
    fn exact_and_longer_regions_are_good() {
        assert!(is_readable(&[1, 2, 3, 4], 4));
        assert!(is_readable(&[1, 2, 3, 4, 5], 4));
    }

    #[test]
    fn handle_tags_differ() {
        assert!(HandleState::Live.is_live());
        assert!(!HandleState::Released.is_live());
        assert_ne!(HandleState::Live.tag(), HandleState::Released.tag());
        assert_eq!(HandleState::default(), HandleState::Live);
    }
}
