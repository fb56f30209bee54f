//! Self-verifying fixed-element-size stack.
//!
//! A [`HardenedStack`] keeps its elements in a guarded, poison-filled slot
//! buffer and fingerprints its own state after every mutation. Each
//! operation re-validates the whole container first, so stray writes are
//! caught at the next access rather than when they finally crash something.
//!
//! # Architecture
//!
//! - **Checksum** (`checksum`): 64-bit Pearson-style fingerprint
//! - **Probe** (`probe`): handle validity and region readability
//! - **Layout** (`layout`): guard/slot offsets and the owned slot buffer
//! - **Capacity** (`capacity`): the `2^k - 1` then `+256` growth ladder
//! - **Stack** (`stack`): construction, push/pop/top, teardown
//! - **Validation** (`validate`): ordered checks narrated as a log session
//! - **Configuration** (`config`): integrity policy and allocation budget
//! - **Reporting** (`report`): the diagnostics channel a stack holds
//! - **Fault injection** (`fault`): corruption hooks for detection tests
//!
//! Each protection layer sits behind a cargo feature (`guards`, `padding`,
//! `checksum`, `probe`, `diagnostics`), all on by default.

#![deny(unsafe_code)]

pub mod capacity;
pub mod checksum;
pub mod config;
pub mod error;
pub mod fault;
pub mod layout;
pub mod probe;
pub mod report;
pub mod stack;
pub mod validate;

pub use config::{IntegrityPolicy, StackConfig};
pub use error::{IntegrityReport, StackError, Violation};
pub use fault::{GuardSide, Tamper};
pub use layout::{GUARD_WORD, POISON, SlotBuffer, SlotLayout};
pub use probe::HandleState;
pub use stack::{HardenedStack, Storage};
