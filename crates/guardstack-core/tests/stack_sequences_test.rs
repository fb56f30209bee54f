//! Deterministic push/pop/top sequences against a `Vec` model.
//!
//! Run: cargo test -p guardstack-core --test stack_sequences_test

use guardstack_core::{
    HandleState, HardenedStack, IntegrityPolicy, POISON, StackConfig, StackError, Tamper,
    Violation,
};

#[derive(Clone, Copy, Debug)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn gen_range_usize(&mut self, low: usize, high_inclusive: usize) -> usize {
        assert!(low <= high_inclusive);
        let span = high_inclusive - low + 1;
        low + (self.next_u64() as usize % span)
    }
}

fn report_stack(name: &str, element_size: usize) -> HardenedStack {
    HardenedStack::construct(name, element_size)
        .unwrap()
        .with_config(StackConfig::default().with_integrity(IntegrityPolicy::Report))
}

fn on_ladder(capacity: usize) -> bool {
    if capacity < 256 {
        (capacity + 1).is_power_of_two()
    } else {
        capacity >= 511 && (capacity - 511) % 256 == 0
    }
}

fn assert_shape(stack: &HardenedStack, ctx: &str) {
    let (size, cap) = (stack.size(), stack.capacity());
    assert!(cap >= 1, "{ctx}: capacity {cap}");
    assert!(size <= cap, "{ctx}: size {size} > capacity {cap}");
    if size > 0 {
        assert!(size < cap, "{ctx}: no free slot at size {size}");
        assert!(!stack.is_unallocated(), "{ctx}: live elements without buffer");
    } else {
        assert_eq!(cap, 1, "{ctx}: empty stack keeps capacity 1");
        assert!(stack.is_unallocated(), "{ctx}: empty stack keeps a buffer");
    }
    assert!(on_ladder(cap), "{ctx}: capacity {cap} off the growth ladder");
}

#[test]
fn deterministic_sequences_hold_core_invariants() {
    const SEEDS: [u64; 4] = [1, 2, 3, 4];
    const STEPS: usize = 3_000;

    for seed in SEEDS {
        let mut rng = XorShift64::new(seed);
        let mut stack = report_stack("seq", 4);
        let mut model: Vec<[u8; 4]> = Vec::new();

        for step in 0..STEPS {
            let ctx = format!("seed={seed} step={step}");
            let mut out = [0u8; 4];
            // Bias towards push so the stack climbs past the linear threshold.
            match rng.gen_range_usize(0, 9) {
                0..=5 => {
                    let value = (rng.next_u64() as u32).to_le_bytes();
                    stack.push(&value).unwrap();
                    model.push(value);
                }
                6..=8 => match model.pop() {
                    Some(expected) => {
                        stack.pop(&mut out).unwrap();
                        assert_eq!(out, expected, "{ctx}");
                    }
                    None => assert_eq!(stack.pop(&mut out), Err(StackError::Empty), "{ctx}"),
                },
                _ => match model.last() {
                    Some(expected) => {
                        stack.top(&mut out).unwrap();
                        assert_eq!(&out, expected, "{ctx}");
                    }
                    None => assert_eq!(stack.top(&mut out), Err(StackError::Empty), "{ctx}"),
                },
            }
            assert_eq!(stack.size(), model.len(), "{ctx}");
            assert_shape(&stack, &ctx);
            assert_eq!(stack.checksum(), stack.compute_checksum(), "{ctx}");
        }
        assert_eq!(stack.validate(), Ok(()), "seed={seed}");
    }
}

#[test]
fn growth_and_shrink_follow_the_ladder() {
    let mut stack = report_stack("ladder", 1);
    let mut grown = vec![stack.capacity()];
    for i in 0..1_000usize {
        stack.push(&[i as u8]).unwrap();
        if grown.last() != Some(&stack.capacity()) {
            grown.push(stack.capacity());
        }
    }
    assert_eq!(grown, [1, 3, 7, 15, 31, 63, 127, 255, 511, 767, 1023]);

    let mut shrunk = vec![stack.capacity()];
    let mut out = [0u8; 1];
    while !stack.is_empty() {
        stack.pop(&mut out).unwrap();
        assert!(stack.capacity() > stack.size() || stack.size() == 0);
        if shrunk.last() != Some(&stack.capacity()) {
            shrunk.push(stack.capacity());
        }
    }
    assert_eq!(shrunk, [1023, 767, 511, 255, 127, 63, 31, 15, 7, 3, 1]);
    assert!(stack.is_unallocated());
}

#[test]
fn n_pushes_then_n_pops_restore_the_empty_state() {
    for n in [1, 2, 3, 7, 8, 255, 256, 600] {
        let mut stack = report_stack("round", 8);
        let empty_checksum = stack.checksum();
        for i in 0..n as u64 {
            stack.push(&i.to_le_bytes()).unwrap();
        }
        let mut out = [0u8; 8];
        for i in (0..n as u64).rev() {
            stack.pop(&mut out).unwrap();
            assert_eq!(u64::from_le_bytes(out), i, "n={n}");
        }
        assert_eq!(stack.size(), 0);
        assert_eq!(stack.capacity(), 1);
        assert!(stack.is_unallocated());
        assert_eq!(stack.checksum(), empty_checksum, "n={n}");
    }
}

#[test]
fn failed_growth_keeps_every_element() {
    let budget = StackConfig::default()
        .with_integrity(IntegrityPolicy::Report)
        .with_max_buffer_bytes(50);
    let mut stack = HardenedStack::construct("budget", 4)
        .unwrap()
        .with_config(budget);

    for i in 0..6u32 {
        stack.push(&i.to_le_bytes()).unwrap();
    }
    assert_eq!(stack.capacity(), 7);
    let before = stack.checksum();

    let err = stack.push(&6u32.to_le_bytes()).unwrap_err();
    assert!(
        matches!(err, StackError::AllocationError { capacity: 15, .. }),
        "{err:?}"
    );
    assert_eq!(stack.size(), 6);
    assert_eq!(stack.capacity(), 7);
    assert_eq!(stack.checksum(), before);
    assert_eq!(stack.validate(), Ok(()));

    let mut out = [0u8; 4];
    for i in (0..6u32).rev() {
        stack.pop(&mut out).unwrap();
        assert_eq!(u32::from_le_bytes(out), i);
    }
    assert!(stack.is_unallocated());
}

#[test]
fn first_push_over_budget_leaves_stack_unallocated() {
    let mut stack = HardenedStack::construct("tiny", 64)
        .unwrap()
        .with_config(StackConfig::default().with_max_buffer_bytes(64));
    assert!(matches!(
        stack.push(&[0; 64]),
        Err(StackError::AllocationError { capacity: 3, .. })
    ));
    assert!(stack.is_unallocated());
    assert_eq!(stack.size(), 0);
    assert_eq!(stack.capacity(), 1);
    assert_eq!(stack.validate(), Ok(()));
}

#[test]
fn popped_slots_return_to_poison() {
    let mut stack = report_stack("poison", 3);
    for i in 0..10u8 {
        stack.push(&[i, i, i]).unwrap();
    }
    let mut out = [0u8; 3];
    for _ in 0..4 {
        stack.pop(&mut out).unwrap();
        let buf = stack.storage().buffer().unwrap();
        assert!(buf.padding(stack.size()).iter().all(|&b| b == POISON));
    }
}

#[test]
fn use_after_deconstruct_is_rejected_everywhere() {
    let mut stack = report_stack("gone", 2);
    stack.push(&[1, 2]).unwrap();
    stack.deconstruct().unwrap();

    let mut out = [0u8; 2];
    assert_eq!(stack.push(&[3, 4]), Err(StackError::InvalidHandle));
    assert_eq!(stack.pop(&mut out), Err(StackError::InvalidHandle));
    assert_eq!(stack.top(&mut out), Err(StackError::InvalidHandle));
    assert_eq!(stack.validate(), Err(StackError::InvalidHandle));
    assert_eq!(stack.size_checked(), Err(StackError::InvalidHandle));
    assert_eq!(stack.deconstruct(), Err(StackError::InvalidHandle));
}

#[cfg(feature = "checksum")]
#[test]
fn deconstruct_returns_corruption_and_still_releases() {
    let mut stack = HardenedStack::construct("torn", 4).unwrap();
    stack.push(&[1; 4]).unwrap();
    stack.flip_checksum(1);

    assert_eq!(
        stack.deconstruct(),
        Err(StackError::IntegrityViolation(Violation::Checksum))
    );
    assert_eq!(stack.handle_state(), HandleState::Released);
    assert!(stack.is_unallocated());
    assert_eq!(stack.size(), 0);
    assert_eq!(stack.deconstruct(), Err(StackError::InvalidHandle));
}
