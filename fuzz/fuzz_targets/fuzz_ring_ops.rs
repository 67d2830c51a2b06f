#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;

use locked_ring::{Empty, RingBuffer};

// Interprets a byte stream as an operation sequence against `RingBuffer`,
// checking every result against a `VecDeque` ground-truth model.
//
// Byte layout:
// - Byte 0 → capacity (clamped to 1..=255)
// - Remaining bytes as `(opcode, operand)` pairs:
//   - 0 → `enqueue(operand)`
//   - 1 → `dequeue()`
//   - 2 → `dequeue_multiple(operand)`
//   - 3 → `inject` sum
//   - 4 → `map` then compare contents
//   - 5 → `clear()`
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let capacity = u32::from(data[0]).max(1);
    let rb: RingBuffer<u8> = RingBuffer::new(capacity).expect("ring creation");
    let mut model: VecDeque<u8> = VecDeque::new();

    let ops = &data[1..];
    let mut i = 0;
    while i + 1 < ops.len() {
        let opcode = ops[i];
        let operand = ops[i + 1];
        i += 2;

        match opcode % 6 {
            0 => {
                let accepted = rb.enqueue(operand).is_ok();
                assert_eq!(accepted, model.len() < capacity as usize, "enqueue mismatch");
                if accepted {
                    model.push_back(operand);
                }
            }
            1 => assert_eq!(rb.dequeue(), model.pop_front(), "dequeue mismatch"),
            2 => {
                let mut out = Vec::new();
                let res = rb.dequeue_multiple(&mut out, u32::from(operand));
                if model.is_empty() {
                    assert_eq!(res, Err(Empty));
                } else {
                    let take = usize::from(operand).min(model.len());
                    let expected: Vec<u8> = model.drain(..take).collect();
                    assert_eq!(res, Ok(take as u32));
                    assert_eq!(out, expected, "dequeue_multiple contents mismatch");
                }
            }
            3 => {
                let sum = rb.inject(0u64, |acc, v| acc + u64::from(*v));
                let expected: u64 = model.iter().map(|v| u64::from(*v)).sum();
                assert_eq!(sum, expected, "inject mismatch");
            }
            4 => {
                let mapped = rb.map(|v| u16::from(*v) + 1).expect("map");
                let expected: Vec<u16> = model.iter().map(|v| u16::from(*v) + 1).collect();
                assert_eq!(mapped.to_vec(), expected, "map mismatch");
            }
            _ => {
                rb.clear();
                model.clear();
            }
        }

        assert_eq!(rb.len() as usize, model.len(), "len mismatch");
    }

    // Final consistency check.
    assert_eq!(rb.to_vec(), model.iter().copied().collect::<Vec<_>>());
});
