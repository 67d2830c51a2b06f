//! End-to-end scenarios through the public API.

use locked_ring::{Empty, RingBuffer, RingConfig, RingError};

#[test]
fn reject_on_full_then_bulk_drain() {
    let rb: RingBuffer<i32> = RingBuffer::new(4).unwrap();
    for v in 1..=4 {
        assert!(rb.enqueue(v).is_ok());
    }

    let before = rb.cursors();
    let rejected = rb.enqueue(5).unwrap_err();
    assert_eq!(rejected.into_inner(), 5);
    assert_eq!(rb.cursors(), before);
    assert_eq!(rb.len(), 4);

    assert_eq!(rb.dequeue(), Some(1));
    assert_eq!(rb.len(), 3);

    assert!(rb.enqueue(5).is_ok());
    assert_eq!(rb.len(), 4);

    let mut out = Vec::new();
    assert_eq!(rb.dequeue_multiple(&mut out, 10), Ok(4));
    assert_eq!(out, vec![2, 3, 4, 5]);
    assert!(rb.is_empty());
    assert_eq!(rb.dequeue_multiple(&mut out, 10), Err(Empty));
}

#[test]
fn fold_leaves_contents_in_place() {
    let rb: RingBuffer<i32> = RingBuffer::new(3).unwrap();
    for v in [10, 20, 30] {
        rb.enqueue(v).unwrap();
    }

    assert_eq!(rb.inject(0, |acc, v| acc + v), 60);
    assert_eq!(rb.len(), 3);

    let mut seen = Vec::new();
    rb.scan(|v, _| seen.push(*v));
    assert_eq!(seen, vec![10, 20, 30]);
}

#[test]
fn map_produces_independent_buffer() {
    let rb: RingBuffer<i32> = RingBuffer::new(2).unwrap();
    rb.enqueue(7).unwrap();
    rb.enqueue(9).unwrap();

    let doubled = rb.map(|v| v * 2).unwrap();
    assert_eq!(doubled.capacity(), rb.capacity());
    assert_eq!(doubled.to_vec(), vec![14, 18]);

    // Both buffers stay usable and independent.
    assert_eq!(rb.dequeue(), Some(7));
    assert!(rb.enqueue(11).is_ok());
    assert_eq!(doubled.dequeue(), Some(14));
    assert_eq!(rb.to_vec(), vec![9, 11]);
    assert_eq!(doubled.to_vec(), vec![18]);
}

#[test]
fn round_trip_preserves_bytes() {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Sample {
        id: u16,
        payload: [u8; 6],
    }

    let rb: RingBuffer<Sample> = RingBuffer::new(5).unwrap();
    let samples: Vec<Sample> = (0..5u16)
        .map(|id| Sample {
            id,
            payload: [id as u8; 6],
        })
        .collect();

    // Rotate the window so the round trip crosses the storage end.
    rb.enqueue(samples[0]).unwrap();
    rb.dequeue();

    for s in &samples {
        rb.enqueue(*s).unwrap();
    }
    assert!(rb.is_full());

    let mut out = [Sample {
        id: 0,
        payload: [0; 6],
    }; 5];
    assert_eq!(rb.dequeue_into(&mut out), Ok(5));
    assert_eq!(out.to_vec(), samples);
}

#[test]
fn owned_elements_move_through() {
    let rb: RingBuffer<String> = RingBuffer::new(3).unwrap();
    rb.enqueue("alpha".to_string()).unwrap();
    rb.enqueue("beta".to_string()).unwrap();

    let lengths = rb.map(|s| s.len()).unwrap();
    assert_eq!(lengths.to_vec(), vec![5, 4]);

    let joined = rb.inject(String::new(), |mut acc, s| {
        acc.push_str(s);
        acc
    });
    assert_eq!(joined, "alphabeta");

    let mut out = Vec::new();
    assert_eq!(rb.dequeue_multiple(&mut out, 1), Ok(1));
    assert_eq!(out, vec!["alpha".to_string()]);
    rb.destroy();
}

#[test]
fn creation_failures_are_distinguishable() {
    assert_eq!(
        RingBuffer::<u32>::new(0).err(),
        Some(RingError::ZeroCapacity)
    );

    let cfg = RingConfig::RESTRICTIVE;
    let err = RingBuffer::<[u8; 8192]>::with_config(cfg).unwrap_err();
    assert!(err.is_over_budget());
    assert!(!err.is_allocation_failure());

    let err = RingBuffer::<u32>::with_config(RingConfig::new(4).with_max_storage_bytes(0))
        .unwrap_err();
    assert!(matches!(err, RingError::InvalidConfig { .. }));
}
