//! Multi-threaded use of a shared buffer.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use locked_ring::{LockTimeout, RingBuffer};

#[test]
fn spsc_delivers_in_order() {
    const N: u64 = 20_000;
    let rb: Arc<RingBuffer<u64>> = Arc::new(RingBuffer::new(8).unwrap());

    let producer = {
        let rb = Arc::clone(&rb);
        thread::spawn(move || {
            for i in 0..N {
                let mut v = i;
                while let Err(full) = rb.enqueue(v) {
                    v = full.into_inner();
                    thread::yield_now();
                }
            }
        })
    };

    let mut next = 0;
    while next < N {
        match rb.dequeue() {
            Some(v) => {
                assert_eq!(v, next);
                next += 1;
            }
            None => thread::yield_now(),
        }
    }
    producer.join().unwrap();
    assert!(rb.is_empty());
}

#[test]
fn accepted_minus_removed_equals_len() {
    let rb: Arc<RingBuffer<u32>> = Arc::new(RingBuffer::new(32).unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(6));

    let threads: Vec<_> = (0..6)
        .map(|t| {
            let rb = Arc::clone(&rb);
            let accepted = Arc::clone(&accepted);
            let removed = Arc::clone(&removed);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut out = Vec::new();
                for i in 0..1_000u32 {
                    if t % 2 == 0 {
                        if rb.enqueue(i).is_ok() {
                            accepted.fetch_add(1, Ordering::Relaxed);
                        }
                    } else if i % 3 == 0 {
                        out.clear();
                        if let Ok(n) = rb.dequeue_multiple(&mut out, 4) {
                            removed.fetch_add(n as usize, Ordering::Relaxed);
                        }
                    } else if rb.dequeue().is_some() {
                        removed.fetch_add(1, Ordering::Relaxed);
                    }
                    assert!(rb.len() <= rb.capacity());
                }
            })
        })
        .collect();

    for th in threads {
        th.join().unwrap();
    }

    let expected = accepted.load(Ordering::Relaxed) - removed.load(Ordering::Relaxed);
    assert_eq!(rb.len() as usize, expected);
    assert_eq!(rb.cursors().len as usize, expected);
}

#[test]
fn readers_see_stable_window_while_writers_run() {
    let rb: Arc<RingBuffer<u32>> = Arc::new(RingBuffer::new(16).unwrap());
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let rb = Arc::clone(&rb);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut i = 0u32;
            while !stop.load(Ordering::Relaxed) {
                if rb.enqueue(i).is_ok() {
                    i += 1;
                } else {
                    rb.dequeue();
                }
            }
        })
    };

    for _ in 0..500 {
        // Values enter in increasing order, so any consistent window is
        // strictly increasing and indices are dense.
        let mut last: Option<u32> = None;
        let mut expected_index = 0;
        rb.scan(|v, i| {
            assert_eq!(i, expected_index);
            expected_index += 1;
            if let Some(prev) = last {
                assert!(*v > prev);
            }
            last = Some(*v);
        });

        let mapped = rb.map(|v| u64::from(*v)).unwrap();
        let snapshot = mapped.to_vec();
        assert!(snapshot.windows(2).all(|w| w[0] < w[1]));
    }

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

#[test]
fn bounded_lock_gives_up_then_succeeds() {
    let rb: Arc<RingBuffer<u8>> = Arc::new(RingBuffer::new(2).unwrap());
    let held = Arc::new(Barrier::new(2));
    let done = Arc::new(Barrier::new(2));

    let holder = {
        let rb = Arc::clone(&rb);
        let held = Arc::clone(&held);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut g = rb.lock();
            g.enqueue(1).unwrap();
            held.wait();
            done.wait();
        })
    };

    held.wait();
    assert!(rb.try_lock().is_none());
    assert_eq!(
        rb.lock_timeout(Duration::from_millis(20)).err(),
        Some(LockTimeout)
    );
    done.wait();
    holder.join().unwrap();

    let mut g = rb.lock_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(g.dequeue(), Some(1));
}

#[test]
fn independent_buffers_do_not_contend() {
    let a: Arc<RingBuffer<u8>> = Arc::new(RingBuffer::new(1).unwrap());
    let b: RingBuffer<u8> = RingBuffer::new(1).unwrap();

    let _held = a.lock();
    assert!(b.enqueue(1).is_ok());
    assert_eq!(b.dequeue(), Some(1));
    assert!(a.try_lock().is_none());
}
