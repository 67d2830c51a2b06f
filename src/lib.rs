//! Fixed-capacity circular buffer shared between execution contexts.
//!
//! ## Scope
//! A generic FIFO ring whose storage is allocated once at creation and never
//! grows. Each buffer owns one blocking lock; every operation that touches the
//! cursors or the slots holds it for its whole critical section and releases
//! it on every exit path.
//!
//! ## Key invariants
//! - `0 <= len <= capacity`; the live count, not cursor positions, decides
//!   between empty and full (`head == tail` in both cases).
//! - Only the live window `[head, head + len)` (wrapping) is ever read.
//! - A full buffer rejects new elements; nothing is overwritten.
//! - Full, empty, and partial transfers are ordinary return values.
//!
//! ## Operations
//! - `enqueue` / `dequeue`: single element transfer.
//! - `dequeue_multiple` / `dequeue_into`: bulk transfer in at most two
//!   contiguous copies.
//! - `scan` (alias `each`): read-only visitation oldest-to-newest.
//! - `inject` (alias `reduce`): left fold with an independent accumulator.
//! - `map`: transformed copy into a new, independently locked buffer.
//! - `is_empty` / `is_full` / `len`: lock-free snapshots.
//!
//! ## Locking
//! One-shot methods wait forever for the lock. `RingBuffer::lock_timeout` and
//! `RingBuffer::try_lock` return a `RingGuard` for bounded acquisition and for
//! batching several operations under one acquisition. Callbacks run under the
//! lock; calling back into the same buffer panics instead of deadlocking.
//!
//! ## Notable entry points
//! - `RingBuffer` / `RingGuard`: the engine and its scoped lock session.
//! - `RingConfig`: creation-time limits.
//! - `RingError`, `Full`, `Empty`, `LockTimeout`: outcomes.
//! - `semaphore::BinarySemaphore`: the blocking primitive.

pub mod config;
pub mod error;
pub mod ring_buffer;
pub mod semaphore;

mod owner;
mod storage;

pub use config::RingConfig;
#[cfg(not(loom))]
pub use error::LockTimeout;
pub use error::{Empty, Full, RingError};
pub use ring_buffer::{Cursors, RingBuffer, RingGuard};
