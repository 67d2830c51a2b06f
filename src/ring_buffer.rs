//! Fixed-capacity ring buffer shared between threads through a blocking lock.
//!
//! # Design
//!
//! One `RingBuffer<T>` owns one heap slot array (`RingStorage<T>`) and one
//! `BinarySemaphore`. Every operation that reads or writes the cursors or the
//! slots runs inside a `RingGuard`, a scoped session holding the semaphore
//! permit. The permit is released when the guard drops, so every exit path
//! (full, empty, allocation failure, callback panic) releases the lock.
//!
//! The one-shot methods on `RingBuffer` (`enqueue`, `dequeue`, `scan`, ...)
//! each take a guard for exactly one operation and wait forever for it.
//! `lock_timeout` and `try_lock` offer bounded acquisition and let a caller
//! batch several operations under one acquisition.
//!
//! # Occupancy
//!
//! `head == tail` holds for both an empty and a full buffer; the live count
//! alone decides which. The count is mirrored into an atomic after every
//! mutation so `is_empty`/`is_full`/`len` can read it without the lock. Those
//! reads are snapshots and may be stale by the time the caller acts on them.
//!
//! # Callbacks
//!
//! `scan`, `inject` and `map` invoke caller closures while the lock is held.
//! A closure that calls back into the same buffer panics (see `owner`) rather
//! than deadlocking. Element borrows handed to closures cannot escape the
//! call.

use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;

#[cfg(not(loom))]
use std::sync::atomic::{AtomicU32, Ordering};
#[cfg(not(loom))]
use std::time::Duration;

#[cfg(loom)]
use loom::sync::atomic::{AtomicU32, Ordering};

use crossbeam_utils::CachePadded;

use crate::config::RingConfig;
#[cfg(not(loom))]
use crate::error::LockTimeout;
use crate::error::{Empty, Full, RingError};
use crate::owner::HolderSlot;
use crate::semaphore::{BinarySemaphore, SemPermit};
use crate::storage::RingStorage;

/// Cursor positions captured under the lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursors {
    /// Slot index of the oldest live element.
    pub head: u32,
    /// Slot index the next enqueue writes to.
    pub tail: u32,
    /// Live element count.
    pub len: u32,
    /// Bytes per slot.
    pub element_size: usize,
}

impl Cursors {
    /// Byte offset of `head` within storage.
    #[inline]
    pub fn head_offset(&self) -> usize {
        self.head as usize * self.element_size
    }

    /// Byte offset of `tail` within storage.
    #[inline]
    pub fn tail_offset(&self) -> usize {
        self.tail as usize * self.element_size
    }
}

/// Fixed-capacity FIFO of `T`, safe to share across threads.
///
/// A full buffer rejects new elements (`Full`) instead of overwriting the
/// oldest one.
///
/// # Thread Safety
///
/// Share via `&RingBuffer<T>` or `Arc<RingBuffer<T>>`. Operations on one
/// buffer are serialized by its lock; different buffers never contend.
pub struct RingBuffer<T> {
    storage: UnsafeCell<RingStorage<T>>,
    /// Live count published after each mutation, read lock-free.
    len: CachePadded<AtomicU32>,
    capacity: u32,
    config: RingConfig,
    lock: BinarySemaphore,
    holder: HolderSlot,
}

// SAFETY: `storage` is only touched through a `RingGuard`, which holds the
// semaphore permit, so access is exclusive. As with `Mutex<T>`, moving
// values between threads requires `T: Send` and nothing more.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer holding up to `capacity` elements. Only the
    /// allocator can refuse the storage.
    pub fn new(capacity: u32) -> Result<Self, RingError> {
        Self::with_config(RingConfig::new(capacity))
    }

    /// Creates an empty buffer from `config`.
    ///
    /// Fails without allocating on zero capacity, zero-sized `T`, an invalid
    /// config, or storage over the config's budget, and reports allocator
    /// refusal as `RingError::AllocationFailure`.
    pub fn with_config(config: RingConfig) -> Result<Self, RingError> {
        let storage = RingStorage::try_new(&config).map_err(|err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                capacity = config.capacity,
                element_size = mem::size_of::<T>(),
                error = %err,
                "ring buffer creation refused"
            );
            err
        })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            capacity = config.capacity,
            element_size = mem::size_of::<T>(),
            bytes = config.capacity as usize * mem::size_of::<T>(),
            "ring buffer created"
        );

        Ok(Self {
            capacity: storage.capacity(),
            storage: UnsafeCell::new(storage),
            len: CachePadded::new(AtomicU32::new(0)),
            config,
            lock: BinarySemaphore::new(),
            holder: HolderSlot::new(),
        })
    }

    /// Acquires the lock, blocking until it is available.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this buffer's lock.
    #[track_caller]
    pub fn lock(&self) -> RingGuard<'_, T> {
        self.holder.assert_not_held_by_current();
        let permit = self.lock.acquire();
        RingGuard::new(self, permit)
    }

    /// Acquires the lock only if no one holds it.
    pub fn try_lock(&self) -> Option<RingGuard<'_, T>> {
        let permit = self.lock.try_acquire()?;
        Some(RingGuard::new(self, permit))
    }

    /// Acquires the lock, giving up after `timeout`.
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this buffer's lock.
    #[cfg(not(loom))]
    #[track_caller]
    pub fn lock_timeout(&self, timeout: Duration) -> Result<RingGuard<'_, T>, LockTimeout> {
        self.holder.assert_not_held_by_current();
        match self.lock.acquire_timeout(timeout) {
            Some(permit) => Ok(RingGuard::new(self, permit)),
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(?timeout, "ring buffer lock timed out");
                Err(LockTimeout)
            }
        }
    }

    /// Appends `value`, or returns it inside `Full` when at capacity.
    #[inline]
    pub fn enqueue(&self, value: T) -> Result<(), Full<T>> {
        self.lock().enqueue(value)
    }

    /// Removes and returns the oldest element, or `None` when empty.
    #[inline]
    pub fn dequeue(&self) -> Option<T> {
        self.lock().dequeue()
    }

    /// Moves up to `requested` of the oldest elements onto the end of `out`.
    ///
    /// Returns how many were moved, which may be fewer than `requested`.
    /// Fails with `Empty` when nothing is live.
    pub fn dequeue_multiple(&self, out: &mut Vec<T>, requested: u32) -> Result<u32, Empty> {
        // Grow `out` before taking the lock so the critical section only copies.
        out.reserve(requested.min(self.capacity) as usize);
        self.lock().dequeue_multiple(out, requested)
    }

    /// Copies up to `out.len()` of the oldest elements into `out` and removes
    /// them. Returns how many were copied. Fails with `Empty` when nothing is
    /// live.
    pub fn dequeue_into(&self, out: &mut [T]) -> Result<u32, Empty>
    where
        T: Copy,
    {
        self.lock().dequeue_into(out)
    }

    /// Visits every live element oldest-to-newest with its zero-based index.
    ///
    /// Nothing is removed. `visit` must not call back into this buffer.
    #[doc(alias = "each")]
    pub fn scan<F>(&self, visit: F)
    where
        F: FnMut(&T, u32),
    {
        self.lock().scan(visit)
    }

    /// Left fold over live elements oldest-to-newest, starting from `seed`.
    ///
    /// Returns `seed` unchanged when empty. `combine` must not call back into
    /// this buffer.
    #[doc(alias = "reduce")]
    pub fn inject<A, F>(&self, seed: A, combine: F) -> A
    where
        F: FnMut(A, &T) -> A,
    {
        self.lock().inject(seed, combine)
    }

    /// Builds a new buffer with the same capacity and config whose elements
    /// are `transform` applied to each live element, oldest-to-newest.
    ///
    /// The source is left unchanged and its lock is released on every path.
    pub fn map<U, F>(&self, transform: F) -> Result<RingBuffer<U>, RingError>
    where
        F: FnMut(&T) -> U,
    {
        self.lock().map(transform)
    }

    /// Drops every live element.
    pub fn clear(&self) {
        self.lock().clear()
    }

    /// Cursor positions captured under the lock.
    pub fn cursors(&self) -> Cursors {
        self.lock().cursors()
    }

    /// Clones live elements oldest-to-newest into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.lock().to_vec()
    }

    /// Lock-free snapshot: true when no elements are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock-free snapshot: true when `len == capacity`.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Lock-free snapshot of the live element count.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Bytes per element (`size_of::<T>()`).
    #[inline]
    pub const fn element_size(&self) -> usize {
        mem::size_of::<T>()
    }

    /// Total bytes of slot storage.
    #[inline]
    pub fn storage_bytes(&self) -> usize {
        self.capacity as usize * mem::size_of::<T>()
    }

    #[inline]
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Releases storage (dropping live elements) and the buffer itself.
    pub fn destroy(self) {
        #[cfg(feature = "tracing")]
        {
            let live = self.len();
            if live > 0 {
                tracing::debug!(
                    live,
                    capacity = self.capacity,
                    "ring buffer destroyed with live elements"
                );
            }
        }
        drop(self);
    }

    /// Destroys the buffer in `slot`, if any. An empty slot is a no-op.
    pub fn destroy_opt(slot: &mut Option<Self>) {
        if let Some(ring) = slot.take() {
            ring.destroy();
        }
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("element_size", &mem::size_of::<T>())
            .finish()
    }
}

/// Scoped lock session on a `RingBuffer`.
///
/// Holds the buffer's lock until dropped. Every locked operation is available
/// here, so a caller can batch several under one acquisition. Not `Send`: the
/// guard must be dropped on the thread that acquired it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct RingGuard<'a, T> {
    ring: &'a RingBuffer<T>,
    _permit: SemPermit<'a>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T> RingGuard<'a, T> {
    fn new(ring: &'a RingBuffer<T>, permit: SemPermit<'a>) -> Self {
        ring.holder.enter();
        Self {
            ring,
            _permit: permit,
            _not_send: PhantomData,
        }
    }

    #[inline]
    fn storage(&self) -> &RingStorage<T> {
        // SAFETY: the permit gives this guard exclusive access.
        unsafe { &*self.ring.storage.get() }
    }

    #[inline]
    fn storage_mut(&mut self) -> &mut RingStorage<T> {
        // SAFETY: the permit gives this guard exclusive access, and `&mut self`
        // rules out outstanding shared borrows from this guard.
        unsafe { &mut *self.ring.storage.get() }
    }

    /// Mirrors the live count for lock-free readers.
    #[inline]
    fn publish_len(&self) {
        self.ring.len.store(self.storage().len(), Ordering::Relaxed);
    }

    /// Appends `value`, or returns it inside `Full` when at capacity.
    pub fn enqueue(&mut self, value: T) -> Result<(), Full<T>> {
        match self.storage_mut().push_back(value) {
            Ok(()) => {
                self.publish_len();
                Ok(())
            }
            Err(value) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(capacity = self.ring.capacity, "enqueue rejected: ring full");
                Err(Full(value))
            }
        }
    }

    /// Removes and returns the oldest element, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<T> {
        let value = self.storage_mut().pop_front();
        if value.is_some() {
            self.publish_len();
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!("dequeue rejected: ring empty");
        }
        value
    }

    /// Moves up to `requested` of the oldest elements onto the end of `out`.
    pub fn dequeue_multiple(&mut self, out: &mut Vec<T>, requested: u32) -> Result<u32, Empty> {
        if self.storage().is_empty() {
            return Err(Empty);
        }
        let moved = self.storage_mut().move_front_into_vec(out, requested);
        self.publish_len();
        Ok(moved)
    }

    /// Copies up to `out.len()` of the oldest elements into `out` and removes
    /// them.
    pub fn dequeue_into(&mut self, out: &mut [T]) -> Result<u32, Empty>
    where
        T: Copy,
    {
        if self.storage().is_empty() {
            return Err(Empty);
        }
        let copied = self.storage_mut().copy_front_into_slice(out);
        self.publish_len();
        Ok(copied)
    }

    /// Visits every live element oldest-to-newest with its zero-based index.
    #[doc(alias = "each")]
    pub fn scan<F>(&self, mut visit: F)
    where
        F: FnMut(&T, u32),
    {
        for (i, value) in self.storage().iter().enumerate() {
            // len <= capacity: u32, so the index fits.
            visit(value, i as u32);
        }
    }

    /// Left fold over live elements oldest-to-newest.
    #[doc(alias = "reduce")]
    pub fn inject<A, F>(&self, seed: A, combine: F) -> A
    where
        F: FnMut(A, &T) -> A,
    {
        self.storage().iter().fold(seed, combine)
    }

    /// Builds a new independently locked buffer of transformed elements.
    pub fn map<U, F>(&self, mut transform: F) -> Result<RingBuffer<U>, RingError>
    where
        F: FnMut(&T) -> U,
    {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            len = self.storage().len(),
            target_element_size = mem::size_of::<U>(),
            "mapping ring buffer"
        );

        let mapped = RingBuffer::<U>::with_config(self.ring.config).map_err(|err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "mapped ring buffer allocation failed");
            err
        })?;

        for value in self.storage().iter() {
            let scratch = transform(value);
            // Same capacity as the source, so the destination cannot fill up.
            let accepted = mapped.enqueue(scratch);
            debug_assert!(accepted.is_ok(), "mapped buffer overflowed");
        }
        Ok(mapped)
    }

    /// Drops every live element and rewinds the cursors.
    pub fn clear(&mut self) {
        self.storage_mut().clear();
        self.publish_len();
    }

    /// Live element count (exact while the guard is held).
    #[inline]
    pub fn len(&self) -> u32 {
        self.storage().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage().is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.storage().is_full()
    }

    /// Current cursor positions.
    pub fn cursors(&self) -> Cursors {
        let s = self.storage();
        Cursors {
            head: s.head(),
            tail: s.tail(),
            len: s.len(),
            element_size: mem::size_of::<T>(),
        }
    }

    /// Clones live elements oldest-to-newest into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let (a, b) = self.storage().as_slices();
        let mut out = Vec::with_capacity(a.len() + b.len());
        out.extend_from_slice(a);
        out.extend_from_slice(b);
        out
    }
}

impl<T> Drop for RingGuard<'_, T> {
    fn drop(&mut self) {
        // Runs before `_permit` is dropped, so the holder is cleared while the
        // lock is still ours.
        self.ring.holder.exit();
    }
}

impl<T> fmt::Debug for RingGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingGuard")
            .field("cursors", &self.cursors())
            .finish()
    }
}
