//! Fixed-capacity slot storage with wrap-around cursors and `MaybeUninit<T>`.
//!
//! # Invariants
//! - `capacity > 0` and `size_of::<T>() > 0`.
//! - `head < capacity`, `tail < capacity`, `len <= capacity`.
//! - `tail == (head + len) % capacity`; when `head == tail`, `len` alone
//!   decides between empty and full.
//! - Slots in the logical range `[head, head + len)` (wrapping) are
//!   initialized; all other slots are uninitialized and never read.
//!
//! # Threading
//! This type is not synchronized. `RingBuffer` wraps it behind its lock.

use std::alloc::{alloc, dealloc, Layout};
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};
use std::slice;

use crate::config::RingConfig;
use crate::error::RingError;

// Compile-time proof that u32 -> usize is lossless on this platform.
const _: () = assert!(
    mem::size_of::<usize>() >= mem::size_of::<u32>(),
    "Platform must have at least 32-bit addressing"
);

#[inline(always)]
fn index(i: u32) -> usize {
    i as usize
}

/// Heap slot array plus head/tail/len bookkeeping.
///
/// Storage is one allocation of `capacity * size_of::<T>()` bytes made at
/// creation; nothing allocates afterwards.
pub(crate) struct RingStorage<T> {
    slots: NonNull<MaybeUninit<T>>,
    layout: Layout,
    capacity: u32,
    head: u32,
    tail: u32,
    len: u32,
}

// SAFETY: `RingStorage` owns its `T`s exactly like `Vec<T>`.
unsafe impl<T: Send> Send for RingStorage<T> {}

impl<T> RingStorage<T> {
    /// Allocates empty storage for `config.capacity` elements.
    ///
    /// Any failure leaves nothing allocated.
    pub(crate) fn try_new(config: &RingConfig) -> Result<Self, RingError> {
        let element_size = mem::size_of::<T>();
        if element_size == 0 {
            return Err(RingError::ZeroSizedElement);
        }
        if config.capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        config
            .try_validate()
            .map_err(|reason| RingError::InvalidConfig { reason })?;

        let overflow = RingError::CapacityOverflow {
            capacity: config.capacity,
            element_size,
        };
        let bytes = config.storage_bytes_for(element_size).ok_or(overflow)?;
        if bytes > config.max_storage_bytes {
            return Err(RingError::OverBudget {
                bytes,
                budget: config.max_storage_bytes,
            });
        }
        let layout = Layout::array::<MaybeUninit<T>>(index(config.capacity))
            .map_err(|_| overflow)?;
        debug_assert_eq!(layout.size(), bytes);

        // SAFETY: layout has non-zero size (capacity > 0, element_size > 0).
        let raw = unsafe { alloc(layout) }.cast::<MaybeUninit<T>>();
        let slots = NonNull::new(raw).ok_or(RingError::AllocationFailure { bytes })?;

        Ok(Self {
            slots,
            layout,
            capacity: config.capacity,
            head: 0,
            tail: 0,
            len: 0,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub(crate) fn head(&self) -> u32 {
        self.head
    }

    #[inline]
    pub(crate) fn tail(&self) -> u32 {
        self.tail
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Advances slot index `idx` by `n` slots, wrapping at capacity.
    #[inline]
    fn wrap_add(&self, idx: u32, n: u32) -> u32 {
        debug_assert!(idx < self.capacity);
        debug_assert!(n <= self.capacity);
        // Both operands < 2^32, so the sum cannot overflow u64.
        let sum = idx as u64 + n as u64;
        let cap = self.capacity as u64;
        (if sum >= cap { sum - cap } else { sum }) as u32
    }

    #[inline]
    fn slot_ptr(&self, idx: u32) -> *mut MaybeUninit<T> {
        debug_assert!(idx < self.capacity, "slot index out of bounds");
        // SAFETY: idx < capacity, so the offset stays inside the allocation.
        unsafe { self.slots.as_ptr().add(index(idx)) }
    }

    #[inline]
    fn check_cursors(&self) {
        debug_assert!(self.len <= self.capacity);
        debug_assert!(self.head < self.capacity, "head out of bounds");
        debug_assert!(self.tail < self.capacity, "tail out of bounds");
        debug_assert_eq!(self.tail, self.wrap_add(self.head, self.len));
    }

    /// Appends `value` at `tail`, or hands it back when full.
    #[inline]
    pub(crate) fn push_back(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }

        // SAFETY: tail < capacity; the slot is outside the live window so it
        // holds no initialized value that would be leaked.
        unsafe { (*self.slot_ptr(self.tail)).write(value) };
        self.tail = self.wrap_add(self.tail, 1);
        self.len += 1;

        self.check_cursors();
        Ok(())
    }

    /// Removes and returns the oldest element, or `None` when empty.
    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: head < capacity, and the slot is initialized because len > 0.
        let value = unsafe { (*self.slot_ptr(self.head)).assume_init_read() };
        self.head = self.wrap_add(self.head, 1);
        self.len -= 1;

        self.check_cursors();
        Some(value)
    }

    /// Raw pointers and lengths of the first `n` live elements as at most two
    /// contiguous runs: `[head, min(head + n, capacity))` then `[0, rest)`.
    #[inline]
    fn front_runs_raw(&self, n: u32) -> ((*const T, usize), (*const T, usize)) {
        debug_assert!(n <= self.len);
        let to_end = self.capacity - self.head;
        let first = n.min(to_end);
        let second = n - first;
        (
            (self.slot_ptr(self.head).cast::<T>().cast_const(), index(first)),
            (self.slots.as_ptr().cast::<T>().cast_const(), index(second)),
        )
    }

    /// Live elements oldest-to-newest as two contiguous slices.
    ///
    /// The second slice is empty unless the live window wraps.
    pub(crate) fn as_slices(&self) -> (&[T], &[T]) {
        let ((a_ptr, a_len), (b_ptr, b_len)) = self.front_runs_raw(self.len);
        // SAFETY: both runs lie within the live window, which is initialized.
        // The two runs never overlap because len <= capacity.
        unsafe {
            (
                slice::from_raw_parts(a_ptr, a_len),
                slice::from_raw_parts(b_ptr, b_len),
            )
        }
    }

    /// Iterates live elements oldest-to-newest without removing them.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        let (a, b) = self.as_slices();
        a.iter().chain(b.iter())
    }

    /// Moves up to `requested` of the oldest elements onto the end of `out`.
    ///
    /// Returns the number moved. Uses one or two bulk copies depending on
    /// whether the window wraps.
    pub(crate) fn move_front_into_vec(&mut self, out: &mut Vec<T>, requested: u32) -> u32 {
        let n = self.len.min(requested);
        if n == 0 {
            return 0;
        }
        // Reserve before touching cursors; a panic here leaves state intact.
        out.reserve(index(n));

        let ((a_ptr, a_len), (b_ptr, b_len)) = self.front_runs_raw(n);
        let base = out.len();
        // SAFETY: `out` has room for `n` more elements. The source runs are
        // initialized and become logically uninitialized once head advances
        // below, so each value is moved exactly once.
        unsafe {
            let dst = out.as_mut_ptr().add(base);
            ptr::copy_nonoverlapping(a_ptr, dst, a_len);
            ptr::copy_nonoverlapping(b_ptr, dst.add(a_len), b_len);
            out.set_len(base + a_len + b_len);
        }

        self.advance_head(n);
        n
    }

    /// Copies up to `out.len()` of the oldest elements into `out` and removes
    /// them. Returns the number copied.
    pub(crate) fn copy_front_into_slice(&mut self, out: &mut [T]) -> u32
    where
        T: Copy,
    {
        let requested = u32::try_from(out.len()).unwrap_or(u32::MAX);
        let n = self.len.min(requested);
        if n == 0 {
            return 0;
        }

        let ((a_ptr, a_len), (b_ptr, b_len)) = self.front_runs_raw(n);
        // SAFETY: runs are initialized and disjoint from `out`, which is a
        // caller-owned slice.
        let (a, b) = unsafe {
            (
                slice::from_raw_parts(a_ptr, a_len),
                slice::from_raw_parts(b_ptr, b_len),
            )
        };
        out[..a_len].copy_from_slice(a);
        out[a_len..a_len + b_len].copy_from_slice(b);

        self.advance_head(n);
        n
    }

    #[inline]
    fn advance_head(&mut self, n: u32) {
        debug_assert!(n <= self.len);
        self.head = self.wrap_add(self.head, n);
        self.len -= n;
        self.check_cursors();
    }

    /// Drops all live elements and rewinds both cursors to slot 0.
    pub(crate) fn clear(&mut self) {
        if self.len > 0 && mem::needs_drop::<T>() {
            let ((a_ptr, a_len), (b_ptr, b_len)) = self.front_runs_raw(self.len);
            // Rewind first so a panicking destructor cannot cause a double drop.
            self.reset_cursors();
            // SAFETY: both runs are initialized and dropped exactly once.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(a_ptr.cast_mut(), a_len));
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(b_ptr.cast_mut(), b_len));
            }
        }
        self.reset_cursors();

        debug_assert!(self.is_empty());
    }

    #[inline]
    fn reset_cursors(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Frees the slot allocation when dropped, including while unwinding out of
/// a panicking element destructor.
struct DeallocOnDrop {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Drop for DeallocOnDrop {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `alloc(layout)` in `RingStorage::try_new` and
        // is freed only here.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl<T> Drop for RingStorage<T> {
    fn drop(&mut self) {
        let _dealloc = DeallocOnDrop {
            ptr: self.slots.cast::<u8>(),
            layout: self.layout,
        };
        self.clear();
    }
}
