//! Binary semaphore used as the per-buffer blocking lock.
//!
//! # Purpose
//!
//! Each ring buffer owns exactly one of these. Every locked operation holds a
//! `SemPermit` for its whole critical section; the permit is RAII, so the
//! semaphore is released on every exit path including unwinding.
//!
//! # Operations
//!
//! | Operation          | Behavior                          |
//! |--------------------|-----------------------------------|
//! | `acquire()`        | Blocks until available            |
//! | `try_acquire()`    | Never blocks                      |
//! | `acquire_timeout()`| Blocks up to a deadline           |
//! | permit drop        | Marks available + `notify_one`    |
//!
//! # Design Notes
//!
//! - Mutex + Condvar rather than a bare `Mutex<()>` so the holder can be a
//!   scoped guard with a bounded wait, which `std::sync::Mutex` lacks.
//! - The inner mutex only protects a `bool` and no caller code runs while it
//!   is held, so poison recovery cannot observe a torn state.

#[cfg(loom)]
use loom::sync::{Condvar, Mutex, MutexGuard};
#[cfg(not(loom))]
use std::sync::{Condvar, Mutex, MutexGuard};

#[cfg(not(loom))]
use std::time::{Duration, Instant};

/// Blocking binary semaphore, initialized available.
#[derive(Debug)]
pub struct BinarySemaphore {
    /// `true` while a permit is outstanding.
    taken: Mutex<bool>,
    cv: Condvar,
}

impl BinarySemaphore {
    /// Creates an available semaphore.
    pub fn new() -> Self {
        Self {
            taken: Mutex::new(false),
            cv: Condvar::new(),
        }
    }

    /// Lock state with poison recovery.
    #[inline]
    fn lock_or_recover(&self) -> MutexGuard<'_, bool> {
        match self.taken.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }

    /// Acquires the semaphore, blocking indefinitely.
    pub fn acquire(&self) -> SemPermit<'_> {
        let mut taken = self.lock_or_recover();
        while *taken {
            taken = match self.cv.wait(taken) {
                Ok(guard) => guard,
                Err(poison) => poison.into_inner(),
            };
        }
        *taken = true;
        SemPermit { sem: self }
    }

    /// Acquires the semaphore if it is available right now.
    pub fn try_acquire(&self) -> Option<SemPermit<'_>> {
        let mut taken = self.lock_or_recover();
        if *taken {
            return None;
        }
        *taken = true;
        Some(SemPermit { sem: self })
    }

    /// Acquires the semaphore, giving up after `timeout`.
    #[cfg(not(loom))]
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<SemPermit<'_>> {
        let deadline = Instant::now() + timeout;
        let mut taken = self.lock_or_recover();

        while *taken {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = match self.cv.wait_timeout(taken, remaining) {
                Ok(res) => res,
                Err(poison) => poison.into_inner(),
            };
            taken = guard;
        }

        *taken = true;
        Some(SemPermit { sem: self })
    }

    /// Snapshot of whether a permit is outstanding.
    pub fn is_taken(&self) -> bool {
        *self.lock_or_recover()
    }

    fn release(&self) {
        let mut taken = self.lock_or_recover();
        debug_assert!(*taken, "semaphore released while available");
        *taken = false;

        // Drop lock before notifying to reduce contention.
        drop(taken);

        // Binary: at most one waiter can make progress.
        self.cv.notify_one();
    }
}

impl Default for BinarySemaphore {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII permit for `BinarySemaphore`. Releases on drop.
#[derive(Debug)]
#[must_use = "the semaphore is released as soon as the permit is dropped"]
pub struct SemPermit<'a> {
    sem: &'a BinarySemaphore,
}

impl Drop for SemPermit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}
