//! Holder tracking for fail-fast detection of re-entrant acquisition.
//!
//! A callback running under a buffer's lock that calls back into the same
//! buffer would block on a lock its own thread holds. Instead of hanging, the
//! buffer records which thread holds the lock and panics on re-entry.
//!
//! Tokens are the address of a thread-local, which is unique among live
//! threads. Under `loom`, modelled threads share one OS thread, so tracking is
//! compiled out.

#[cfg(not(loom))]
use std::sync::atomic::{AtomicUsize, Ordering};

/// Sentinel meaning "no holder".
#[cfg(not(loom))]
const NO_HOLDER: usize = 0;

#[cfg(not(loom))]
fn current_token() -> usize {
    thread_local! {
        static TOKEN: u8 = const { 0 };
    }
    TOKEN.with(|t| t as *const u8 as usize)
}

/// Records the thread currently holding a buffer's lock.
#[derive(Debug, Default)]
pub(crate) struct HolderSlot {
    #[cfg(not(loom))]
    holder: AtomicUsize,
}

impl HolderSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Panics if the calling thread already holds the lock.
    ///
    /// Only the holding thread ever stores its own token, so seeing our token
    /// here means we hold the lock. A relaxed load suffices.
    #[inline]
    #[track_caller]
    pub(crate) fn assert_not_held_by_current(&self) {
        #[cfg(not(loom))]
        assert!(
            self.holder.load(Ordering::Relaxed) != current_token(),
            "re-entrant ring buffer access: this thread already holds the lock \
             (callbacks and guards must not call back into the same buffer)"
        );
    }

    /// Marks the calling thread as holder. Call right after acquiring.
    #[inline]
    pub(crate) fn enter(&self) {
        #[cfg(not(loom))]
        self.holder.store(current_token(), Ordering::Relaxed);
    }

    /// Clears the holder. Call right before releasing.
    #[inline]
    pub(crate) fn exit(&self) {
        #[cfg(not(loom))]
        self.holder.store(NO_HOLDER, Ordering::Relaxed);
    }
}
