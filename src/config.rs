//! Creation-time limits for ring buffers.
//!
//! Capacity is fixed for the life of a buffer. The storage budget is opt-in:
//! `RingConfig::new` and `DEFAULT` accept any allocation the allocator grants,
//! while `BOUNDED` and `RESTRICTIVE` cap the single up-front allocation so a
//! misconfigured capacity fails at creation instead of exhausting a small heap.

/// Largest storage budget; any single allocation must fit in `isize`.
pub const UNBOUNDED_STORAGE_BYTES: usize = isize::MAX as usize;

/// Limits applied when a buffer is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingConfig {
    /// Maximum number of live elements.
    ///
    /// Default: 64.
    pub capacity: u32,

    /// Upper bound on `capacity * element_size` in bytes.
    ///
    /// Default: `isize::MAX` (no budget beyond the allocator's own limit).
    pub max_storage_bytes: usize,
}

impl RingConfig {
    /// General-purpose defaults. Only the allocator can refuse storage.
    pub const DEFAULT: Self = Self {
        capacity: 64,
        max_storage_bytes: UNBOUNDED_STORAGE_BYTES,
    };

    /// Defaults with a 64 MiB storage budget.
    pub const BOUNDED: Self = Self {
        capacity: 64,
        max_storage_bytes: 64 * 1024 * 1024, // 64 MiB
    };

    /// Small limits for tests or constrained targets.
    pub const RESTRICTIVE: Self = Self {
        capacity: 16,
        max_storage_bytes: 64 * 1024, // 64 KiB
    };

    /// Config with `capacity` and no storage budget.
    pub const fn new(capacity: u32) -> Self {
        Self {
            capacity,
            max_storage_bytes: Self::DEFAULT.max_storage_bytes,
        }
    }

    /// Replaces the storage budget.
    #[must_use]
    pub const fn with_max_storage_bytes(mut self, bytes: usize) -> Self {
        self.max_storage_bytes = bytes;
        self
    }

    /// Validates that limits are usable.
    ///
    /// # Panics
    ///
    /// Panics if limits are invalid (configuration bug).
    #[track_caller]
    pub const fn validate(&self) {
        assert!(self.capacity > 0, "ring capacity must be > 0");
        assert!(self.max_storage_bytes > 0, "storage budget must be > 0");
        assert!(
            self.max_storage_bytes <= isize::MAX as usize,
            "storage budget exceeds isize::MAX"
        );
    }

    /// Non-panicking validation for runtime configuration.
    pub const fn try_validate(&self) -> Result<(), &'static str> {
        if self.capacity == 0 {
            return Err("ring capacity must be > 0");
        }
        if self.max_storage_bytes == 0 {
            return Err("storage budget must be > 0");
        }
        if self.max_storage_bytes > isize::MAX as usize {
            return Err("storage budget exceeds isize::MAX");
        }
        Ok(())
    }

    /// Bytes of storage needed for `element_size`-byte elements, or `None`
    /// on overflow.
    #[inline]
    pub const fn storage_bytes_for(&self, element_size: usize) -> Option<usize> {
        match element_size.checked_mul(self.capacity as usize) {
            Some(bytes) if bytes <= isize::MAX as usize => Some(bytes),
            _ => None,
        }
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = RingConfig::DEFAULT.validate();
const _: () = RingConfig::BOUNDED.validate();
const _: () = RingConfig::RESTRICTIVE.validate();
