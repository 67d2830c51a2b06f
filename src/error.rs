//! Error types for buffer creation and transfer.
//!
//! Expected outcomes (`Full`, `Empty`, `LockTimeout`) are plain values so
//! producer/consumer loops can check and retry without unwinding. `RingError`
//! covers creation, including the destination buffer built by `map`.

use std::fmt;

/// Errors returned when a buffer cannot be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingError {
    /// Capacity was zero.
    ZeroCapacity,
    /// The element type has no size.
    ZeroSizedElement,
    /// `capacity * element_size` does not fit in an allocation.
    CapacityOverflow { capacity: u32, element_size: usize },
    /// The configuration failed `RingConfig::try_validate`.
    InvalidConfig { reason: &'static str },
    /// Storage would exceed the configured byte budget.
    OverBudget { bytes: usize, budget: usize },
    /// The allocator returned no memory.
    AllocationFailure { bytes: usize },
}

impl RingError {
    /// True when the request was well-formed but the allocator refused it.
    #[inline]
    pub const fn is_allocation_failure(&self) -> bool {
        matches!(self, Self::AllocationFailure { .. })
    }

    /// True when storage was refused by the configured budget.
    #[inline]
    pub const fn is_over_budget(&self) -> bool {
        matches!(self, Self::OverBudget { .. })
    }
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "ring capacity must be > 0"),
            Self::ZeroSizedElement => write!(f, "ring element size must be > 0"),
            Self::CapacityOverflow {
                capacity,
                element_size,
            } => write!(
                f,
                "ring storage overflows: {capacity} elements of {element_size} bytes"
            ),
            Self::InvalidConfig { reason } => write!(f, "invalid ring config: {reason}"),
            Self::OverBudget { bytes, budget } => write!(
                f,
                "ring storage of {bytes} bytes exceeds budget of {budget} bytes"
            ),
            Self::AllocationFailure { bytes } => {
                write!(f, "failed to allocate {bytes} bytes of ring storage")
            }
        }
    }
}

impl std::error::Error for RingError {}

/// Enqueue rejected because the buffer was at capacity.
///
/// Carries the rejected value back to the caller; nothing is overwritten.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that was not enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

impl<T> fmt::Display for Full<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ring buffer is full")
    }
}

impl<T> std::error::Error for Full<T> {}

/// Bulk dequeue found no live elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Empty;

impl fmt::Display for Empty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ring buffer is empty")
    }
}

impl std::error::Error for Empty {}

/// Bounded lock acquisition gave up before the lock became available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockTimeout;

impl fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("timed out waiting for ring buffer lock")
    }
}

impl std::error::Error for LockTimeout {}
