//! Unified error type for `malloc-core`.
//!
//! Mirrors the teacher's `MmError` shape: one enum, a hand-written
//! `Display`, and a `Result` alias. Production entry points (`allocate`,
//! `reallocate`) collapse every variant to a null pointer per the
//! allocator's error-handling policy -- no panics, no retries.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The provider refused to extend the heap.
    OutOfMemory,
    /// A debug heap-consistency check found a violated invariant.
    CorruptHeap,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "provider refused to extend the heap"),
            Self::CorruptHeap => write!(f, "heap consistency check failed"),
        }
    }
}

pub type AllocResult<T = ()> = Result<T, AllocError>;
