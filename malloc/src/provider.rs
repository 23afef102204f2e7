//! The external `sbrk`-style collaborator.
//!
//! Out of scope for this crate's own contract (the allocator only ever
//! calls through this trait); a real embedder wraps an actual `sbrk` or
//! `mmap`-backed region, and tests use a fixed-capacity buffer that never
//! moves (see `testing::VecProvider`).

use crate::error::AllocResult;

pub trait Provider {
    /// A fixed base address, constant for the lifetime of the process.
    fn heap_lo(&self) -> usize;

    /// Address of the current last valid byte in the heap.
    fn heap_hi(&self) -> usize;

    /// Extend the heap by `n` bytes. Returns the address of the first
    /// byte of the newly added region (the old top of heap) on success.
    /// Leaves the heap unchanged on failure.
    fn heap_extend(&mut self, n: u32) -> AllocResult<usize>;
}
