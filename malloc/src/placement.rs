//! Placement (split): carve a `request`-sized allocation out of a
//! free block that is known to be at least that large.

use crate::block;
use crate::list;
use crate::tunables::MIN_BLOCK_SIZE;

/// `p` must already be unlinked from its free list, with
/// `block_size = block::size(p) >= request`. Returns `p`, now allocated.
pub unsafe fn place(base: usize, p: *mut u8, request: u32, block_size: u32) -> *mut u8 {
    unsafe {
        if block_size - request < MIN_BLOCK_SIZE {
            block::set_alloc(p, true);
            let next = block::phys_next(p);
            block::set_prev_alloc(next, true);
            return p;
        }

        block::set_alloc(p, true);
        block::set_size_header_only(p, request);

        let remainder = p.add(request as usize);
        block::set_header(remainder, 0);
        block::set_prev_alloc(remainder, true);
        block::set_size(remainder, block_size - request);
        list::insert_free(base, remainder);

        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::VecProvider;

    #[test]
    fn splits_when_remainder_is_usable() {
        let mut heap = VecProvider::new(1 << 16);
        let base = heap.heap_lo();
        // A single 64-byte free block, already unlinked (test fixture: no
        // prologue needed, place() only touches p and its successor).
        let p = unsafe { (base as *mut u8).add(crate::tunables::FIRST_BLOCK_OFFSET as usize) };
        unsafe {
            block::set_header(p, 0);
            block::set_prev_alloc(p, true);
            block::set_size(p, 64);
            // Successor boundary marker so phys_next has somewhere to land.
            let next = block::phys_next(p);
            block::set_header(next, 0);

            let out = place(base, p, 16, 64);
            assert_eq!(out, p);
            assert!(block::is_allocated(p));
            assert_eq!(block::size(p), 16);

            let rem = p.add(16);
            assert!(!block::is_allocated(rem));
            assert_eq!(block::size(rem), 48);
            assert!(block::is_prev_allocated(rem));
        }
    }

    #[test]
    fn consumes_whole_block_when_remainder_too_small() {
        let heap = VecProvider::new(1 << 16);
        let base = heap.heap_lo();
        let p = unsafe { (base as *mut u8).add(crate::tunables::FIRST_BLOCK_OFFSET as usize) };
        unsafe {
            block::set_header(p, 0);
            block::set_prev_alloc(p, true);
            block::set_size(p, 32);
            let next = block::phys_next(p);
            block::set_header(next, 0);

            let out = place(base, p, 32, 32);
            assert_eq!(out, p);
            assert!(block::is_allocated(p));
            assert_eq!(block::size(p), 32);
            assert!(block::is_prev_allocated(next));
        }
    }
}
