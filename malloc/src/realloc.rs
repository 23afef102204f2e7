//! In-place reallocate: shrink by splitting off a free remainder, grow by
//! absorbing a free successor or extending the heap tail, otherwise move.

use core::ptr;

use crate::block;
use crate::list;
use crate::tunables::MIN_BLOCK_SIZE;

/// Shrink `p`'s block to `new` bytes (`new <= old`). Splits off the
/// remainder as a free block, coalescing it forward if its successor is
/// already free.
pub unsafe fn shrink(base: usize, p: *mut u8, old: u32, new: u32) -> *mut u8 {
    unsafe {
        if old - new < MIN_BLOCK_SIZE {
            return p;
        }

        block::set_size_header_only(p, new);
        let remainder = p.add(new as usize);
        block::set_header(remainder, 0);
        block::set_prev_alloc(remainder, true);
        block::set_size(remainder, old - new);

        let after = block::phys_next(remainder);
        if block::is_allocated(after) {
            block::set_prev_alloc(after, false);
            list::insert_free(base, remainder);
        } else {
            list::unlink(base, after);
            let combined = (old - new) + block::size(after);
            block::set_size(remainder, combined);
            list::insert_free(base, remainder);
        }

        p
    }
}

/// Grow `p`'s block in place by absorbing a free successor, or by
/// extending the heap if `p` is the last real block. Returns `None` when
/// neither applies, meaning the caller must move the allocation.
pub unsafe fn grow_in_place(base: usize, p: *mut u8, old: u32, new: u32) -> Option<*mut u8> {
    unsafe {
        let need = new - old;
        let b = block::phys_next(p);

        if !block::is_allocated(b) && block::size(b) >= need {
            if block::size(b) - need >= MIN_BLOCK_SIZE {
                list::unlink(base, b);
                let remainder_size = block::size(b) - need;
                let remainder = p.add(new as usize);
                block::set_header(remainder, 0);
                block::set_prev_alloc(remainder, true);
                block::set_size(remainder, remainder_size);
                list::insert_free(base, remainder);

                block::set_size_header_only(p, new);
            } else {
                list::unlink(base, b);
                let combined = old + block::size(b);
                block::set_size_header_only(p, combined);
                let after = block::phys_next(p);
                block::set_prev_alloc(after, true);
            }
            return Some(p);
        }

        None
    }
}

/// Copy the overlap between two payload regions, used by the
/// move-on-grow path.
pub unsafe fn copy_payload(src: *const u8, dst: *mut u8, len: usize) {
    unsafe {
        ptr::copy_nonoverlapping(src, dst, len);
    }
}
