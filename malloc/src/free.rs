//! Release an allocated block back to its size class, coalescing
//! immediately with any free physical neighbour.

use crate::block;
use crate::list;

/// Free `p`. A null pointer is a silent no-op, mirroring the libc contract.
pub unsafe fn free_block(base: usize, p: *mut u8) {
    if p.is_null() {
        return;
    }
    unsafe {
        let prev_free = !block::is_prev_allocated(p);
        let next = block::phys_next(p);
        let next_free = !block::is_allocated(next);

        match (prev_free, next_free) {
            (false, false) => {
                block::set_alloc(p, false);
                block::set_prev_alloc(next, false);
                block::set_size(p, block::size(p));
                list::insert_free(base, p);
            }
            (true, false) => {
                let q = block::phys_prev(p);
                list::unlink(base, q);
                let combined = block::size(q) + block::size(p);
                block::set_size(q, combined);
                block::set_prev_alloc(next, false);
                list::insert_free(base, q);
            }
            (false, true) => {
                let r = block::phys_next(p);
                list::unlink(base, r);
                let combined = block::size(p) + block::size(r);
                block::set_alloc(p, false);
                block::set_size(p, combined);
                list::insert_free(base, p);
            }
            (true, true) => {
                let q = block::phys_prev(p);
                let r = block::phys_next(p);
                list::unlink(base, q);
                list::unlink(base, r);
                let combined = block::size(q) + block::size(p) + block::size(r);
                block::set_size(q, combined);
                list::insert_free(base, q);
            }
        }
    }
}
