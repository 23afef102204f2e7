//! First-fit search across size classes, escalating toward larger blocks
//! when the starting class comes up empty.

use crate::block;
use crate::list;
use crate::size_class::{self, FIRST_CLASS};

/// Find a free block of at least `n` bytes, starting from `class_of(n)`
/// and escalating toward `FIRST_CLASS` (the catch-all for the largest
/// blocks) until a fit is found. The returned block has already been
/// unlinked from its list.
pub unsafe fn find_fit(base: usize, n: u32) -> Option<*mut u8> {
    unsafe {
        let start = size_class::class_of(n);
        let mut id = start;
        loop {
            let sentinel = size_class::sentinel_addr(base, id);
            let mut cur = block::next_link(sentinel, base);
            while cur != sentinel {
                if block::size(cur) >= n {
                    list::unlink(base, cur);
                    return Some(cur);
                }
                cur = block::next_link(cur, base);
            }
            if id == FIRST_CLASS {
                return None;
            }
            id -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::place;
    use crate::testing::VecProvider;
    use crate::tunables::FIRST_BLOCK_OFFSET;

    unsafe fn init_sentinels(base: usize) {
        unsafe {
            for id in size_class::FIRST_CLASS..=size_class::LAST_CLASS {
                list::list_init_empty(base, size_class::sentinel_addr(base, id));
            }
        }
    }

    #[test]
    fn finds_exact_class_before_escalating() {
        let heap = VecProvider::new(1 << 16);
        let base = heap.heap_lo();
        unsafe {
            init_sentinels(base);

            // A 32-byte block (class 27, [16,32)... actually 32 lands one
            // class up) and a 64-byte block, each in their own class.
            let small = (base as *mut u8).add(FIRST_BLOCK_OFFSET as usize);
            block::set_header(small, 0);
            block::set_prev_alloc(small, true);
            block::set_size(small, 32);
            list::insert_free(base, small);

            let big = small.add(32);
            block::set_header(big, 0);
            block::set_prev_alloc(big, true);
            block::set_size(big, 64);
            list::insert_free(base, big);

            let next = block::phys_next(big);
            block::set_header(next, 0);

            let found = find_fit(base, 64).expect("a 64-byte block exists");
            assert_eq!(found, big);
        }
    }

    #[test]
    fn escalates_when_starting_class_is_empty() {
        let heap = VecProvider::new(1 << 16);
        let base = heap.heap_lo();
        unsafe {
            init_sentinels(base);

            let only = (base as *mut u8).add(FIRST_BLOCK_OFFSET as usize);
            block::set_header(only, 0);
            block::set_prev_alloc(only, true);
            block::set_size(only, 4096);
            list::insert_free(base, only);

            let next = block::phys_next(only);
            block::set_header(next, 0);

            // A request small enough that its own class is empty, but the
            // catch-all class holds the one large block.
            let found = find_fit(base, 24).expect("escalation reaches the large block");
            assert_eq!(found, only);
            let out = place(base, found, 24, 4096);
            assert_eq!(out, only);
        }
    }
}
