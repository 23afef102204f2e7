//! Debug heap-consistency checker. Not part of the allocator's contract:
//! a production build need never call this. Walks the physical block
//! chain and every size-class list, logging a diagnostic for the first
//! violation of each invariant it finds rather than panicking, so a
//! caller can decide what to do with a corrupt heap.

use malloc_support::klog_error;

use crate::block;
use crate::size_class;

/// Walk the heap from `base + FIRST_BLOCK_OFFSET` to the trailing
/// sentinel at `end`, verifying boundary-tag and size-class invariants.
/// `label` is an arbitrary caller-chosen tag echoed into any diagnostic,
/// letting a caller correlate a violation with the call site that
/// triggered it.
pub unsafe fn check_heap(base: usize, end: usize, label: i32) -> bool {
    unsafe {
        let mut ok = true;
        let mut p = (base + crate::tunables::FIRST_BLOCK_OFFSET as usize) as *mut u8;
        let mut prev_was_free = false;

        while (p as usize) < end {
            let size = block::size(p);
            if size == 0 {
                if p as usize != end - 4 {
                    klog_error!("check_heap[{label}]: zero-size block before trailing sentinel at {:#x}", p as usize);
                    ok = false;
                } else if block::is_prev_allocated(p) == prev_was_free {
                    klog_error!("check_heap[{label}]: trailing sentinel prev_allocated bit wrong");
                    ok = false;
                }
                break;
            }

            if size % 8 != 0 || size < 16 {
                klog_error!("check_heap[{label}]: block at {:#x} has illegal size {size}", p as usize);
                ok = false;
            }

            let allocated = block::is_allocated(p);
            if !allocated {
                let footer = ((p.add(size as usize - 8)) as *mut u32).read();
                if footer != size {
                    klog_error!(
                        "check_heap[{label}]: header/footer mismatch at {:#x}: {size} vs {footer}",
                        p as usize
                    );
                    ok = false;
                }
                if prev_was_free {
                    klog_error!("check_heap[{label}]: two adjacent free blocks at {:#x}", p as usize);
                    ok = false;
                }
            }

            if block::is_prev_allocated(p) == prev_was_free {
                klog_error!(
                    "check_heap[{label}]: prev_allocated bit wrong at {:#x}",
                    p as usize
                );
                ok = false;
            }

            prev_was_free = !allocated;
            p = block::phys_next(p);
        }

        for id in size_class::FIRST_CLASS..=size_class::LAST_CLASS {
            if !check_class_list(base, id, label) {
                ok = false;
            }
        }

        ok
    }
}

unsafe fn check_class_list(base: usize, id: u32, label: i32) -> bool {
    unsafe {
        let sentinel = size_class::sentinel_addr(base, id);
        let mut ok = true;
        let mut cur = block::next_link(sentinel, base);
        while cur != sentinel {
            if block::next_link(block::prev_link(cur, base), base) != cur {
                klog_error!("check_heap[{label}]: broken prev link at {:#x}", cur as usize);
                ok = false;
            }
            if block::prev_link(block::next_link(cur, base), base) != cur {
                klog_error!("check_heap[{label}]: broken next link at {:#x}", cur as usize);
                ok = false;
            }
            let size = block::size(cur);
            if size < size_class::min_size(id) || size >= size_class::max_size(id) {
                klog_error!(
                    "check_heap[{label}]: block at {:#x} (size {size}) misfiled in class {id}",
                    cur as usize
                );
                ok = false;
            }
            if block::is_allocated(cur) {
                klog_error!("check_heap[{label}]: allocated block in free list at {:#x}", cur as usize);
                ok = false;
            }
            cur = block::next_link(cur, base);
        }
        ok
    }
}
