//! Heap extension: ask the provider for more address space and fold it
//! into the block at the end of the heap, merging with a trailing free
//! block when one exists.

use crate::block;
use crate::error::AllocResult;
use crate::list;
use crate::placement::place;
use crate::provider::Provider;
use crate::tunables::EXTEND_CHUNK;

/// Grow the heap to satisfy an aligned `request`, then place it.
///
/// `tail_sentinel` is the address of the current trailing sentinel (a
/// zero-size allocated block). Its `prev_allocated` bit says whether the
/// block immediately before it is a free tail block or not.
pub unsafe fn extend<P: Provider>(
    provider: &mut P,
    base: usize,
    tail_sentinel: *mut u8,
    request: u32,
) -> AllocResult<(*mut u8, *mut u8)> {
    unsafe {
        if block::is_prev_allocated(tail_sentinel) {
            let grow_by = request.max(EXTEND_CHUNK);
            provider.heap_extend(grow_by)?;

            let new_block = tail_sentinel;
            block::set_header(new_block, 0);
            block::set_prev_alloc(new_block, true);
            block::set_size(new_block, grow_by);

            let new_sentinel = new_block.add(grow_by as usize);
            block::set_header(new_sentinel, 0);
            block::set_alloc(new_sentinel, true);
            block::set_prev_alloc(new_sentinel, false);

            let placed = place(base, new_block, request, grow_by);
            Ok((placed, new_sentinel))
        } else {
            let t = block::phys_prev(tail_sentinel);
            let s = block::size(t);
            let grow_by = request.saturating_sub(s).max(EXTEND_CHUNK);
            provider.heap_extend(grow_by)?;

            list::unlink(base, t);
            let prev_alloc = block::is_prev_allocated(t);
            let new_size = s + grow_by;
            block::set_header(t, 0);
            block::set_prev_alloc(t, prev_alloc);
            block::set_size(t, new_size);

            let new_sentinel = t.add(new_size as usize);
            block::set_header(new_sentinel, 0);
            block::set_alloc(new_sentinel, true);
            block::set_prev_alloc(new_sentinel, false);

            let placed = place(base, t, request, new_size);
            Ok((placed, new_sentinel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_class;
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
    fn extends_when_tail_allocated() {
        let mut heap = VecProvider::new(1 << 20);
        let base = heap.heap_lo();
        unsafe {
            init_sentinels(base);
            heap.heap_extend(4096).unwrap();

            let last_alloc = (base as *mut u8).add(FIRST_BLOCK_OFFSET as usize);
            block::set_header(last_alloc, 4096 - FIRST_BLOCK_OFFSET - 4);
            block::set_alloc(last_alloc, true);
            block::set_prev_alloc(last_alloc, true);

            let sentinel = last_alloc.add((4096 - FIRST_BLOCK_OFFSET - 4) as usize);
            block::set_header(sentinel, 0);
            block::set_alloc(sentinel, true);
            block::set_prev_alloc(sentinel, true);

            let (placed, new_sentinel) = extend(&mut heap, base, sentinel, 64).unwrap();
            assert_eq!(placed, sentinel);
            assert!(block::is_allocated(placed));
            assert!(block::is_allocated(new_sentinel));
            assert_eq!(block::size(new_sentinel), 0);
        }
    }
}
