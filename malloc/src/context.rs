//! The allocator context: the single struct that owns everything the
//! design notes call out as process-wide state (heap base, heap end,
//! the size-class sentinels, the boundary tables) so a caller can run
//! more than one heap -- one per test, say -- without any globals.

use malloc_support::klog_warn;

use crate::block;
use crate::checker;
use crate::error::{AllocError, AllocResult};
use crate::free;
use crate::grow;
use crate::list;
use crate::placement::place;
use crate::provider::Provider;
use crate::realloc;
use crate::search;
use crate::size_class;
use crate::tunables::{self, EXTEND_CHUNK, FIRST_BLOCK_OFFSET};

pub struct Heap<P: Provider> {
    provider: P,
    base: usize,
    end: usize,
}

impl<P: Provider> Heap<P> {
    /// Lay out the prologue sentinels and the initial free block.
    pub fn init(mut provider: P) -> AllocResult<Self> {
        let base = provider.heap_lo();
        provider.heap_extend(EXTEND_CHUNK)?;

        unsafe {
            for id in size_class::FIRST_CLASS..=size_class::LAST_CLASS {
                list::list_init_empty(base, size_class::sentinel_addr(base, id));
            }

            let first = (base + FIRST_BLOCK_OFFSET as usize) as *mut u8;
            let payload_size = EXTEND_CHUNK - FIRST_BLOCK_OFFSET - 4;
            block::set_header(first, 0);
            block::set_prev_alloc(first, true);
            block::set_size(first, payload_size);
            list::insert_free(base, first);

            let sentinel = first.add(payload_size as usize);
            block::set_header(sentinel, 0);
            block::set_alloc(sentinel, true);
            block::set_prev_alloc(sentinel, false);

            let end = sentinel as usize + 4;
            Ok(Self { provider, base, end })
        }
    }

    pub fn heap_lo(&self) -> usize {
        self.base
    }

    pub fn heap_hi(&self) -> usize {
        self.end
    }

    fn trailing_sentinel(&self) -> *mut u8 {
        (self.end - 4) as *mut u8
    }

    pub fn allocate(&mut self, user_size: usize) -> *mut u8 {
        if user_size == 0 {
            return core::ptr::null_mut();
        }

        let n = tunables::align(user_size);
        unsafe {
            if let Some(p) = search::find_fit(self.base, n) {
                let block_size = block::size(p);
                return place(self.base, p, n, block_size);
            }

            match self.grow_and_place(n) {
                Ok(p) => p,
                Err(_) => core::ptr::null_mut(),
            }
        }
    }

    unsafe fn grow_and_place(&mut self, n: u32) -> AllocResult<*mut u8> {
        unsafe {
            let (placed, new_sentinel) =
                grow::extend(&mut self.provider, self.base, self.trailing_sentinel(), n)?;
            self.end = new_sentinel as usize + 4;
            Ok(placed)
        }
    }

    pub fn free(&mut self, p: *mut u8) {
        if p.is_null() {
            return;
        }
        unsafe {
            free::free_block(self.base, p);
        }
    }

    pub fn reallocate(&mut self, p: *mut u8, user_size: usize) -> *mut u8 {
        if p.is_null() {
            return self.allocate(user_size);
        }
        if user_size == 0 {
            self.free(p);
            return core::ptr::null_mut();
        }

        unsafe {
            let old = block::size(p);
            let new = tunables::align(user_size);

            if new <= old {
                return realloc::shrink(self.base, p, old, new);
            }

            if let Some(grown) = realloc::grow_in_place(self.base, p, old, new) {
                return grown;
            }

            let b = block::phys_next(p);
            if b as usize + 4 == self.end {
                let need = new - old;
                if self.provider.heap_extend(need).is_err() {
                    return core::ptr::null_mut();
                }
                block::set_size_header_only(p, new);
                let sentinel = p.add(new as usize);
                block::set_header(sentinel, 0);
                block::set_alloc(sentinel, true);
                block::set_prev_alloc(sentinel, true);
                self.end = sentinel as usize + 4;
                return p;
            }

            let q = self.allocate(user_size);
            if q.is_null() {
                return core::ptr::null_mut();
            }
            realloc::copy_payload(p, q, old.min(new) as usize);
            self.free(p);
            q
        }
    }

    pub fn zeroed_allocate(&mut self, count: usize, size: usize) -> *mut u8 {
        let total = match count.checked_mul(size) {
            Some(t) => t,
            None => return core::ptr::null_mut(),
        };
        let p = self.allocate(total);
        if !p.is_null() {
            unsafe {
                core::ptr::write_bytes(p, 0, total);
            }
        }
        p
    }

    /// Run the debug consistency checker over the current heap state.
    /// Returns `Err(CorruptHeap)` on the first violated invariant, having
    /// already logged every violation it found.
    pub fn check_heap(&self, label: i32) -> AllocResult<()> {
        let ok = unsafe { checker::check_heap(self.base, self.end, label) };
        if ok {
            Ok(())
        } else {
            klog_warn!("check_heap[{label}]: heap consistency check failed");
            Err(AllocError::CorruptHeap)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::VecProvider;

    fn new_heap() -> Heap<VecProvider> {
        Heap::init(VecProvider::new(1 << 20)).expect("init succeeds with ample capacity")
    }

    #[test]
    fn s1_small_alloc_free() {
        let mut heap = new_heap();
        let a = heap.allocate(1);
        assert!(!a.is_null());
        assert_eq!(unsafe { block::size(a) }, 16);
        heap.free(a);
        assert!(heap.check_heap(1).is_ok());
    }

    #[test]
    fn s2_split_is_contiguous() {
        let mut heap = new_heap();
        let a = heap.allocate(16);
        let b = heap.allocate(16);
        assert_eq!(b as usize, a as usize + 16);
        assert!(heap.check_heap(2).is_ok());
    }

    #[test]
    fn s3_coalesce_after_three_frees() {
        let mut heap = new_heap();
        let a = heap.allocate(64);
        let b = heap.allocate(64);
        let c = heap.allocate(64);
        heap.free(a);
        heap.free(c);
        heap.free(b);
        assert!(heap.check_heap(3).is_ok());

        let big = heap.allocate(150);
        assert_eq!(big, a);
    }

    #[test]
    fn s4_realloc_shrink_keeps_pointer() {
        let mut heap = new_heap();
        let a = heap.allocate(256);
        let r = heap.reallocate(a, 64);
        assert_eq!(r, a);
        assert!(heap.check_heap(4).is_ok());
    }

    #[test]
    fn s5_realloc_grow_into_free_neighbor() {
        let mut heap = new_heap();
        let a = heap.allocate(64);
        let b = heap.allocate(64);
        heap.free(b);
        let r = heap.reallocate(a, 120);
        assert_eq!(r, a);
        assert!(heap.check_heap(5).is_ok());
    }

    #[test]
    fn s6_realloc_grow_at_heap_tail() {
        let mut heap = new_heap();
        let a = heap.allocate(4000);
        let r = heap.reallocate(a, 8000);
        assert_eq!(r, a);
        assert!(heap.check_heap(6).is_ok());
    }

    #[test]
    fn zeroed_allocate_is_zero_filled() {
        let mut heap = new_heap();
        let p = heap.zeroed_allocate(8, 4);
        assert!(!p.is_null());
        let bytes = unsafe { core::slice::from_raw_parts(p, 32) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn null_free_is_noop() {
        let mut heap = new_heap();
        heap.free(core::ptr::null_mut());
        assert!(heap.check_heap(0).is_ok());
    }

    #[test]
    fn exhausted_provider_returns_null() {
        let mut heap = Heap::init(VecProvider::new(1 << 13)).unwrap();
        let mut last = core::ptr::null_mut();
        for _ in 0..10_000 {
            let p = heap.allocate(64);
            if p.is_null() {
                break;
            }
            last = p;
        }
        assert!(!last.is_null());
        assert!(heap.allocate(1 << 30).is_null());
    }
}
