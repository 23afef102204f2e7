//! Block encoding: pure functions over a block's payload pointer `p` and
//! the heap base `B`.
//!
//! Every free block carries a 4-byte header at `p - 4` and a 4-byte
//! footer at `p + size - 8`; allocated blocks carry only the header. When
//! free, the first two words of the payload (`p + 0`, `p + 4`) hold
//! base-relative 32-bit offsets to the predecessor and successor in the
//! owning size class's list. Callers are responsible for respecting the
//! preconditions noted on each function; none of these are checked.

use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u32 {
        const ALLOCATED      = 0b001;
        const PREV_ALLOCATED = 0b010;
    }
}

const SIZE_MASK: u32 = !0x7;

#[inline]
unsafe fn header_ptr(p: *mut u8) -> *mut u32 {
    unsafe { p.sub(4) as *mut u32 }
}

/// Read the header word at `p - 4`.
#[inline]
pub unsafe fn header(p: *mut u8) -> u32 {
    unsafe { header_ptr(p).read() }
}

/// Overwrite the header word at `p - 4` with a raw value (size | flags).
#[inline]
pub unsafe fn set_header(p: *mut u8, h: u32) {
    unsafe { header_ptr(p).write(h) }
}

/// The block's total size in bytes (always a multiple of 8).
#[inline]
pub unsafe fn size(p: *mut u8) -> u32 {
    unsafe { header(p) & SIZE_MASK }
}

#[inline]
pub unsafe fn is_allocated(p: *mut u8) -> bool {
    unsafe { header(p) & BlockFlags::ALLOCATED.bits() != 0 }
}

#[inline]
pub unsafe fn is_prev_allocated(p: *mut u8) -> bool {
    unsafe { header(p) & BlockFlags::PREV_ALLOCATED.bits() != 0 }
}

/// Set the allocated bit, preserving size and the prev-allocated bit.
#[inline]
pub unsafe fn set_alloc(p: *mut u8, allocated: bool) {
    unsafe {
        let h = header(p) & !BlockFlags::ALLOCATED.bits();
        let h = if allocated {
            h | BlockFlags::ALLOCATED.bits()
        } else {
            h
        };
        set_header(p, h);
    }
}

/// Set the prev-allocated bit, preserving size and the allocated bit.
#[inline]
pub unsafe fn set_prev_alloc(p: *mut u8, prev_allocated: bool) {
    unsafe {
        let h = header(p) & !BlockFlags::PREV_ALLOCATED.bits();
        let h = if prev_allocated {
            h | BlockFlags::PREV_ALLOCATED.bits()
        } else {
            h
        };
        set_header(p, h);
    }
}

#[inline]
unsafe fn footer_ptr(p: *mut u8, n: u32) -> *mut u32 {
    unsafe { p.add(n as usize - 8) as *mut u32 }
}

/// Rewrite the size of a **free** block: header (preserving flags) and a
/// matching footer. Forces the allocated bit to 0; preserves prev-allocated.
#[inline]
pub unsafe fn set_size(p: *mut u8, n: u32) {
    unsafe {
        let prev_alloc = header(p) & BlockFlags::PREV_ALLOCATED.bits();
        set_header(p, n | prev_alloc);
        footer_ptr(p, n).write(n);
    }
}

/// Rewrite the size of an **allocated** block: header only, no footer.
/// Preserves both flag bits.
#[inline]
pub unsafe fn set_size_header_only(p: *mut u8, n: u32) {
    unsafe {
        let flags = header(p) & 0x7;
        set_header(p, n | flags);
    }
}

/// The physical block immediately following `p`.
#[inline]
pub unsafe fn phys_next(p: *mut u8) -> *mut u8 {
    unsafe { p.add(size(p) as usize) }
}

/// The physical block immediately preceding `p`. Only valid when
/// `is_prev_allocated(p)` is false: reads the predecessor's footer at
/// `p - 8` to learn its size.
#[inline]
pub unsafe fn phys_prev(p: *mut u8) -> *mut u8 {
    unsafe {
        let footer = (p.sub(8) as *mut u32).read();
        p.sub((footer & SIZE_MASK) as usize)
    }
}

/// Read the free-list predecessor link at `p + 0`, a base-relative offset.
#[inline]
pub unsafe fn prev_link(p: *mut u8, base: usize) -> *mut u8 {
    unsafe {
        let off = (p as *mut u32).read();
        (base + off as usize) as *mut u8
    }
}

/// Read the free-list successor link at `p + 4`, a base-relative offset.
#[inline]
pub unsafe fn next_link(p: *mut u8, base: usize) -> *mut u8 {
    unsafe {
        let off = (p.add(4) as *mut u32).read();
        (base + off as usize) as *mut u8
    }
}

#[inline]
pub unsafe fn set_prev_link(p: *mut u8, base: usize, target: *mut u8) {
    unsafe {
        let off = (target as usize - base) as u32;
        (p as *mut u32).write(off);
    }
}

#[inline]
pub unsafe fn set_next_link(p: *mut u8, base: usize, target: *mut u8) {
    unsafe {
        let off = (target as usize - base) as u32;
        (p.add(4) as *mut u32).write(off);
    }
}
