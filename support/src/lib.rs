//! Shared, allocation-free utilities for `malloc-core`.
//!
//! Kept separate from the allocator itself so the logging facade and the
//! alignment helpers can be reused by a future second consumer (e.g. an
//! in-kernel heap) without dragging in the allocator's own state.

#![no_std]

pub mod alignment;
pub mod klog;

pub use alignment::{align_down_u32, align_down_usize, align_up_u32, align_up_usize};
