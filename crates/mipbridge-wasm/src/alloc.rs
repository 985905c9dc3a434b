//! Boundary heap.
//!
//! The host cannot hand out pointers into its own memory, so strings and
//! batch buffers are allocated here, filled by the host, passed back to an
//! export and released with a matching `mipb_dealloc`. Allocations are zeroed
//! and counted so leaks across repeated solves show up in
//! [`mipb_outstanding_allocations`].

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::ptr;

/// Alignment of every boundary allocation; covers `f64` and `i32`.
pub const ALIGN: usize = 8;

thread_local! {
    static OUTSTANDING: Cell<i32> = const { Cell::new(0) };
}

fn layout(size: i32) -> Option<Layout> {
    let size = usize::try_from(size).ok().filter(|&size| size > 0)?;
    Layout::from_size_align(size, ALIGN).ok()
}

/// Allocate `size` zeroed bytes. Returns null for a non-positive size or when
/// the allocator fails.
#[no_mangle]
pub extern "C" fn mipb_alloc(size: i32) -> *mut u8 {
    let Some(layout) = layout(size) else {
        return ptr::null_mut();
    };
    // SAFETY: `layout` has a non-zero size.
    let ptr = unsafe { alloc::alloc_zeroed(layout) };
    if !ptr.is_null() {
        OUTSTANDING.with(|count| count.set(count.get() + 1));
    }
    ptr
}

/// Release a block obtained from [`mipb_alloc`]. Null is ignored.
///
/// # Safety
///
/// `ptr` must come from `mipb_alloc` called with the same `size`, and must not
/// have been released already.
#[no_mangle]
pub unsafe extern "C" fn mipb_dealloc(ptr: *mut u8, size: i32) {
    if ptr.is_null() {
        return;
    }
    let Some(layout) = layout(size) else {
        return;
    };
    // SAFETY: guaranteed by the caller.
    unsafe { alloc::dealloc(ptr, layout) };
    OUTSTANDING.with(|count| count.set(count.get() - 1));
}

/// Number of boundary blocks currently allocated on this thread.
#[no_mangle]
pub extern "C" fn mipb_outstanding_allocations() -> i32 {
    OUTSTANDING.with(Cell::get)
}
