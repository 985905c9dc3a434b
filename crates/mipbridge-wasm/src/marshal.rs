//! Marshaling helpers for both sides of the boundary.
//!
//! Engine side: views over caller-provided strings and buffers, and the
//! per-thread slot that returned strings live in.
//!
//! Host side: [`BoundaryBuffer`] and [`ScopedCStr`], owners of boundary heap
//! blocks that are released on every exit path.

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::slice;

use crate::alloc::{mipb_alloc, mipb_dealloc};

// ============================================================================
// Engine side
// ============================================================================

thread_local! {
    static RETURN_SLOT: RefCell<CString> = RefCell::new(CString::default());
}

/// Borrow a NUL-terminated UTF-8 string. `None` for null or invalid UTF-8.
///
/// # Safety
///
/// A non-null `ptr` must point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Borrow `len` elements. A zero length never touches `ptr`; a negative length
/// or a null pointer with elements is rejected.
///
/// # Safety
///
/// A non-null `ptr` must be valid for reads of `len` elements during `'a`.
pub(crate) unsafe fn slice_in<'a, T>(ptr: *const T, len: i32) -> Option<&'a [T]> {
    let len = usize::try_from(len).ok()?;
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Mutable counterpart of [`slice_in`].
///
/// # Safety
///
/// A non-null `ptr` must be valid for writes of `len` elements during `'a` and
/// not aliased.
pub(crate) unsafe fn slice_out<'a, T>(ptr: *mut T, len: i32) -> Option<&'a mut [T]> {
    let len = usize::try_from(len).ok()?;
    if len == 0 {
        return Some(&mut []);
    }
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { slice::from_raw_parts_mut(ptr, len) })
}

/// Store `value` in the return slot and hand out a pointer to it. The pointer
/// stays valid until the next string-returning export on this thread.
pub(crate) fn return_str(value: &str) -> *const c_char {
    let value = CString::new(value.replace('\0', "")).unwrap_or_default();
    RETURN_SLOT.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = value;
        slot.as_ptr()
    })
}

// ============================================================================
// Host side
// ============================================================================

/// Element types that may live in a boundary buffer.
///
/// # Safety
///
/// The all-zero bit pattern must be a valid value and the alignment must not
/// exceed [`crate::alloc::ALIGN`].
pub unsafe trait Element: Copy {}

unsafe impl Element for u8 {}
unsafe impl Element for i32 {}
unsafe impl Element for f64 {}

/// Typed view over a boundary heap block, released on drop.
pub struct BoundaryBuffer<T: Element> {
    ptr: NonNull<T>,
    len: usize,
    bytes: i32,
    _owns: PhantomData<T>,
}

impl<T: Element> BoundaryBuffer<T> {
    /// Zero-filled buffer of `len` elements. `None` when the byte size does
    /// not fit the boundary or the allocation fails.
    pub fn new(len: usize) -> Option<Self> {
        let bytes = i32::try_from(len.checked_mul(mem::size_of::<T>())?).ok()?;
        let ptr = if bytes == 0 {
            NonNull::dangling()
        } else {
            NonNull::new(mipb_alloc(bytes).cast::<T>())?
        };
        Some(Self {
            ptr,
            len,
            bytes,
            _owns: PhantomData,
        })
    }

    pub fn from_slice(values: &[T]) -> Option<Self> {
        let mut buffer = Self::new(values.len())?;
        buffer.as_mut_slice().copy_from_slice(values);
        Some(buffer)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element count as passed across the boundary.
    pub fn count(&self) -> i32 {
        // `len * size_of::<T>()` fits in i32, so `len` does too.
        self.len as i32
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the block holds `len` zero-initialised or written elements.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Element> Drop for BoundaryBuffer<T> {
    fn drop(&mut self) {
        if self.bytes > 0 {
            // SAFETY: allocated by `mipb_alloc` with this size in `new`.
            unsafe { mipb_dealloc(self.ptr.as_ptr().cast::<u8>(), self.bytes) };
        }
    }
}

/// A host string copied into the boundary heap as a NUL-terminated byte
/// sequence, released on drop.
pub struct ScopedCStr {
    buffer: BoundaryBuffer<u8>,
}

impl ScopedCStr {
    /// `None` if `value` contains an interior NUL or allocation fails.
    pub fn new(value: &str) -> Option<Self> {
        if value.contains('\0') {
            return None;
        }
        let mut buffer = BoundaryBuffer::new(value.len() + 1)?;
        buffer.as_mut_slice()[..value.len()].copy_from_slice(value.as_bytes());
        Some(Self { buffer })
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.buffer.as_ptr().cast::<c_char>()
    }
}

/// Pass `value` to `f` as a boundary string; the copy is released before this
/// returns, whatever `f` does.
pub fn with_scoped_str<R>(value: &str, f: impl FnOnce(*const c_char) -> R) -> Option<R> {
    let scoped = ScopedCStr::new(value)?;
    Some(f(scoped.as_ptr()))
}

/// Copy a string returned by an export. `None` for null.
///
/// # Safety
///
/// A non-null `ptr` must point to a NUL-terminated string.
pub unsafe fn copy_returned_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: guaranteed by the caller.
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}
