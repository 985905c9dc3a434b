//! Exported primitives.
//!
//! Every function here is `extern "C"`, prefixed `mipb_`, and folds failures
//! into an in-band sentinel: `-1` for handles, counts and codes, `0` for
//! boolean-style results, `0.0` for numbers and null for strings. Nothing
//! unwinds across the boundary.

pub mod context;
pub mod diagnostics;
pub mod lifecycle;
pub mod model;
pub mod pricer;
pub mod solve;

use mipbridge_core::{Handle, Sentinel, INVALID_HANDLE};

pub(crate) fn handle_code(handle: Option<Handle>) -> i32 {
    handle.map_or(INVALID_HANDLE, Handle::raw)
}

pub(crate) fn bool_code(value: Option<bool>) -> i32 {
    value.map_or(Sentinel::False, Sentinel::from_bool).code()
}

pub(crate) fn done_code(done: Option<()>) -> i32 {
    bool_code(done.map(|()| true))
}

pub(crate) fn count_code(count: Option<usize>) -> i32 {
    count.map_or(INVALID_HANDLE, |n| i32::try_from(n).unwrap_or(i32::MAX))
}

pub(crate) fn counter(value: u64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn flag(value: i32) -> bool {
    value != 0
}
