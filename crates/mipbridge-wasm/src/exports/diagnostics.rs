//! Model file output.

use std::ffi::c_char;
use std::path::Path;
use std::ptr;

use super::{done_code, flag};
use crate::marshal::{read_str, return_str};
use crate::state::session_call;

/// Write the active problem (the transformed one once solving has started)
/// as an LP file.
///
/// # Safety
///
/// `path` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_model_write_lp(path: *const c_char) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(path) = (unsafe { read_str(path) }) else {
        return 0;
    };
    done_code(session_call("model_write_lp", |s| s.write_lp(Path::new(path))))
}

/// Write the problem with integrality sections.
///
/// # Safety
///
/// `path` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_model_write_mip(
    path: *const c_char,
    generic_names: i32,
    orig_obj: i32,
    lazy_conss: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(path) = (unsafe { read_str(path) }) else {
        return 0;
    };
    done_code(session_call("model_write_mip", |s| {
        s.write_mip(
            Path::new(path),
            flag(generic_names),
            flag(orig_obj),
            flag(lazy_conss),
        )
    }))
}

/// Write `{prefix}_{mode}_{round}.lp` tagged with the current pricing mode
/// and round. Returns the path written, or null on failure.
///
/// # Safety
///
/// `prefix` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_model_write_lp_snapshot(prefix: *const c_char) -> *const c_char {
    // SAFETY: guaranteed by the caller.
    let Some(prefix) = (unsafe { read_str(prefix) }) else {
        return ptr::null();
    };
    session_call("model_write_lp_snapshot", |s| s.write_lp_snapshot(prefix))
        .map_or(ptr::null(), |path| return_str(&path.to_string_lossy()))
}
