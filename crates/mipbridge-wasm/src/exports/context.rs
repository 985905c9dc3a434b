//! Solving-context and LP introspection.
//!
//! Values that only exist while solving (LP values, reduced costs, duals)
//! read as `0.0` outside the solving stage.

use std::ffi::c_char;
use std::ptr;

use mipbridge_core::INVALID_HANDLE;

use super::{bool_code, count_code};
use crate::marshal::{return_str, slice_out};
use crate::state::{pricing_view, session_call};

/// Engine stage code, `-1` without an engine.
#[no_mangle]
pub extern "C" fn mipb_ctx_get_stage() -> i32 {
    session_call("ctx_get_stage", |s| Ok(s.stage().code())).unwrap_or(INVALID_HANDLE)
}

/// Whether a node LP is available; only ever true while solving.
#[no_mangle]
pub extern "C" fn mipb_ctx_has_lp() -> i32 {
    bool_code(session_call("ctx_has_lp", |s| Ok(s.has_current_lp())))
}

/// LP solution status code, `-1` outside the solving stage.
#[no_mangle]
pub extern "C" fn mipb_ctx_get_lp_solstat() -> i32 {
    session_call("ctx_get_lp_solstat", |s| Ok(s.lp_solstat()))
        .flatten()
        .map_or(INVALID_HANDLE, |stat| stat.code())
}

/// `0` none, `1` reduced cost, `2` Farkas; `-1` if unavailable.
#[no_mangle]
pub extern "C" fn mipb_ctx_get_pricing_mode() -> i32 {
    pricing_view(|p| p.mode().code()).unwrap_or(INVALID_HANDLE)
}

#[no_mangle]
pub extern "C" fn mipb_ctx_is_transformed() -> i32 {
    bool_code(session_call("ctx_is_transformed", |s| Ok(s.is_transformed())))
}

#[no_mangle]
pub extern "C" fn mipb_ctx_get_var_lp_value(var: i32) -> f64 {
    session_call("ctx_get_var_lp_value", |s| s.var_lp_value(var)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_ctx_get_var_redcost(var: i32) -> f64 {
    session_call("ctx_get_var_redcost", |s| s.var_redcost(var)).unwrap_or(0.0)
}

/// Number of rows in the current LP, `-1` outside the solving stage.
#[no_mangle]
pub extern "C" fn mipb_ctx_get_n_lp_rows() -> i32 {
    count_code(session_call("ctx_get_n_lp_rows", |s| s.n_lp_rows()))
}

#[no_mangle]
pub extern "C" fn mipb_cons_is_in_lp(cons: i32) -> i32 {
    bool_code(session_call("cons_is_in_lp", |s| s.cons_is_in_lp(cons)))
}

#[no_mangle]
pub extern "C" fn mipb_cons_get_dual_linear(cons: i32) -> f64 {
    session_call("cons_get_dual_linear", |s| s.cons_dual(cons)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_cons_get_farkas_linear(cons: i32) -> f64 {
    session_call("cons_get_farkas_linear", |s| s.cons_farkas(cons)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_row_get_dual(row: i32) -> f64 {
    session_call("row_get_dual", |s| s.row_dual(row)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_row_get_farkas(row: i32) -> f64 {
    session_call("row_get_farkas", |s| s.row_farkas(row)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_row_get_lhs(row: i32) -> f64 {
    session_call("row_get_lhs", |s| s.row_lhs(row)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_row_get_rhs(row: i32) -> f64 {
    session_call("row_get_rhs", |s| s.row_rhs(row)).unwrap_or(0.0)
}

/// Position of the row in the current LP, `-1` if it is not in it.
#[no_mangle]
pub extern "C" fn mipb_row_get_lppos(row: i32) -> i32 {
    count_code(session_call("row_get_lppos", |s| s.row_lp_pos(row)).flatten())
}

#[no_mangle]
pub extern "C" fn mipb_row_is_in_lp(row: i32) -> i32 {
    bool_code(session_call("row_is_in_lp", |s| s.row_is_in_lp(row)))
}

#[no_mangle]
pub extern "C" fn mipb_row_is_local(row: i32) -> i32 {
    bool_code(session_call("row_is_local", |s| s.row_is_local(row)))
}

/// Row name, null for an invalid handle. Valid until the next
/// string-returning call.
#[no_mangle]
pub extern "C" fn mipb_row_get_name(row: i32) -> *const c_char {
    session_call("row_get_name", |s| s.row_name(row).map(str::to_owned))
        .map_or(ptr::null(), |name| return_str(&name))
}

// ============================================================================
// Batched LP row access
// ============================================================================

/// Fill `out` with the duals of the current LP rows, in LP order.
///
/// Returns the number written (`min(n, rows)`), `0` when no LP is available
/// and `-1` on misuse.
///
/// # Safety
///
/// `out` must be valid for writes of `n` `f64` values.
#[no_mangle]
pub unsafe extern "C" fn mipb_ctx_get_lp_row_duals_batch(out: *mut f64, n: i32) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(out) = (unsafe { slice_out(out, n) }) else {
        return INVALID_HANDLE;
    };
    count_code(session_call("lp_row_duals_batch", |s| s.lp_row_duals_into(out)))
}

/// Farkas counterpart of [`mipb_ctx_get_lp_row_duals_batch`].
///
/// # Safety
///
/// `out` must be valid for writes of `n` `f64` values.
#[no_mangle]
pub unsafe extern "C" fn mipb_ctx_get_lp_row_farkas_batch(out: *mut f64, n: i32) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(out) = (unsafe { slice_out(out, n) }) else {
        return INVALID_HANDLE;
    };
    count_code(session_call("lp_row_farkas_batch", |s| {
        s.lp_row_farkas_into(out)
    }))
}

/// Row handles of the current LP rows, in the order the batched dual
/// accessors use.
///
/// # Safety
///
/// `out` must be valid for writes of `n` `i32` values.
#[no_mangle]
pub unsafe extern "C" fn mipb_ctx_get_lp_row_ids_batch(out: *mut i32, n: i32) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(out) = (unsafe { slice_out(out, n) }) else {
        return INVALID_HANDLE;
    };
    count_code(session_call("lp_row_ids_batch", |s| s.lp_row_handles_into(out)))
}
