//! Parameters, solving and solution queries.

use std::ffi::c_char;
use std::ptr;

use mipbridge_core::INVALID_HANDLE;

use super::{bool_code, done_code, flag};
use crate::marshal::{read_str, return_str};
use crate::state::{bridge_call, session_call};

#[no_mangle]
pub extern "C" fn mipb_set_time_limit(seconds: f64) -> i32 {
    done_code(session_call("set_time_limit", |s| s.set_time_limit(seconds)))
}

#[no_mangle]
pub extern "C" fn mipb_set_gap(gap: f64) -> i32 {
    done_code(session_call("set_gap", |s| s.set_gap(gap)))
}

/// Objective limit: solutions not better than `cutoff` are discarded.
#[no_mangle]
pub extern "C" fn mipb_set_cutoff(cutoff: f64) -> i32 {
    done_code(session_call("set_cutoff", |s| s.set_cutoff(cutoff)))
}

/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_set_param_int(name: *const c_char, value: i32) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return 0;
    };
    done_code(session_call("set_param_int", |s| {
        s.set_int_param(name, i64::from(value))
    }))
}

/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_set_param_real(name: *const c_char, value: f64) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return 0;
    };
    done_code(session_call("set_param_real", |s| s.set_real_param(name, value)))
}

/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_set_param_bool(name: *const c_char, value: i32) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return 0;
    };
    done_code(session_call("set_param_bool", |s| {
        s.set_bool_param(name, flag(value))
    }))
}

/// # Safety
///
/// `name` and `value` must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn mipb_set_param_string(name: *const c_char, value: *const c_char) -> i32 {
    // SAFETY: guaranteed by the caller.
    let (Some(name), Some(value)) = (unsafe { read_str(name) }, unsafe { read_str(value) }) else {
        return 0;
    };
    done_code(session_call("set_param_string", |s| {
        s.set_string_param(name, value)
    }))
}

/// Offer a primal point written as `name=value;name=value`. Returns `1` if
/// the engine kept it.
///
/// # Safety
///
/// `hint` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_add_solution_hint(hint: *const c_char) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(hint) = (unsafe { read_str(hint) }) else {
        return 0;
    };
    bool_code(session_call("add_solution_hint", |s| s.add_solution_hint(hint)))
}

/// Solve the current problem. Returns `0` optimal, `1` infeasible,
/// `2` unbounded, `3` time limit, `4` any other outcome and `-1` on error.
#[no_mangle]
pub extern "C" fn mipb_solve() -> i32 {
    bridge_call("solve", |bridge| bridge.solve()).map_or(INVALID_HANDLE, |status| status.code())
}

/// Objective value of the best solution, `0.0` without one.
#[no_mangle]
pub extern "C" fn mipb_get_objective() -> f64 {
    session_call("get_objective", |s| Ok(s.objective()))
        .flatten()
        .unwrap_or(0.0)
}

/// Value of the named original variable in the best solution.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_get_var_value(name: *const c_char) -> f64 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return 0.0;
    };
    session_call("get_var_value", |s| Ok(s.var_value(name)))
        .flatten()
        .unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_get_nvars() -> i32 {
    super::count_code(session_call("get_nvars", |s| Ok(s.n_vars())))
}

/// Comma-separated names of the original variables, or null without an
/// engine. Valid until the next string-returning call.
#[no_mangle]
pub extern "C" fn mipb_get_var_names() -> *const c_char {
    session_call("get_var_names", |s| Ok(s.var_names()))
        .map_or(ptr::null(), |names| return_str(&names))
}

#[no_mangle]
pub extern "C" fn mipb_get_solving_time() -> f64 {
    session_call("get_solving_time", |s| Ok(s.stats().solving_time)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_get_nnodes() -> i64 {
    session_call("get_nnodes", |s| Ok(s.stats().nodes))
        .map_or(-1, |nodes| i64::try_from(nodes).unwrap_or(i64::MAX))
}

#[no_mangle]
pub extern "C" fn mipb_get_gap() -> f64 {
    session_call("get_gap", |s| Ok(s.stats().gap)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_get_dual_bound() -> f64 {
    session_call("get_dual_bound", |s| Ok(s.stats().dual_bound)).unwrap_or(0.0)
}

#[no_mangle]
pub extern "C" fn mipb_get_primal_bound() -> f64 {
    session_call("get_primal_bound", |s| Ok(s.stats().primal_bound)).unwrap_or(0.0)
}
