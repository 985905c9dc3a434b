//! Model building and handle lookup.

use std::ffi::c_char;

use mipbridge_core::{ConsOptions, VarOptions, VarType, INVALID_HANDLE};

use super::{bool_code, done_code, flag, handle_code};
use crate::marshal::{read_str, slice_in};
use crate::state::session_call;

/// Add a variable to the original problem and return its handle.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_add_var(
    name: *const c_char,
    lb: f64,
    ub: f64,
    obj: f64,
    vartype: i32,
    initial: i32,
    removable: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let (Some(name), Some(var_type)) = (unsafe { read_str(name) }, VarType::from_code(vartype)) else {
        return INVALID_HANDLE;
    };
    let opts = VarOptions {
        lb,
        ub,
        obj,
        var_type,
        initial: flag(initial),
        removable: flag(removable),
    };
    handle_code(session_call("add_var", |s| s.add_var(name, &opts)))
}

/// Add a linear constraint `lhs <= a·x <= rhs` with no coefficients yet.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn mipb_add_cons_linear(
    name: *const c_char,
    lhs: f64,
    rhs: f64,
    initial: i32,
    separate: i32,
    enforce: i32,
    check: i32,
    propagate: i32,
    local: i32,
    modifiable: i32,
    dynamic: i32,
    removable: i32,
    sticking_at_node: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return INVALID_HANDLE;
    };
    let opts = ConsOptions {
        lhs,
        rhs,
        initial: flag(initial),
        separate: flag(separate),
        enforce: flag(enforce),
        check: flag(check),
        propagate: flag(propagate),
        local: flag(local),
        modifiable: flag(modifiable),
        dynamic: flag(dynamic),
        removable: flag(removable),
        sticking_at_node: flag(sticking_at_node),
    };
    handle_code(session_call("add_cons_linear", |s| {
        s.add_linear_cons(name, &opts)
    }))
}

#[no_mangle]
pub extern "C" fn mipb_set_cons_modifiable(cons: i32, modifiable: i32) -> i32 {
    done_code(session_call("set_cons_modifiable", |s| {
        s.set_cons_modifiable(cons, flag(modifiable))
    }))
}

#[no_mangle]
pub extern "C" fn mipb_add_coef_linear(cons: i32, var: i32, val: f64) -> i32 {
    done_code(session_call("add_coef_linear", |s| {
        s.add_coef_linear(cons, var, val)
    }))
}

/// Add `nnz` coefficients to one constraint. Nothing is applied unless every
/// variable handle is valid.
///
/// # Safety
///
/// `vars` and `vals` must be valid for reads of `nnz` elements.
#[no_mangle]
pub unsafe extern "C" fn mipb_add_coef_linear_batch(
    cons: i32,
    vars: *const i32,
    vals: *const f64,
    nnz: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let (Some(vars), Some(vals)) = (unsafe { slice_in(vars, nnz) }, unsafe { slice_in(vals, nnz) })
    else {
        return 0;
    };
    done_code(session_call("add_coef_linear_batch", |s| {
        s.add_coefs_linear(cons, vars, vals)
    }))
}

/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_var_find_id(name: *const c_char) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return INVALID_HANDLE;
    };
    handle_code(session_call("var_find_id", |s| s.find_var(name)))
}

/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_cons_find_id(name: *const c_char) -> i32 {
    // SAFETY: guaranteed by the caller.
    let Some(name) = (unsafe { read_str(name) }) else {
        return INVALID_HANDLE;
    };
    handle_code(session_call("cons_find_id", |s| s.find_cons(name)))
}

/// Handle of the transformed counterpart of a variable.
#[no_mangle]
pub extern "C" fn mipb_var_get_transformed(var: i32) -> i32 {
    handle_code(session_call("var_get_transformed", |s| s.var_transformed(var)))
}

/// `1` if the variable's column starts in the initial LP.
#[no_mangle]
pub extern "C" fn mipb_var_is_initial(var: i32) -> i32 {
    bool_code(session_call("var_is_initial", |s| s.var_is_initial(var)))
}

/// `1` if the variable's column may be aged out of the LP.
#[no_mangle]
pub extern "C" fn mipb_var_is_removable(var: i32) -> i32 {
    bool_code(session_call("var_is_removable", |s| s.var_is_removable(var)))
}

#[no_mangle]
pub extern "C" fn mipb_cons_get_transformed(cons: i32) -> i32 {
    handle_code(session_call("cons_get_transformed", |s| {
        s.cons_transformed(cons)
    }))
}

/// Handle of the LP row behind a constraint; only available once the LP has
/// been constructed.
#[no_mangle]
pub extern "C" fn mipb_cons_get_row(cons: i32) -> i32 {
    handle_code(session_call("cons_get_row", |s| s.cons_row(cons)))
}
