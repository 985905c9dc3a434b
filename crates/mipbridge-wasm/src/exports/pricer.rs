//! Pricer plugin, pricing round control and event callbacks.
//!
//! The `set_*`, `add_*` and `abort_round` functions are meant to be called
//! from inside a host pricing callback; they act on the round in progress.
//! A malformed `add_*` call (null name, unknown type, null or negative batch)
//! inside a round abandons it and interrupts the solve, like an invalid
//! handle does.
//!
//! Incumbent and node callbacks run against the paused engine, so the
//! `mipb_ctx_*` and LP queries answer there. Lifecycle calls still return
//! their failure sentinel.

use std::ffi::c_char;

use mipbridge_core::{
    Engine, PricerOptions, PricerResult, PricingMode, Sentinel, VarOptions, VarType,
    INVALID_HANDLE,
};

use super::{bool_code, counter, done_code, flag, handle_code};
use crate::callbacks::{self, IncumbentCallback, NodeCallback, PricingCallback};
use crate::marshal::{read_str, slice_in};
use crate::state::{bridge_call, pricing_view, session_call, with_bridge};

// ============================================================================
// Plugin
// ============================================================================

/// Include the pricer plugin: `1` if included, `0` if it already was, `-1`
/// on failure. Null strings select the default name and description.
///
/// # Safety
///
/// `name` and `desc` must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn mipb_pricer_include(
    name: *const c_char,
    desc: *const c_char,
    priority: i32,
    delay: i32,
) -> i32 {
    let defaults = PricerOptions::default();
    // SAFETY: guaranteed by the caller.
    let (name, desc) = unsafe { (read_str(name), read_str(desc)) };
    let opts = PricerOptions {
        name: name.map_or(defaults.name, str::to_owned),
        description: desc.map_or(defaults.description, str::to_owned),
        priority,
        delay: flag(delay),
    };
    match bridge_call("pricer_include", |bridge| bridge.include_pricer(&opts)) {
        Some(included) => Sentinel::from_bool(included).code(),
        None => INVALID_HANDLE,
    }
}

#[no_mangle]
pub extern "C" fn mipb_pricer_activate() -> i32 {
    done_code(bridge_call("pricer_activate", |bridge| bridge.activate_pricer()))
}

#[no_mangle]
pub extern "C" fn mipb_pricer_deactivate() -> i32 {
    done_code(bridge_call("pricer_deactivate", |bridge| {
        bridge.deactivate_pricer()
    }))
}

#[no_mangle]
pub extern "C" fn mipb_pricer_is_active() -> i32 {
    bool_code(session_call("pricer_is_active", |s| {
        Ok(s.engine().pricer_is_active())
    }))
}

// ============================================================================
// Host callbacks
// ============================================================================

/// Register the reduced-cost pricing function. Null unregisters it.
#[no_mangle]
pub extern "C" fn mipb_set_redcost_callback(callback: Option<PricingCallback>) {
    callbacks::set_pricing_callback(PricingMode::ReducedCost, callback);
}

/// Register the Farkas pricing function. Null unregisters it.
#[no_mangle]
pub extern "C" fn mipb_set_farkas_callback(callback: Option<PricingCallback>) {
    callbacks::set_pricing_callback(PricingMode::Farkas, callback);
}

#[no_mangle]
pub extern "C" fn mipb_enable_redcost_callback(enabled: i32) -> i32 {
    done_code(with_bridge("enable_redcost_callback", |bridge| {
        bridge.enable_redcost(flag(enabled))
    }))
}

#[no_mangle]
pub extern "C" fn mipb_enable_farkas_callback(enabled: i32) -> i32 {
    done_code(with_bridge("enable_farkas_callback", |bridge| {
        bridge.enable_farkas(flag(enabled))
    }))
}

#[no_mangle]
pub extern "C" fn mipb_set_incumbent_callback(callback: Option<IncumbentCallback>) {
    callbacks::set_incumbent_callback(callback);
}

#[no_mangle]
pub extern "C" fn mipb_set_node_callback(callback: Option<NodeCallback>) {
    callbacks::set_node_callback(callback);
}

#[no_mangle]
pub extern "C" fn mipb_enable_incumbent_callback(enabled: i32) -> i32 {
    done_code(with_bridge("enable_incumbent_callback", |bridge| {
        bridge.enable_incumbent_events(flag(enabled))
    }))
}

/// Toggle node notifications. The engine subscription is made the first time
/// they are switched on.
#[no_mangle]
pub extern "C" fn mipb_enable_node_callback(enabled: i32) -> i32 {
    done_code(bridge_call("enable_node_callback", |bridge| {
        bridge.enable_node_events(flag(enabled))
    }))
}

// ============================================================================
// Round control
// ============================================================================

/// Set the pending result. Only the codes of [`mipb_result_success`],
/// [`mipb_result_didnotrun`] and [`mipb_result_didnotfind`] are accepted.
#[no_mangle]
pub extern "C" fn mipb_pricer_set_result(code: i32) -> i32 {
    done_code(session_call("pricer_set_result", |s| s.set_result_code(code)))
}

#[no_mangle]
pub extern "C" fn mipb_pricer_set_lowerbound(bound: f64) -> i32 {
    done_code(session_call("pricer_set_lowerbound", |s| {
        s.set_lower_bound(bound);
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn mipb_pricer_set_stopearly(stop: i32) -> i32 {
    done_code(session_call("pricer_set_stopearly", |s| {
        s.set_stop_early(flag(stop));
        Ok(())
    }))
}

/// Request that the round be abandoned when the callback returns. The solve
/// is interrupted at that point.
#[no_mangle]
pub extern "C" fn mipb_pricer_set_abortround(abort: i32) -> i32 {
    done_code(session_call("pricer_set_abortround", |s| {
        s.set_abort_round(flag(abort));
        Ok(())
    }))
}

/// Abandon the round now and interrupt the solve.
#[no_mangle]
pub extern "C" fn mipb_pricer_abort_round() -> i32 {
    done_code(session_call("pricer_abort_round", |s| {
        s.abort_round();
        Ok(())
    }))
}

/// Add a priced variable to the transformed problem and return its handle.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_pricer_add_priced_var(
    name: *const c_char,
    lb: f64,
    ub: f64,
    obj: f64,
    vartype: i32,
    initial: i32,
    removable: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let name = unsafe { read_str(name) };
    handle_code(session_call("pricer_add_priced_var", |s| {
        let Some(name) = name else {
            return s.reject_pricing_write("priced variable without a name");
        };
        let Some(var_type) = VarType::from_code(vartype) else {
            return s.reject_pricing_write(format!("unknown variable type {vartype}"));
        };
        let opts = VarOptions {
            initial: flag(initial),
            removable: flag(removable),
            ..VarOptions::bounded(lb, ub, obj).with_type(var_type)
        };
        s.add_priced_var(name, &opts)
    }))
}

/// Bind `var` into `n` LP rows. All or nothing: an invalid handle applies no
/// coefficient and aborts the round.
///
/// # Safety
///
/// `rows` and `vals` must be valid for reads of `n` elements.
#[no_mangle]
pub unsafe extern "C" fn mipb_pricer_add_var_to_rows_batch(
    var: i32,
    rows: *const i32,
    vals: *const f64,
    n: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let (rows, vals) = unsafe { (slice_in(rows, n), slice_in(vals, n)) };
    done_code(session_call("pricer_add_var_to_rows_batch", |s| {
        match (rows, vals) {
            (Some(rows), Some(vals)) => s.add_var_to_rows(var, rows, vals),
            _ => s.reject_pricing_write(format!("unreadable row batch of length {n}")),
        }
    }))
}

/// Constraint counterpart of [`mipb_pricer_add_var_to_rows_batch`].
///
/// # Safety
///
/// `conss` and `vals` must be valid for reads of `n` elements.
#[no_mangle]
pub unsafe extern "C" fn mipb_pricer_add_var_to_conss_batch(
    var: i32,
    conss: *const i32,
    vals: *const f64,
    n: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller.
    let (conss, vals) = unsafe { (slice_in(conss, n), slice_in(vals, n)) };
    done_code(session_call("pricer_add_var_to_conss_batch", |s| {
        match (conss, vals) {
            (Some(conss), Some(vals)) => s.add_var_to_conss(var, conss, vals),
            _ => s.reject_pricing_write(format!("unreadable constraint batch of length {n}")),
        }
    }))
}

// ============================================================================
// Counters
// ============================================================================

/// Priced variables added since the solve started.
#[no_mangle]
pub extern "C" fn mipb_pricer_get_n_added_vars() -> i32 {
    pricing_view(|p| counter(p.added_total())).unwrap_or(INVALID_HANDLE)
}

/// Priced variables added in the current (or last) round.
#[no_mangle]
pub extern "C" fn mipb_pricer_get_n_added_vars_this_call() -> i32 {
    pricing_view(|p| counter(p.added_this_call())).unwrap_or(INVALID_HANDLE)
}

#[no_mangle]
pub extern "C" fn mipb_pricer_get_last_result() -> i32 {
    pricing_view(|p| p.last_result().code()).unwrap_or(INVALID_HANDLE)
}

#[no_mangle]
pub extern "C" fn mipb_pricer_get_last_mode() -> i32 {
    pricing_view(|p| p.last_mode().code()).unwrap_or(INVALID_HANDLE)
}

#[no_mangle]
pub extern "C" fn mipb_pricer_get_redcost_calls() -> i32 {
    pricing_view(|p| counter(p.redcost_calls())).unwrap_or(INVALID_HANDLE)
}

#[no_mangle]
pub extern "C" fn mipb_pricer_get_farkas_calls() -> i32 {
    pricing_view(|p| counter(p.farkas_calls())).unwrap_or(INVALID_HANDLE)
}

/// Pricing round number, shared by both modes. `0` before the first round.
#[no_mangle]
pub extern "C" fn mipb_pricer_get_round() -> i32 {
    pricing_view(|p| counter(p.round())).unwrap_or(INVALID_HANDLE)
}

#[no_mangle]
pub extern "C" fn mipb_result_success() -> i32 {
    PricerResult::Success.code()
}

#[no_mangle]
pub extern "C" fn mipb_result_didnotrun() -> i32 {
    PricerResult::DidNotRun.code()
}

#[no_mangle]
pub extern "C" fn mipb_result_didnotfind() -> i32 {
    PricerResult::DidNotFind.code()
}
