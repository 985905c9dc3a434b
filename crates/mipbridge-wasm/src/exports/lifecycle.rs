//! Engine and problem lifecycle.

use std::ffi::c_char;
use std::io;

use mipbridge_core::{Sentinel, INVALID_HANDLE};
use tracing_subscriber::EnvFilter;

use super::done_code;
use crate::marshal::read_str;
use crate::state::bridge_call;

/// Create the engine instance: `1` if created, `0` if one already exists,
/// `-1` on failure.
#[no_mangle]
pub extern "C" fn mipb_create() -> i32 {
    match bridge_call("create", |bridge| bridge.create_engine()) {
        Some(created) => Sentinel::from_bool(created).code(),
        None => INVALID_HANDLE,
    }
}

/// Tear down the current problem and release the engine.
#[no_mangle]
pub extern "C" fn mipb_free() -> i32 {
    done_code(bridge_call("free", |bridge| bridge.destroy_engine()))
}

/// Free the current problem. Every handle issued so far becomes invalid.
#[no_mangle]
pub extern "C" fn mipb_problem_clear() -> i32 {
    done_code(bridge_call("problem_clear", |bridge| bridge.clear_problem()))
}

/// Start a new problem. A null or empty name selects the default name.
///
/// # Safety
///
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mipb_problem_begin(name: *const c_char, maximize: i32) -> i32 {
    // SAFETY: guaranteed by the caller.
    let name = unsafe { read_str(name) }.unwrap_or_default();
    done_code(bridge_call("problem_begin", |bridge| {
        bridge.begin_problem(name, maximize != 0)
    }))
}

/// Like [`mipb_problem_clear`], but also valid without an engine.
#[no_mangle]
pub extern "C" fn mipb_reset() -> i32 {
    done_code(bridge_call("reset", |bridge| bridge.reset()))
}

/// Install a stderr subscriber honouring `RUST_LOG`. Returns `0` if a
/// subscriber was already installed.
#[no_mangle]
pub extern "C" fn mipb_init_logging() -> i32 {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .try_init()
        .is_ok();
    Sentinel::from_bool(installed).code()
}
