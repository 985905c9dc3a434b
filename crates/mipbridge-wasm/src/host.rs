//! Safe host-side wrapper over the exported primitives.
//!
//! [`Host`] marshals arguments the way a sandboxed host does: strings and
//! batches are copied into the boundary heap, passed by pointer and released
//! on every path. Sentinel returns become `anyhow` errors with context.
//! Functions that act on a pricing round are meant to be called from a host
//! pricing callback.

use std::ffi::c_char;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use mipbridge_core::{ConsOptions, PricerOptions, Sentinel, VarOptions};

use crate::exports::context::*;
use crate::exports::diagnostics::*;
use crate::exports::lifecycle::*;
use crate::exports::model::*;
use crate::exports::pricer::*;
use crate::exports::solve::*;
use crate::marshal::{copy_returned_str, with_scoped_str, BoundaryBuffer, Element};

fn check(code: i32, what: &str) -> Result<()> {
    ensure!(code == Sentinel::True.code(), "{what} failed (code {code})");
    Ok(())
}

fn handle(code: i32, what: &str) -> Result<i32> {
    ensure!(code > 0, "{what} returned no handle (code {code})");
    Ok(code)
}

fn with_str<R>(value: &str, f: impl FnOnce(*const c_char) -> R) -> Result<R> {
    with_scoped_str(value, f).with_context(|| format!("cannot marshal string {value:?}"))
}

/// Fill a fresh boundary buffer through `fill` and copy out what was written.
fn read_batch<T: Element>(
    capacity: usize,
    what: &str,
    fill: impl FnOnce(*mut T, i32) -> i32,
) -> Result<Vec<T>> {
    let mut buffer = BoundaryBuffer::<T>::new(capacity)
        .with_context(|| format!("cannot allocate {capacity} slots for {what}"))?;
    let written = fill(buffer.as_mut_ptr(), buffer.count());
    let Ok(written) = usize::try_from(written) else {
        bail!("{what} failed (code {written})");
    };
    Ok(buffer.as_slice()[..written.min(capacity)].to_vec())
}

/// Copy handles and values into boundary buffers for one batched call.
fn with_batch<R>(
    handles: &[i32],
    vals: &[f64],
    f: impl FnOnce(*const i32, *const f64, i32) -> R,
) -> Result<R> {
    ensure!(
        handles.len() == vals.len(),
        "{} handles but {} values",
        handles.len(),
        vals.len()
    );
    let handles = BoundaryBuffer::from_slice(handles).context("cannot allocate handle batch")?;
    let vals = BoundaryBuffer::from_slice(vals).context("cannot allocate value batch")?;
    Ok(f(handles.as_ptr(), vals.as_ptr(), handles.count()))
}

fn returned_str(ptr: *const c_char, what: &str) -> Result<String> {
    // SAFETY: exports return null or a pointer into the return slot.
    unsafe { copy_returned_str(ptr) }.with_context(|| format!("{what} returned no string"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Host;

impl Host {
    /// Make sure an engine instance exists.
    pub fn create() -> Result<Self> {
        ensure!(mipb_create() >= 0, "engine creation failed");
        Ok(Host)
    }

    pub fn free(self) -> Result<()> {
        check(mipb_free(), "free")
    }

    pub fn begin_problem(&self, name: &str, maximize: bool) -> Result<()> {
        // SAFETY: `p` is a live boundary string.
        let code = with_str(name, |p| unsafe { mipb_problem_begin(p, i32::from(maximize)) })?;
        check(code, "begin problem")
    }

    pub fn clear_problem(&self) -> Result<()> {
        check(mipb_problem_clear(), "clear problem")
    }

    // ---- model ----

    pub fn add_var(&self, name: &str, opts: &VarOptions) -> Result<i32> {
        let code = with_str(name, |p| {
            // SAFETY: `p` is a live boundary string.
            unsafe {
                mipb_add_var(
                    p,
                    opts.lb,
                    opts.ub,
                    opts.obj,
                    opts.var_type as i32,
                    i32::from(opts.initial),
                    i32::from(opts.removable),
                )
            }
        })?;
        handle(code, "add variable")
    }

    pub fn add_cons(&self, name: &str, opts: &ConsOptions) -> Result<i32> {
        let code = with_str(name, |p| {
            // SAFETY: `p` is a live boundary string.
            unsafe {
                mipb_add_cons_linear(
                    p,
                    opts.lhs,
                    opts.rhs,
                    i32::from(opts.initial),
                    i32::from(opts.separate),
                    i32::from(opts.enforce),
                    i32::from(opts.check),
                    i32::from(opts.propagate),
                    i32::from(opts.local),
                    i32::from(opts.modifiable),
                    i32::from(opts.dynamic),
                    i32::from(opts.removable),
                    i32::from(opts.sticking_at_node),
                )
            }
        })?;
        handle(code, "add constraint")
    }

    pub fn add_coefs(&self, cons: i32, vars: &[i32], vals: &[f64]) -> Result<()> {
        // SAFETY: both buffers hold `n` elements.
        let code = with_batch(vars, vals, |vars, vals, n| unsafe {
            mipb_add_coef_linear_batch(cons, vars, vals, n)
        })?;
        check(code, "add coefficients")
    }

    pub fn set_cons_modifiable(&self, cons: i32, modifiable: bool) -> Result<()> {
        check(
            mipb_set_cons_modifiable(cons, i32::from(modifiable)),
            "set modifiable",
        )
    }

    pub fn find_var(&self, name: &str) -> Result<i32> {
        // SAFETY: `p` is a live boundary string.
        let code = with_str(name, |p| unsafe { mipb_var_find_id(p) })?;
        handle(code, "find variable")
    }

    pub fn find_cons(&self, name: &str) -> Result<i32> {
        // SAFETY: `p` is a live boundary string.
        let code = with_str(name, |p| unsafe { mipb_cons_find_id(p) })?;
        handle(code, "find constraint")
    }

    pub fn cons_row(&self, cons: i32) -> Result<i32> {
        handle(mipb_cons_get_row(cons), "constraint row")
    }

    // ---- parameters and solving ----

    pub fn set_int_param(&self, name: &str, value: i32) -> Result<()> {
        // SAFETY: `p` is a live boundary string.
        let code = with_str(name, |p| unsafe { mipb_set_param_int(p, value) })?;
        check(code, name)
    }

    pub fn set_real_param(&self, name: &str, value: f64) -> Result<()> {
        // SAFETY: `p` is a live boundary string.
        let code = with_str(name, |p| unsafe { mipb_set_param_real(p, value) })?;
        check(code, name)
    }

    pub fn add_solution_hint(&self, hint: &str) -> Result<bool> {
        // SAFETY: `p` is a live boundary string.
        let code = with_str(hint, |p| unsafe { mipb_add_solution_hint(p) })?;
        Ok(code == Sentinel::True.code())
    }

    /// Solve and return the boundary status code.
    pub fn solve(&self) -> Result<i32> {
        let code = mipb_solve();
        ensure!(code >= 0, "solve failed");
        Ok(code)
    }

    pub fn objective(&self) -> f64 {
        mipb_get_objective()
    }

    pub fn var_value(&self, name: &str) -> Result<f64> {
        // SAFETY: `p` is a live boundary string.
        with_str(name, |p| unsafe { mipb_get_var_value(p) })
    }

    pub fn var_names(&self) -> Result<Vec<String>> {
        let names = returned_str(mipb_get_var_names(), "variable names")?;
        Ok(names
            .split(',')
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect())
    }

    // ---- pricer ----

    pub fn include_pricer(&self, opts: &PricerOptions) -> Result<bool> {
        let code = with_str(&opts.name, |name| {
            with_str(&opts.description, |desc| {
                // SAFETY: both are live boundary strings.
                unsafe { mipb_pricer_include(name, desc, opts.priority, i32::from(opts.delay)) }
            })
        })??;
        ensure!(code >= 0, "include pricer failed");
        Ok(code == Sentinel::True.code())
    }

    pub fn activate_pricer(&self) -> Result<()> {
        check(mipb_pricer_activate(), "activate pricer")
    }

    pub fn lp_row_duals(&self, capacity: usize) -> Result<Vec<f64>> {
        // SAFETY: the buffer holds `n` elements.
        read_batch(capacity, "row duals", |out, n| unsafe {
            mipb_ctx_get_lp_row_duals_batch(out, n)
        })
    }

    pub fn lp_row_farkas(&self, capacity: usize) -> Result<Vec<f64>> {
        // SAFETY: the buffer holds `n` elements.
        read_batch(capacity, "row Farkas duals", |out, n| unsafe {
            mipb_ctx_get_lp_row_farkas_batch(out, n)
        })
    }

    pub fn lp_row_ids(&self, capacity: usize) -> Result<Vec<i32>> {
        // SAFETY: the buffer holds `n` elements.
        read_batch(capacity, "row handles", |out, n| unsafe {
            mipb_ctx_get_lp_row_ids_batch(out, n)
        })
    }

    pub fn add_priced_var(&self, name: &str, opts: &VarOptions) -> Result<i32> {
        let code = with_str(name, |p| {
            // SAFETY: `p` is a live boundary string.
            unsafe {
                mipb_pricer_add_priced_var(
                    p,
                    opts.lb,
                    opts.ub,
                    opts.obj,
                    opts.var_type as i32,
                    i32::from(opts.initial),
                    i32::from(opts.removable),
                )
            }
        })?;
        handle(code, "add priced variable")
    }

    pub fn add_var_to_rows(&self, var: i32, rows: &[i32], vals: &[f64]) -> Result<()> {
        // SAFETY: both buffers hold `n` elements.
        let code = with_batch(rows, vals, |rows, vals, n| unsafe {
            mipb_pricer_add_var_to_rows_batch(var, rows, vals, n)
        })?;
        check(code, "add variable to rows")
    }

    pub fn add_var_to_conss(&self, var: i32, conss: &[i32], vals: &[f64]) -> Result<()> {
        // SAFETY: both buffers hold `n` elements.
        let code = with_batch(conss, vals, |conss, vals, n| unsafe {
            mipb_pricer_add_var_to_conss_batch(var, conss, vals, n)
        })?;
        check(code, "add variable to constraints")
    }

    // ---- diagnostics ----

    pub fn write_lp(&self, path: &Path) -> Result<()> {
        let path_str = path.to_str().context("path is not valid UTF-8")?;
        // SAFETY: `p` is a live boundary string.
        let code = with_str(path_str, |p| unsafe { mipb_model_write_lp(p) })?;
        check(code, "write LP")
    }

    pub fn write_snapshot(&self, prefix: &Path) -> Result<PathBuf> {
        let prefix = prefix.to_str().context("prefix is not valid UTF-8")?;
        // SAFETY: `p` is a live boundary string.
        let ptr = with_str(prefix, |p| unsafe { mipb_model_write_lp_snapshot(p) })?;
        returned_str(ptr, "write snapshot").map(PathBuf::from)
    }
}
