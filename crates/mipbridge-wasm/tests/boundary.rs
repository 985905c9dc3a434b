//! End-to-end tests of the exported surface, driven the way a host drives
//! it: strings and batches through the boundary heap, pricing and event
//! logic as `extern "C"` callbacks.

use std::cell::RefCell;
use std::ffi::CString;
use std::path::PathBuf;
use std::ptr;

use mipbridge_core::{ConsOptions, PricerOptions, VarOptions, VarType};
use mipbridge_wasm::alloc::mipb_outstanding_allocations;
use mipbridge_wasm::exports::context::*;
use mipbridge_wasm::exports::lifecycle::*;
use mipbridge_wasm::exports::model::*;
use mipbridge_wasm::exports::pricer::*;
use mipbridge_wasm::exports::solve::*;
use mipbridge_wasm::Host;

const TOL: f64 = 1e-6;
const STAGE_INIT: i32 = 0;
const STAGE_SOLVING: i32 = 9;
const STATUS_OPTIMAL: i32 = 0;
const STATUS_OTHER: i32 = 4;

/// What the callbacks saw. Callbacks never panic; the test asserts on the
/// record after the solve returns.
#[derive(Default)]
struct Seen {
    c1: i32,
    prefix: Option<PathBuf>,
    added: usize,
    modes: Vec<i32>,
    rounds: Vec<i32>,
    stages: Vec<i32>,
    lifecycle_codes: Vec<Vec<i32>>,
    batch_duals: Vec<f64>,
    single_duals: Vec<f64>,
    bind_ok: Vec<bool>,
    codes: Vec<i32>,
    incumbents: Vec<f64>,
    nodes: Vec<f64>,
    snapshots: Vec<PathBuf>,
}

thread_local! {
    static SEEN: RefCell<Seen> = RefCell::new(Seen::default());
}

fn seen<R>(f: impl FnOnce(&mut Seen) -> R) -> R {
    SEEN.with(|p| f(&mut p.borrow_mut()))
}

/// min x + 2y, x + y >= 1, both in [0, 10].
fn covering(host: &Host) -> (i32, i32, i32) {
    host.begin_problem("covering", false).unwrap();
    let x = host.add_var("x", &VarOptions::bounded(0.0, 10.0, 1.0)).unwrap();
    let y = host.add_var("y", &VarOptions::bounded(0.0, 10.0, 2.0)).unwrap();
    let c1 = host
        .add_cons("c1", &ConsOptions::ranged(1.0, f64::INFINITY))
        .unwrap();
    host.add_coefs(c1, &[x, y], &[1.0, 1.0]).unwrap();
    (x, y, c1)
}

/// Restricted master: one expensive column covering a modifiable row.
fn master(host: &Host) -> i32 {
    host.begin_problem("master", false).unwrap();
    let x = host.add_var("x", &VarOptions::bounded(0.0, 10.0, 10.0)).unwrap();
    let c1 = host
        .add_cons(
            "c1",
            &ConsOptions::ranged(1.0, f64::INFINITY).modifiable(true),
        )
        .unwrap();
    host.add_coefs(c1, &[x], &[1.0]).unwrap();
    assert!(host.include_pricer(&PricerOptions::default()).unwrap());
    host.activate_pricer().unwrap();
    seen(|p| p.c1 = c1);
    c1
}

/// max 5x + 4y, 6x + 4y <= 24, x in 0..4 integer, y binary.
fn knapsack(host: &Host) {
    host.begin_problem("knapsack", true).unwrap();
    let x = host
        .add_var(
            "x",
            &VarOptions::bounded(0.0, 4.0, 5.0).with_type(VarType::Integer),
        )
        .unwrap();
    let y = host
        .add_var(
            "y",
            &VarOptions::bounded(0.0, 1.0, 4.0).with_type(VarType::Binary),
        )
        .unwrap();
    let cap = host
        .add_cons("cap", &ConsOptions::ranged(f64::NEG_INFINITY, 24.0))
        .unwrap();
    host.add_coefs(cap, &[x, y], &[6.0, 4.0]).unwrap();
}

// ============================================================================
// Host callbacks
// ============================================================================

extern "C" fn price_cheap_column() {
    let host = Host;
    let c1 = seen(|p| p.c1);
    let lifecycle = vec![
        mipb_solve(),
        mipb_create(),
        mipb_problem_clear(),
        mipb_pricer_activate(),
    ];
    let duals = host.lp_row_duals(8).unwrap_or_default();
    let rows = host.lp_row_ids(8).unwrap_or_default();
    let singles: Vec<f64> = rows.iter().map(|&row| mipb_row_get_dual(row)).collect();
    seen(|p| {
        p.modes.push(mipb_ctx_get_pricing_mode());
        p.rounds.push(mipb_pricer_get_round());
        p.stages.push(mipb_ctx_get_stage());
        p.lifecycle_codes.push(lifecycle);
        p.batch_duals.extend(duals);
        p.single_duals.extend(singles);
    });

    if 1.0 - mipb_cons_get_dual_linear(c1) < -TOL {
        let name = format!("z{}", seen(|p| p.added));
        if let Ok(z) = host.add_priced_var(&name, &VarOptions::bounded(0.0, f64::INFINITY, 1.0)) {
            let ok = host.add_var_to_conss(z, &[c1], &[1.0]).is_ok();
            seen(|p| {
                p.added += 1;
                p.bind_ok.push(ok);
            });
        }
    }
    mipb_pricer_set_result(mipb_result_success());
}

extern "C" fn price_farkas_column() {
    let host = Host;
    let c1 = seen(|p| p.c1);
    let farkas = host.lp_row_farkas(4).unwrap_or_default();
    seen(|p| {
        p.modes.push(mipb_ctx_get_pricing_mode());
        p.batch_duals.extend(farkas);
    });
    if mipb_cons_get_farkas_linear(c1) > TOL {
        let row = mipb_cons_get_row(c1);
        if let Ok(z) = host.add_priced_var("z", &VarOptions::bounded(0.0, f64::INFINITY, 1.0)) {
            let ok = host.add_var_to_rows(z, &[row], &[1.0]).is_ok();
            seen(|p| p.bind_ok.push(ok));
        }
    }
}

extern "C" fn abort_pricing() {
    mipb_pricer_set_result(mipb_result_success());
    mipb_pricer_set_abortround(1);
}

extern "C" fn bind_with_stale_row() {
    let host = Host;
    let mut rows = host.lp_row_ids(4).unwrap_or_default();
    rows.push(9999);
    let vals = vec![1.0; rows.len()];
    if let Ok(z) = host.add_priced_var("z", &VarOptions::bounded(0.0, f64::INFINITY, 1.0)) {
        let ok = host.add_var_to_rows(z, &rows, &vals).is_ok();
        seen(|p| p.bind_ok.push(ok));
    }
}

extern "C" fn bind_null_batch() {
    let host = Host;
    if let Ok(z) = host.add_priced_var("z", &VarOptions::bounded(0.0, f64::INFINITY, 1.0)) {
        // SAFETY: a null batch is never read.
        let code = unsafe { mipb_pricer_add_var_to_rows_batch(z, ptr::null(), ptr::null(), 2) };
        seen(|p| p.codes.push(code));
    }
    mipb_pricer_set_result(mipb_result_success());
}

extern "C" fn add_malformed_vars() {
    let name = CString::new("z").unwrap();
    // SAFETY: `name` is NUL-terminated and outlives both calls.
    let codes = unsafe {
        [
            mipb_pricer_add_priced_var(name.as_ptr(), 0.0, 1.0, 1.0, 9, 1, 1),
            mipb_pricer_add_priced_var(ptr::null(), 0.0, 1.0, 1.0, 0, 1, 1),
        ]
    };
    seen(|p| p.codes.extend(codes));
    mipb_pricer_set_result(mipb_result_success());
}

/// First round only: one column pinned in the LP, one with default flags.
extern "C" fn price_flagged_columns() {
    if seen(|p| p.added) > 0 {
        return;
    }
    let host = Host;
    let c1 = seen(|p| p.c1);
    let pinned = VarOptions {
        initial: false,
        removable: false,
        ..VarOptions::bounded(0.0, f64::INFINITY, 1.0)
    };
    let loose = VarOptions::bounded(0.0, f64::INFINITY, 2.0);
    for (name, opts) in [("pinned", pinned), ("loose", loose)] {
        if let Ok(z) = host.add_priced_var(name, &opts) {
            let ok = host.add_var_to_conss(z, &[c1], &[1.0]).is_ok();
            let flags = [mipb_var_is_initial(z), mipb_var_is_removable(z)];
            seen(|p| {
                p.added += 1;
                p.bind_ok.push(ok);
                p.codes.extend(flags);
            });
        }
    }
    mipb_pricer_set_result(mipb_result_success());
}

extern "C" fn snapshot_round() {
    let Some(prefix) = seen(|p| p.prefix.clone()) else {
        return;
    };
    if let Ok(path) = Host.write_snapshot(&prefix) {
        seen(|p| p.snapshots.push(path));
    }
}

extern "C" fn record_incumbent(objective: f64) {
    let stage = mipb_ctx_get_stage();
    seen(|p| {
        p.incumbents.push(objective);
        p.stages.push(stage);
    });
}

extern "C" fn record_node(_dual_bound: f64, _primal_bound: f64, nodes: f64) {
    let transformed = mipb_ctx_is_transformed();
    seen(|p| {
        p.nodes.push(nodes);
        p.codes.push(transformed);
    });
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_sentinels_without_engine() {
    assert_eq!(mipb_ctx_get_stage(), -1);
    assert_eq!(mipb_solve(), -1);
    assert_eq!(mipb_problem_clear(), 0);
    assert_eq!(mipb_reset(), 1);
    assert_eq!(mipb_free(), 1);
    assert!(mipb_get_var_names().is_null());
    assert_eq!(mipb_get_objective(), 0.0);
    assert_eq!(mipb_ctx_get_n_lp_rows(), -1);
    assert_eq!(mipb_ctx_get_var_lp_value(1), 0.0);
    assert_eq!(mipb_pricer_get_round(), 0);
    assert!(Host.add_var("x", &VarOptions::default()).is_err());

    assert_eq!(mipb_create(), 1);
    assert_eq!(mipb_create(), 0);
    assert_eq!(mipb_ctx_get_stage(), STAGE_INIT);
    assert_eq!(mipb_ctx_get_lp_solstat(), -1);
}

#[test]
fn test_covering_scenario() {
    let host = Host::create().unwrap();
    let (x, _, _) = covering(&host);
    assert_eq!(host.find_var("x").unwrap(), x);
    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);

    assert!((host.objective() - 1.0).abs() < TOL);
    assert!((host.var_value("x").unwrap() - 1.0).abs() < TOL);
    assert!(host.var_value("y").unwrap().abs() < TOL);
    assert_eq!(host.var_names().unwrap(), vec!["x", "y"]);
    assert_eq!(mipb_get_nvars(), 2);
    assert!(mipb_get_nnodes() >= 1);
    assert_eq!(mipb_get_gap(), 0.0);
    assert_eq!(mipb_ctx_is_transformed(), 1);
    assert_eq!(mipb_ctx_has_lp(), 0);
    assert_eq!(mipb_outstanding_allocations(), 0);
}

#[test]
fn test_handles_do_not_survive_problem_change() {
    let host = Host::create().unwrap();
    let (x, _, c1) = covering(&host);
    assert_eq!(mipb_set_cons_modifiable(c1, 1), 1);

    host.begin_problem("next", false).unwrap();
    let x2 = host.add_var("x", &VarOptions::default()).unwrap();
    assert_ne!(x, x2);
    assert_eq!(mipb_set_cons_modifiable(c1, 1), 0);
    assert_eq!(mipb_add_coef_linear(c1, x2, 1.0), 0);

    host.clear_problem().unwrap();
    assert_eq!(mipb_ctx_get_stage(), STAGE_INIT);
    assert!(host.find_var("x").is_err());
}

#[test]
fn test_batch_misuse_is_reported() {
    let host = Host::create().unwrap();
    let (x, y, c1) = covering(&host);

    let mut buf = [0.0f64; 4];
    // No LP outside solving.
    assert_eq!(
        unsafe { mipb_ctx_get_lp_row_duals_batch(buf.as_mut_ptr(), 4) },
        0
    );
    assert_eq!(
        unsafe { mipb_ctx_get_lp_row_duals_batch(buf.as_mut_ptr(), 0) },
        -1
    );
    assert_eq!(
        unsafe { mipb_ctx_get_lp_row_duals_batch(std::ptr::null_mut(), 4) },
        -1
    );
    assert_eq!(
        unsafe { mipb_ctx_get_lp_row_duals_batch(buf.as_mut_ptr(), -2) },
        -1
    );

    let vars = [x, 999_999];
    let vals = [1.0, 2.0];
    assert_eq!(
        unsafe { mipb_add_coef_linear_batch(c1, vars.as_ptr(), vals.as_ptr(), 2) },
        0
    );
    assert!(host.add_coefs(c1, &[x, y], &[1.0]).is_err());
}

#[test]
fn test_parameters_and_hints() {
    let host = Host::create().unwrap();
    covering(&host);
    assert_eq!(mipb_set_time_limit(5.0), 1);
    assert_eq!(mipb_set_gap(0.0), 1);
    host.set_int_param("limits/nodes", 100).unwrap();
    assert!(host.set_real_param("limits/nodes", 1.0).is_err());
    assert!(host.set_real_param("no/such/param", 1.0).is_err());

    assert!(host.add_solution_hint("x=1;y=0").unwrap());
    assert!(!host.add_solution_hint("nope=1").unwrap());
    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
    assert!((host.objective() - 1.0).abs() < TOL);
}

#[test]
fn test_result_codes() {
    assert_eq!(mipb_result_success(), 17);
    assert_eq!(mipb_result_didnotrun(), 1);
    assert_eq!(mipb_result_didnotfind(), 3);

    Host::create().unwrap();
    assert_eq!(mipb_pricer_set_result(2), 0);
    assert_eq!(mipb_pricer_set_result(mipb_result_didnotfind()), 1);
}

#[test]
fn test_redcost_callback_prices_a_column() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(price_cheap_column));
    assert_eq!(mipb_enable_redcost_callback(1), 1);

    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
    assert!((host.objective() - 1.0).abs() < TOL);
    assert!((host.var_value("z0").unwrap() - 1.0).abs() < TOL);

    assert!(mipb_pricer_get_redcost_calls() >= 2);
    assert_eq!(mipb_pricer_get_farkas_calls(), 0);
    assert_eq!(mipb_pricer_get_n_added_vars(), 1);
    assert_eq!(mipb_pricer_get_last_mode(), 1);
    assert_eq!(mipb_ctx_get_pricing_mode(), 0);

    seen(|p| {
        assert_eq!(p.added, 1);
        assert_eq!(p.bind_ok, vec![true]);
        assert!(p.modes.iter().all(|&m| m == 1));
        let expected: Vec<i32> = (1..=p.rounds.len() as i32).collect();
        assert_eq!(p.rounds, expected);
        assert!(p.stages.iter().all(|&s| s == STAGE_SOLVING));
        assert!(p
            .lifecycle_codes
            .iter()
            .all(|codes| codes == &vec![-1, -1, 0, 0]));
        assert!(!p.batch_duals.is_empty());
        assert_eq!(p.batch_duals, p.single_duals);
        assert!((p.batch_duals[0] - 10.0).abs() < TOL);
    });
    assert_eq!(mipb_outstanding_allocations(), 0);
}

#[test]
fn test_farkas_callback_restores_feasibility() {
    let host = Host::create().unwrap();
    host.begin_problem("empty", false).unwrap();
    let c1 = host
        .add_cons(
            "c1",
            &ConsOptions::ranged(1.0, f64::INFINITY).modifiable(true),
        )
        .unwrap();
    assert!(host.include_pricer(&PricerOptions::default()).unwrap());
    host.activate_pricer().unwrap();
    seen(|p| p.c1 = c1);
    mipb_set_farkas_callback(Some(price_farkas_column));
    assert_eq!(mipb_enable_farkas_callback(1), 1);

    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
    assert!((host.objective() - 1.0).abs() < TOL);
    // Once the Farkas column makes the LP feasible, pricing continues in
    // reduced-cost mode.
    assert_eq!(mipb_pricer_get_farkas_calls(), 1);
    assert!(mipb_pricer_get_redcost_calls() >= 1);
    assert_eq!(mipb_pricer_get_last_mode(), 1);
    seen(|p| {
        assert_eq!(p.modes, vec![2]);
        assert_eq!(p.bind_ok, vec![true]);
        assert_eq!(p.batch_duals.len(), 1);
        assert!((p.batch_duals[0] - 1.0).abs() < TOL);
    });
}

#[test]
fn test_abort_round_interrupts_solve() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(abort_pricing));
    mipb_enable_redcost_callback(1);

    assert_eq!(host.solve().unwrap(), STATUS_OTHER);
    assert_eq!(mipb_pricer_get_redcost_calls(), 1);
    assert_eq!(mipb_pricer_get_last_result(), mipb_result_didnotrun());
}

#[test]
fn test_invalid_batch_binding_aborts_round() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(bind_with_stale_row));
    mipb_enable_redcost_callback(1);

    assert_eq!(host.solve().unwrap(), STATUS_OTHER);
    seen(|p| assert_eq!(p.bind_ok, vec![false]));
    assert_eq!(mipb_pricer_get_redcost_calls(), 1);
    assert_eq!(mipb_pricer_get_last_result(), mipb_result_didnotrun());
    assert_eq!(mipb_pricer_get_n_added_vars(), 1);
}

#[test]
fn test_null_batch_aborts_round() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(bind_null_batch));
    mipb_enable_redcost_callback(1);

    assert_eq!(host.solve().unwrap(), STATUS_OTHER);
    seen(|p| assert_eq!(p.codes, vec![0]));
    assert_eq!(mipb_pricer_get_redcost_calls(), 1);
    assert_eq!(mipb_pricer_get_last_result(), mipb_result_didnotrun());
}

#[test]
fn test_malformed_priced_var_aborts_round() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(add_malformed_vars));
    mipb_enable_redcost_callback(1);

    assert_eq!(host.solve().unwrap(), STATUS_OTHER);
    seen(|p| assert_eq!(p.codes, vec![-1, -1]));
    assert_eq!(mipb_pricer_get_redcost_calls(), 1);
    assert_eq!(mipb_pricer_get_n_added_vars(), 0);
    assert_eq!(mipb_pricer_get_last_result(), mipb_result_didnotrun());
}

#[test]
fn test_malformed_write_outside_round_is_rejected_quietly() {
    let host = Host::create().unwrap();
    covering(&host);
    // SAFETY: a null batch is never read.
    assert_eq!(
        unsafe { mipb_pricer_add_var_to_conss_batch(1, ptr::null(), ptr::null(), -1) },
        0
    );
    assert_eq!(mipb_pricer_get_round(), 0);
    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
}

#[test]
fn test_priced_var_keeps_column_flags() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(price_flagged_columns));
    mipb_enable_redcost_callback(1);

    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
    assert!((host.objective() - 1.0).abs() < TOL);
    seen(|p| {
        assert_eq!(p.bind_ok, vec![true, true]);
        assert_eq!(p.codes, vec![0, 0, 1, 1]);
    });
}

#[test]
fn test_disabled_callback_is_not_called() {
    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(abort_pricing));
    mipb_enable_redcost_callback(0);

    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
    assert!((host.objective() - 10.0).abs() < TOL);
    assert!(mipb_pricer_get_redcost_calls() >= 1);
    assert_eq!(mipb_pricer_get_last_result(), mipb_result_success());
}

#[test]
fn test_snapshot_names_mode_and_round() {
    let dir = tempfile::tempdir().unwrap();
    seen(|p| p.prefix = Some(dir.path().join("snap")));

    let host = Host::create().unwrap();
    master(&host);
    mipb_set_redcost_callback(Some(snapshot_round));
    mipb_enable_redcost_callback(1);
    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);

    seen(|p| {
        let first = &p.snapshots[0];
        assert!(first.to_string_lossy().ends_with("snap_redcost_1.lp"));
        let text = std::fs::read_to_string(first).unwrap();
        assert!(text.contains("c1"));
    });
}

#[test]
fn test_event_callbacks() {
    let host = Host::create().unwrap();
    knapsack(&host);
    mipb_set_incumbent_callback(Some(record_incumbent));
    mipb_set_node_callback(Some(record_node));
    assert_eq!(mipb_enable_incumbent_callback(1), 1);
    assert_eq!(mipb_enable_node_callback(1), 1);

    assert_eq!(host.solve().unwrap(), STATUS_OPTIMAL);
    assert!((host.objective() - 20.0).abs() < TOL);
    seen(|p| {
        assert!((p.incumbents.last().copied().unwrap() - 20.0).abs() < TOL);
        assert!(p.incumbents.windows(2).all(|w| w[1] > w[0]));
        // Context reads answer from the paused engine.
        assert!(p.stages.iter().all(|&s| s == STAGE_SOLVING));
        assert!(p.codes.iter().all(|&c| c == 1));
        assert!(!p.nodes.is_empty());
        assert!(p.nodes.windows(2).all(|w| w[1] >= w[0]));
    });

    assert_eq!(mipb_enable_incumbent_callback(0), 1);
    knapsack(&host);
    let before = seen(|p| p.incumbents.len());
    host.solve().unwrap();
    assert_eq!(seen(|p| p.incumbents.len()), before);
}
