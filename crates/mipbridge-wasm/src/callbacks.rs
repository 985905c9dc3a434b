//! Host function pointers and the trampolines that call them.

use std::cell::Cell;
use std::thread::LocalKey;

use mipbridge_core::{NodeProgress, PricingMode};
use tracing::trace;

use crate::state::{ActiveSession, HostSession};

/// Host pricing logic for one mode. Reads and writes the round through the
/// exported context and pricer functions.
pub type PricingCallback = extern "C" fn();
/// Receives the objective value of each new incumbent.
pub type IncumbentCallback = extern "C" fn(f64);
/// Receives dual bound, primal bound and node count after each node.
pub type NodeCallback = extern "C" fn(f64, f64, f64);

type Slot<T> = LocalKey<Cell<Option<T>>>;

thread_local! {
    static REDCOST: Cell<Option<PricingCallback>> = const { Cell::new(None) };
    static FARKAS: Cell<Option<PricingCallback>> = const { Cell::new(None) };
    static INCUMBENT: Cell<Option<IncumbentCallback>> = const { Cell::new(None) };
    static NODE: Cell<Option<NodeCallback>> = const { Cell::new(None) };
}

fn pricing_slot(mode: PricingMode) -> Option<&'static Slot<PricingCallback>> {
    match mode {
        PricingMode::ReducedCost => Some(&REDCOST),
        PricingMode::Farkas => Some(&FARKAS),
        PricingMode::None => None,
    }
}

pub(crate) fn set_pricing_callback(mode: PricingMode, callback: Option<PricingCallback>) {
    if let Some(slot) = pricing_slot(mode) {
        slot.with(|cell| cell.set(callback));
    }
}

pub(crate) fn set_incumbent_callback(callback: Option<IncumbentCallback>) {
    INCUMBENT.with(|cell| cell.set(callback));
}

pub(crate) fn set_node_callback(callback: Option<NodeCallback>) {
    NODE.with(|cell| cell.set(callback));
}

/// Pricing handler installed on the controller. Without a registered host
/// function the round keeps its default outcome.
pub(crate) fn run_pricing(mode: PricingMode, session: &mut HostSession<'_>) {
    let Some(callback) = pricing_slot(mode).and_then(|slot| slot.with(Cell::get)) else {
        trace!(?mode, "no host pricing function registered");
        return;
    };
    let _active = ActiveSession::enter(session);
    callback();
}

/// Incumbent handler installed on the controller. The session stays active
/// while the host function runs, so context reads see the solving engine.
pub(crate) fn forward_incumbent(session: &mut HostSession<'_>, objective: f64) {
    if let Some(callback) = INCUMBENT.with(Cell::get) {
        let _active = ActiveSession::enter(session);
        callback(objective);
    }
}

pub(crate) fn forward_node(session: &mut HostSession<'_>, progress: NodeProgress) {
    if let Some(callback) = NODE.with(Cell::get) {
        let _active = ActiveSession::enter(session);
        callback(
            progress.dual_bound,
            progress.primal_bound,
            progress.nodes as f64,
        );
    }
}
