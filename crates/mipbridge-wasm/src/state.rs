//! Per-thread boundary state.
//!
//! The host sees one lifecycle controller per module instance. It lives in a
//! thread-local `RefCell` and every export borrows it for the duration of one
//! call. A solve keeps it borrowed until the engine returns, so exports made
//! from inside a host pricing or event callback resolve against the session
//! the engine handed to that callback instead. Anything that needs the controller itself
//! (lifecycle, pricer installation, a second solve) finds it busy and returns
//! its failure sentinel.

use std::cell::{Cell, RefCell};
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;

use mipbridge_core::{Bridge, BridgeResult, PricingMode, PricingState, Session};
use mipbridge_engine::BranchPriceEngine;
use tracing::debug;

use crate::callbacks;

pub(crate) type HostBridge = Bridge<BranchPriceEngine>;
pub(crate) type HostSession<'a> = Session<'a, BranchPriceEngine>;

thread_local! {
    static BRIDGE: RefCell<HostBridge> = RefCell::new(new_bridge());
    static ACTIVE_SESSION: Cell<*mut c_void> = const { Cell::new(ptr::null_mut()) };
}

/// Controller with the host trampolines installed. The trampolines look up the
/// host function pointers at call time, so registering a callback never needs
/// the controller.
fn new_bridge() -> HostBridge {
    let mut bridge = Bridge::new();
    bridge.set_redcost_handler(Box::new(|session: &mut HostSession<'_>| {
        callbacks::run_pricing(PricingMode::ReducedCost, session)
    }));
    bridge.set_farkas_handler(Box::new(|session: &mut HostSession<'_>| {
        callbacks::run_pricing(PricingMode::Farkas, session)
    }));
    bridge.set_incumbent_handler(Box::new(callbacks::forward_incumbent));
    bridge.set_node_handler(Box::new(callbacks::forward_node));
    bridge
}

fn ok_or_log<R>(op: &'static str, result: BridgeResult<R>) -> Option<R> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(op, error = %err, "boundary call failed");
            None
        }
    }
}

/// Run `f` on the lifecycle controller. `None` while a solve is in flight.
pub(crate) fn with_bridge<R>(op: &'static str, f: impl FnOnce(&mut HostBridge) -> R) -> Option<R> {
    BRIDGE.with(|cell| match cell.try_borrow_mut() {
        Ok(mut bridge) => Some(f(&mut bridge)),
        Err(_) => {
            debug!(op, "controller busy, call rejected");
            None
        }
    })
}

pub(crate) fn bridge_call<R>(
    op: &'static str,
    f: impl FnOnce(&mut HostBridge) -> BridgeResult<R>,
) -> Option<R> {
    with_bridge(op, f).and_then(|result| ok_or_log(op, result))
}

/// Run `f` on the active callback session, or on a fresh session over the
/// controller when no host callback is running.
pub(crate) fn session_call<R>(
    op: &'static str,
    f: impl FnOnce(&mut HostSession<'_>) -> BridgeResult<R>,
) -> Option<R> {
    let active = ACTIVE_SESSION.with(Cell::get);
    if !active.is_null() {
        // SAFETY: the pointer was taken from a live `&mut Session` by
        // `ActiveSession::enter` and is cleared before that borrow ends. The
        // handler holding the original borrow is suspended in the host
        // callback for as long as the pointer is set.
        let session = unsafe { &mut *active.cast::<HostSession<'_>>() };
        return ok_or_log(op, f(session));
    }
    bridge_call(op, |bridge| bridge.session().and_then(|mut session| f(&mut session)))
}

/// Read the pricing state. Works inside and outside pricing callbacks.
pub(crate) fn pricing_view<R>(f: impl FnOnce(&PricingState) -> R) -> Option<R> {
    let active = ACTIVE_SESSION.with(Cell::get);
    if !active.is_null() {
        // SAFETY: see `session_call`.
        let session = unsafe { &*active.cast::<HostSession<'_>>() };
        return Some(f(session.pricing()));
    }
    BRIDGE.with(|cell| cell.try_borrow().ok().map(|bridge| f(bridge.pricing())))
}

/// Marks a session as the target of boundary calls while a host callback
/// runs. The previous target is restored on drop.
pub(crate) struct ActiveSession<'s> {
    previous: *mut c_void,
    _session: PhantomData<&'s mut ()>,
}

impl<'s> ActiveSession<'s> {
    pub(crate) fn enter(session: &'s mut HostSession<'_>) -> Self {
        let current = (session as *mut HostSession<'_>).cast::<c_void>();
        let previous = ACTIVE_SESSION.with(|cell| cell.replace(current));
        Self {
            previous,
            _session: PhantomData,
        }
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        ACTIVE_SESSION.with(|cell| cell.set(self.previous));
    }
}
