//! Pricing callback bridge.
//!
//! [`Dispatcher`] is what the engine sees as its [`SolveHooks`] during a
//! solve. Each pricing invocation runs the state machine in
//! [`PricingState`], calls the host handler for that mode (if one is enabled)
//! with a [`Session`] over the suspended engine, and converts the pending
//! fields into the engine's [`PricerOutcome`].

use tracing::{debug, warn};

use crate::engine::{Engine, EngineEvent, SolveHooks};
use crate::events::EventBridge;
use crate::pricing::{PricerOutcome, PricingMode, PricingState};
use crate::registry::Registries;
use crate::session::Session;

/// Host pricing logic. Runs to completion before the engine resumes.
pub type PricingHandler<E> = Box<dyn FnMut(&mut Session<'_, E>)>;

/// Installation state of the pricer plugin and its host handlers.
pub struct PricerSlot<E: Engine> {
    installed: bool,
    redcost_enabled: bool,
    farkas_enabled: bool,
    redcost: Option<PricingHandler<E>>,
    farkas: Option<PricingHandler<E>>,
}

impl<E: Engine> Default for PricerSlot<E> {
    fn default() -> Self {
        Self {
            installed: false,
            redcost_enabled: false,
            farkas_enabled: false,
            redcost: None,
            farkas: None,
        }
    }
}

impl<E: Engine> PricerSlot<E> {
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub(crate) fn mark_installed(&mut self) {
        self.installed = true;
    }

    pub fn redcost_enabled(&self) -> bool {
        self.redcost_enabled
    }

    pub fn farkas_enabled(&self) -> bool {
        self.farkas_enabled
    }

    pub(crate) fn enable(&mut self, mode: PricingMode, enabled: bool) {
        match mode {
            PricingMode::ReducedCost => self.redcost_enabled = enabled,
            PricingMode::Farkas => self.farkas_enabled = enabled,
            PricingMode::None => {}
        }
    }

    pub(crate) fn set_handler(&mut self, mode: PricingMode, handler: PricingHandler<E>) {
        match mode {
            PricingMode::ReducedCost => self.redcost = Some(handler),
            PricingMode::Farkas => self.farkas = Some(handler),
            PricingMode::None => {}
        }
    }

    /// Forget the plugin and switch both callbacks off. Handlers stay set so
    /// the host only has to re-enable them.
    pub(crate) fn reset(&mut self) {
        self.installed = false;
        self.redcost_enabled = false;
        self.farkas_enabled = false;
    }

    fn handler(&mut self, mode: PricingMode) -> Option<&mut PricingHandler<E>> {
        match mode {
            PricingMode::ReducedCost if self.redcost_enabled => self.redcost.as_mut(),
            PricingMode::Farkas if self.farkas_enabled => self.farkas.as_mut(),
            _ => None,
        }
    }
}

/// Solve hooks wired to the bridge's state for the duration of one solve.
pub(crate) struct Dispatcher<'a, E: Engine> {
    pub registries: &'a mut Registries<E>,
    pub pricing: &'a mut PricingState,
    pub pricer: &'a mut PricerSlot<E>,
    pub events: &'a mut EventBridge<E>,
}

impl<E: Engine> Dispatcher<'_, E> {
    fn run_round(&mut self, engine: &mut E, mode: PricingMode) -> PricerOutcome {
        self.pricing.begin_round(mode);
        let round = self.pricing.round();
        debug!(round, ?mode, "pricing round started");

        if mode == PricingMode::Farkas && !engine.has_current_node_lp() {
            self.pricing.short_circuit();
        } else if let Some(handler) = self.pricer.handler(mode) {
            let mut session = Session::new(engine, self.registries, self.pricing);
            handler(&mut session);
        }

        let aborted = self.pricing.abort_requested();
        let outcome = self.pricing.finish_round();
        if aborted {
            warn!(round, ?mode, "pricing round aborted, interrupting solve");
            engine.interrupt_solve();
        }
        debug!(
            round,
            result = ?outcome.result,
            added = self.pricing.added_this_call(),
            "pricing round finished"
        );
        outcome
    }
}

impl<E: Engine> SolveHooks<E> for Dispatcher<'_, E> {
    fn price_redcost(&mut self, engine: &mut E) -> PricerOutcome {
        self.run_round(engine, PricingMode::ReducedCost)
    }

    fn price_farkas(&mut self, engine: &mut E) -> PricerOutcome {
        self.run_round(engine, PricingMode::Farkas)
    }

    fn notify(&mut self, engine: &mut E, event: &EngineEvent) {
        let mut session = Session::new(engine, self.registries, self.pricing);
        self.events.dispatch(&mut session, event);
    }
}
