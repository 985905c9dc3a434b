//! Problem lifecycle controller.
//!
//! [`Bridge`] owns the (optional) engine instance together with the handle
//! registries, the pricing state, the pricer slot and the event bridge. Every
//! path that ends a problem goes through one teardown routine, so no registry
//! entry or pricing field survives into the next problem.

use tracing::{debug, info, warn};

use crate::config::PricerOptions;
use crate::engine::{Engine, EventKind, ObjSense, SolveStatus, Stage};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{EventBridge, IncumbentHandler, NodeHandler};
use crate::pricer::{Dispatcher, PricerSlot, PricingHandler};
use crate::pricing::{PricingMode, PricingState};
use crate::registry::Registries;
use crate::session::Session;

/// Name used when the host begins a problem without one.
pub const DEFAULT_PROBLEM_NAME: &str = "problem";

pub struct Bridge<E: Engine> {
    engine: Option<E>,
    registries: Registries<E>,
    pricing: PricingState,
    pricer: PricerSlot<E>,
    events: EventBridge<E>,
}

impl<E: Engine> Default for Bridge<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> Bridge<E> {
    pub fn new() -> Self {
        Self {
            engine: None,
            registries: Registries::new(),
            pricing: PricingState::new(),
            pricer: PricerSlot::default(),
            events: EventBridge::new(),
        }
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn pricing(&self) -> &PricingState {
        &self.pricing
    }

    pub fn registries(&self) -> &Registries<E> {
        &self.registries
    }

    pub fn pricer(&self) -> &PricerSlot<E> {
        &self.pricer
    }

    pub fn events(&self) -> &EventBridge<E> {
        &self.events
    }

    fn engine_mut(&mut self) -> BridgeResult<&mut E> {
        self.engine.as_mut().ok_or(BridgeError::NoEngine)
    }

    /// Install `engine` as the instance. Returns `false` without touching
    /// anything if an instance already exists.
    pub fn create_engine_with(&mut self, mut engine: E) -> BridgeResult<bool> {
        if self.engine.is_some() {
            return Ok(false);
        }
        engine.include_default_plugins()?;
        engine.catch_event(EventKind::BestSolutionFound)?;
        self.events.mark_installed();
        self.events.mark_subscribed(EventKind::BestSolutionFound);
        if self.events.node_enabled() {
            engine.catch_event(EventKind::NodeProcessed)?;
            self.events.mark_subscribed(EventKind::NodeProcessed);
        }
        self.engine = Some(engine);
        info!("engine created");
        Ok(true)
    }

    pub fn create_engine(&mut self) -> BridgeResult<bool>
    where
        E: Default,
    {
        if self.engine.is_some() {
            return Ok(false);
        }
        self.create_engine_with(E::default())
    }

    /// Tear down the current problem and release the engine. No-op without
    /// an engine.
    pub fn destroy_engine(&mut self) -> BridgeResult<()> {
        if self.engine.is_none() {
            return Ok(());
        }
        let result = self.teardown();
        self.engine = None;
        self.events.detach();
        info!("engine destroyed");
        result
    }

    /// Free the current problem and reset every registry and the pricing
    /// state.
    pub fn clear_problem(&mut self) -> BridgeResult<()> {
        if self.engine.is_none() {
            return Err(BridgeError::NoEngine);
        }
        self.teardown()
    }

    /// Like [`clear_problem`](Self::clear_problem), but also valid without an
    /// engine, in which case only the bridge state is reset.
    pub fn reset(&mut self) -> BridgeResult<()> {
        self.teardown()
    }

    /// Start a new problem, discarding the previous one.
    pub fn begin_problem(&mut self, name: &str, maximize: bool) -> BridgeResult<()> {
        if self.engine.is_none() {
            return Err(BridgeError::NoEngine);
        }
        self.teardown()?;
        let name = if name.is_empty() {
            DEFAULT_PROBLEM_NAME
        } else {
            name
        };
        let engine = self.engine_mut()?;
        engine.create_problem(name)?;
        engine.set_objective_sense(ObjSense::from_maximize(maximize))?;
        info!(name, maximize, "problem started");
        Ok(())
    }

    /// Shared teardown. Bridge state is reset even when freeing engine data
    /// fails; the first engine error is returned.
    fn teardown(&mut self) -> BridgeResult<()> {
        let mut result = Ok(());
        if let Some(engine) = self.engine.as_mut() {
            if engine.stage() > Stage::Problem {
                result = engine.free_transform();
            }
            if engine.stage() >= Stage::Problem {
                let freed = engine.free_problem();
                result = result.and(freed);
            }
        }
        self.pricing.reset();
        self.registries.clear();
        self.pricer.reset();
        debug!(epoch = self.registries.vars.epoch(), "bridge state reset");
        result.map_err(|err| {
            warn!(error = %err, "engine teardown failed");
            BridgeError::from(err)
        })
    }

    /// Borrow the engine through handle-based accessors.
    pub fn session(&mut self) -> BridgeResult<Session<'_, E>> {
        let engine = self.engine.as_mut().ok_or(BridgeError::NoEngine)?;
        Ok(Session::new(engine, &mut self.registries, &mut self.pricing))
    }

    // ---- pricer plugin ----

    /// Install the pricer plugin. Returns `false` if it was already installed.
    pub fn include_pricer(&mut self, opts: &PricerOptions) -> BridgeResult<bool> {
        if self.pricer.is_installed() {
            return Ok(false);
        }
        self.engine_mut()?.include_pricer(opts)?;
        self.pricer.mark_installed();
        info!(name = %opts.name, priority = opts.priority, "pricer included");
        Ok(true)
    }

    pub fn activate_pricer(&mut self) -> BridgeResult<()> {
        if !self.pricer.is_installed() {
            return Err(BridgeError::NoPricer);
        }
        self.engine_mut()?.activate_pricer()?;
        Ok(())
    }

    pub fn deactivate_pricer(&mut self) -> BridgeResult<()> {
        if !self.pricer.is_installed() {
            return Err(BridgeError::NoPricer);
        }
        self.engine_mut()?.deactivate_pricer()?;
        Ok(())
    }

    pub fn set_redcost_handler(&mut self, handler: PricingHandler<E>) {
        self.pricer.set_handler(PricingMode::ReducedCost, handler);
    }

    pub fn set_farkas_handler(&mut self, handler: PricingHandler<E>) {
        self.pricer.set_handler(PricingMode::Farkas, handler);
    }

    pub fn enable_redcost(&mut self, enabled: bool) {
        self.pricer.enable(PricingMode::ReducedCost, enabled);
    }

    pub fn enable_farkas(&mut self, enabled: bool) {
        self.pricer.enable(PricingMode::Farkas, enabled);
    }

    // ---- events ----

    pub fn set_incumbent_handler(&mut self, handler: IncumbentHandler<E>) {
        self.events.set_incumbent_handler(handler);
    }

    pub fn set_node_handler(&mut self, handler: NodeHandler<E>) {
        self.events.set_node_handler(handler);
    }

    pub fn enable_incumbent_events(&mut self, enabled: bool) {
        self.events.enable_incumbent(enabled);
    }

    /// Toggle node notifications. The engine subscription is made the first
    /// time they are enabled on an instance.
    pub fn enable_node_events(&mut self, enabled: bool) -> BridgeResult<()> {
        self.events.enable_node(enabled);
        if enabled && !self.events.node_subscribed() {
            if let Some(engine) = self.engine.as_mut() {
                engine.catch_event(EventKind::NodeProcessed)?;
                self.events.mark_subscribed(EventKind::NodeProcessed);
            }
        }
        Ok(())
    }

    // ---- solving ----

    /// Run the engine to completion, dispatching pricing rounds and events
    /// to the host handlers on the way.
    pub fn solve(&mut self) -> BridgeResult<SolveStatus> {
        let Bridge {
            engine,
            registries,
            pricing,
            pricer,
            events,
        } = self;
        let engine = engine.as_mut().ok_or(BridgeError::NoEngine)?;
        if engine.stage() < Stage::Problem {
            return Err(BridgeError::NoProblem);
        }

        pricing.prepare_solve();
        let mut dispatcher = Dispatcher {
            registries,
            pricing,
            pricer,
            events,
        };
        info!("solve started");
        engine.solve(&mut dispatcher)?;

        let status = engine.status();
        info!(
            ?status,
            objective = ?engine.best_objective(),
            rounds = dispatcher.pricing.round(),
            "solve finished"
        );
        Ok(status)
    }
}
