//! Event bridge: forwards incumbent and node notifications to host handlers.
//!
//! Handlers receive a [`Session`] over the solving engine, so they can read
//! the stage, statistics and the current node LP while the solve is paused.

use tracing::trace;

use crate::engine::{Engine, EngineEvent, EventKind};
use crate::session::Session;

/// Bounds and node count reported after a node has been processed.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct NodeProgress {
    pub dual_bound: f64,
    pub primal_bound: f64,
    pub nodes: u64,
}

pub type IncumbentHandler<E> = Box<dyn FnMut(&mut Session<'_, E>, f64)>;
pub type NodeHandler<E> = Box<dyn FnMut(&mut Session<'_, E>, NodeProgress)>;

/// Host handlers for engine events, each gated by its own enable flag.
pub struct EventBridge<E: Engine> {
    incumbent_enabled: bool,
    node_enabled: bool,
    on_incumbent: Option<IncumbentHandler<E>>,
    on_node: Option<NodeHandler<E>>,
    installed: bool,
    node_subscribed: bool,
}

impl<E: Engine> Default for EventBridge<E> {
    fn default() -> Self {
        Self {
            incumbent_enabled: false,
            node_enabled: false,
            on_incumbent: None,
            on_node: None,
            installed: false,
            node_subscribed: false,
        }
    }
}

impl<E: Engine> EventBridge<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_incumbent_handler(&mut self, handler: IncumbentHandler<E>) {
        self.on_incumbent = Some(handler);
    }

    pub fn set_node_handler(&mut self, handler: NodeHandler<E>) {
        self.on_node = Some(handler);
    }

    pub fn enable_incumbent(&mut self, enabled: bool) {
        self.incumbent_enabled = enabled;
    }

    pub fn enable_node(&mut self, enabled: bool) {
        self.node_enabled = enabled;
    }

    pub fn incumbent_enabled(&self) -> bool {
        self.incumbent_enabled
    }

    pub fn node_enabled(&self) -> bool {
        self.node_enabled
    }

    /// Whether the handler has been installed on an engine instance.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    pub(crate) fn mark_installed(&mut self) {
        self.installed = true;
    }

    pub(crate) fn mark_subscribed(&mut self, kind: EventKind) {
        if kind == EventKind::NodeProcessed {
            self.node_subscribed = true;
        }
    }

    pub(crate) fn node_subscribed(&self) -> bool {
        self.node_subscribed
    }

    /// Forget the engine instance the handler was installed on.
    pub(crate) fn detach(&mut self) {
        self.installed = false;
        self.node_subscribed = false;
    }

    /// Forward an event if its flag is on and a handler is set. Returns
    /// whether a handler ran.
    pub fn dispatch(&mut self, session: &mut Session<'_, E>, event: &EngineEvent) -> bool {
        match *event {
            EngineEvent::BestSolutionFound { objective } => {
                if !self.incumbent_enabled {
                    return false;
                }
                match self.on_incumbent.as_mut() {
                    Some(handler) => {
                        trace!(objective, "incumbent event");
                        handler(session, objective);
                        true
                    }
                    None => false,
                }
            }
            EngineEvent::NodeProcessed {
                dual_bound,
                primal_bound,
                nodes,
            } => {
                if !self.node_enabled {
                    return false;
                }
                match self.on_node.as_mut() {
                    Some(handler) => {
                        handler(
                            session,
                            NodeProgress {
                                dual_bound,
                                primal_bound,
                                nodes,
                            },
                        );
                        true
                    }
                    None => false,
                }
            }
        }
    }
}
