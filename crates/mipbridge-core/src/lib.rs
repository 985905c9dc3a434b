//! Boundary layer between a mixed-integer optimization engine and a host
//! environment that cannot hold native pointers.
//!
//! The engine itself (branch-and-bound, LP relaxation, presolve) is a black
//! box behind the [`Engine`] trait. This crate owns everything that makes the
//! engine's extension points usable from the host:
//!
//! - [`HandleRegistry`]: stable positive integer handles for native objects,
//!   scoped to a lifetime epoch.
//! - [`Bridge`]: the problem lifecycle controller. It creates and tears down
//!   the engine instance and resets registries and pricing state together.
//! - The pricing callback bridge: a small state machine that runs host pricing
//!   logic synchronously on the engine's stack and hands the host's decisions
//!   back to the engine.
//! - [`EventBridge`]: fan-out of incumbent and node notifications to host
//!   handlers that see the paused engine through a session.
//!
//! # Architecture
//!
//! ```text
//! host ──build model──> Bridge ──Session──> Engine
//!      ──solve────────> Bridge ──SolveHooks──> Engine::solve
//!                                  │
//!                 engine calls back synchronously
//!                                  ▼
//!                    price_redcost / price_farkas / notify
//!                                  │
//!                      host handler(&mut Session)
//! ```
//!
//! There is exactly one logical thread of control. A host handler must run to
//! completion before the engine resumes; the only cancellation mechanism is
//! interrupting the solve.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod pricer;
pub mod pricing;
pub mod registry;
pub mod session;

#[cfg(test)]
mod mock;

pub use bridge::{Bridge, DEFAULT_PROBLEM_NAME};
pub use config::{ConsOptions, PricerOptions, SolveSettings, VarOptions};
pub use engine::{
    Engine, EngineError, EngineEvent, EngineResult, EventKind, LpSolStat, ObjSense, SolveHooks,
    SolveStatus, Stage, VarType,
};
pub use error::{BridgeError, BridgeResult, Sentinel};
pub use events::{EventBridge, IncumbentHandler, NodeHandler, NodeProgress};
pub use pricer::{PricerSlot, PricingHandler};
pub use pricing::{PricerOutcome, PricerResult, PricingMode, PricingState};
pub use registry::{Handle, HandleKind, HandleRegistry, Registries, INVALID_HANDLE};
pub use session::{parse_solution_hint, Session, SolveStats};
