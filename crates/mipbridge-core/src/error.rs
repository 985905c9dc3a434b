//! Error types and boundary sentinels.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::engine::{EngineError, Stage};
use crate::registry::HandleKind;

/// In-band status codes used where a result has to cross the boundary.
///
/// Handle-returning operations use [`Sentinel::Invalid`]; boolean-style
/// operations use [`Sentinel::False`] / [`Sentinel::True`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Sentinel {
    /// Invalid handle, misuse, or no engine instance.
    Invalid = -1,
    /// Operation failed or predicate is false.
    False = 0,
    /// Operation succeeded or predicate is true.
    True = 1,
}

impl Sentinel {
    /// Convert from a raw boundary code.
    pub fn from_raw(code: i32) -> Self {
        match code {
            1 => Sentinel::True,
            0 => Sentinel::False,
            _ => Sentinel::Invalid,
        }
    }

    /// Encode a boolean.
    pub fn from_bool(value: bool) -> Self {
        if value {
            Sentinel::True
        } else {
            Sentinel::False
        }
    }

    /// Check if this code signals success.
    pub fn is_success(&self) -> bool {
        matches!(self, Sentinel::True)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Errors raised by the boundary layer.
///
/// Every variant is non-fatal to the host process. At the exported surface
/// they are folded into [`Sentinel`] values.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No engine instance has been created (or it was destroyed).
    #[error("No engine instance")]
    NoEngine,

    /// The engine has no problem to operate on.
    #[error("No problem has been created")]
    NoProblem,

    /// Stale, out-of-range, zero or negative handle.
    #[error("Invalid {kind} handle {handle}")]
    InvalidHandle { kind: HandleKind, handle: i32 },

    /// Name lookup found nothing.
    #[error("No {kind} named {name}")]
    NotFound { kind: HandleKind, name: String },

    /// Operation attempted in the wrong engine stage.
    #[error("Operation requires stage {expected:?}, engine is in {actual:?}")]
    WrongStage { expected: Stage, actual: Stage },

    /// Farkas pricing or dual queries without a node LP.
    #[error("No current node LP")]
    NoCurrentLp,

    /// Pricing write operation outside a pricing round.
    #[error("Not inside a pricing round")]
    NotPricing,

    /// The pricer plugin has not been included.
    #[error("No pricer included")]
    NoPricer,

    /// The host abandoned the current pricing round.
    #[error("Pricing round aborted")]
    PricingAborted,

    /// Registry or buffer growth failed.
    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// Malformed argument (mismatched batch lengths, unknown result code, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine rejected the operation.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl BridgeError {
    pub(crate) fn invalid_handle(kind: HandleKind, handle: i32) -> Self {
        BridgeError::InvalidHandle { kind, handle }
    }
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
