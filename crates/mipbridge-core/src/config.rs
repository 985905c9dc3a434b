//! Option structs for model building and solving.
//!
//! Every field has a default so hosts can pass partial JSON objects.

use serde::{Deserialize, Serialize};

use crate::engine::{Engine, EngineResult, VarType};

/// Well-known engine parameter names.
pub mod params {
    pub const TIME_LIMIT: &str = "limits/time";
    pub const GAP_LIMIT: &str = "limits/gap";
    pub const NODE_LIMIT: &str = "limits/nodes";
    pub const FEASTOL: &str = "numerics/feastol";
    pub const MAX_PRICING_ROUNDS: &str = "pricing/maxrounds";
    pub const VERBOSITY: &str = "display/verblevel";
    pub const CHECK_STABILITY: &str = "lp/checkstability";
    pub const NODE_SELECTION: &str = "nodeselection/strategy";
}

/// Variable creation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VarOptions {
    pub lb: f64,
    pub ub: f64,
    pub obj: f64,
    pub var_type: VarType,
    pub initial: bool,
    pub removable: bool,
}

impl Default for VarOptions {
    fn default() -> Self {
        Self {
            lb: 0.0,
            ub: f64::INFINITY,
            obj: 0.0,
            var_type: VarType::Continuous,
            initial: true,
            removable: true,
        }
    }
}

impl VarOptions {
    pub fn bounded(lb: f64, ub: f64, obj: f64) -> Self {
        Self {
            lb,
            ub,
            obj,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, var_type: VarType) -> Self {
        self.var_type = var_type;
        self
    }
}

/// Linear constraint creation options. `lhs <= a·x <= rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsOptions {
    pub lhs: f64,
    pub rhs: f64,
    pub initial: bool,
    pub separate: bool,
    pub enforce: bool,
    pub check: bool,
    pub propagate: bool,
    pub local: bool,
    pub modifiable: bool,
    pub dynamic: bool,
    pub removable: bool,
    pub sticking_at_node: bool,
}

impl Default for ConsOptions {
    fn default() -> Self {
        Self {
            lhs: f64::NEG_INFINITY,
            rhs: f64::INFINITY,
            initial: true,
            separate: true,
            enforce: true,
            check: true,
            propagate: true,
            local: false,
            modifiable: false,
            dynamic: false,
            removable: false,
            sticking_at_node: false,
        }
    }
}

impl ConsOptions {
    pub fn ranged(lhs: f64, rhs: f64) -> Self {
        Self {
            lhs,
            rhs,
            ..Self::default()
        }
    }

    pub fn modifiable(mut self, modifiable: bool) -> Self {
        self.modifiable = modifiable;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricerOptions {
    pub name: String,
    pub description: String,
    pub priority: i32,
    /// Only price after the LP has been solved without pricing at a node.
    pub delay: bool,
}

impl Default for PricerOptions {
    fn default() -> Self {
        Self {
            name: "host_pricer".to_string(),
            description: "host-driven pricer".to_string(),
            priority: 0,
            delay: true,
        }
    }
}

/// Solve limits applied through the engine's parameter table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveSettings {
    pub time_limit: Option<f64>,
    pub gap_limit: Option<f64>,
    pub node_limit: Option<i64>,
    pub max_pricing_rounds: Option<i64>,
}

impl SolveSettings {
    pub fn apply<E: Engine>(&self, engine: &mut E) -> EngineResult<()> {
        if let Some(limit) = self.time_limit {
            engine.set_real_param(params::TIME_LIMIT, limit)?;
        }
        if let Some(gap) = self.gap_limit {
            engine.set_real_param(params::GAP_LIMIT, gap)?;
        }
        if let Some(nodes) = self.node_limit {
            engine.set_int_param(params::NODE_LIMIT, nodes)?;
        }
        if let Some(rounds) = self.max_pricing_rounds {
            engine.set_int_param(params::MAX_PRICING_ROUNDS, rounds)?;
        }
        Ok(())
    }
}
