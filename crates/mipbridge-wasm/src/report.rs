//! JSON views and JSON option bags.
//!
//! Hosts that prefer structured data build models from partial JSON option
//! objects (every field has a default) and read results back as one
//! [`SolutionReport`].

use anyhow::{Context, Result};
use mipbridge_core::{
    ConsOptions, Engine, Handle, PricerOptions, PricingMode, PricingState, SolveSettings,
    SolveStats, SolveStatus, VarOptions,
};
use serde::Serialize;

use crate::state::{bridge_call, session_call, HostSession};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableValue {
    pub name: String,
    /// `None` when there is no solution.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingSummary {
    pub rounds: u64,
    pub redcost_calls: u64,
    pub farkas_calls: u64,
    pub added_vars: u64,
    pub last_mode: PricingMode,
    pub last_result_code: i32,
}

impl From<&PricingState> for PricingSummary {
    fn from(pricing: &PricingState) -> Self {
        PricingSummary {
            rounds: pricing.round(),
            redcost_calls: pricing.redcost_calls(),
            farkas_calls: pricing.farkas_calls(),
            added_vars: pricing.added_total(),
            last_mode: pricing.last_mode(),
            last_result_code: pricing.last_result().code(),
        }
    }
}

/// Outcome of the last solve, as returned to JavaScript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionReport {
    pub status: SolveStatus,
    pub status_code: i32,
    pub objective: Option<f64>,
    pub stats: SolveStats,
    pub variables: Vec<VariableValue>,
    pub pricing: PricingSummary,
}

impl SolutionReport {
    fn collect(session: &HostSession<'_>) -> Self {
        let engine = session.engine();
        let variables = engine
            .vars()
            .into_iter()
            .map(|var| VariableValue {
                name: engine.var_name(var).to_string(),
                value: engine.solution_value(var),
            })
            .collect();
        let status = engine.status();
        SolutionReport {
            status,
            status_code: status.code(),
            objective: session.objective(),
            stats: session.stats(),
            variables,
            pricing: PricingSummary::from(session.pricing()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize solution report")
    }
}

pub fn solution_report() -> Result<SolutionReport> {
    session_call("solution_report", |s| Ok(SolutionReport::collect(s)))
        .context("no engine instance to report on")
}

/// One row of the current node LP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LpRowValue {
    pub handle: i32,
    pub name: String,
    pub dual: f64,
    pub farkas: f64,
}

/// Snapshot of the current LP rows in LP order. Only available while
/// solving, typically from inside a pricing callback.
pub fn lp_rows() -> Result<Vec<LpRowValue>> {
    session_call("lp_rows", |s| {
        let n = s.n_lp_rows()?;
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut handles = vec![0; n];
        let written = s.lp_row_handles_into(&mut handles)?;
        handles.truncate(written);
        handles
            .into_iter()
            .map(|handle| {
                Ok(LpRowValue {
                    handle,
                    name: s.row_name(handle)?.to_string(),
                    dual: s.row_dual(handle)?,
                    farkas: s.row_farkas(handle)?,
                })
            })
            .collect()
    })
    .context("no current LP")
}

/// Apply `{"time_limit": .., "gap_limit": .., "node_limit": .., "max_pricing_rounds": ..}`.
pub fn apply_settings_json(json: &str) -> Result<()> {
    let settings: SolveSettings = serde_json::from_str(json).context("Invalid solve settings")?;
    session_call("apply_settings", |s| s.apply_settings(&settings))
        .context("cannot apply solve settings")
}

pub fn add_var_json(name: &str, json: &str) -> Result<i32> {
    let opts: VarOptions = serde_json::from_str(json).context("Invalid variable options")?;
    session_call("add_var", |s| s.add_var(name, &opts))
        .map(Handle::raw)
        .with_context(|| format!("cannot add variable {name}"))
}

pub fn add_cons_json(name: &str, json: &str) -> Result<i32> {
    let opts: ConsOptions = serde_json::from_str(json).context("Invalid constraint options")?;
    session_call("add_cons", |s| s.add_linear_cons(name, &opts))
        .map(Handle::raw)
        .with_context(|| format!("cannot add constraint {name}"))
}

/// Include the pricer from JSON options. Returns whether it was newly
/// included.
pub fn include_pricer_json(json: &str) -> Result<bool> {
    let opts: PricerOptions = serde_json::from_str(json).context("Invalid pricer options")?;
    bridge_call("include_pricer", |bridge| bridge.include_pricer(&opts))
        .context("cannot include pricer")
}
