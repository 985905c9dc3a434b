//! LP-based branch-and-price engine behind the [`mipbridge_core::Engine`]
//! contract.
//!
//! [`BranchPriceEngine`] keeps the model in plain arenas ([`model`]), solves
//! node relaxations with Clarabel ([`lp`]) and explores the
//! tree depth-first or best-first ([`search`]). A pricer, when active, is
//! consulted after every node LP through the solve hooks, exactly like an
//! external pricer plugin would be.

pub mod lp;
pub mod model;
pub mod params;
mod search;
pub mod writer;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::{debug, info, trace};
use web_time::Instant;

use mipbridge_core::{
    ConsOptions, Engine, EngineError, EngineResult, EventKind, LpSolStat, ObjSense, PricerOptions,
    SolveHooks, SolveStatus, Stage, VarOptions,
};

use crate::model::{ConsData, ConsId, Model, RowId, VarData, VarId};
use crate::params::Params;
use crate::lp::{LpSolution, LpStatus};
use crate::writer::{LpWriter, WriteOptions};

pub use crate::params::NodeSelection;

/// Best primal point found so far, in internal (minimization) form.
#[derive(Debug, Clone)]
pub(crate) struct Incumbent {
    pub objective: f64,
    /// Indexed by variable arena position.
    pub values: Vec<f64>,
}

/// Relaxation of the node currently being processed.
#[derive(Debug, Clone)]
pub(crate) struct NodeLp {
    pub solution: LpSolution,
    /// Arena index of the first LP column.
    pub col_offset: usize,
}

impl NodeLp {
    fn solstat(&self) -> LpSolStat {
        match self.solution.status {
            LpStatus::Optimal => LpSolStat::Optimal,
            LpStatus::Infeasible => LpSolStat::Infeasible,
            LpStatus::Unbounded => LpSolStat::UnboundedRay,
            LpStatus::NotConverged => LpSolStat::IterLimit,
        }
    }
}

#[derive(Debug)]
pub struct BranchPriceEngine {
    stage: Stage,
    model: Model,
    sense: ObjSense,
    params: Params,
    /// Objective limit in external form.
    cutoff: Option<f64>,
    pricer: Option<PricerOptions>,
    pricer_active: bool,
    plugins_included: bool,
    subscribed: Vec<EventKind>,
    /// Points offered before transformation, checked when solving starts.
    pending_hints: Vec<Vec<(VarId, f64)>>,
    interrupted: bool,
    status: SolveStatus,
    incumbent: Option<Incumbent>,
    node_lp: Option<NodeLp>,
    lp_rows: Vec<RowId>,
    /// Bumped whenever columns or coefficients change during solving.
    revision: u64,
    nodes: u64,
    started: Option<Instant>,
    solving_time: f64,
    /// Internal form.
    dual_bound: f64,
}

impl Default for BranchPriceEngine {
    fn default() -> Self {
        Self {
            stage: Stage::Init,
            model: Model::default(),
            sense: ObjSense::Minimize,
            params: Params::default(),
            cutoff: None,
            pricer: None,
            pricer_active: false,
            plugins_included: false,
            subscribed: Vec::new(),
            pending_hints: Vec::new(),
            interrupted: false,
            status: SolveStatus::Unknown,
            incumbent: None,
            node_lp: None,
            lp_rows: Vec::new(),
            revision: 0,
            nodes: 0,
            started: None,
            solving_time: 0.0,
            dual_bound: f64::NEG_INFINITY,
        }
    }
}

impl BranchPriceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn plugins_included(&self) -> bool {
        self.plugins_included
    }

    fn sign(&self) -> f64 {
        match self.sense {
            ObjSense::Minimize => 1.0,
            ObjSense::Maximize => -1.0,
        }
    }

    /// Convert between internal and external objective values.
    fn external(&self, value: f64) -> f64 {
        self.sign() * value
    }

    fn require(&self, operation: &'static str, stages: &[Stage]) -> EngineResult<()> {
        if stages.contains(&self.stage) {
            Ok(())
        } else {
            Err(EngineError::stage(operation, self.stage))
        }
    }

    fn require_problem(&self, operation: &'static str) -> EngineResult<()> {
        if self.stage >= Stage::Problem {
            Ok(())
        } else {
            Err(EngineError::stage(operation, self.stage))
        }
    }

    fn var_data(&self, var: VarId) -> EngineResult<&VarData> {
        self.model
            .var(var)
            .ok_or_else(|| EngineError::UnknownObject(format!("variable {}", var.0)))
    }

    fn cons_data(&self, cons: ConsId) -> EngineResult<&ConsData> {
        self.model
            .cons(cons)
            .ok_or_else(|| EngineError::UnknownObject(format!("constraint {}", cons.0)))
    }

    fn clear_solving_data(&mut self) {
        self.interrupted = false;
        self.status = SolveStatus::Unknown;
        self.incumbent = None;
        self.node_lp = None;
        self.lp_rows.clear();
        self.revision = 0;
        self.nodes = 0;
        self.started = None;
        self.solving_time = 0.0;
        self.dual_bound = f64::NEG_INFINITY;
    }

    pub(crate) fn is_subscribed(&self, kind: EventKind) -> bool {
        self.subscribed.contains(&kind)
    }

    pub(crate) fn elapsed(&self) -> f64 {
        match self.started {
            Some(start) if self.stage == Stage::Solving => start.elapsed().as_secs_f64(),
            _ => self.solving_time,
        }
    }

    /// Threshold a node bound must stay below to be worth exploring.
    pub(crate) fn prune_threshold(&self) -> f64 {
        let incumbent = self
            .incumbent
            .as_ref()
            .map_or(f64::INFINITY, |inc| inc.objective);
        let cutoff = self
            .cutoff
            .map_or(f64::INFINITY, |limit| self.sign() * limit);
        incumbent.min(cutoff)
    }

    /// Complete a partial point: unlisted variables sit at zero, clamped
    /// into their bounds.
    fn complete_point(&self, values: &[(VarId, f64)]) -> Vec<f64> {
        let mut point: Vec<f64> = self
            .model
            .vars
            .iter()
            .map(|v| 0.0_f64.max(v.lb).min(v.ub))
            .collect();
        for &(var, value) in values {
            let active = self.model.active_var(var).index();
            if let Some(slot) = point.get_mut(active) {
                *slot = value;
            }
        }
        point
    }

    /// Feasibility of a full point over the active problem.
    fn is_feasible(&self, point: &[f64]) -> bool {
        let tol = self.params.feastol;
        let vars_ok = self.model.lp_vars().all(|i| {
            let var = &self.model.vars[i];
            let value = point[i];
            value >= var.lb - tol
                && value <= var.ub + tol
                && (!var.var_type.is_integral() || (value - value.round()).abs() <= tol)
        });
        vars_ok
            && self.model.lp_conss().all(|i| {
                let cons = &self.model.conss[i];
                let activity = cons.activity(point);
                activity >= cons.opts.lhs - tol && activity <= cons.opts.rhs + tol
            })
    }

    pub(crate) fn internal_objective(&self, point: &[f64]) -> f64 {
        self.model
            .lp_vars()
            .map(|i| self.sign() * self.model.vars[i].obj * point[i])
            .sum()
    }

    /// Store `point` if it improves on the incumbent and respects the
    /// objective limit.
    pub(crate) fn offer_incumbent(&mut self, point: Vec<f64>) -> bool {
        let objective = self.internal_objective(&point);
        if objective >= self.prune_threshold() - 1e-9 {
            return false;
        }
        debug!(objective = self.external(objective), "new incumbent");
        self.incumbent = Some(Incumbent {
            objective,
            values: point,
        });
        true
    }

    /// Check points offered before transformation.
    pub(crate) fn check_pending_hints(&mut self) -> bool {
        let hints = std::mem::take(&mut self.pending_hints);
        let mut improved = false;
        for hint in hints {
            let point = self.complete_point(&hint);
            if self.is_feasible(&point) {
                improved |= self.offer_incumbent(point);
            }
        }
        improved
    }

    fn writer(&self, options: WriteOptions) -> LpWriter<'_> {
        LpWriter::new(&self.model, self.sense, options)
    }

    fn write_to(&self, path: &Path, options: WriteOptions) -> EngineResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.writer(options).write(&mut out)?;
        info!(path = %path.display(), "problem written");
        Ok(())
    }
}

impl Engine for BranchPriceEngine {
    type Var = VarId;
    type Cons = ConsId;
    type Row = RowId;

    fn include_default_plugins(&mut self) -> EngineResult<()> {
        self.plugins_included = true;
        Ok(())
    }

    fn catch_event(&mut self, kind: EventKind) -> EngineResult<()> {
        if !self.subscribed.contains(&kind) {
            self.subscribed.push(kind);
        }
        Ok(())
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn create_problem(&mut self, name: &str) -> EngineResult<()> {
        self.require("create a problem", &[Stage::Init])?;
        self.model = Model::new(name);
        self.sense = ObjSense::Minimize;
        self.stage = Stage::Problem;
        debug!(name, "problem created");
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: ObjSense) -> EngineResult<()> {
        self.require("set the objective sense", &[Stage::Problem])?;
        self.sense = sense;
        Ok(())
    }

    fn free_transform(&mut self) -> EngineResult<()> {
        if self.stage <= Stage::Problem {
            return self.require_problem("free the transformed problem");
        }
        self.model.free_transform();
        self.clear_solving_data();
        self.stage = Stage::Problem;
        Ok(())
    }

    fn free_problem(&mut self) -> EngineResult<()> {
        self.require_problem("free the problem")?;
        self.model = Model::default();
        self.clear_solving_data();
        self.pending_hints.clear();
        self.sense = ObjSense::Minimize;
        self.cutoff = None;
        self.pricer_active = false;
        self.stage = Stage::Init;
        Ok(())
    }

    fn create_var(&mut self, name: &str, opts: &VarOptions) -> EngineResult<VarId> {
        self.require("create a variable", &[Stage::Problem])?;
        if self.model.var_name_taken(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(self.model.push_var(VarData::new(name, opts, false)))
    }

    fn create_linear_cons(&mut self, name: &str, opts: &ConsOptions) -> EngineResult<ConsId> {
        self.require("create a constraint", &[Stage::Problem])?;
        if self.model.cons_name_taken(name) {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(self.model.push_cons(ConsData {
            name: name.to_string(),
            opts: opts.clone(),
            coefs: Vec::new(),
            transformed: false,
            twin: None,
        }))
    }

    fn add_coef_linear(&mut self, cons: ConsId, var: VarId, val: f64) -> EngineResult<()> {
        self.require("add a coefficient", &[Stage::Problem, Stage::Solving])?;
        self.var_data(var)?;
        self.cons_data(cons)?;
        let (cons, var) = (self.model.active_cons(cons), self.model.active_var(var));
        if let Some(data) = self.model.conss.get_mut(cons.index()) {
            match data.coefs.iter_mut().find(|(v, _)| *v == var) {
                Some((_, coef)) => *coef += val,
                None => data.coefs.push((var, val)),
            }
        }
        if self.stage == Stage::Solving {
            self.revision += 1;
        }
        Ok(())
    }

    fn set_cons_modifiable(&mut self, cons: ConsId, modifiable: bool) -> EngineResult<()> {
        self.require_problem("change constraint flags")?;
        self.cons_data(cons)?;
        let active = self.model.active_cons(cons);
        for id in [cons, active] {
            if let Some(data) = self.model.conss.get_mut(id.index()) {
                data.opts.modifiable = modifiable;
            }
        }
        Ok(())
    }

    fn find_var(&self, name: &str) -> Option<VarId> {
        self.model.find_var(name)
    }

    fn find_cons(&self, name: &str) -> Option<ConsId> {
        self.model.find_cons(name)
    }

    fn is_transformed(&self) -> bool {
        self.model.transformed
    }

    fn var_is_transformed(&self, var: VarId) -> bool {
        self.model.var(var).is_some_and(|v| v.transformed)
    }

    fn var_is_initial(&self, var: VarId) -> bool {
        self.model.var(var).is_some_and(|v| v.initial)
    }

    fn var_is_removable(&self, var: VarId) -> bool {
        self.model.var(var).is_some_and(|v| v.removable)
    }

    fn cons_is_transformed(&self, cons: ConsId) -> bool {
        self.model.cons(cons).is_some_and(|c| c.transformed)
    }

    fn transformed_var(&self, var: VarId) -> Option<VarId> {
        let data = self.model.var(var)?;
        if data.transformed {
            Some(var)
        } else {
            data.twin
        }
    }

    fn transformed_cons(&self, cons: ConsId) -> Option<ConsId> {
        let data = self.model.cons(cons)?;
        if data.transformed {
            Some(cons)
        } else {
            data.twin
        }
    }

    fn cons_row(&self, cons: ConsId) -> Option<RowId> {
        if !self.is_lp_constructed() {
            return None;
        }
        self.model
            .row_of(cons)
            .filter(|row| row.index() < self.lp_rows.len())
    }

    fn vars(&self) -> Vec<VarId> {
        let n = if self.model.transformed {
            self.model.n_orig_vars
        } else {
            self.model.vars.len()
        };
        (0..n as u32).map(VarId).collect()
    }

    fn var_name(&self, var: VarId) -> &str {
        self.model.var(var).map_or("", |v| v.name.as_str())
    }

    fn set_int_param(&mut self, name: &str, value: i64) -> EngineResult<()> {
        self.params.set_int(name, value)
    }

    fn set_real_param(&mut self, name: &str, value: f64) -> EngineResult<()> {
        self.params.set_real(name, value)
    }

    fn set_bool_param(&mut self, name: &str, value: bool) -> EngineResult<()> {
        self.params.set_bool(name, value)
    }

    fn set_string_param(&mut self, name: &str, value: &str) -> EngineResult<()> {
        self.params.set_string(name, value)
    }

    fn set_objective_limit(&mut self, limit: f64) -> EngineResult<()> {
        self.require_problem("set the objective limit")?;
        self.cutoff = Some(limit);
        Ok(())
    }

    fn solve(&mut self, hooks: &mut dyn SolveHooks<Self>) -> EngineResult<()> {
        match self.stage {
            Stage::Problem => {}
            Stage::Solved => return Ok(()),
            stage => return Err(EngineError::stage("solve", stage)),
        }
        self.model.transform();
        self.clear_solving_data();
        self.stage = Stage::Solving;
        self.started = Some(Instant::now());
        info!(
            vars = self.model.n_orig_vars,
            conss = self.model.n_orig_conss,
            pricer = self.pricer_active,
            "solve started"
        );

        let result = self.run_search(hooks);

        self.solving_time = self.elapsed();
        self.node_lp = None;
        self.lp_rows.clear();
        self.stage = Stage::Solved;
        self.status = result?;
        info!(
            status = ?self.status,
            nodes = self.nodes,
            time = self.solving_time,
            "solve finished"
        );
        Ok(())
    }

    fn interrupt_solve(&mut self) {
        if self.stage == Stage::Solving {
            debug!("solve interrupted");
        }
        self.interrupted = true;
    }

    fn status(&self) -> SolveStatus {
        self.status
    }

    fn try_solution(&mut self, values: &[(VarId, f64)]) -> EngineResult<bool> {
        self.require_problem("add a solution")?;
        for &(var, _) in values {
            self.var_data(var)?;
        }
        if !self.model.transformed {
            self.pending_hints.push(values.to_vec());
            return Ok(true);
        }
        let point = self.complete_point(values);
        if !self.is_feasible(&point) {
            trace!("offered point is infeasible");
            return Ok(false);
        }
        Ok(self.offer_incumbent(point))
    }

    fn best_objective(&self) -> Option<f64> {
        self.incumbent
            .as_ref()
            .map(|inc| self.external(inc.objective))
    }

    fn solution_value(&self, var: VarId) -> Option<f64> {
        let incumbent = self.incumbent.as_ref()?;
        self.model.var(var)?;
        let active = self.model.active_var(var).index();
        Some(incumbent.values.get(active).copied().unwrap_or(0.0))
    }

    fn solving_time(&self) -> f64 {
        self.elapsed()
    }

    fn n_nodes(&self) -> u64 {
        self.nodes
    }

    fn gap(&self) -> f64 {
        let (primal, dual) = (self.primal_bound(), self.dual_bound());
        if primal.is_infinite() || dual.is_infinite() {
            return f64::INFINITY;
        }
        if (primal - dual).abs() <= 1e-9 {
            return 0.0;
        }
        let denom = primal.abs().min(dual.abs());
        if primal * dual < 0.0 || denom <= 1e-9 {
            return f64::INFINITY;
        }
        (primal - dual).abs() / denom
    }

    fn dual_bound(&self) -> f64 {
        self.external(self.dual_bound)
    }

    fn primal_bound(&self) -> f64 {
        let internal = self
            .incumbent
            .as_ref()
            .map_or(f64::INFINITY, |inc| inc.objective);
        self.external(internal)
    }

    fn has_current_node_lp(&self) -> bool {
        self.stage == Stage::Solving && self.node_lp.is_some()
    }

    fn is_lp_constructed(&self) -> bool {
        self.has_current_node_lp()
    }

    fn lp_solstat(&self) -> LpSolStat {
        match &self.node_lp {
            Some(lp) if self.stage == Stage::Solving => lp.solstat(),
            _ => LpSolStat::NotSolved,
        }
    }

    fn lp_rows(&self) -> &[RowId] {
        &self.lp_rows
    }

    fn var_lp_value(&self, var: VarId) -> f64 {
        self.lp_column(var, |sol| &sol.x)
    }

    fn var_redcost(&self, var: VarId) -> f64 {
        self.lp_column(var, |sol| &sol.redcosts)
    }

    fn row_dual(&self, row: RowId) -> f64 {
        self.lp_row(row, |sol| &sol.duals)
    }

    fn row_farkas(&self, row: RowId) -> f64 {
        self.lp_row(row, |sol| &sol.farkas)
    }

    fn row_lhs(&self, row: RowId) -> f64 {
        self.model
            .row_cons(row)
            .map_or(f64::NEG_INFINITY, |c| c.opts.lhs)
    }

    fn row_rhs(&self, row: RowId) -> f64 {
        self.model.row_cons(row).map_or(f64::INFINITY, |c| c.opts.rhs)
    }

    fn row_lp_pos(&self, row: RowId) -> Option<usize> {
        self.row_is_in_lp(row).then_some(row.index())
    }

    fn row_is_in_lp(&self, row: RowId) -> bool {
        self.is_lp_constructed() && row.index() < self.lp_rows.len()
    }

    fn row_is_local(&self, row: RowId) -> bool {
        self.model.row_cons(row).is_some_and(|c| c.opts.local)
    }

    fn row_name(&self, row: RowId) -> &str {
        self.model.row_cons(row).map_or("", |c| c.name.as_str())
    }

    fn include_pricer(&mut self, opts: &PricerOptions) -> EngineResult<()> {
        if self.stage == Stage::Solving {
            return Err(EngineError::stage("include a pricer", self.stage));
        }
        self.pricer = Some(opts.clone());
        self.pricer_active = false;
        Ok(())
    }

    fn activate_pricer(&mut self) -> EngineResult<()> {
        if self.pricer.is_none() {
            return Err(EngineError::NoPricer);
        }
        self.require_problem("activate the pricer")?;
        self.pricer_active = true;
        Ok(())
    }

    fn deactivate_pricer(&mut self) -> EngineResult<()> {
        if self.pricer.is_none() {
            return Err(EngineError::NoPricer);
        }
        self.pricer_active = false;
        Ok(())
    }

    fn pricer_is_active(&self) -> bool {
        self.pricer_active
    }

    fn add_priced_var(&mut self, name: &str, opts: &VarOptions, score: f64) -> EngineResult<VarId> {
        self.require("add a priced variable", &[Stage::Solving])?;
        let var = self.model.push_var(VarData::new(name, opts, true));
        self.revision += 1;
        trace!(name, score, "priced variable added");
        Ok(var)
    }

    fn add_var_to_row(&mut self, row: RowId, var: VarId, val: f64) -> EngineResult<()> {
        self.require("add a variable to a row", &[Stage::Solving])?;
        self.var_data(var)?;
        let var = self.model.active_var(var);
        let cons = self
            .model
            .row_cons_mut(row)
            .ok_or_else(|| EngineError::UnknownObject(format!("row {}", row.0)))?;
        match cons.coefs.iter_mut().find(|(v, _)| *v == var) {
            Some((_, coef)) => *coef += val,
            None => cons.coefs.push((var, val)),
        }
        self.revision += 1;
        Ok(())
    }

    fn write_lp(&self, path: &Path) -> EngineResult<()> {
        self.require_problem("write the LP")?;
        self.write_to(path, WriteOptions::default())
    }

    fn write_mip(
        &self,
        path: &Path,
        generic_names: bool,
        orig_obj: bool,
        lazy_conss: bool,
    ) -> EngineResult<()> {
        self.require_problem("write the MIP")?;
        let options = WriteOptions {
            generic_names,
            orig_obj,
            lazy_conss,
            integrality: true,
        };
        self.write_to(path, options)
    }
}

impl BranchPriceEngine {
    fn lp_column(&self, var: VarId, pick: impl Fn(&LpSolution) -> &[f64]) -> f64 {
        let Some(lp) = self.node_lp.as_ref().filter(|_| self.stage == Stage::Solving) else {
            return 0.0;
        };
        let index = self.model.active_var(var).index();
        index
            .checked_sub(lp.col_offset)
            .and_then(|col| pick(&lp.solution).get(col).copied())
            .unwrap_or(0.0)
    }

    fn lp_row(&self, row: RowId, pick: impl Fn(&LpSolution) -> &[f64]) -> f64 {
        match self.node_lp.as_ref() {
            Some(lp) if self.stage == Stage::Solving => {
                pick(&lp.solution).get(row.index()).copied().unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mipbridge_core::{EngineEvent, PricerOutcome};

    struct NoHooks;

    impl SolveHooks<BranchPriceEngine> for NoHooks {
        fn price_redcost(&mut self, _: &mut BranchPriceEngine) -> PricerOutcome {
            PricerOutcome::default()
        }

        fn price_farkas(&mut self, _: &mut BranchPriceEngine) -> PricerOutcome {
            PricerOutcome::default()
        }

        fn notify(&mut self, _: &mut BranchPriceEngine, _: &EngineEvent) {}
    }

    fn two_var_problem() -> (BranchPriceEngine, VarId, VarId, ConsId) {
        let mut engine = BranchPriceEngine::new();
        engine.create_problem("p").unwrap();
        let x = engine.create_var("x", &VarOptions::bounded(0.0, 10.0, 1.0)).unwrap();
        let y = engine.create_var("y", &VarOptions::bounded(0.0, 10.0, 2.0)).unwrap();
        let c = engine
            .create_linear_cons("c1", &ConsOptions::ranged(1.0, f64::INFINITY))
            .unwrap();
        engine.add_coef_linear(c, x, 1.0).unwrap();
        engine.add_coef_linear(c, y, 1.0).unwrap();
        (engine, x, y, c)
    }

    #[test]
    fn test_stage_transitions() {
        let mut engine = BranchPriceEngine::new();
        assert_eq!(engine.stage(), Stage::Init);
        assert!(engine.create_var("x", &VarOptions::default()).is_err());
        engine.create_problem("p").unwrap();
        assert_eq!(engine.stage(), Stage::Problem);
        assert!(engine.create_problem("q").is_err());
        engine.free_problem().unwrap();
        assert_eq!(engine.stage(), Stage::Init);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let (mut engine, ..) = two_var_problem();
        assert!(matches!(
            engine.create_var("x", &VarOptions::default()),
            Err(EngineError::DuplicateName(_))
        ));
        assert!(matches!(
            engine.create_linear_cons("c1", &ConsOptions::default()),
            Err(EngineError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_solve_small_lp() {
        let (mut engine, x, y, _) = two_var_problem();
        engine.solve(&mut NoHooks).unwrap();
        assert_eq!(engine.stage(), Stage::Solved);
        assert_eq!(engine.status(), SolveStatus::Optimal);
        assert!((engine.best_objective().unwrap() - 1.0).abs() < 1e-9);
        assert!((engine.solution_value(x).unwrap() - 1.0).abs() < 1e-9);
        assert!(engine.solution_value(y).unwrap().abs() < 1e-9);
        assert_eq!(engine.gap(), 0.0);
        assert!(!engine.has_current_node_lp());
    }

    #[test]
    fn test_free_transform_returns_to_problem() {
        let (mut engine, x, ..) = two_var_problem();
        engine.solve(&mut NoHooks).unwrap();
        engine.free_transform().unwrap();
        assert_eq!(engine.stage(), Stage::Problem);
        assert!(!engine.is_transformed());
        assert_eq!(engine.best_objective(), None);
        assert_eq!(engine.solution_value(x), None);
        assert_eq!(engine.vars().len(), 2);
    }

    #[test]
    fn test_hint_before_solve_becomes_incumbent() {
        let (mut engine, x, y, _) = two_var_problem();
        assert!(engine.try_solution(&[(x, 0.0), (y, 1.0)]).unwrap());
        engine.set_objective_limit(1.5).unwrap();
        engine.solve(&mut NoHooks).unwrap();
        assert!((engine.best_objective().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible_hint_is_rejected_after_transform() {
        let (mut engine, x, ..) = two_var_problem();
        engine.solve(&mut NoHooks).unwrap();
        assert!(!engine.try_solution(&[(x, 0.0)]).unwrap());
    }

    #[test]
    fn test_gap_needs_both_bounds() {
        let engine = BranchPriceEngine::new();
        assert!(engine.gap().is_infinite());
        assert_eq!(engine.primal_bound(), f64::INFINITY);
    }

    #[test]
    fn test_pricer_activation_requires_inclusion() {
        let (mut engine, ..) = two_var_problem();
        assert!(matches!(engine.activate_pricer(), Err(EngineError::NoPricer)));
        engine.include_pricer(&PricerOptions::default()).unwrap();
        engine.activate_pricer().unwrap();
        assert!(engine.pricer_is_active());
        engine.free_problem().unwrap();
        assert!(!engine.pricer_is_active());
    }

    #[test]
    fn test_node_lp_accessors_are_zero_outside_solving() {
        let (engine, x, ..) = two_var_problem();
        assert_eq!(engine.var_lp_value(x), 0.0);
        assert_eq!(engine.lp_solstat(), LpSolStat::NotSolved);
        assert!(engine.lp_rows().is_empty());
        assert_eq!(engine.row_dual(RowId(0)), 0.0);
    }
}
