//! Scripted engine used by the unit tests.
//!
//! Solving does no arithmetic: it transforms the model, then replays a fixed
//! list of pricing calls and events against the hooks, recording what the
//! bridge handed back.

use std::path::Path;

use crate::config::{ConsOptions, PricerOptions, VarOptions};
use crate::engine::{
    Engine, EngineError, EngineEvent, EngineResult, EventKind, LpSolStat, ObjSense, SolveHooks,
    SolveStatus, Stage,
};
use crate::pricing::PricerOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Redcost,
    Farkas,
    Incumbent(f64),
    Node(f64, f64, u64),
}

#[derive(Debug, Clone)]
pub struct MockVar {
    pub name: String,
    pub opts: VarOptions,
    pub twin: Option<usize>,
    pub transformed: bool,
    pub lp_value: f64,
    pub redcost: f64,
}

#[derive(Debug, Clone)]
pub struct MockCons {
    pub name: String,
    pub opts: ConsOptions,
    pub coefs: Vec<(MockId, f64)>,
    pub twin: Option<usize>,
    pub row: Option<usize>,
    pub transformed: bool,
}

pub struct MockEngine {
    pub stage: Stage,
    pub vars: Vec<MockVar>,
    pub conss: Vec<MockCons>,
    pub n_orig_vars: usize,
    pub n_orig_conss: usize,
    pub lp_rows: Vec<MockId>,
    pub row_names: Vec<String>,
    pub row_coefs: Vec<(MockId, MockId, f64)>,
    pub duals: Vec<f64>,
    pub farkas: Vec<f64>,
    pub has_lp: bool,
    pub script: Vec<Step>,
    pub outcomes: Vec<PricerOutcome>,
    pub interrupted: bool,
    pub status: SolveStatus,
    pub subscribed: Vec<EventKind>,
    pub plugins_included: bool,
    pub pricer: Option<PricerOptions>,
    pub pricer_active: bool,
    pub fail_row_updates: bool,
    pub hints: Vec<Vec<(String, f64)>>,
    pub int_params: Vec<(String, i64)>,
    pub real_params: Vec<(String, f64)>,
    pub sense: ObjSense,
    pub best: Option<f64>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            stage: Stage::Init,
            vars: Vec::new(),
            conss: Vec::new(),
            n_orig_vars: 0,
            n_orig_conss: 0,
            lp_rows: Vec::new(),
            row_names: Vec::new(),
            row_coefs: Vec::new(),
            duals: Vec::new(),
            farkas: Vec::new(),
            has_lp: true,
            script: Vec::new(),
            outcomes: Vec::new(),
            interrupted: false,
            status: SolveStatus::Unknown,
            subscribed: Vec::new(),
            plugins_included: false,
            pricer: None,
            pricer_active: false,
            fail_row_updates: false,
            hints: Vec::new(),
            int_params: Vec::new(),
            real_params: Vec::new(),
            sense: ObjSense::Minimize,
            best: None,
        }
    }
}

impl MockEngine {
    pub fn scripted(script: Vec<Step>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// Transform the model and enter the solving stage with one LP row per
    /// constraint.
    pub fn start_solving(&mut self) {
        self.n_orig_vars = self.vars.len();
        self.n_orig_conss = self.conss.len();
        for i in 0..self.n_orig_vars {
            let mut twin = self.vars[i].clone();
            twin.name = format!("t_{}", twin.name);
            twin.transformed = true;
            self.vars[i].twin = Some(self.vars.len());
            self.vars.push(twin);
        }
        for i in 0..self.n_orig_conss {
            let mut twin = self.conss[i].clone();
            twin.transformed = true;
            twin.row = Some(self.lp_rows.len());
            self.lp_rows.push(MockId(self.lp_rows.len()));
            self.row_names.push(twin.name.clone());
            self.conss[i].twin = Some(self.conss.len());
            self.conss.push(twin);
        }
        self.stage = Stage::Solving;
    }

    fn twin_cons(&self, cons: MockId) -> &MockCons {
        let c = &self.conss[cons.0];
        match c.twin {
            Some(t) => &self.conss[t],
            None => c,
        }
    }
}

impl Engine for MockEngine {
    type Var = MockId;
    type Cons = MockId;
    type Row = MockId;

    fn include_default_plugins(&mut self) -> EngineResult<()> {
        self.plugins_included = true;
        Ok(())
    }

    fn catch_event(&mut self, kind: EventKind) -> EngineResult<()> {
        self.subscribed.push(kind);
        Ok(())
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    fn create_problem(&mut self, _name: &str) -> EngineResult<()> {
        if self.stage != Stage::Init {
            return Err(EngineError::stage("create problem", self.stage));
        }
        self.stage = Stage::Problem;
        Ok(())
    }

    fn set_objective_sense(&mut self, sense: ObjSense) -> EngineResult<()> {
        self.sense = sense;
        Ok(())
    }

    fn free_transform(&mut self) -> EngineResult<()> {
        self.vars.truncate(self.n_orig_vars);
        self.conss.truncate(self.n_orig_conss);
        for var in &mut self.vars {
            var.twin = None;
        }
        for cons in &mut self.conss {
            cons.twin = None;
        }
        self.lp_rows.clear();
        self.row_names.clear();
        self.stage = Stage::Problem;
        Ok(())
    }

    fn free_problem(&mut self) -> EngineResult<()> {
        self.vars.clear();
        self.conss.clear();
        self.lp_rows.clear();
        self.row_names.clear();
        self.row_coefs.clear();
        self.n_orig_vars = 0;
        self.n_orig_conss = 0;
        self.pricer_active = false;
        self.stage = Stage::Init;
        Ok(())
    }

    fn create_var(&mut self, name: &str, opts: &VarOptions) -> EngineResult<MockId> {
        if self.stage != Stage::Problem {
            return Err(EngineError::stage("create variable", self.stage));
        }
        self.vars.push(MockVar {
            name: name.to_string(),
            opts: opts.clone(),
            twin: None,
            transformed: false,
            lp_value: 0.0,
            redcost: 0.0,
        });
        Ok(MockId(self.vars.len() - 1))
    }

    fn create_linear_cons(&mut self, name: &str, opts: &ConsOptions) -> EngineResult<MockId> {
        if self.stage != Stage::Problem {
            return Err(EngineError::stage("create constraint", self.stage));
        }
        self.conss.push(MockCons {
            name: name.to_string(),
            opts: opts.clone(),
            coefs: Vec::new(),
            twin: None,
            row: None,
            transformed: false,
        });
        Ok(MockId(self.conss.len() - 1))
    }

    fn add_coef_linear(&mut self, cons: MockId, var: MockId, val: f64) -> EngineResult<()> {
        if self.fail_row_updates {
            return Err(EngineError::Numerical("row update refused".to_string()));
        }
        let cons = self
            .conss
            .get_mut(cons.0)
            .ok_or_else(|| EngineError::UnknownObject(format!("{cons:?}")))?;
        cons.coefs.push((var, val));
        Ok(())
    }

    fn set_cons_modifiable(&mut self, cons: MockId, modifiable: bool) -> EngineResult<()> {
        self.conss[cons.0].opts.modifiable = modifiable;
        Ok(())
    }

    fn find_var(&self, name: &str) -> Option<MockId> {
        self.vars.iter().position(|v| v.name == name).map(MockId)
    }

    fn find_cons(&self, name: &str) -> Option<MockId> {
        self.conss.iter().position(|c| c.name == name).map(MockId)
    }

    fn is_transformed(&self) -> bool {
        self.stage >= Stage::Transformed
    }

    fn var_is_transformed(&self, var: MockId) -> bool {
        self.vars[var.0].transformed
    }

    fn var_is_initial(&self, var: MockId) -> bool {
        self.vars[var.0].opts.initial
    }

    fn var_is_removable(&self, var: MockId) -> bool {
        self.vars[var.0].opts.removable
    }

    fn cons_is_transformed(&self, cons: MockId) -> bool {
        self.conss[cons.0].transformed
    }

    fn transformed_var(&self, var: MockId) -> Option<MockId> {
        self.vars[var.0].twin.map(MockId)
    }

    fn transformed_cons(&self, cons: MockId) -> Option<MockId> {
        self.conss[cons.0].twin.map(MockId)
    }

    fn cons_row(&self, cons: MockId) -> Option<MockId> {
        self.twin_cons(cons).row.map(MockId)
    }

    fn vars(&self) -> Vec<MockId> {
        (0..self.vars.len())
            .filter(|&i| !self.vars[i].transformed)
            .map(MockId)
            .collect()
    }

    fn var_name(&self, var: MockId) -> &str {
        &self.vars[var.0].name
    }

    fn set_int_param(&mut self, name: &str, value: i64) -> EngineResult<()> {
        self.int_params.push((name.to_string(), value));
        Ok(())
    }

    fn set_real_param(&mut self, name: &str, value: f64) -> EngineResult<()> {
        self.real_params.push((name.to_string(), value));
        Ok(())
    }

    fn set_bool_param(&mut self, name: &str, _value: bool) -> EngineResult<()> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }

    fn set_string_param(&mut self, name: &str, _value: &str) -> EngineResult<()> {
        Err(EngineError::UnknownParameter(name.to_string()))
    }

    fn set_objective_limit(&mut self, limit: f64) -> EngineResult<()> {
        self.real_params.push(("limits/objective".to_string(), limit));
        Ok(())
    }

    fn solve(&mut self, hooks: &mut dyn SolveHooks<Self>) -> EngineResult<()> {
        if self.stage < Stage::Problem {
            return Err(EngineError::stage("solve", self.stage));
        }
        self.interrupted = false;
        self.start_solving();
        for step in self.script.clone() {
            if self.interrupted {
                break;
            }
            match step {
                Step::Redcost => {
                    let outcome = hooks.price_redcost(self);
                    self.outcomes.push(outcome);
                }
                Step::Farkas => {
                    let outcome = hooks.price_farkas(self);
                    self.outcomes.push(outcome);
                }
                Step::Incumbent(objective) => {
                    self.best = Some(objective);
                    if self.subscribed.contains(&EventKind::BestSolutionFound) {
                        hooks.notify(self, &EngineEvent::BestSolutionFound { objective });
                    }
                }
                Step::Node(dual_bound, primal_bound, nodes) => {
                    if self.subscribed.contains(&EventKind::NodeProcessed) {
                        hooks.notify(
                            self,
                            &EngineEvent::NodeProcessed {
                                dual_bound,
                                primal_bound,
                                nodes,
                            },
                        );
                    }
                }
            }
        }
        self.stage = Stage::Solved;
        self.status = if self.interrupted {
            SolveStatus::UserInterrupt
        } else {
            SolveStatus::Optimal
        };
        Ok(())
    }

    fn interrupt_solve(&mut self) {
        self.interrupted = true;
    }

    fn status(&self) -> SolveStatus {
        self.status
    }

    fn try_solution(&mut self, values: &[(MockId, f64)]) -> EngineResult<bool> {
        let named = values
            .iter()
            .map(|&(var, value)| (self.vars[var.0].name.clone(), value))
            .collect();
        self.hints.push(named);
        Ok(true)
    }

    fn best_objective(&self) -> Option<f64> {
        self.best
    }

    fn solution_value(&self, var: MockId) -> Option<f64> {
        self.best.map(|_| self.vars[var.0].lp_value)
    }

    fn solving_time(&self) -> f64 {
        0.0
    }

    fn n_nodes(&self) -> u64 {
        1
    }

    fn gap(&self) -> f64 {
        0.0
    }

    fn dual_bound(&self) -> f64 {
        self.best.unwrap_or(f64::NEG_INFINITY)
    }

    fn primal_bound(&self) -> f64 {
        self.best.unwrap_or(f64::INFINITY)
    }

    fn has_current_node_lp(&self) -> bool {
        self.stage == Stage::Solving && self.has_lp
    }

    fn is_lp_constructed(&self) -> bool {
        self.stage == Stage::Solving
    }

    fn lp_solstat(&self) -> LpSolStat {
        LpSolStat::Optimal
    }

    fn lp_rows(&self) -> &[MockId] {
        &self.lp_rows
    }

    fn var_lp_value(&self, var: MockId) -> f64 {
        self.vars[var.0].lp_value
    }

    fn var_redcost(&self, var: MockId) -> f64 {
        self.vars[var.0].redcost
    }

    fn row_dual(&self, row: MockId) -> f64 {
        self.duals.get(row.0).copied().unwrap_or(0.0)
    }

    fn row_farkas(&self, row: MockId) -> f64 {
        self.farkas.get(row.0).copied().unwrap_or(0.0)
    }

    fn row_lhs(&self, row: MockId) -> f64 {
        self.conss[self.n_orig_conss + row.0].opts.lhs
    }

    fn row_rhs(&self, row: MockId) -> f64 {
        self.conss[self.n_orig_conss + row.0].opts.rhs
    }

    fn row_lp_pos(&self, row: MockId) -> Option<usize> {
        self.lp_rows.iter().position(|&r| r == row)
    }

    fn row_is_in_lp(&self, row: MockId) -> bool {
        self.lp_rows.contains(&row)
    }

    fn row_is_local(&self, _row: MockId) -> bool {
        false
    }

    fn row_name(&self, row: MockId) -> &str {
        &self.row_names[row.0]
    }

    fn include_pricer(&mut self, opts: &PricerOptions) -> EngineResult<()> {
        self.pricer = Some(opts.clone());
        Ok(())
    }

    fn activate_pricer(&mut self) -> EngineResult<()> {
        if self.pricer.is_none() {
            return Err(EngineError::NoPricer);
        }
        self.pricer_active = true;
        Ok(())
    }

    fn deactivate_pricer(&mut self) -> EngineResult<()> {
        self.pricer_active = false;
        Ok(())
    }

    fn pricer_is_active(&self) -> bool {
        self.pricer_active
    }

    fn add_priced_var(&mut self, name: &str, opts: &VarOptions, _score: f64) -> EngineResult<MockId> {
        if self.stage != Stage::Solving {
            return Err(EngineError::stage("add priced variable", self.stage));
        }
        self.vars.push(MockVar {
            name: name.to_string(),
            opts: opts.clone(),
            twin: None,
            transformed: true,
            lp_value: 0.0,
            redcost: 0.0,
        });
        Ok(MockId(self.vars.len() - 1))
    }

    fn add_var_to_row(&mut self, row: MockId, var: MockId, val: f64) -> EngineResult<()> {
        if self.fail_row_updates {
            return Err(EngineError::Numerical("row update refused".to_string()));
        }
        self.row_coefs.push((row, var, val));
        Ok(())
    }

    fn write_lp(&self, path: &Path) -> EngineResult<()> {
        std::fs::write(path, "\\ mock\nEnd\n")?;
        Ok(())
    }

    fn write_mip(&self, path: &Path, _: bool, _: bool, _: bool) -> EngineResult<()> {
        self.write_lp(path)
    }
}
