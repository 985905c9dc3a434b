//! Contract between the boundary layer and the optimization engine.
//!
//! The engine is a black box. Anything that can create variables and linear
//! constraints, run a branch-and-bound solve, call a pricer while solving and
//! report incumbent/node events can sit behind [`Engine`]. The bridge drives it
//! exclusively through this trait.

use std::fmt::Debug;
use std::path::Path;

use thiserror::Error;

use crate::config::{ConsOptions, PricerOptions, VarOptions};
use crate::pricing::PricerOutcome;

/// Engine stage, numbered the way SCIP numbers its stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum Stage {
    Init = 0,
    Problem = 1,
    Transforming = 2,
    Transformed = 3,
    InitPresolve = 4,
    Presolving = 5,
    ExitPresolve = 6,
    Presolved = 7,
    InitSolve = 8,
    Solving = 9,
    Solved = 10,
    ExitSolve = 11,
    FreeTrans = 12,
    Free = 13,
}

impl Stage {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Variable domain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum VarType {
    Binary = 0,
    Integer = 1,
    ImplInt = 2,
    #[default]
    Continuous = 3,
}

impl VarType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(VarType::Binary),
            1 => Some(VarType::Integer),
            2 => Some(VarType::ImplInt),
            3 => Some(VarType::Continuous),
            _ => None,
        }
    }

    pub fn is_integral(self) -> bool {
        !matches!(self, VarType::Continuous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

impl ObjSense {
    pub fn from_maximize(maximize: bool) -> Self {
        if maximize {
            ObjSense::Maximize
        } else {
            ObjSense::Minimize
        }
    }
}

/// Solution status of the current node LP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum LpSolStat {
    NotSolved = 0,
    Optimal = 1,
    Infeasible = 2,
    UnboundedRay = 3,
    ObjLimit = 4,
    IterLimit = 5,
    TimeLimit = 6,
    Error = 7,
}

impl LpSolStat {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Overall outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Unknown,
    Optimal,
    Infeasible,
    Unbounded,
    TimeLimit,
    NodeLimit,
    GapLimit,
    UserInterrupt,
}

impl SolveStatus {
    /// Boundary code: 0 optimal, 1 infeasible, 2 unbounded, 3 time limit,
    /// 4 anything else.
    pub fn code(self) -> i32 {
        match self {
            SolveStatus::Optimal => 0,
            SolveStatus::Infeasible => 1,
            SolveStatus::Unbounded => 2,
            SolveStatus::TimeLimit => 3,
            _ => 4,
        }
    }
}

/// Engine events the bridge can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BestSolutionFound,
    NodeProcessed,
}

/// Event payload delivered through [`SolveHooks::notify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    BestSolutionFound {
        objective: f64,
    },
    NodeProcessed {
        dual_bound: f64,
        primal_bound: f64,
        nodes: u64,
    },
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::BestSolutionFound { .. } => EventKind::BestSolutionFound,
            EngineEvent::NodeProcessed { .. } => EventKind::NodeProcessed,
        }
    }
}

/// Errors reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot {operation} in stage {stage:?}")]
    InvalidStage {
        operation: &'static str,
        stage: Stage,
    },

    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Parameter {name} expects a {expected} value")]
    ParameterType { name: String, expected: &'static str },

    #[error("Invalid value for parameter {name}: {value}")]
    InvalidParameterValue { name: String, value: String },

    #[error("No pricer included")]
    NoPricer,

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn stage(operation: &'static str, stage: Stage) -> Self {
        EngineError::InvalidStage { operation, stage }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Callbacks the engine makes into the bridge while [`Engine::solve`] runs.
///
/// All calls happen synchronously on the solving stack; the engine does not
/// continue until the hook returns.
pub trait SolveHooks<E: Engine> {
    /// Reduced-cost pricing on a node LP that was solved to optimality.
    fn price_redcost(&mut self, engine: &mut E) -> PricerOutcome;

    /// Farkas pricing on an infeasible node LP.
    fn price_farkas(&mut self, engine: &mut E) -> PricerOutcome;

    /// Deliver a subscribed event. The engine is handed over so event
    /// handlers can read the solving state.
    fn notify(&mut self, engine: &mut E, event: &EngineEvent);
}

/// The optimization engine as seen by the bridge.
///
/// Object identities (`Var`, `Cons`, `Row`) are cheap copyable ids that stay
/// valid until the owning problem is freed. During solving, original objects
/// have transformed twins; callers map between them with
/// [`transformed_var`](Engine::transformed_var) and
/// [`transformed_cons`](Engine::transformed_cons).
pub trait Engine: Sized + 'static {
    type Var: Copy + Eq + Debug + 'static;
    type Cons: Copy + Eq + Debug + 'static;
    type Row: Copy + Eq + Debug + 'static;

    // ---- instance and problem lifecycle ----

    fn include_default_plugins(&mut self) -> EngineResult<()>;
    fn catch_event(&mut self, kind: EventKind) -> EngineResult<()>;
    fn stage(&self) -> Stage;
    fn create_problem(&mut self, name: &str) -> EngineResult<()>;
    fn set_objective_sense(&mut self, sense: ObjSense) -> EngineResult<()>;
    /// Drop the transformed problem and all solving data.
    fn free_transform(&mut self) -> EngineResult<()>;
    /// Drop the problem entirely; the engine returns to [`Stage::Init`].
    fn free_problem(&mut self) -> EngineResult<()>;

    // ---- model building ----

    fn create_var(&mut self, name: &str, opts: &VarOptions) -> EngineResult<Self::Var>;
    fn create_linear_cons(&mut self, name: &str, opts: &ConsOptions) -> EngineResult<Self::Cons>;
    fn add_coef_linear(&mut self, cons: Self::Cons, var: Self::Var, val: f64) -> EngineResult<()>;
    fn set_cons_modifiable(&mut self, cons: Self::Cons, modifiable: bool) -> EngineResult<()>;

    // ---- lookup ----

    fn find_var(&self, name: &str) -> Option<Self::Var>;
    fn find_cons(&self, name: &str) -> Option<Self::Cons>;
    fn is_transformed(&self) -> bool;
    fn var_is_transformed(&self, var: Self::Var) -> bool;
    /// Whether the column starts in the initial LP.
    fn var_is_initial(&self, var: Self::Var) -> bool;
    /// Whether the column may be dropped from the LP by aging.
    fn var_is_removable(&self, var: Self::Var) -> bool;
    fn cons_is_transformed(&self, cons: Self::Cons) -> bool;
    fn transformed_var(&self, var: Self::Var) -> Option<Self::Var>;
    fn transformed_cons(&self, cons: Self::Cons) -> Option<Self::Cons>;
    /// LP row backing a linear constraint, once the LP has been constructed.
    fn cons_row(&self, cons: Self::Cons) -> Option<Self::Row>;
    /// Variables of the original problem, in creation order.
    fn vars(&self) -> Vec<Self::Var>;
    fn var_name(&self, var: Self::Var) -> &str;

    // ---- parameters ----

    fn set_int_param(&mut self, name: &str, value: i64) -> EngineResult<()>;
    fn set_real_param(&mut self, name: &str, value: f64) -> EngineResult<()>;
    fn set_bool_param(&mut self, name: &str, value: bool) -> EngineResult<()>;
    fn set_string_param(&mut self, name: &str, value: &str) -> EngineResult<()>;
    fn set_objective_limit(&mut self, limit: f64) -> EngineResult<()>;

    // ---- solving and results ----

    fn solve(&mut self, hooks: &mut dyn SolveHooks<Self>) -> EngineResult<()>;
    /// Request that the running solve stops at the next opportunity.
    fn interrupt_solve(&mut self);
    fn status(&self) -> SolveStatus;
    /// Offer a (partial) primal point; returns whether it was accepted.
    fn try_solution(&mut self, values: &[(Self::Var, f64)]) -> EngineResult<bool>;
    fn best_objective(&self) -> Option<f64>;
    fn solution_value(&self, var: Self::Var) -> Option<f64>;
    fn solving_time(&self) -> f64;
    fn n_nodes(&self) -> u64;
    fn gap(&self) -> f64;
    fn dual_bound(&self) -> f64;
    fn primal_bound(&self) -> f64;

    // ---- current node LP ----

    fn has_current_node_lp(&self) -> bool;
    fn is_lp_constructed(&self) -> bool;
    fn lp_solstat(&self) -> LpSolStat;
    /// Rows of the current LP, in LP order.
    fn lp_rows(&self) -> &[Self::Row];
    fn var_lp_value(&self, var: Self::Var) -> f64;
    fn var_redcost(&self, var: Self::Var) -> f64;
    fn row_dual(&self, row: Self::Row) -> f64;
    fn row_farkas(&self, row: Self::Row) -> f64;
    fn row_lhs(&self, row: Self::Row) -> f64;
    fn row_rhs(&self, row: Self::Row) -> f64;
    fn row_lp_pos(&self, row: Self::Row) -> Option<usize>;
    fn row_is_in_lp(&self, row: Self::Row) -> bool;
    fn row_is_local(&self, row: Self::Row) -> bool;
    fn row_name(&self, row: Self::Row) -> &str;

    // ---- pricer plugin ----

    fn include_pricer(&mut self, opts: &PricerOptions) -> EngineResult<()>;
    fn activate_pricer(&mut self) -> EngineResult<()>;
    fn deactivate_pricer(&mut self) -> EngineResult<()>;
    fn pricer_is_active(&self) -> bool;
    /// Create a variable during pricing and add it to the transformed problem.
    fn add_priced_var(&mut self, name: &str, opts: &VarOptions, score: f64)
        -> EngineResult<Self::Var>;
    fn add_var_to_row(&mut self, row: Self::Row, var: Self::Var, val: f64) -> EngineResult<()>;

    // ---- diagnostics ----

    fn write_lp(&self, path: &Path) -> EngineResult<()>;
    fn write_mip(
        &self,
        path: &Path,
        generic_names: bool,
        orig_obj: bool,
        lazy_conss: bool,
    ) -> EngineResult<()>;
}
