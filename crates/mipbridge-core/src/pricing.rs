//! Pricing state machine.
//!
//! One [`PricingState`] exists per bridge. The engine enters it once per
//! pricing invocation through [`begin_round`](PricingState::begin_round), host
//! logic writes pending fields, and [`finish_round`](PricingState::finish_round)
//! turns them into the [`PricerOutcome`] handed back to the engine.

use serde::Serialize;

/// Which pricing context is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum PricingMode {
    #[default]
    None = 0,
    ReducedCost = 1,
    Farkas = 2,
}

impl PricingMode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Short tag used in snapshot file names.
    pub fn tag(self) -> &'static str {
        match self {
            PricingMode::None => "none",
            PricingMode::ReducedCost => "redcost",
            PricingMode::Farkas => "farkas",
        }
    }
}

/// Result code of one pricing round, numbered like `SCIP_RESULT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum PricerResult {
    DidNotRun = 1,
    DidNotFind = 3,
    Success = 17,
}

impl PricerResult {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(PricerResult::DidNotRun),
            3 => Some(PricerResult::DidNotFind),
            17 => Some(PricerResult::Success),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// What the engine receives when a pricing invocation returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricerOutcome {
    pub result: PricerResult,
    pub lower_bound: Option<f64>,
    pub stop_early: bool,
}

impl Default for PricerOutcome {
    fn default() -> Self {
        Self {
            result: PricerResult::Success,
            lower_bound: None,
            stop_early: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingState {
    mode: PricingMode,
    result: PricerResult,
    lower_bound: Option<f64>,
    stop_early: bool,
    abort_round: bool,
    redcost_calls: u64,
    farkas_calls: u64,
    round: u64,
    last_mode: PricingMode,
    last_result: PricerResult,
    added_this_call: u64,
    added_total: u64,
}

impl Default for PricingState {
    fn default() -> Self {
        Self {
            mode: PricingMode::None,
            result: PricerResult::Success,
            lower_bound: None,
            stop_early: false,
            abort_round: false,
            redcost_calls: 0,
            farkas_calls: 0,
            round: 0,
            last_mode: PricingMode::None,
            last_result: PricerResult::DidNotRun,
            added_this_call: 0,
            added_total: 0,
        }
    }
}

impl PricingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to initial values. Used on every lifecycle reset.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clear per-solve fields before a new solve starts.
    pub fn prepare_solve(&mut self) {
        self.mode = PricingMode::None;
        self.added_this_call = 0;
    }

    /// Enter a pricing invocation.
    pub fn begin_round(&mut self, mode: PricingMode) {
        match mode {
            PricingMode::ReducedCost => self.redcost_calls += 1,
            PricingMode::Farkas => self.farkas_calls += 1,
            PricingMode::None => {}
        }
        self.mode = mode;
        self.round += 1;
        self.added_this_call = 0;
        self.result = PricerResult::Success;
        self.lower_bound = None;
        self.stop_early = false;
        self.abort_round = false;
    }

    /// The round cannot run (e.g. no node LP for Farkas pricing).
    pub fn short_circuit(&mut self) {
        self.result = PricerResult::DidNotRun;
    }

    /// Abandon the current round. The caller is responsible for
    /// interrupting the solve.
    pub fn request_abort(&mut self) {
        self.abort_round = true;
        self.result = PricerResult::DidNotRun;
        self.stop_early = true;
    }

    /// Leave the pricing invocation and produce the engine's outcome.
    ///
    /// An aborted round always reports `DidNotRun` with `stop_early` set.
    pub fn finish_round(&mut self) -> PricerOutcome {
        if self.abort_round {
            self.result = PricerResult::DidNotRun;
            self.stop_early = true;
        }
        self.last_result = self.result;
        self.last_mode = self.mode;
        self.mode = PricingMode::None;
        PricerOutcome {
            result: self.result,
            lower_bound: self.lower_bound,
            stop_early: self.stop_early,
        }
    }

    pub fn in_round(&self) -> bool {
        self.mode != PricingMode::None
    }

    pub fn record_added(&mut self) {
        self.added_this_call += 1;
        self.added_total += 1;
    }

    pub fn set_result(&mut self, result: PricerResult) {
        self.result = result;
        self.last_result = result;
    }

    pub fn set_lower_bound(&mut self, bound: f64) {
        self.lower_bound = Some(bound);
    }

    pub fn set_stop_early(&mut self, stop: bool) {
        self.stop_early = stop;
    }

    /// Set or clear the pending abort flag without escalating yet.
    pub fn set_abort_round(&mut self, abort: bool) {
        self.abort_round = abort;
    }

    pub fn mode(&self) -> PricingMode {
        self.mode
    }

    pub fn result(&self) -> PricerResult {
        self.result
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    pub fn stop_early(&self) -> bool {
        self.stop_early
    }

    pub fn abort_requested(&self) -> bool {
        self.abort_round
    }

    pub fn redcost_calls(&self) -> u64 {
        self.redcost_calls
    }

    pub fn farkas_calls(&self) -> u64 {
        self.farkas_calls
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn last_mode(&self) -> PricingMode {
        self.last_mode
    }

    pub fn last_result(&self) -> PricerResult {
        self.last_result
    }

    pub fn added_this_call(&self) -> u64 {
        self.added_this_call
    }

    pub fn added_total(&self) -> u64 {
        self.added_total
    }
}
