//! Branch-and-price tree search.
//!
//! Every node solves its relaxation, lets the pricer add columns until it
//! reports no further progress, and then either prunes, records an integral
//! solution or branches on the most fractional integer variable.

use tracing::{debug, trace, warn};

use mipbridge_core::{
    EngineError, EngineEvent, EngineResult, EventKind, PricerResult, SolveHooks, SolveStatus,
};

use crate::params::NodeSelection;
use crate::lp::{solve_lp, LpModel, LpRow, LpStatus};
use crate::{NodeLp, BranchPriceEngine};
use crate::model::RowId;

const INTEGRALITY_TOL: f64 = 1e-6;
const BOUND_TOL: f64 = 1e-7;

/// Bound override on a variable, by arena index.
#[derive(Debug, Clone, Copy)]
struct BoundChange {
    var: usize,
    lb: f64,
    ub: f64,
}

#[derive(Debug, Clone)]
struct SearchNode {
    depth: u32,
    /// Lower bound on the internal objective below this node.
    bound: f64,
    changes: Vec<BoundChange>,
}

impl SearchNode {
    fn root() -> Self {
        Self {
            depth: 0,
            bound: f64::NEG_INFINITY,
            changes: Vec::new(),
        }
    }

    fn child(&self, bound: f64, change: BoundChange) -> Self {
        let mut changes = self.changes.clone();
        changes.push(change);
        Self {
            depth: self.depth + 1,
            bound,
            changes,
        }
    }

    fn bounds_of(&self, var: usize, lb: f64, ub: f64) -> (f64, f64) {
        self.changes
            .iter()
            .rev()
            .find(|c| c.var == var)
            .map_or((lb, ub), |c| (c.lb, c.ub))
    }
}

/// Open nodes, selected depth-first or by best bound.
struct NodeQueue {
    strategy: NodeSelection,
    nodes: Vec<SearchNode>,
}

impl NodeQueue {
    fn new(strategy: NodeSelection) -> Self {
        Self {
            strategy,
            nodes: vec![SearchNode::root()],
        }
    }

    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: SearchNode) {
        self.nodes.push(node);
    }

    fn pop(&mut self) -> Option<SearchNode> {
        match self.strategy {
            NodeSelection::Dfs => self.nodes.pop(),
            NodeSelection::BestFirst => {
                let best = self
                    .nodes
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| a.bound.total_cmp(&b.bound))
                    .map(|(i, _)| i)?;
                Some(self.nodes.swap_remove(best))
            }
        }
    }

    fn best_bound(&self) -> f64 {
        self.nodes
            .iter()
            .map(|n| n.bound)
            .fold(f64::INFINITY, f64::min)
    }

    fn prune(&mut self, threshold: f64) {
        self.nodes.retain(|n| n.bound < threshold - BOUND_TOL);
    }
}

enum NodeOutcome {
    Pruned,
    Infeasible,
    Unbounded,
    Integral,
    Branched(SearchNode, SearchNode),
    Interrupted,
}

impl BranchPriceEngine {
    pub(crate) fn run_search(
        &mut self,
        hooks: &mut dyn SolveHooks<Self>,
    ) -> EngineResult<SolveStatus> {
        if self.check_pending_hints() {
            self.notify_incumbent(hooks);
        }

        let mut queue = NodeQueue::new(self.params.node_selection);
        while !queue.is_empty() {
            if let Some(status) = self.limit_reached() {
                return Ok(status);
            }
            let Some(node) = queue.pop() else { break };
            if node.bound >= self.prune_threshold() - BOUND_TOL {
                continue;
            }

            self.nodes += 1;
            let outcome = self.process_node(&node, hooks)?;
            match outcome {
                NodeOutcome::Interrupted => return Ok(SolveStatus::UserInterrupt),
                NodeOutcome::Unbounded => {
                    self.dual_bound = f64::NEG_INFINITY;
                    return Ok(SolveStatus::Unbounded);
                }
                NodeOutcome::Branched(down, up) => {
                    queue.push(down);
                    queue.push(up);
                }
                NodeOutcome::Integral => {
                    queue.prune(self.prune_threshold());
                    self.notify_incumbent(hooks);
                }
                NodeOutcome::Pruned | NodeOutcome::Infeasible => {}
            }

            self.dual_bound = queue.best_bound().min(self.prune_threshold());
            if self.is_subscribed(EventKind::NodeProcessed) {
                let event = EngineEvent::NodeProcessed {
                    dual_bound: self.external(self.dual_bound),
                    primal_bound: self.primal_bound_external(),
                    nodes: self.nodes,
                };
                hooks.notify(self, &event);
            }
        }

        Ok(match self.incumbent.as_ref() {
            Some(incumbent) => {
                self.dual_bound = incumbent.objective;
                SolveStatus::Optimal
            }
            None => SolveStatus::Infeasible,
        })
    }

    fn limit_reached(&self) -> Option<SolveStatus> {
        if self.interrupted {
            return Some(SolveStatus::UserInterrupt);
        }
        if self.elapsed() >= self.params.time_limit {
            return Some(SolveStatus::TimeLimit);
        }
        if self.params.node_limit().is_some_and(|limit| self.nodes >= limit) {
            return Some(SolveStatus::NodeLimit);
        }
        if self.incumbent.is_some()
            && self.params.gap_limit > 0.0
            && mipbridge_core::Engine::gap(self) <= self.params.gap_limit
        {
            return Some(SolveStatus::GapLimit);
        }
        None
    }

    fn primal_bound_external(&self) -> f64 {
        mipbridge_core::Engine::primal_bound(self)
    }

    fn notify_incumbent(&mut self, hooks: &mut dyn SolveHooks<Self>) {
        let Some(objective) = self.incumbent.as_ref().map(|inc| inc.objective) else {
            return;
        };
        if self.is_subscribed(EventKind::BestSolutionFound) {
            let event = EngineEvent::BestSolutionFound {
                objective: self.external(objective),
            };
            hooks.notify(self, &event);
        }
    }

    /// Relaxation over the transformed variables under the node's bounds.
    fn build_lp(&self, node: &SearchNode) -> LpModel {
        let cols = self.model.lp_vars();
        let offset = cols.start;
        let mut lp = LpModel::default();
        for i in cols {
            let var = &self.model.vars[i];
            let (lb, ub) = node.bounds_of(i, var.lb, var.ub);
            lp.cost.push(self.sign() * var.obj);
            lp.lb.push(lb);
            lp.ub.push(ub);
        }
        lp.rows = self
            .model
            .lp_conss()
            .map(|i| {
                let cons = &self.model.conss[i];
                LpRow {
                    coefs: cons
                        .coefs
                        .iter()
                        .filter_map(|&(var, coef)| {
                            var.index().checked_sub(offset).map(|col| (col, coef))
                        })
                        .collect(),
                    lhs: cons.opts.lhs,
                    rhs: cons.opts.rhs,
                }
            })
            .collect();
        lp
    }

    fn solve_node_lp(&mut self, node: &SearchNode) -> LpStatus {
        let lp = self.build_lp(node);
        let solution = solve_lp(&lp);
        trace!(
            status = ?solution.status,
            objective = solution.objective,
            iterations = solution.iterations,
            "node LP solved"
        );
        let status = solution.status;
        self.lp_rows = (0..lp.rows.len() as u32).map(RowId).collect();
        self.node_lp = Some(NodeLp {
            solution,
            col_offset: self.model.lp_vars().start,
        });
        status
    }

    fn process_node(
        &mut self,
        node: &SearchNode,
        hooks: &mut dyn SolveHooks<Self>,
    ) -> EngineResult<NodeOutcome> {
        let max_rounds = self.params.max_pricing_rounds();
        let mut pricing = self.pricer_active;
        let mut rounds = 0u64;
        let mut bound = node.bound;

        let status = loop {
            let status = self.solve_node_lp(node);
            if !pricing || max_rounds.is_some_and(|max| rounds >= max) {
                break status;
            }
            let revision = self.revision;
            let outcome = match status {
                LpStatus::Optimal => hooks.price_redcost(self),
                LpStatus::Infeasible => hooks.price_farkas(self),
                _ => break status,
            };
            rounds += 1;
            if self.interrupted {
                return Ok(NodeOutcome::Interrupted);
            }
            if let Some(lower) = outcome.lower_bound {
                bound = bound.max(lower);
            }
            if self.revision == revision {
                break status;
            }
            if outcome.stop_early || outcome.result != PricerResult::Success {
                pricing = false;
            }
        };
        debug!(depth = node.depth, rounds, status = ?status, "node processed");

        let Some(lp) = self.node_lp.as_ref() else {
            return Err(EngineError::Numerical("node LP missing".to_string()));
        };
        match status {
            LpStatus::Infeasible => return Ok(NodeOutcome::Infeasible),
            LpStatus::Unbounded => return Ok(NodeOutcome::Unbounded),
            LpStatus::NotConverged => {
                warn!(depth = node.depth, "node LP did not converge");
                return Err(EngineError::Numerical(
                    "node LP did not converge".to_string(),
                ));
            }
            LpStatus::Optimal => {}
        }

        let bound = bound.max(lp.solution.objective);
        if bound >= self.prune_threshold() - BOUND_TOL {
            return Ok(NodeOutcome::Pruned);
        }

        let offset = lp.col_offset;
        let branch = lp
            .solution
            .x
            .iter()
            .enumerate()
            .filter(|&(col, _)| self.model.vars[offset + col].var_type.is_integral())
            .map(|(col, &value)| (offset + col, value, (value - value.round()).abs()))
            .filter(|&(_, _, frac)| frac > INTEGRALITY_TOL)
            .max_by(|a, b| a.2.total_cmp(&b.2));

        match branch {
            None => {
                let mut point = vec![0.0; self.model.vars.len()];
                for (col, &value) in lp.solution.x.iter().enumerate() {
                    let var = &self.model.vars[offset + col];
                    point[offset + col] = if var.var_type.is_integral() {
                        value.round()
                    } else {
                        value
                    };
                }
                if self.offer_incumbent(point) {
                    Ok(NodeOutcome::Integral)
                } else {
                    Ok(NodeOutcome::Pruned)
                }
            }
            Some((var, value, _)) => {
                let data = &self.model.vars[var];
                let (lb, ub) = node.bounds_of(var, data.lb, data.ub);
                trace!(var = %data.name, value, "branching");
                let down = node.child(
                    bound,
                    BoundChange {
                        var,
                        lb,
                        ub: value.floor(),
                    },
                );
                let up = node.child(
                    bound,
                    BoundChange {
                        var,
                        lb: value.ceil(),
                        ub,
                    },
                );
                Ok(NodeOutcome::Branched(down, up))
            }
        }
    }
}
