//! Handle-mediated access to the engine.
//!
//! A [`Session`] is a short-lived view over the engine, the registries and the
//! pricing state. The bridge hands one out for model building and result
//! queries, and the pricing dispatcher hands one to host pricing handlers
//! while the engine is suspended inside a pricing round. Every operation takes
//! and returns raw `i32` handles, so the exported boundary layer is a thin
//! shell around it.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{params, ConsOptions, SolveSettings, VarOptions};
use crate::engine::{Engine, LpSolStat, Stage};
use crate::error::{BridgeError, BridgeResult};
use crate::pricing::{PricerResult, PricingState};
use crate::registry::{Handle, HandleKind, Registries};

/// Score passed to the engine for every priced variable.
const PRICED_VAR_SCORE: f64 = 1.0;

/// Statistics of the last solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolveStats {
    pub solving_time: f64,
    pub nodes: u64,
    pub gap: f64,
    pub dual_bound: f64,
    pub primal_bound: f64,
}

pub struct Session<'a, E: Engine> {
    engine: &'a mut E,
    registries: &'a mut Registries<E>,
    pricing: &'a mut PricingState,
}

impl<'a, E: Engine> Session<'a, E> {
    pub fn new(
        engine: &'a mut E,
        registries: &'a mut Registries<E>,
        pricing: &'a mut PricingState,
    ) -> Self {
        Self {
            engine,
            registries,
            pricing,
        }
    }

    pub fn engine(&self) -> &E {
        self.engine
    }

    pub fn pricing(&self) -> &PricingState {
        self.pricing
    }

    // ---- context ----

    pub fn stage(&self) -> Stage {
        self.engine.stage()
    }

    pub fn is_transformed(&self) -> bool {
        self.engine.is_transformed()
    }

    fn is_solving(&self) -> bool {
        self.engine.stage() == Stage::Solving
    }

    /// Whether a node LP is available. Only true while solving.
    pub fn has_current_lp(&self) -> bool {
        self.is_solving() && self.engine.has_current_node_lp()
    }

    /// LP solution status, or `None` outside the solving stage.
    pub fn lp_solstat(&self) -> Option<LpSolStat> {
        self.is_solving().then(|| self.engine.lp_solstat())
    }

    fn lp_available(&self) -> bool {
        self.is_solving() && self.engine.is_lp_constructed()
    }

    pub fn n_lp_rows(&self) -> BridgeResult<usize> {
        let stage = self.stage();
        if stage != Stage::Solving {
            return Err(BridgeError::WrongStage {
                expected: Stage::Solving,
                actual: stage,
            });
        }
        if !self.engine.is_lp_constructed() {
            return Err(BridgeError::NoCurrentLp);
        }
        Ok(self.engine.lp_rows().len())
    }

    fn require_problem(&self) -> BridgeResult<()> {
        if self.stage() < Stage::Problem {
            return Err(BridgeError::NoProblem);
        }
        Ok(())
    }

    // ---- model building ----

    pub fn add_var(&mut self, name: &str, opts: &VarOptions) -> BridgeResult<Handle> {
        self.require_problem()?;
        let var = self.engine.create_var(name, opts)?;
        self.registries.vars.register(var)
    }

    pub fn add_linear_cons(&mut self, name: &str, opts: &ConsOptions) -> BridgeResult<Handle> {
        self.require_problem()?;
        let cons = self.engine.create_linear_cons(name, opts)?;
        self.registries.conss.register(cons)
    }

    pub fn add_coef_linear(&mut self, cons: i32, var: i32, val: f64) -> BridgeResult<()> {
        let cons = self.registries.conss.resolve(cons)?;
        let var = self.registries.vars.resolve(var)?;
        self.engine.add_coef_linear(cons, var, val)?;
        Ok(())
    }

    /// Add several coefficients to one constraint. Nothing is applied unless
    /// every handle resolves.
    pub fn add_coefs_linear(&mut self, cons: i32, vars: &[i32], vals: &[f64]) -> BridgeResult<()> {
        check_lengths(vars.len(), vals.len())?;
        let cons = self.registries.conss.resolve(cons)?;
        let vars = self.registries.vars.resolve_all(vars)?;
        for (var, &val) in vars.into_iter().zip(vals) {
            self.engine.add_coef_linear(cons, var, val)?;
        }
        Ok(())
    }

    pub fn set_cons_modifiable(&mut self, cons: i32, modifiable: bool) -> BridgeResult<()> {
        let cons = self.registries.conss.resolve(cons)?;
        self.engine.set_cons_modifiable(cons, modifiable)?;
        Ok(())
    }

    // ---- lookup ----

    pub fn find_var(&mut self, name: &str) -> BridgeResult<Handle> {
        let var = self
            .engine
            .find_var(name)
            .ok_or_else(|| not_found(HandleKind::Variable, name))?;
        self.registries.vars.register(var)
    }

    pub fn find_cons(&mut self, name: &str) -> BridgeResult<Handle> {
        let cons = self
            .engine
            .find_cons(name)
            .ok_or_else(|| not_found(HandleKind::Constraint, name))?;
        self.registries.conss.register(cons)
    }

    fn require_transformed(&self) -> BridgeResult<()> {
        if !self.engine.is_transformed() {
            return Err(BridgeError::WrongStage {
                expected: Stage::Transformed,
                actual: self.stage(),
            });
        }
        Ok(())
    }

    /// Handle of the transformed twin of a variable. A handle that already
    /// refers to a transformed variable maps to itself.
    pub fn var_transformed(&mut self, var: i32) -> BridgeResult<Handle> {
        let resolved = self.registries.vars.resolve(var)?;
        self.require_transformed()?;
        if self.engine.var_is_transformed(resolved) {
            return self.registries.vars.register(resolved);
        }
        let twin = self
            .engine
            .transformed_var(resolved)
            .ok_or_else(|| BridgeError::invalid_handle(HandleKind::Variable, var))?;
        self.registries.vars.register(twin)
    }

    pub fn var_is_initial(&self, var: i32) -> BridgeResult<bool> {
        let var = self.registries.vars.resolve(var)?;
        Ok(self.engine.var_is_initial(var))
    }

    pub fn var_is_removable(&self, var: i32) -> BridgeResult<bool> {
        let var = self.registries.vars.resolve(var)?;
        Ok(self.engine.var_is_removable(var))
    }

    pub fn cons_transformed(&mut self, cons: i32) -> BridgeResult<Handle> {
        let resolved = self.registries.conss.resolve(cons)?;
        self.require_transformed()?;
        if self.engine.cons_is_transformed(resolved) {
            return self.registries.conss.register(resolved);
        }
        let twin = self
            .engine
            .transformed_cons(resolved)
            .ok_or_else(|| BridgeError::invalid_handle(HandleKind::Constraint, cons))?;
        self.registries.conss.register(twin)
    }

    /// Handle of the LP row behind a constraint.
    pub fn cons_row(&mut self, cons: i32) -> BridgeResult<Handle> {
        let cons = self.registries.conss.resolve(cons)?;
        let row = self.engine.cons_row(cons).ok_or(BridgeError::NoCurrentLp)?;
        self.registries.rows.register(row)
    }

    // ---- LP introspection ----

    /// Current LP value of a variable; `0.0` outside the solving stage.
    pub fn var_lp_value(&self, var: i32) -> BridgeResult<f64> {
        let var = self.registries.vars.resolve(var)?;
        Ok(if self.is_solving() {
            self.engine.var_lp_value(var)
        } else {
            0.0
        })
    }

    /// Reduced cost of a variable; `0.0` outside the solving stage.
    pub fn var_redcost(&self, var: i32) -> BridgeResult<f64> {
        let var = self.registries.vars.resolve(var)?;
        Ok(if self.is_solving() {
            self.engine.var_redcost(var)
        } else {
            0.0
        })
    }

    fn cons_row_value(&self, cons: i32, value: impl Fn(&E, E::Row) -> f64) -> BridgeResult<f64> {
        let cons = self.registries.conss.resolve(cons)?;
        if !self.is_solving() {
            return Ok(0.0);
        }
        Ok(self
            .engine
            .cons_row(cons)
            .map_or(0.0, |row| value(&*self.engine, row)))
    }

    pub fn cons_dual(&self, cons: i32) -> BridgeResult<f64> {
        self.cons_row_value(cons, |engine, row| engine.row_dual(row))
    }

    pub fn cons_farkas(&self, cons: i32) -> BridgeResult<f64> {
        self.cons_row_value(cons, |engine, row| engine.row_farkas(row))
    }

    pub fn cons_is_in_lp(&self, cons: i32) -> BridgeResult<bool> {
        let cons = self.registries.conss.resolve(cons)?;
        Ok(self
            .engine
            .cons_row(cons)
            .is_some_and(|row| self.engine.row_is_in_lp(row)))
    }

    fn row_value(&self, row: i32, value: impl Fn(&E, E::Row) -> f64) -> BridgeResult<f64> {
        let row = self.registries.rows.resolve(row)?;
        Ok(if self.is_solving() {
            value(&*self.engine, row)
        } else {
            0.0
        })
    }

    pub fn row_dual(&self, row: i32) -> BridgeResult<f64> {
        self.row_value(row, |engine, row| engine.row_dual(row))
    }

    pub fn row_farkas(&self, row: i32) -> BridgeResult<f64> {
        self.row_value(row, |engine, row| engine.row_farkas(row))
    }

    pub fn row_lhs(&self, row: i32) -> BridgeResult<f64> {
        let row = self.registries.rows.resolve(row)?;
        Ok(self.engine.row_lhs(row))
    }

    pub fn row_rhs(&self, row: i32) -> BridgeResult<f64> {
        let row = self.registries.rows.resolve(row)?;
        Ok(self.engine.row_rhs(row))
    }

    pub fn row_lp_pos(&self, row: i32) -> BridgeResult<Option<usize>> {
        let row = self.registries.rows.resolve(row)?;
        Ok(self.engine.row_lp_pos(row))
    }

    pub fn row_is_in_lp(&self, row: i32) -> BridgeResult<bool> {
        let row = self.registries.rows.resolve(row)?;
        Ok(self.engine.row_is_in_lp(row))
    }

    pub fn row_is_local(&self, row: i32) -> BridgeResult<bool> {
        let row = self.registries.rows.resolve(row)?;
        Ok(self.engine.row_is_local(row))
    }

    pub fn row_name(&self, row: i32) -> BridgeResult<&str> {
        let row = self.registries.rows.resolve(row)?;
        Ok(self.engine.row_name(row))
    }

    // ---- batched LP row access ----

    /// Fill `out` with the dual values of the current LP rows, in LP order.
    ///
    /// Writes `min(out.len(), rows)` values and returns how many were
    /// written; `0` when no LP is available. Rows touched are registered, so
    /// [`lp_row_handles_into`](Self::lp_row_handles_into) yields matching
    /// handles.
    pub fn lp_row_duals_into(&mut self, out: &mut [f64]) -> BridgeResult<usize> {
        self.fill_lp_rows(out, |engine, row| engine.row_dual(row))
    }

    pub fn lp_row_farkas_into(&mut self, out: &mut [f64]) -> BridgeResult<usize> {
        self.fill_lp_rows(out, |engine, row| engine.row_farkas(row))
    }

    pub fn lp_row_handles_into(&mut self, out: &mut [i32]) -> BridgeResult<usize> {
        if out.is_empty() {
            return Err(BridgeError::InvalidArgument("empty buffer".to_string()));
        }
        if !self.lp_available() {
            return Ok(0);
        }
        let rows = self.engine.lp_rows();
        let mut written = 0;
        for (slot, &row) in out.iter_mut().zip(rows) {
            *slot = self.registries.rows.register(row)?.raw();
            written += 1;
        }
        Ok(written)
    }

    fn fill_lp_rows(
        &mut self,
        out: &mut [f64],
        value: impl Fn(&E, E::Row) -> f64,
    ) -> BridgeResult<usize> {
        if out.is_empty() {
            return Err(BridgeError::InvalidArgument("empty buffer".to_string()));
        }
        if !self.lp_available() {
            return Ok(0);
        }
        let engine: &E = self.engine;
        let mut written = 0;
        for (slot, &row) in out.iter_mut().zip(engine.lp_rows()) {
            self.registries.rows.register(row)?;
            *slot = value(engine, row);
            written += 1;
        }
        Ok(written)
    }

    // ---- pricing ----

    fn require_round(&self) -> BridgeResult<()> {
        if !self.pricing.in_round() {
            return Err(BridgeError::NotPricing);
        }
        Ok(())
    }

    pub fn set_result(&mut self, result: PricerResult) {
        self.pricing.set_result(result);
    }

    /// Set the pending result from a raw code. Unknown codes are rejected.
    pub fn set_result_code(&mut self, code: i32) -> BridgeResult<()> {
        let result = PricerResult::from_code(code)
            .ok_or_else(|| BridgeError::InvalidArgument(format!("unknown result code {code}")))?;
        self.pricing.set_result(result);
        Ok(())
    }

    pub fn set_lower_bound(&mut self, bound: f64) {
        self.pricing.set_lower_bound(bound);
    }

    pub fn set_stop_early(&mut self, stop: bool) {
        self.pricing.set_stop_early(stop);
    }

    /// Set the pending abort flag; escalation happens when the round ends.
    pub fn set_abort_round(&mut self, abort: bool) {
        self.pricing.set_abort_round(abort);
    }

    /// Abandon the round now and interrupt the solve.
    pub fn abort_round(&mut self) {
        warn!(
            round = self.pricing.round(),
            mode = ?self.pricing.mode(),
            "pricing round aborted, interrupting solve"
        );
        self.pricing.request_abort();
        self.engine.interrupt_solve();
    }

    /// Refuse a malformed pricing write. Inside a round this abandons the
    /// round, the same as a write with an invalid handle.
    pub fn reject_pricing_write<T>(&mut self, reason: impl Into<String>) -> BridgeResult<T> {
        if self.pricing.in_round() {
            self.abort_round();
        }
        Err(BridgeError::InvalidArgument(reason.into()))
    }

    /// Create a priced variable in the transformed problem.
    pub fn add_priced_var(&mut self, name: &str, opts: &VarOptions) -> BridgeResult<Handle> {
        self.require_round()?;
        let added = self
            .engine
            .add_priced_var(name, opts, PRICED_VAR_SCORE)
            .map_err(BridgeError::from)
            .and_then(|var| self.registries.vars.register(var));
        match added {
            Ok(handle) => {
                self.pricing.record_added();
                debug!(name, handle = handle.raw(), obj = opts.obj, "priced variable added");
                Ok(handle)
            }
            Err(err) => {
                self.abort_round();
                Err(err)
            }
        }
    }

    /// Bind a variable into several LP rows. All handles are validated before
    /// anything is applied; any failure aborts the round.
    pub fn add_var_to_rows(&mut self, var: i32, rows: &[i32], vals: &[f64]) -> BridgeResult<()> {
        self.require_round()?;
        let resolved = check_lengths(rows.len(), vals.len()).and_then(|()| {
            let var = self.registries.vars.resolve(var)?;
            let rows = self.registries.rows.resolve_all(rows)?;
            Ok((var, rows))
        });
        let (var, rows) = self.or_abort(resolved)?;
        for (row, &val) in rows.into_iter().zip(vals) {
            let applied = self
                .engine
                .add_var_to_row(row, var, val)
                .map_err(BridgeError::from);
            self.or_abort(applied)?;
        }
        Ok(())
    }

    /// Bind a variable into several linear constraints, all or nothing.
    pub fn add_var_to_conss(&mut self, var: i32, conss: &[i32], vals: &[f64]) -> BridgeResult<()> {
        self.require_round()?;
        let resolved = check_lengths(conss.len(), vals.len()).and_then(|()| {
            let var = self.registries.vars.resolve(var)?;
            let conss = self.registries.conss.resolve_all(conss)?;
            Ok((var, conss))
        });
        let (var, conss) = self.or_abort(resolved)?;
        for (cons, &val) in conss.into_iter().zip(vals) {
            let applied = self
                .engine
                .add_coef_linear(cons, var, val)
                .map_err(BridgeError::from);
            self.or_abort(applied)?;
        }
        Ok(())
    }

    fn or_abort<T>(&mut self, result: BridgeResult<T>) -> BridgeResult<T> {
        if result.is_err() {
            self.abort_round();
        }
        result
    }

    // ---- parameters ----

    pub fn set_int_param(&mut self, name: &str, value: i64) -> BridgeResult<()> {
        Ok(self.engine.set_int_param(name, value)?)
    }

    pub fn set_real_param(&mut self, name: &str, value: f64) -> BridgeResult<()> {
        Ok(self.engine.set_real_param(name, value)?)
    }

    pub fn set_bool_param(&mut self, name: &str, value: bool) -> BridgeResult<()> {
        Ok(self.engine.set_bool_param(name, value)?)
    }

    pub fn set_string_param(&mut self, name: &str, value: &str) -> BridgeResult<()> {
        Ok(self.engine.set_string_param(name, value)?)
    }

    pub fn set_time_limit(&mut self, seconds: f64) -> BridgeResult<()> {
        self.set_real_param(params::TIME_LIMIT, seconds)
    }

    pub fn set_gap(&mut self, gap: f64) -> BridgeResult<()> {
        self.set_real_param(params::GAP_LIMIT, gap)
    }

    pub fn set_cutoff(&mut self, cutoff: f64) -> BridgeResult<()> {
        Ok(self.engine.set_objective_limit(cutoff)?)
    }

    pub fn apply_settings(&mut self, settings: &SolveSettings) -> BridgeResult<()> {
        Ok(settings.apply(self.engine)?)
    }

    // ---- solution ----

    /// Offer a primal point written as `name=value` pairs separated by `;`.
    /// Unknown names and malformed tokens are skipped. Returns whether the
    /// engine stored the point.
    pub fn add_solution_hint(&mut self, hint: &str) -> BridgeResult<bool> {
        self.require_problem()?;
        let values: Vec<_> = parse_solution_hint(hint)
            .filter_map(|(name, value)| self.engine.find_var(name).map(|var| (var, value)))
            .collect();
        if values.is_empty() {
            return Ok(false);
        }
        Ok(self.engine.try_solution(&values)?)
    }

    pub fn objective(&self) -> Option<f64> {
        self.engine.best_objective()
    }

    pub fn var_value(&self, name: &str) -> Option<f64> {
        self.engine
            .find_var(name)
            .and_then(|var| self.engine.solution_value(var))
    }

    pub fn n_vars(&self) -> usize {
        self.engine.vars().len()
    }

    /// Names of the original variables, comma separated.
    pub fn var_names(&self) -> String {
        self.engine
            .vars()
            .into_iter()
            .map(|var| self.engine.var_name(var))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn stats(&self) -> SolveStats {
        SolveStats {
            solving_time: self.engine.solving_time(),
            nodes: self.engine.n_nodes(),
            gap: self.engine.gap(),
            dual_bound: self.engine.dual_bound(),
            primal_bound: self.engine.primal_bound(),
        }
    }

    // ---- diagnostics ----

    pub fn write_lp(&self, path: &Path) -> BridgeResult<()> {
        self.require_problem()?;
        Ok(self.engine.write_lp(path)?)
    }

    pub fn write_mip(
        &self,
        path: &Path,
        generic_names: bool,
        orig_obj: bool,
        lazy_conss: bool,
    ) -> BridgeResult<()> {
        self.require_problem()?;
        Ok(self
            .engine
            .write_mip(path, generic_names, orig_obj, lazy_conss)?)
    }

    /// Write `{prefix}_{mode}_{round}.lp` and return the path written.
    pub fn write_lp_snapshot(&self, prefix: &str) -> BridgeResult<PathBuf> {
        let path = PathBuf::from(format!(
            "{prefix}_{}_{}.lp",
            self.pricing.mode().tag(),
            self.pricing.round()
        ));
        self.write_lp(&path)?;
        Ok(path)
    }
}

fn not_found(kind: HandleKind, name: &str) -> BridgeError {
    BridgeError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn check_lengths(handles: usize, values: usize) -> BridgeResult<()> {
    if handles != values {
        return Err(BridgeError::InvalidArgument(format!(
            "{handles} handles but {values} values"
        )));
    }
    Ok(())
}

/// Split `"x=1;y=2.5"` into `(name, value)` pairs, skipping malformed tokens.
pub fn parse_solution_hint(hint: &str) -> impl Iterator<Item = (&str, f64)> + '_ {
    hint.split(';').filter_map(|token| {
        let (name, value) = token.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        value.trim().parse::<f64>().ok().map(|value| (name, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;
    use crate::pricing::PricingMode;

    struct Fixture {
        engine: MockEngine,
        registries: Registries<MockEngine>,
        pricing: PricingState,
    }

    impl Fixture {
        fn new() -> Self {
            let mut engine = MockEngine::default();
            engine.create_problem("p").unwrap();
            Self {
                engine,
                registries: Registries::new(),
                pricing: PricingState::new(),
            }
        }

        fn session(&mut self) -> Session<'_, MockEngine> {
            Session::new(&mut self.engine, &mut self.registries, &mut self.pricing)
        }
    }

    #[test]
    fn test_parse_solution_hint() {
        let pairs: Vec<_> = parse_solution_hint("x=1; y = 2.5;bad;=3;z=abc;w=").collect();
        assert_eq!(pairs, vec![("x", 1.0), ("y", 2.5)]);
    }

    #[test]
    fn test_add_and_find_return_same_handle() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        let x = s.add_var("x", &VarOptions::default()).unwrap();
        let c = s.add_linear_cons("c", &ConsOptions::default()).unwrap();
        assert_eq!(s.find_var("x").unwrap(), x);
        assert_eq!(s.find_cons("c").unwrap(), c);
        assert!(matches!(
            s.find_var("nope"),
            Err(BridgeError::NotFound { kind: HandleKind::Variable, .. })
        ));
    }

    #[test]
    fn test_add_var_without_problem() {
        let mut fx = Fixture::new();
        fx.engine.free_problem().unwrap();
        let mut s = fx.session();
        assert!(matches!(
            s.add_var("x", &VarOptions::default()),
            Err(BridgeError::NoProblem)
        ));
    }

    #[test]
    fn test_add_coefs_linear_is_all_or_nothing() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        let x = s.add_var("x", &VarOptions::default()).unwrap().raw();
        let y = s.add_var("y", &VarOptions::default()).unwrap().raw();
        let c = s.add_linear_cons("c", &ConsOptions::default()).unwrap().raw();

        assert!(s.add_coefs_linear(c, &[x, 999, y], &[1.0, 2.0, 3.0]).is_err());
        assert!(s.add_coefs_linear(c, &[x, y], &[1.0]).is_err());
        assert!(fx.engine.conss[0].coefs.is_empty());

        let mut s = fx.session();
        s.add_coefs_linear(c, &[x, y], &[1.0, 2.0]).unwrap();
        assert_eq!(fx.engine.conss[0].coefs.len(), 2);
    }

    #[test]
    fn test_lp_queries_outside_solving_are_neutral() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        let x = s.add_var("x", &VarOptions::default()).unwrap().raw();
        let c = s.add_linear_cons("c", &ConsOptions::default()).unwrap().raw();
        assert_eq!(s.var_lp_value(x).unwrap(), 0.0);
        assert_eq!(s.var_redcost(x).unwrap(), 0.0);
        assert_eq!(s.cons_dual(c).unwrap(), 0.0);
        assert!(!s.has_current_lp());
        assert_eq!(s.lp_solstat(), None);
        assert!(matches!(s.n_lp_rows(), Err(BridgeError::WrongStage { .. })));

        let mut buf = [0.0; 4];
        assert_eq!(s.lp_row_duals_into(&mut buf).unwrap(), 0);
        assert!(s.lp_row_duals_into(&mut []).is_err());
        assert!(s.var_lp_value(x + 1).is_err());
    }

    #[test]
    fn test_var_transformed_requires_transformation() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        let x = s.add_var("x", &VarOptions::default()).unwrap().raw();
        assert!(matches!(
            s.var_transformed(x),
            Err(BridgeError::WrongStage { .. })
        ));
    }

    #[test]
    fn test_pricing_writes_require_round() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        let x = s.add_var("x", &VarOptions::default()).unwrap().raw();
        assert!(matches!(
            s.add_priced_var("z", &VarOptions::default()),
            Err(BridgeError::NotPricing)
        ));
        assert!(matches!(
            s.add_var_to_rows(x, &[], &[]),
            Err(BridgeError::NotPricing)
        ));
        assert!(!fx.pricing.abort_requested());
    }

    #[test]
    fn test_invalid_batch_binding_aborts_round() {
        let mut fx = Fixture::new();
        let x = fx.session().add_var("x", &VarOptions::default()).unwrap().raw();
        fx.session()
            .add_linear_cons("c", &ConsOptions::ranged(1.0, f64::INFINITY))
            .unwrap();
        fx.engine.start_solving();
        fx.pricing.begin_round(PricingMode::ReducedCost);

        let mut s = fx.session();
        let mut rows = [0i32; 2];
        assert_eq!(s.lp_row_handles_into(&mut rows).unwrap(), 1);
        assert!(s.add_var_to_rows(x, &[rows[0], 12345], &[1.0, 1.0]).is_err());

        assert!(fx.engine.row_coefs.is_empty());
        assert!(fx.engine.interrupted);
        assert!(fx.pricing.abort_requested());
        assert_eq!(fx.pricing.result(), PricerResult::DidNotRun);
        assert!(fx.pricing.stop_early());
    }

    #[test]
    fn test_rejected_write_aborts_only_inside_a_round() {
        let mut fx = Fixture::new();
        assert!(fx.session().reject_pricing_write::<()>("null name").is_err());
        assert!(!fx.pricing.abort_requested());
        assert!(!fx.engine.interrupted);

        fx.engine.start_solving();
        fx.pricing.begin_round(PricingMode::ReducedCost);
        let err = fx.session().reject_pricing_write::<()>("negative length");
        assert!(matches!(err, Err(BridgeError::InvalidArgument(_))));
        assert!(fx.pricing.abort_requested());
        assert!(fx.engine.interrupted);
        assert_eq!(fx.pricing.result(), PricerResult::DidNotRun);
    }

    #[test]
    fn test_result_code_validation() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        assert!(s.set_result_code(2).is_err());
        s.set_result_code(3).unwrap();
        assert_eq!(fx.pricing.result(), PricerResult::DidNotFind);
        assert_eq!(fx.pricing.last_result(), PricerResult::DidNotFind);
    }

    #[test]
    fn test_solution_hint_ignores_unknown_names() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        s.add_var("x", &VarOptions::default()).unwrap();
        assert!(!s.add_solution_hint("nope=1").unwrap());
        assert!(s.add_solution_hint("x=1;nope=2").unwrap());
        assert_eq!(fx.engine.hints, vec![vec![("x".to_string(), 1.0)]]);
    }

    #[test]
    fn test_var_names_in_creation_order() {
        let mut fx = Fixture::new();
        let mut s = fx.session();
        s.add_var("b", &VarOptions::default()).unwrap();
        s.add_var("a", &VarOptions::default()).unwrap();
        assert_eq!(s.n_vars(), 2);
        assert_eq!(s.var_names(), "b,a");
    }

    #[test]
    fn test_snapshot_path_uses_mode_and_round() {
        let mut fx = Fixture::new();
        fx.pricing.begin_round(PricingMode::Farkas);
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("snap");
        let s = fx.session();
        let path = s.write_lp_snapshot(prefix.to_str().unwrap()).unwrap();
        assert!(path.to_string_lossy().ends_with("snap_farkas_1.lp"));
        assert!(path.exists());
    }
}
