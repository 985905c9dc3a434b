//! Node LP relaxations, solved with Clarabel.
//!
//! An [`LpModel`] is rewritten into Clarabel's conic standard form
//!
//! ```text
//! minimize    c'x
//! subject to  Ax + s = b,   s ∈ {0}^k × R+^m
//! ```
//!
//! with one zero-cone row per equality and one non-negative row per finite
//! side of every range row and column bound. Row duals and Farkas
//! multipliers are folded back from the conic duals `z`; reduced costs are
//! `c - A'y` over the model rows.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use tracing::{trace, warn};

/// Values at or beyond this magnitude are treated as infinite.
pub const INFINITY: f64 = 1e20;

const FEAS_TOL: f64 = 1e-7;
/// Farkas entries smaller than this, relative to the largest, are zeroed.
const CERT_TOL: f64 = 1e-7;

pub fn is_infinite(value: f64) -> bool {
    value.abs() >= INFINITY
}

/// `lhs <= sum(coef * x[col]) <= rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct LpRow {
    pub coefs: Vec<(usize, f64)>,
    pub lhs: f64,
    pub rhs: f64,
}

/// Minimize `cost · x` subject to `rows` and `lb <= x <= ub`.
#[derive(Debug, Clone, Default)]
pub struct LpModel {
    pub cost: Vec<f64>,
    pub lb: Vec<f64>,
    pub ub: Vec<f64>,
    pub rows: Vec<LpRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The interior-point method stopped without a certificate (iteration or
    /// time limit, numerical trouble).
    NotConverged,
}

#[derive(Debug, Clone)]
pub struct LpSolution {
    pub status: LpStatus,
    pub objective: f64,
    pub x: Vec<f64>,
    /// Row duals in minimization form; `>= 0` on active `>=` rows.
    pub duals: Vec<f64>,
    /// Farkas multipliers, non-zero only when infeasible, scaled so the
    /// largest magnitude is 1. A column `a` weakens the certificate when
    /// `farkas · a > 0`.
    pub farkas: Vec<f64>,
    pub redcosts: Vec<f64>,
    pub iterations: usize,
}

impl LpSolution {
    fn empty(status: LpStatus, n_cols: usize, n_rows: usize) -> Self {
        Self {
            status,
            objective: 0.0,
            x: vec![0.0; n_cols],
            duals: vec![0.0; n_rows],
            farkas: vec![0.0; n_rows],
            redcosts: vec![0.0; n_cols],
            iterations: 0,
        }
    }
}

/// Model row a conic row was generated from.
#[derive(Debug, Clone, Copy)]
enum Origin {
    /// `a·x = rhs`
    Equal(usize),
    /// `a·x <= rhs`
    Upper(usize),
    /// `a·x >= lhs`, stored negated.
    Lower(usize),
    /// Column bound. Its multiplier ends up in the reduced cost.
    Bound,
}

#[derive(Debug)]
struct ConicRow {
    coefs: Vec<(usize, f64)>,
    rhs: f64,
    origin: Origin,
}

/// Rows of `Ax + s = b`, zero-cone block first.
#[derive(Debug, Default)]
struct ConicForm {
    equal: Vec<ConicRow>,
    inequal: Vec<ConicRow>,
}

impl ConicForm {
    fn build(model: &LpModel) -> Self {
        let mut form = Self::default();
        for (i, row) in model.rows.iter().enumerate() {
            form.push_range(
                &row.coefs,
                row.lhs,
                row.rhs,
                [Origin::Equal(i), Origin::Lower(i), Origin::Upper(i)],
            );
        }
        for (j, (&lb, &ub)) in model.lb.iter().zip(&model.ub).enumerate() {
            form.push_range(&[(j, 1.0)], lb, ub, [Origin::Bound; 3]);
        }
        form
    }

    /// `[equal, lower, upper]` origins for one range.
    fn push_range(&mut self, coefs: &[(usize, f64)], lhs: f64, rhs: f64, origins: [Origin; 3]) {
        let [equal, lower, upper] = origins;
        let has_lhs = !is_infinite(lhs);
        let has_rhs = !is_infinite(rhs);
        if has_lhs && has_rhs && lhs == rhs {
            self.equal.push(ConicRow {
                coefs: coefs.to_vec(),
                rhs,
                origin: equal,
            });
            return;
        }
        if has_lhs {
            self.inequal.push(ConicRow {
                coefs: coefs.iter().map(|&(j, a)| (j, -a)).collect(),
                rhs: -lhs,
                origin: lower,
            });
        }
        if has_rhs {
            self.inequal.push(ConicRow {
                coefs: coefs.to_vec(),
                rhs,
                origin: upper,
            });
        }
    }

    fn rows(&self) -> impl Iterator<Item = &ConicRow> {
        self.equal.iter().chain(&self.inequal)
    }

    fn is_empty(&self) -> bool {
        self.equal.is_empty() && self.inequal.is_empty()
    }

    /// `A` in CSC form, `b`, and the cone list.
    fn assemble(&self, n_cols: usize) -> (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>) {
        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_cols];
        let mut b = Vec::with_capacity(self.equal.len() + self.inequal.len());
        for (r, row) in self.rows().enumerate() {
            for &(j, a) in &row.coefs {
                let column = &mut columns[j];
                // Rows arrive in order, so a repeated column shows up last.
                match column.last_mut() {
                    Some((last, value)) if *last == r => *value += a,
                    _ => column.push((r, a)),
                }
            }
            b.push(row.rhs);
        }

        let mut col_ptr = Vec::with_capacity(n_cols + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        for column in &columns {
            col_ptr.push(row_idx.len());
            for &(r, a) in column {
                row_idx.push(r);
                values.push(a);
            }
        }
        col_ptr.push(row_idx.len());

        let mut cones = Vec::with_capacity(2);
        if !self.equal.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(self.equal.len()));
        }
        if !self.inequal.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(self.inequal.len()));
        }
        let a = CscMatrix::new(b.len(), n_cols, col_ptr, row_idx, values);
        (a, b, cones)
    }

    /// Map conic duals onto model rows (minimization form).
    fn fold(&self, z: &[f64], n_rows: usize) -> Vec<f64> {
        let mut y = vec![0.0; n_rows];
        for (row, &zr) in self.rows().zip(z) {
            match row.origin {
                Origin::Equal(i) | Origin::Upper(i) => y[i] -= zr,
                Origin::Lower(i) => y[i] += zr,
                Origin::Bound => {}
            }
        }
        y
    }
}

fn bounds_conflict(model: &LpModel) -> bool {
    model
        .lb
        .iter()
        .zip(&model.ub)
        .any(|(&lb, &ub)| !is_infinite(lb) && !is_infinite(ub) && lb > ub + FEAS_TOL)
}

/// Models that need no solver: no columns, or no constraints at all.
fn solve_trivial(model: &LpModel, form: &ConicForm) -> Option<LpSolution> {
    let n = model.cost.len();
    let n_rows = model.rows.len();
    if n == 0 {
        // Every row activity is zero.
        let farkas: Vec<f64> = model
            .rows
            .iter()
            .map(|row| {
                if !is_infinite(row.lhs) && row.lhs > FEAS_TOL {
                    1.0
                } else if !is_infinite(row.rhs) && row.rhs < -FEAS_TOL {
                    -1.0
                } else {
                    0.0
                }
            })
            .collect();
        if farkas.iter().all(|&f| f == 0.0) {
            return Some(LpSolution::empty(LpStatus::Optimal, 0, n_rows));
        }
        let mut sol = LpSolution::empty(LpStatus::Infeasible, 0, n_rows);
        sol.farkas = farkas;
        return Some(sol);
    }
    if form.is_empty() {
        let status = if model.cost.iter().any(|&c| c != 0.0) {
            LpStatus::Unbounded
        } else {
            LpStatus::Optimal
        };
        return Some(LpSolution::empty(status, n, n_rows));
    }
    None
}

fn normalized_certificate(mut farkas: Vec<f64>) -> Vec<f64> {
    let scale = farkas.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale > 0.0 && scale.is_finite() {
        for value in &mut farkas {
            *value /= scale;
            if value.abs() < CERT_TOL {
                *value = 0.0;
            }
        }
    }
    farkas
}

/// Solve `model` to optimality, or prove it infeasible or unbounded.
pub fn solve_lp(model: &LpModel) -> LpSolution {
    let n = model.cost.len();
    let n_rows = model.rows.len();
    if bounds_conflict(model) {
        return LpSolution::empty(LpStatus::Infeasible, n, n_rows);
    }

    let form = ConicForm::build(model);
    if let Some(sol) = solve_trivial(model, &form) {
        return sol;
    }

    let (a, b, cones) = form.assemble(n);
    let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
    let settings = match DefaultSettingsBuilder::default().verbose(false).build() {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = ?err, "Clarabel settings rejected");
            return LpSolution::empty(LpStatus::NotConverged, n, n_rows);
        }
    };
    let mut solver = match DefaultSolver::new(&p, &model.cost, &a, &b, &cones, settings) {
        Ok(solver) => solver,
        Err(err) => {
            warn!(error = ?err, "Clarabel initialization failed");
            return LpSolution::empty(LpStatus::NotConverged, n, n_rows);
        }
    };
    solver.solve();

    let sol = &solver.solution;
    let iterations = sol.iterations as usize;
    trace!(status = ?sol.status, iterations, rows = b.len(), cols = n, "Clarabel finished");

    match sol.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {
            let x = sol.x.clone();
            let duals = form.fold(&sol.z, n_rows);
            let mut redcosts = model.cost.clone();
            for (row, &dual) in model.rows.iter().zip(&duals) {
                for &(j, coef) in &row.coefs {
                    redcosts[j] -= coef * dual;
                }
            }
            let objective = model.cost.iter().zip(&x).map(|(c, v)| c * v).sum();
            LpSolution {
                status: LpStatus::Optimal,
                objective,
                x,
                duals,
                farkas: vec![0.0; n_rows],
                redcosts,
                iterations,
            }
        }
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            let mut out = LpSolution::empty(LpStatus::Infeasible, n, n_rows);
            out.farkas = normalized_certificate(form.fold(&sol.z, n_rows));
            out.iterations = iterations;
            out
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            let mut out = LpSolution::empty(LpStatus::Unbounded, n, n_rows);
            out.iterations = iterations;
            out
        }
        status => {
            warn!(?status, "Clarabel stopped without a result");
            let mut out = LpSolution::empty(LpStatus::NotConverged, n, n_rows);
            out.iterations = iterations;
            out
        }
    }
}
