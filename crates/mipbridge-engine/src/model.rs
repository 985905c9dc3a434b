//! Variable and constraint arenas.
//!
//! Original objects occupy the front of each arena. Transforming appends one
//! twin per original, and priced variables are appended after the twins, so
//! freeing the transformed problem is a truncation.

use mipbridge_core::{ConsOptions, VarOptions, VarType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsId(pub(crate) u32);

/// Position of a transformed constraint's row in the LP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) u32);

impl VarId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConsId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl RowId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct VarData {
    pub name: String,
    pub lb: f64,
    pub ub: f64,
    pub obj: f64,
    pub var_type: VarType,
    pub initial: bool,
    pub removable: bool,
    pub transformed: bool,
    pub twin: Option<VarId>,
}

impl VarData {
    pub fn new(name: &str, opts: &VarOptions, transformed: bool) -> Self {
        let (lb, ub) = match opts.var_type {
            VarType::Binary => (opts.lb.max(0.0), opts.ub.min(1.0)),
            _ => (opts.lb, opts.ub),
        };
        Self {
            name: name.to_string(),
            lb,
            ub,
            obj: opts.obj,
            var_type: opts.var_type,
            initial: opts.initial,
            removable: opts.removable,
            transformed,
            twin: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsData {
    pub name: String,
    pub opts: ConsOptions,
    pub coefs: Vec<(VarId, f64)>,
    pub transformed: bool,
    pub twin: Option<ConsId>,
}

impl ConsData {
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefs
            .iter()
            .map(|&(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub vars: Vec<VarData>,
    pub conss: Vec<ConsData>,
    pub n_orig_vars: usize,
    pub n_orig_conss: usize,
    pub transformed: bool,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn var(&self, var: VarId) -> Option<&VarData> {
        self.vars.get(var.index())
    }

    pub fn cons(&self, cons: ConsId) -> Option<&ConsData> {
        self.conss.get(cons.index())
    }

    pub fn push_var(&mut self, data: VarData) -> VarId {
        self.vars.push(data);
        VarId(self.vars.len() as u32 - 1)
    }

    pub fn push_cons(&mut self, data: ConsData) -> ConsId {
        self.conss.push(data);
        ConsId(self.conss.len() as u32 - 1)
    }

    /// Map an original variable to its twin once transformed.
    pub fn active_var(&self, var: VarId) -> VarId {
        self.var(var).and_then(|v| v.twin).unwrap_or(var)
    }

    pub fn active_cons(&self, cons: ConsId) -> ConsId {
        self.cons(cons).and_then(|c| c.twin).unwrap_or(cons)
    }

    /// Look up by name, preferring transformed objects once they exist.
    pub fn find_var(&self, name: &str) -> Option<VarId> {
        let by_name = |(i, v): (usize, &VarData)| (v.name == name).then_some(VarId(i as u32));
        self.vars
            .iter()
            .enumerate()
            .skip(self.n_orig_vars)
            .find_map(by_name)
            .or_else(|| self.vars.iter().enumerate().find_map(by_name))
    }

    pub fn find_cons(&self, name: &str) -> Option<ConsId> {
        let by_name = |(i, c): (usize, &ConsData)| (c.name == name).then_some(ConsId(i as u32));
        self.conss
            .iter()
            .enumerate()
            .skip(self.n_orig_conss)
            .find_map(by_name)
            .or_else(|| self.conss.iter().enumerate().find_map(by_name))
    }

    pub fn var_name_taken(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name)
    }

    pub fn cons_name_taken(&self, name: &str) -> bool {
        self.conss.iter().any(|c| c.name == name)
    }

    /// Create twins for every original variable and constraint.
    pub fn transform(&mut self) {
        self.n_orig_vars = self.vars.len();
        self.n_orig_conss = self.conss.len();
        for i in 0..self.n_orig_vars {
            let mut twin = self.vars[i].clone();
            twin.name = format!("t_{}", twin.name);
            twin.transformed = true;
            twin.twin = None;
            let id = self.push_var(twin);
            self.vars[i].twin = Some(id);
        }
        for i in 0..self.n_orig_conss {
            let mut twin = self.conss[i].clone();
            twin.transformed = true;
            twin.twin = None;
            for (var, _) in twin.coefs.iter_mut() {
                *var = self.active_var(*var);
            }
            let id = self.push_cons(twin);
            self.conss[i].twin = Some(id);
        }
        self.transformed = true;
    }

    /// Drop twins and priced variables.
    pub fn free_transform(&mut self) {
        if !self.transformed {
            return;
        }
        self.vars.truncate(self.n_orig_vars);
        self.conss.truncate(self.n_orig_conss);
        for var in &mut self.vars {
            var.twin = None;
        }
        for cons in &mut self.conss {
            cons.twin = None;
        }
        self.transformed = false;
    }

    /// Transformed variables in LP column order.
    pub fn lp_vars(&self) -> std::ops::Range<usize> {
        if self.transformed {
            self.n_orig_vars..self.vars.len()
        } else {
            0..self.vars.len()
        }
    }

    /// Constraints in LP row order.
    pub fn lp_conss(&self) -> std::ops::Range<usize> {
        if self.transformed {
            self.n_orig_conss..self.conss.len()
        } else {
            0..self.conss.len()
        }
    }

    pub fn row_of(&self, cons: ConsId) -> Option<RowId> {
        if !self.transformed {
            return None;
        }
        let active = self.active_cons(cons).index();
        (active >= self.n_orig_conss && active < self.conss.len())
            .then(|| RowId((active - self.n_orig_conss) as u32))
    }

    pub fn row_cons(&self, row: RowId) -> Option<&ConsData> {
        self.conss.get(self.n_orig_conss + row.index())
    }

    pub fn row_cons_mut(&mut self, row: RowId) -> Option<&mut ConsData> {
        let index = self.n_orig_conss + row.index();
        self.conss.get_mut(index)
    }
}
