//! CPLEX LP file output.
//!
//! Writes whichever problem is active: the original one before solving,
//! the transformed one (priced columns included) afterwards.

use std::io::{self, Write};

use mipbridge_core::{ObjSense, VarType};

use crate::model::{ConsData, Model, VarData};
use crate::lp::is_infinite;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace names with `x0, x1, ...` and `c0, c1, ...`.
    pub generic_names: bool,
    /// Keep the user's objective sense instead of the internal
    /// minimization form.
    pub orig_obj: bool,
    /// Move removable or dynamic constraints into a lazy section.
    pub lazy_conss: bool,
    /// Emit `General` and `Binary` sections.
    pub integrality: bool,
}

pub struct LpWriter<'a> {
    model: &'a Model,
    sense: ObjSense,
    options: WriteOptions,
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() || c == ':' { '_' } else { c })
        .collect()
}

fn bound(value: f64) -> String {
    if is_infinite(value) {
        if value > 0.0 { "+inf" } else { "-inf" }.to_string()
    } else {
        value.to_string()
    }
}

fn term(coef: f64, name: &str) -> String {
    if coef < 0.0 {
        format!("- {} {}", -coef, name)
    } else {
        format!("+ {} {}", coef, name)
    }
}

impl<'a> LpWriter<'a> {
    pub fn new(model: &'a Model, sense: ObjSense, options: WriteOptions) -> Self {
        Self {
            model,
            sense,
            options,
        }
    }

    fn vars(&self) -> impl Iterator<Item = (usize, &'a VarData)> {
        let model = self.model;
        let start = model.lp_vars().start;
        model.lp_vars().map(move |i| (i - start, &model.vars[i]))
    }

    fn conss(&self) -> impl Iterator<Item = (usize, &'a ConsData)> {
        let model = self.model;
        let start = model.lp_conss().start;
        model.lp_conss().map(move |i| (i - start, &model.conss[i]))
    }

    fn var_name(&self, arena: usize) -> String {
        let start = self.model.lp_vars().start;
        if self.options.generic_names {
            format!("x{}", arena.saturating_sub(start))
        } else {
            sanitize(&self.model.vars[arena].name)
        }
    }

    fn cons_name(&self, pos: usize, cons: &ConsData) -> String {
        if self.options.generic_names {
            format!("c{pos}")
        } else {
            sanitize(&cons.name)
        }
    }

    fn is_lazy(&self, cons: &ConsData) -> bool {
        self.options.lazy_conss && (cons.opts.removable || cons.opts.dynamic)
    }

    pub fn write(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "\\ Problem: {}", sanitize(&self.model.name))?;
        self.write_objective(out)?;

        writeln!(out, "Subject To")?;
        for (pos, cons) in self.conss().filter(|(_, c)| !self.is_lazy(c)) {
            self.write_cons(out, pos, cons)?;
        }
        if self.conss().any(|(_, c)| self.is_lazy(c)) {
            writeln!(out, "Lazy Constraints")?;
            for (pos, cons) in self.conss().filter(|(_, c)| self.is_lazy(c)) {
                self.write_cons(out, pos, cons)?;
            }
        }

        writeln!(out, "Bounds")?;
        for (pos, var) in self.vars() {
            let name = self.var_name(pos + self.model.lp_vars().start);
            self.write_bounds(out, &name, var)?;
        }

        if self.options.integrality {
            self.write_section(out, "General", |v| {
                matches!(v.var_type, VarType::Integer | VarType::ImplInt)
            })?;
            self.write_section(out, "Binary", |v| v.var_type == VarType::Binary)?;
        }
        writeln!(out, "End")
    }

    fn write_objective(&self, out: &mut impl Write) -> io::Result<()> {
        let keep_sense = self.options.orig_obj && self.sense == ObjSense::Maximize;
        writeln!(out, "{}", if keep_sense { "Maximize" } else { "Minimize" })?;
        let sign = if self.sense == ObjSense::Maximize && !keep_sense {
            -1.0
        } else {
            1.0
        };
        let start = self.model.lp_vars().start;
        let terms: Vec<String> = self
            .vars()
            .filter(|(_, v)| v.obj != 0.0)
            .map(|(pos, v)| term(sign * v.obj, &self.var_name(pos + start)))
            .collect();
        if terms.is_empty() {
            writeln!(out, " obj: 0")
        } else {
            writeln!(out, " obj: {}", terms.join(" "))
        }
    }

    fn write_cons(&self, out: &mut impl Write, pos: usize, cons: &ConsData) -> io::Result<()> {
        let name = self.cons_name(pos, cons);
        let mut terms: Vec<String> = cons
            .coefs
            .iter()
            .map(|&(var, coef)| term(coef, &self.var_name(var.index())))
            .collect();
        if terms.is_empty() {
            match self.vars().next() {
                Some((pos, _)) => {
                    terms.push(format!("0 {}", self.var_name(pos + self.model.lp_vars().start)))
                }
                None => return writeln!(out, "\\ empty row {name}"),
            }
        }
        let lhs = terms.join(" ");
        let (lo, hi) = (cons.opts.lhs, cons.opts.rhs);
        match (is_infinite(lo), is_infinite(hi)) {
            (true, true) => writeln!(out, "\\ free row {name}"),
            (false, true) => writeln!(out, " {name}: {lhs} >= {lo}"),
            (true, false) => writeln!(out, " {name}: {lhs} <= {hi}"),
            (false, false) if lo == hi => writeln!(out, " {name}: {lhs} = {lo}"),
            (false, false) => {
                writeln!(out, " {name}_lhs: {lhs} >= {lo}")?;
                writeln!(out, " {name}_rhs: {lhs} <= {hi}")
            }
        }
    }

    fn write_bounds(&self, out: &mut impl Write, name: &str, var: &VarData) -> io::Result<()> {
        let (lb, ub) = (var.lb, var.ub);
        match (is_infinite(lb), is_infinite(ub)) {
            _ if lb == ub => writeln!(out, " {name} = {}", bound(lb)),
            (true, true) => writeln!(out, " {name} free"),
            (false, true) if lb == 0.0 => Ok(()),
            (false, true) => writeln!(out, " {name} >= {}", bound(lb)),
            _ => writeln!(out, " {} <= {name} <= {}", bound(lb), bound(ub)),
        }
    }

    fn write_section(
        &self,
        out: &mut impl Write,
        title: &str,
        select: impl Fn(&VarData) -> bool,
    ) -> io::Result<()> {
        let start = self.model.lp_vars().start;
        let names: Vec<String> = self
            .vars()
            .filter(|(_, v)| select(v))
            .map(|(pos, _)| self.var_name(pos + start))
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        writeln!(out, "{title}")?;
        writeln!(out, " {}", names.join(" "))
    }
}
