// Copyright 2024 by the degopt contributors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

//! A small, generic mixed-integer linear program representation.
//!
//! The model builder assembles a [`MilpModel`] out of named binary and
//! continuous variables, a minimization objective and labeled linear
//! constraints. The model can be written out in CPLEX LP format (the audit
//! artifact consumed by external tools) and is handed to the solver driver
//! for the actual solve. Expressions keep their terms in a `BTreeMap` keyed
//! by variable id, so repeated `add_term` calls merge coefficients and the
//! emitted model is deterministic for diffing.

use std::collections::BTreeMap;
use std::io;

/// Index of a variable within its model.
pub type VarId = usize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VarKind {
    Binary,
    /// Continuous with the given lower bound (no upper bound)
    Continuous { lower: f64 },
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
}

/// Comparison sense of a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn symbol(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

/// A linear expression over model variables (no constant part; constants live
/// on the constraint's right-hand side).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinExpr {
    terms: BTreeMap<VarId, f64>,
}

impl LinExpr {
    pub fn new() -> LinExpr {
        LinExpr::default()
    }

    /// Add `coef * var`, merging with an existing coefficient of `var`.
    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut LinExpr {
        *self.terms.entry(var).or_insert(0.0) += coef;
        self
    }

    /// Terms in ascending variable-id order, zero coefficients skipped.
    pub fn terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.terms
            .iter()
            .filter(|(_, c)| **c != 0.0)
            .map(|(v, c)| (*v, *c))
    }

    pub fn is_empty(&self) -> bool {
        self.terms().next().is_none()
    }
}

#[derive(Clone, Debug)]
pub struct Constraint {
    /// Unique label, shows up in the LP artifact
    pub label: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// A minimization MILP.
#[derive(Clone, Debug, Default)]
pub struct MilpModel {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinExpr,
}

impl MilpModel {
    pub fn new() -> MilpModel {
        MilpModel::default()
    }

    pub fn binary(&mut self, name: String) -> VarId {
        self.variables.push(Variable {
            name,
            kind: VarKind::Binary,
        });
        self.variables.len() - 1
    }

    pub fn continuous(&mut self, name: String, lower: f64) -> VarId {
        self.variables.push(Variable {
            name,
            kind: VarKind::Continuous { lower },
        });
        self.variables.len() - 1
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn constrain(&mut self, label: String, expr: LinExpr, sense: Sense, rhs: f64) {
        self.constraints.push(Constraint {
            label,
            expr,
            sense,
            rhs,
        });
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.variables[var].name
    }

    /// Write the model in CPLEX LP format.
    pub fn write_lp<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "\\ generated by degopt")?;
        writeln!(writer, "Minimize")?;
        writeln!(writer, " obj:{}", self.format_expr(&self.objective))?;
        writeln!(writer, "Subject To")?;
        for constraint in self.constraints.iter() {
            writeln!(
                writer,
                " {}:{} {} {}",
                constraint.label,
                self.format_expr(&constraint.expr),
                constraint.sense.symbol(),
                format_num(constraint.rhs)
            )?;
        }
        let bounded: Vec<&Variable> = self
            .variables
            .iter()
            .filter(|v| matches!(v.kind, VarKind::Continuous { .. }))
            .collect();
        if !bounded.is_empty() {
            writeln!(writer, "Bounds")?;
            for var in bounded {
                if let VarKind::Continuous { lower } = var.kind {
                    writeln!(writer, " {} >= {}", var.name, format_num(lower))?;
                }
            }
        }
        let binaries: Vec<&str> = self
            .variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .map(|v| v.name.as_str())
            .collect();
        if !binaries.is_empty() {
            writeln!(writer, "Binaries")?;
            for chunk in binaries.chunks(8) {
                writeln!(writer, " {}", chunk.join(" "))?;
            }
        }
        writeln!(writer, "End")?;
        Ok(())
    }

    fn format_expr(&self, expr: &LinExpr) -> String {
        let mut out = String::new();
        for (var, coef) in expr.terms() {
            if out.is_empty() {
                if coef < 0.0 {
                    out.push_str(" -");
                }
            } else if coef < 0.0 {
                out.push_str(" -");
            } else {
                out.push_str(" +");
            }
            let abs = coef.abs();
            if abs == 1.0 {
                out.push_str(&format!(" {}", self.var_name(var)));
            } else {
                out.push_str(&format!(" {} {}", format_num(abs), self.var_name(var)));
            }
        }
        if out.is_empty() {
            out.push_str(" 0");
        }
        out
    }
}

fn format_num(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Turn an arbitrary identifier (e.g. a course code with `/` in it) into an
/// LP-safe variable-name fragment.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
