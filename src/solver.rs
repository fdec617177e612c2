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

//! The solver driver: hands an assembled [`MilpModel`] to the MILP backend
//! (`good_lp` with the pure-Rust microlp solver), writes the audit artifacts
//! and reads the schedule back out of the solution.
//!
//! The driver owns the whole solver session; there is no retry and no
//! partial-solution salvage. Infeasibility is a regular, typed result.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time;

use good_lp::{
    constraint, default_solver, Expression, ProblemVariables, ResolutionError, Solution as _,
    SolverModel,
};
use log::{debug, info};

use crate::lp::{MilpModel, Sense, VarKind};
use crate::model::PlanVars;
use crate::solution::Schedule;

/// Error conditions of a solve.
#[derive(Debug)]
pub enum SolveError {
    /// The model admits no feasible plan
    Infeasible,
    /// The model is unbounded (indicates an inconsistent objective)
    Unbounded,
    /// The solver backend failed; the model artifact (if written) helps
    /// reproducing the failure
    Solver {
        message: String,
        model_path: Option<PathBuf>,
    },
    /// An audit artifact could not be written
    Io(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Infeasible => write!(f, "model infeasible or unsolvable"),
            SolveError::Unbounded => write!(f, "model unbounded"),
            SolveError::Solver {
                message,
                model_path,
            } => {
                write!(f, "solver failure: {}", message)?;
                if let Some(path) = model_path {
                    write!(f, " (assembled model at {})", path.display())?;
                }
                Ok(())
            }
            SolveError::Io(message) => write!(f, "could not write artifact: {}", message),
        }
    }
}

/// Statistics of a completed solve.
pub struct SolveStats {
    pub num_variables: usize,
    pub num_constraints: usize,
    pub objective: f64,
    pub solve_time: time::Duration,
}

impl fmt::Display for SolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Solving statistics:
Variables:    {: >6}
Constraints:  {: >6}
Objective:    {:.4}
Solve time:   {:.3}s\n",
            self.num_variables,
            self.num_constraints,
            self.objective,
            self.solve_time.as_millis() as f32 / 1000f32
        )
    }
}

/// Solve the model and read the term assignment out of the optimal solution.
///
/// If `model_path` is given, the LP-format model artifact is written before
/// solving; if `solution_path` is given, a `name=value` line per variable is
/// written afterwards.
pub fn solve(
    model: &MilpModel,
    vars: &PlanVars,
    model_path: Option<&Path>,
    solution_path: Option<&Path>,
) -> Result<(Schedule, SolveStats), SolveError> {
    if let Some(path) = model_path {
        write_model_artifact(model, path)?;
        debug!("Model artifact written to {}.", path.display());
    }

    // Mirror the model's variables into the backend, in declaration order, so
    // our VarIds index straight into this list.
    let mut problem_vars = ProblemVariables::new();
    let backend_vars: Vec<good_lp::Variable> = model
        .variables()
        .iter()
        .map(|v| match v.kind {
            VarKind::Binary => problem_vars.add(good_lp::variable().binary()),
            VarKind::Continuous { lower } => problem_vars.add(good_lp::variable().min(lower)),
        })
        .collect();

    let mut objective = Expression::default();
    for (var, coef) in model.objective().terms() {
        objective += coef * backend_vars[var];
    }

    let mut problem = problem_vars.minimise(objective.clone()).using(default_solver);
    for con in model.constraints() {
        let mut expr = Expression::default();
        for (var, coef) in con.expr.terms() {
            expr += coef * backend_vars[var];
        }
        problem = problem.with(match con.sense {
            Sense::Le => constraint::leq(expr, con.rhs),
            Sense::Ge => constraint::geq(expr, con.rhs),
            Sense::Eq => constraint::eq(expr, con.rhs),
        });
    }

    info!(
        "Solving model with {} variables and {} constraints ...",
        model.num_variables(),
        model.num_constraints()
    );
    let tic = time::Instant::now();
    let solution = problem.solve().map_err(|e| match e {
        ResolutionError::Infeasible => SolveError::Infeasible,
        ResolutionError::Unbounded => SolveError::Unbounded,
        other => SolveError::Solver {
            message: other.to_string(),
            model_path: model_path.map(Path::to_path_buf),
        },
    })?;
    let solve_time = tic.elapsed();

    let values: Vec<f64> = backend_vars.iter().map(|v| solution.value(*v)).collect();
    if let Some(path) = solution_path {
        write_solution_artifact(model, &values, path)?;
        debug!("Solution artifact written to {}.", path.display());
    }

    let stats = SolveStats {
        num_variables: model.num_variables(),
        num_constraints: model.num_constraints(),
        objective: solution.eval(&objective),
        solve_time,
    };
    Ok((extract_schedule(vars, &values), stats))
}

/// Convert the binary slot variables of a solution into the term-assignment
/// map (slot 0 marks passed courses).
fn extract_schedule(vars: &PlanVars, values: &[f64]) -> Schedule {
    let terms = vars
        .slot
        .iter()
        .map(|slots| {
            slots
                .iter()
                .position(|v| values[*v] > 0.5)
                .map(|s| s as u32)
        })
        .collect();
    Schedule::new(terms)
}

fn write_model_artifact(model: &MilpModel, path: &Path) -> Result<(), SolveError> {
    let file = File::create(path)
        .map_err(|e| SolveError::Io(format!("{}: {}", path.display(), e)))?;
    model
        .write_lp(file)
        .map_err(|e| SolveError::Io(format!("{}: {}", path.display(), e)))
}

fn write_solution_artifact(
    model: &MilpModel,
    values: &[f64],
    path: &Path,
) -> Result<(), SolveError> {
    let mut file = File::create(path)
        .map_err(|e| SolveError::Io(format!("{}: {}", path.display(), e)))?;
    for (var, value) in values.iter().enumerate() {
        writeln!(file, "{}={}", model.var_name(var), value)
            .map_err(|e| SolveError::Io(format!("{}: {}", path.display(), e)))?;
    }
    Ok(())
}
