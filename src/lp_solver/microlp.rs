//! Pure Rust backend built on `microlp`.
//!
//! microlp solves the LP relaxation with a simplex method and handles binary
//! variables by branch-and-bound, so it can take every model this crate builds.
//! It is always compiled in and serves as the default selection.

use ::microlp::{ComparisonOp, OptimizationDirection, Problem};
use tracing::debug;

use crate::lp_solver::*;

/// Whether a row is satisfied by any assignment (an infinite bound on its open side).
fn is_vacuous(sense: ConstraintSense, rhs: f64) -> bool {
    match sense {
        ConstraintSense::LessEqual => rhs == f64::INFINITY,
        ConstraintSense::GreaterEqual => rhs == f64::NEG_INFINITY,
        ConstraintSense::Equal => false,
    }
}

/// Whether a row with no variable terms holds for the constant left-hand side 0.
fn holds_without_terms(sense: ConstraintSense, rhs: f64) -> bool {
    match sense {
        ConstraintSense::LessEqual => 0.0 <= rhs,
        ConstraintSense::Equal => rhs == 0.0,
        ConstraintSense::GreaterEqual => 0.0 >= rhs,
    }
}

/// Solve an LP model using microlp
pub fn solve_microlp<Brand>(
    builder: &LPModelBuilder<Brand>,
    options: &SolverOptions,
) -> Result<LPSolution<Brand>> {
    if let Some(limit) = options.time_limit {
        debug!(?limit, "microlp does not support time limits, ignoring");
    }

    let num_vars = builder.variables.len();

    let (direction, objective_constant) = match &builder.objective {
        Some(obj_info) => (
            match obj_info.sense {
                OptimisationSense::Minimise => OptimizationDirection::Minimize,
                OptimisationSense::Maximise => OptimizationDirection::Maximize,
            },
            obj_info.expression.constant,
        ),
        None => (OptimizationDirection::Minimize, 0.0),
    };

    let mut obj_coeffs = vec![0.0; num_vars];
    if let Some(obj_info) = &builder.objective {
        for (idx, coefficient) in obj_info.expression.compact() {
            obj_coeffs[idx] = coefficient;
        }
    }

    if let Some(empty) = builder
        .variables
        .iter()
        .find(|v| v.var_type == VariableType::Continuous && v.lower_bound > v.upper_bound)
    {
        return Err(anyhow!(
            "variable {} has empty bounds [{}, {}]",
            empty.name,
            empty.lower_bound,
            empty.upper_bound
        ));
    }

    let mut problem = Problem::new(direction);

    let vars: Vec<_> = builder
        .variables
        .iter()
        .zip(&obj_coeffs)
        .map(|(var_info, &coefficient)| match var_info.var_type {
            VariableType::Continuous => {
                problem.add_var(coefficient, (var_info.lower_bound, var_info.upper_bound))
            }
            VariableType::Binary => problem.add_binary_var(coefficient),
        })
        .collect();

    let mut skipped = 0usize;
    for constraint in &builder.constraints {
        let terms = constraint.expression.compact();
        let rhs = constraint.rhs - constraint.expression.constant;

        if is_vacuous(constraint.sense, rhs) {
            skipped += 1;
            continue;
        }

        if terms.is_empty() {
            if holds_without_terms(constraint.sense, rhs) {
                skipped += 1;
                continue;
            }
            debug!(
                constraint = constraint.name(),
                rhs, "constant row cannot be satisfied"
            );
            return Ok(LPSolution::empty(OptimisationStatus::Infeasible, num_vars));
        }

        let op = match constraint.sense {
            ConstraintSense::LessEqual => ComparisonOp::Le,
            ConstraintSense::Equal => ComparisonOp::Eq,
            ConstraintSense::GreaterEqual => ComparisonOp::Ge,
        };

        problem.add_constraint(
            terms.into_iter().map(|(idx, coefficient)| (vars[idx], coefficient)),
            op,
            rhs,
        );
    }

    debug!(
        variables = num_vars,
        rows = builder.constraints.len() - skipped,
        skipped,
        "microlp problem assembled"
    );

    match problem.solve() {
        Ok(solution) => {
            let variable_values: Vec<f64> = vars.iter().map(|v| *solution.var_value(*v)).collect();
            Ok(LPSolution::new(
                OptimisationStatus::Optimal,
                solution.objective() + objective_constant,
                variable_values,
            ))
        }
        Err(::microlp::Error::Infeasible) => {
            Ok(LPSolution::empty(OptimisationStatus::Infeasible, num_vars))
        }
        Err(::microlp::Error::Unbounded) => {
            Ok(LPSolution::empty(OptimisationStatus::Unbounded, num_vars))
        }
        Err(err) => Err(anyhow!("microlp failed: {}", err)),
    }
}
