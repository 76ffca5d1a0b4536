use std::collections::HashMap;

use crate::lp_solver::output_suppression::GagHandle;
use crate::lp_solver::*;
use ::coin_cbc::{Model, Sense};
use tracing::debug;

/// Round a floating-point number to a specified number of significant digits
/// This is an workaround to mask floating point errors in CBC.
fn round_to_sig_digits(value: f64, digits: u32) -> f64 {
    if value == 0.0 {
        return 0.0;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10_f64.powi(digits as i32 - magnitude - 1);
    (value * scale).round() / scale
}

/// Solve an LP model using Coin CBC
pub fn solve_coin_cbc<Brand>(
    builder: &LPModelBuilder<Brand>,
    options: &SolverOptions,
) -> Result<LPSolution<Brand>> {
    // CBC prints its progress log on stdout
    let _gag_handle = GagHandle::stdout()?;
    let mut model = Model::default();
    let mut var_map = HashMap::new();

    if let Some(limit) = options.time_limit {
        model.set_parameter("sec", &limit.as_secs_f64().to_string());
    }

    for (idx, var_info) in builder.variables.iter().enumerate() {
        let col = match var_info.var_type {
            VariableType::Continuous => {
                let col = model.add_col();
                model.set_col_lower(col, var_info.lower_bound);
                model.set_col_upper(col, var_info.upper_bound);
                col
            }
            VariableType::Binary => model.add_binary(),
        };
        let var_id = VariableId {
            id: idx,
            _brand: std::marker::PhantomData,
        };
        var_map.insert(var_id, col);
    }

    for constraint in &builder.constraints {
        let row = model.add_row();

        for term in &constraint.expression.terms {
            if let Some(&col) = var_map.get(&term.variable) {
                model.set_weight(row, col, term.coefficient);
            } else {
                return Err(anyhow!(
                    "Variable {:?} not found in model (constraint {})",
                    term.variable,
                    constraint.name()
                ));
            }
        }

        let rhs_adjusted = constraint.rhs - constraint.expression.constant;

        match constraint.sense {
            ConstraintSense::LessEqual => {
                model.set_row_upper(row, rhs_adjusted);
            }
            ConstraintSense::Equal => {
                model.set_row_equal(row, rhs_adjusted);
            }
            ConstraintSense::GreaterEqual => {
                model.set_row_lower(row, rhs_adjusted);
            }
        }
    }

    if let Some(obj_info) = &builder.objective {
        for term in &obj_info.expression.terms {
            if let Some(&col) = var_map.get(&term.variable) {
                model.set_obj_coeff(col, term.coefficient);
            } else {
                return Err(anyhow!(
                    "Variable {:?} not found in model",
                    term.variable
                ));
            }
        }

        let sense = match obj_info.sense {
            OptimisationSense::Minimise => Sense::Minimize,
            OptimisationSense::Maximise => Sense::Maximize,
        };

        model.set_obj_sense(sense);
    }

    let solution = model.solve();
    let raw = solution.raw();

    if raw.is_abandoned() {
        return Err(anyhow!("CBC abandoned the search (numerical difficulties)"));
    }

    let status = if raw.is_proven_optimal() {
        OptimisationStatus::Optimal
    } else if raw.is_proven_infeasible() {
        OptimisationStatus::Infeasible
    } else if raw.is_continuous_unbounded() {
        OptimisationStatus::Unbounded
    } else if raw.is_seconds_limit_reached() {
        // An incumbent at the time limit is usable but unproven
        if raw.best_solution().is_some() {
            OptimisationStatus::OptimalInaccurate
        } else {
            OptimisationStatus::Infeasible
        }
    } else {
        OptimisationStatus::Other("Unknown status")
    };
    debug!(?status, "CBC finished");

    let num_vars = builder.variables.len();
    if !status.has_solution() {
        return Ok(LPSolution::empty(status, num_vars));
    }

    let mut variable_values = vec![0.0; num_vars];
    for (var_id, col) in var_map.iter() {
        variable_values[var_id.id] = round_to_sig_digits(solution.col(*col), 8);
    }

    let objective_value = builder
        .objective
        .as_ref()
        .map(|obj_info| round_to_sig_digits(obj_info.expression.evaluate(&variable_values), 8))
        .unwrap_or(0.0);

    Ok(LPSolution::new(status, objective_value, variable_values))
}
