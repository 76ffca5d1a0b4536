use std::collections::HashMap;

use ::gurobi::{ConstrSense, Env, LinExpr, Model, ModelSense, Status, VarType, attr, param};

use crate::lp_solver::*;

/// Solve an LP model using Gurobi
pub fn solve_gurobi<Brand>(
    builder: &LPModelBuilder<Brand>,
    options: &SolverOptions,
) -> Result<LPSolution<Brand>> {
    let mut env = Env::new("")?;
    env.set(param::OutputFlag, 0)?;
    if let Some(limit) = options.time_limit {
        env.set(param::TimeLimit, limit.as_secs_f64())?;
    }
    let mut model = Model::new("diet", &env)?;

    let mut var_map = HashMap::new();
    for (idx, var_info) in builder.variables.iter().enumerate() {
        let vtype = match var_info.var_type {
            VariableType::Continuous => VarType::Continuous,
            VariableType::Binary => VarType::Binary,
        };

        let var = model.add_var(
            &var_info.name,
            vtype,
            0.0, // objective coefficient
            var_info.lower_bound,
            var_info.upper_bound,
            &[], // coefficients for existing constraints
            &[], // constraint indices
        )?;

        let var_id = VariableId {
            id: idx,
            _brand: std::marker::PhantomData,
        };
        var_map.insert(var_id, var);
    }

    for constraint in &builder.constraints {
        let mut gurobi_expr = LinExpr::new();

        for term in &constraint.expression.terms {
            if let Some(var) = var_map.get(&term.variable) {
                gurobi_expr = gurobi_expr.add_term(term.coefficient, var.clone());
            } else {
                return Err(anyhow!(
                    "Variable {:?} not found in model (constraint {})",
                    term.variable,
                    constraint.name()
                ));
            }
        }
        gurobi_expr = gurobi_expr.add_constant(constraint.expression.constant);

        let sense = match constraint.sense {
            ConstraintSense::LessEqual => ConstrSense::Less,
            ConstraintSense::Equal => ConstrSense::Equal,
            ConstraintSense::GreaterEqual => ConstrSense::Greater,
        };

        model.add_constr(constraint.name(), gurobi_expr, sense, constraint.rhs)?;
    }

    // Update the model before setting objective
    model.update()?;

    if let Some(obj_info) = &builder.objective {
        let mut gurobi_expr = LinExpr::new();

        for term in &obj_info.expression.terms {
            if let Some(var) = var_map.get(&term.variable) {
                gurobi_expr = gurobi_expr.add_term(term.coefficient, var.clone());
            } else {
                return Err(anyhow!(
                    "Variable {:?} not found in model",
                    term.variable
                ));
            }
        }
        gurobi_expr = gurobi_expr.add_constant(obj_info.expression.constant);

        let sense = match obj_info.sense {
            OptimisationSense::Minimise => ModelSense::Minimize,
            OptimisationSense::Maximise => ModelSense::Maximize,
        };

        model.set_objective(gurobi_expr, sense)?;
    }

    model.optimize()?;

    let status = match model.status()? {
        Status::Optimal => OptimisationStatus::Optimal,
        Status::SubOptimal => OptimisationStatus::OptimalInaccurate,
        Status::TimeLimit => {
            if model.get(attr::SolCount)? > 0 {
                OptimisationStatus::OptimalInaccurate
            } else {
                OptimisationStatus::Infeasible
            }
        }
        Status::Infeasible => OptimisationStatus::Infeasible,
        Status::Unbounded => OptimisationStatus::Unbounded,
        Status::InfOrUnbd => OptimisationStatus::InfeasibleOrUnbounded,
        _ => OptimisationStatus::Other("Unknown status"),
    };

    let num_vars = builder.variables.len();
    if !status.has_solution() {
        return Ok(LPSolution::empty(status, num_vars));
    }

    let mut variable_values = vec![0.0; num_vars];
    for (var_id, var) in &var_map {
        variable_values[var_id.id] = var.get(&model, attr::X)?;
    }

    Ok(LPSolution::new(
        status,
        model.get(attr::ObjVal)?,
        variable_values,
    ))
}
