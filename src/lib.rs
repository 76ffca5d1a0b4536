//! Least-cost diet optimisation
//!
//! This library picks how many grams of each food in a catalog to buy so that the
//! total price is minimal while the plan meets a set of nutritional bounds:
//! calorie and macronutrient ranges, mineral minima, sugar, sodium, cholesterol
//! and saturated fat ceilings, and optionally a minimum number of distinct food
//! categories.
//!
//! # Overview
//!
//! A request flows through four stages:
//!
//! 1. **Loading** ([`dataset`]): read and clean a CSV food catalog
//! 2. **Model construction** ([`optimise`]): turn per-100 g nutrient columns into
//!    per-gram coefficient vectors ([`nutrients`]) and build a linear program, or a
//!    mixed-integer program when category diversity is requested
//! 3. **Solving** ([`lp_solver`]): submit the model to an ordered chain of solver
//!    backends, falling through to the next on failure
//! 4. **Reporting** ([`report`]): shopping list, nutrient totals and CSV export
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use dietopt::optimise::{Profile, optimise_diet};
//! use dietopt::read_file;
//! use std::path::Path;
//!
//! let foods = read_file(Path::new("foods.csv"))?;
//! let plan = optimise_diet(&foods, &Profile::AdultFemale.config())?;
//!
//! if let Some(solution) = &plan.solution {
//!     println!("{}: ${:.2}", plan.status, solution.total_cost);
//! }
//! # Ok(())
//! # }
//! ```

use clap::Parser;
use std::{error::Error, fmt};

pub mod dataset;
pub mod lp_solver;
pub mod nutrients;
pub mod optimise;
pub mod report;

pub use dataset::read_file;
pub use optimise::{OptimiseArgs, ProfilesArgs, optimise_main, profiles_main};

use lp_solver::SolverFailure;

/// Application-level errors.
#[derive(Debug, PartialEq, Eq)]
pub enum AppError {
    /// The bounds admit no plan
    Infeasible,
    /// The catalog lacks required columns
    MissingColumns(Vec<String>),
    /// No food is left after cleaning and filtering
    NoFoods,
    /// Every solver backend failed
    SolverChainExhausted(Vec<SolverFailure>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Infeasible => write!(f, "Problem Infeasible"),
            AppError::MissingColumns(columns) => {
                write!(f, "Missing required columns: {}", columns.join(", "))
            }
            AppError::NoFoods => write!(f, "No foods available with the selected categories"),
            AppError::SolverChainExhausted(failures) => {
                write!(f, "All solvers failed")?;
                for failure in failures {
                    write!(f, "; {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for AppError {}

/// Command-line interface arguments.
#[derive(Debug, Parser)]
#[clap(
    name = "dietopt",
    about = "Least-cost diet optimiser over a food nutrient catalog"
)]
pub enum CLIArguments {
    /// Find the cheapest set of foods meeting the nutritional bounds.
    Optimise(OptimiseArgs),
    /// List the built-in requirement profiles.
    Profiles(ProfilesArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_solver::SolverBackend;

    #[test]
    fn test_exhausted_chain_message_lists_failures() {
        let err = AppError::SolverChainExhausted(vec![
            SolverFailure {
                backend: SolverBackend::Gurobi,
                reason: "no licence".into(),
            },
            SolverFailure {
                backend: SolverBackend::MicroLp,
                reason: "panicked".into(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "All solvers failed; gurobi: no licence; microlp: panicked"
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let err = AppError::MissingColumns(vec!["food".into(), "Fat".into()]);
        assert_eq!(err.to_string(), "Missing required columns: food, Fat");
    }
}
