//! Least-cost diet optimisation.
//!
//! This module builds and solves the diet model: one non-negative continuous
//! variable per food holding the grams to buy, a price objective to minimise,
//! and linear bounds on the nutrients those grams deliver.
//!
//! # Model
//!
//! - **Nutrient bounds** ([`constraints`]): ranges for calories, carbohydrates and
//!   fat; minima for protein, fibre and five minerals; maxima for sugar, sodium,
//!   cholesterol and saturated fat; a per-food cap; an optional total weight
//!   range for single-meal plans.
//! - **Diversity** ([`diversity`]): an optional minimum number of food categories,
//!   expressed with one binary indicator per category. This turns the linear
//!   program into a mixed-integer one.
//!
//! # Outcome
//!
//! Solving never fails outright. The resulting [`DietPlan`] carries a
//! [`DietStatus`]; only `optimal` and `optimal_inaccurate` come with a
//! [`SolutionResult`].
//!
//! # Usage Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use dietopt::optimise::{ConfigOverrides, OptimiseArgs, Profile, optimise_main};
//!
//! let args = OptimiseArgs {
//!     input: "foods.csv".into(),
//!     profile: Profile::AdultFemale,
//!     config: None,
//!     overrides: ConfigOverrides {
//!         min_categories: Some(4),
//!         ..Default::default()
//!     },
//!     categories: vec![],
//!     csv: Some("shopping_list.csv".into()),
//!     report: None,
//!     time_limit: Some(30.0),
//! };
//!
//! optimise_main(args)?;
//! # Ok(())
//! # }
//! ```

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Duration,
};

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;

use crate::lp_solver::{SolverChain, SolverOptions};
use crate::report::{write_profiles, write_report, write_shopping_list};
use crate::{AppError, read_file};

mod config;
pub mod constraints;
pub mod diversity;
mod model;
mod result;
mod solve;

pub use config::{
    ConfigOverrides, ConstraintConfig, DEFAULT_MIN_CATEGORIES, Objective, Profile, resolve,
    resolve_for_catalog,
};
pub use model::{DietModel, build_model};
pub use result::{
    CategoryUsage, LineItem, SIGNIFICANCE_THRESHOLD, SolutionResult, extract_solution, round_to,
};
pub use solve::{DietOptimiser, DietPlan, DietStatus, optimise_diet};

/// Command-line arguments for the optimisation command.
#[derive(Parser, Debug)]
pub struct OptimiseArgs {
    /// Food catalog CSV
    pub input: PathBuf,

    /// Requirement profile the bounds start from
    #[clap(long, value_enum, default_value_t = Profile::YoungAdultMale)]
    pub profile: Profile,

    /// JSON file of bound overrides, applied over the profile
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[clap(flatten)]
    pub overrides: ConfigOverrides,

    /// Only consider foods in this category (repeatable)
    #[clap(long = "category")]
    pub categories: Vec<String>,

    /// Output shopping-list CSV file
    #[clap(long)]
    pub csv: Option<PathBuf>,

    /// Output report file, instead of stdout
    #[clap(long)]
    pub report: Option<PathBuf>,

    /// Time limit in seconds for each solver attempt
    #[clap(long)]
    pub time_limit: Option<f64>,
}

/// Command-line arguments for the profile listing command.
#[derive(Parser, Debug)]
pub struct ProfilesArgs {}

/// Optimise a diet from a catalog file.
///
/// Bounds are resolved from the profile, the optional config file and the
/// command-line overrides, in that order. A catalog with a `Category` column
/// requires [`DEFAULT_MIN_CATEGORIES`] categories unless a layer says otherwise. The report goes to stdout unless
/// `--report` is given; the shopping list is only written for a solved plan.
///
/// Returns an error when no plan is found, after the report has been written.
pub fn optimise_main(args: OptimiseArgs) -> Result<()> {
    let OptimiseArgs {
        input,
        profile,
        config: config_file,
        overrides,
        categories,
        csv,
        report,
        time_limit,
    } = args;

    let mut layers = Vec::new();
    if let Some(path) = &config_file {
        layers.push(ConfigOverrides::read_file(path)?);
    }
    layers.push(overrides);

    let foods = read_file(&input)?.with_categories(&categories)?;
    if foods.is_empty() {
        return Err(AppError::NoFoods.into());
    }
    let config = resolve_for_catalog(profile, &layers, foods.has_categories());
    info!(
        foods = foods.len(),
        ?profile,
        min_categories = config.min_categories,
        "optimising"
    );

    let time_limit = time_limit
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .map_err(|err| anyhow!("invalid time limit {}: {}", secs, err))
        })
        .transpose()?;
    let chain = SolverChain::from_env()?.with_options(SolverOptions { time_limit });

    let plan = DietOptimiser::new(chain).optimise(&foods, &config);

    match &report {
        Some(path) => {
            let mut out_file = BufWriter::new(fs::File::create(path)?);
            write_report(&mut out_file, &plan)?;
            out_file.flush()?;
        }
        None => write_report(&mut io::stdout().lock(), &plan)?,
    }

    if let (Some(path), Some(solution)) = (&csv, &plan.solution) {
        write_shopping_list(BufWriter::new(fs::File::create(path)?), &solution.items)?;
    }

    match plan.status {
        DietStatus::Optimal | DietStatus::OptimalInaccurate => Ok(()),
        DietStatus::Infeasible => Err(AppError::Infeasible.into()),
        status => Err(anyhow!("Optimisation failed: {}", status)),
    }
}

/// Print the built-in profiles.
pub fn profiles_main(_args: ProfilesArgs) -> Result<()> {
    write_profiles(&mut io::stdout().lock())
}
