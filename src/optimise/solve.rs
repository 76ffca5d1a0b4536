use std::fmt;

use tracing::{info, warn};

use crate::AppError;
use crate::dataset::FoodTable;
use crate::lp_model_builder;
use crate::lp_solver::{
    OptimisationStatus, SolveOutcome, SolverBackend, SolverChain, SolverFailure,
};
use crate::nutrients::{Nutrient, NutrientCatalog, NutrientVectors};

use super::config::{ConstraintConfig, Objective};
use super::model::{DietModel, build_model};
use super::result::{CategoryUsage, SIGNIFICANCE_THRESHOLD, SolutionResult, extract_solution};

/// Terminal status of one optimisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DietStatus {
    Optimal,
    /// A plan was found, but optimality was not proven
    OptimalInaccurate,
    Infeasible,
    Unbounded,
    Error(String),
}

impl DietStatus {
    /// Whether the status carries a plan
    pub fn is_success(&self) -> bool {
        matches!(self, DietStatus::Optimal | DietStatus::OptimalInaccurate)
    }
}

impl From<OptimisationStatus> for DietStatus {
    fn from(status: OptimisationStatus) -> Self {
        match status {
            OptimisationStatus::Optimal => DietStatus::Optimal,
            OptimisationStatus::OptimalInaccurate => DietStatus::OptimalInaccurate,
            // Non-negative prices bound a cost plan below, so for the default
            // objective the ambiguous answer can only mean infeasible
            OptimisationStatus::Infeasible | OptimisationStatus::InfeasibleOrUnbounded => {
                DietStatus::Infeasible
            }
            OptimisationStatus::Unbounded => DietStatus::Unbounded,
            OptimisationStatus::Other(status) => DietStatus::Error(status.to_string()),
        }
    }
}

impl fmt::Display for DietStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DietStatus::Optimal => write!(f, "optimal"),
            DietStatus::OptimalInaccurate => write!(f, "optimal_inaccurate"),
            DietStatus::Infeasible => write!(f, "infeasible"),
            DietStatus::Unbounded => write!(f, "unbounded"),
            DietStatus::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Outcome of one optimisation: a status, and a solution only on success.
#[derive(Debug, Clone, PartialEq)]
pub struct DietPlan {
    pub status: DietStatus,
    pub objective: Objective,
    /// Backend that produced the status, if any ran to completion
    pub backend: Option<SolverBackend>,
    /// Backends that failed before the answer, in order
    pub failures: Vec<SolverFailure>,
    pub solution: Option<SolutionResult>,
}

impl DietPlan {
    pub fn total_cost(&self) -> Option<f64> {
        self.solution.as_ref().map(|s| s.total_cost)
    }

    fn error(objective: Objective, err: &anyhow::Error, failures: Vec<SolverFailure>) -> Self {
        DietPlan {
            status: DietStatus::Error(format!("{:#}", err)),
            objective,
            backend: None,
            failures,
            solution: None,
        }
    }
}

/// Builds a fresh model for each request and hands it to a solver chain.
#[derive(Debug, Clone)]
pub struct DietOptimiser {
    chain: SolverChain,
    threshold: f64,
}

impl DietOptimiser {
    pub fn new(chain: SolverChain) -> Self {
        Self {
            chain,
            threshold: SIGNIFICANCE_THRESHOLD,
        }
    }

    /// Grams at or below which an allocation is left off the shopping list
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Find the best plan for `table` within the bounds of `config`.
    ///
    /// Never fails: model and solver errors surface as [`DietStatus::Error`].
    pub fn optimise(&self, table: &FoodTable, config: &ConstraintConfig) -> DietPlan {
        let catalog = NutrientCatalog::discover(table.columns());
        for nutrient in Nutrient::ALL {
            let required = config.lower_bound(nutrient).is_some_and(|min| min > 0.0);
            if required && !catalog.is_present(nutrient) {
                warn!(%nutrient, "minimum set on a nutrient the catalog does not carry");
            }
        }
        let vectors = NutrientVectors::extract(table, &catalog);

        let model = match build_model(lp_model_builder!(DietModelBrand), table, &vectors, config) {
            Ok(model) => model,
            Err(err) => {
                warn!(error = %err, "diet model rejected");
                return DietPlan::error(config.objective, &err, Vec::new());
            }
        };

        let outcome = self.chain.solve(&model.builder);
        self.plan(table, &vectors, config, &model, outcome)
    }

    /// Turn the chain's answer for `model` into a plan.
    pub(crate) fn plan<Brand>(
        &self,
        table: &FoodTable,
        vectors: &NutrientVectors,
        config: &ConstraintConfig,
        model: &DietModel<Brand>,
        outcome: anyhow::Result<SolveOutcome<Brand>>,
    ) -> DietPlan {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "no solver produced an answer");
                let failures = match err.downcast_ref::<AppError>() {
                    Some(AppError::SolverChainExhausted(failures)) => failures.clone(),
                    _ => Vec::new(),
                };
                return DietPlan::error(config.objective, &err, failures);
            }
        };

        let status = DietStatus::from(outcome.solution.status);
        info!(%status, backend = %outcome.backend, "optimisation finished");

        let solution = status.is_success().then(|| {
            let raw: Vec<f64> = model
                .grams
                .iter()
                .map(|&x| outcome.solution.get_value(x).unwrap_or(0.0))
                .collect();

            let mut result = extract_solution(table, vectors, &raw, self.threshold);
            result.category_usage = model
                .categories
                .iter()
                .map(|indicator| CategoryUsage {
                    category: indicator.label.clone(),
                    grams: table
                        .foods()
                        .iter()
                        .zip(&raw)
                        .filter(|(food, _)| food.category == indicator.label)
                        .map(|(_, grams)| grams)
                        .sum(),
                    counted: outcome.solution.get_value(indicator.used).unwrap_or(0.0) > 0.5,
                })
                .collect();
            result
        });

        DietPlan {
            status,
            objective: config.objective,
            backend: Some(outcome.backend),
            failures: outcome.failures,
            solution,
        }
    }
}

/// Optimise with the default solver chain.
pub fn optimise_diet(table: &FoodTable, config: &ConstraintConfig) -> anyhow::Result<DietPlan> {
    Ok(DietOptimiser::new(SolverChain::from_env()?).optimise(table, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FoodItem;
    use crate::lp_solver::LPSolution;
    use crate::optimise::Profile;

    fn table() -> FoodTable {
        let columns = ["food", "Category", "Market Price (USD per gram)", "Caloric Value", "Protein", "Carbohydrates", "Fat"]
            .map(String::from)
            .to_vec();
        FoodTable::new(
            columns,
            vec![
                FoodItem::new("lentils", 0.004, "Legumes")
                    .with_value("Caloric Value", 116.0)
                    .with_value("Protein", 9.0),
                FoodItem::new("tofu", 0.007, "Legumes")
                    .with_value("Caloric Value", 76.0)
                    .with_value("Protein", 8.0),
            ],
        )
    }

    #[test]
    fn test_inaccurate_answer_still_yields_a_plan() {
        let table = table();
        let vectors = NutrientVectors::extract(&table, &NutrientCatalog::discover(table.columns()));
        let config = Profile::AdultFemale.config();
        let model = build_model(lp_model_builder!(), &table, &vectors, &config).unwrap();

        let optimiser = DietOptimiser::new(SolverChain::new(
            vec![SolverBackend::MicroLp],
            SolverBackend::MicroLp,
        ));
        let outcome = SolveOutcome {
            backend: SolverBackend::CoinCbc,
            solution: LPSolution::new(
                OptimisationStatus::OptimalInaccurate,
                1.0,
                vec![200.0, 0.0005],
            ),
            failures: Vec::new(),
        };

        let plan = optimiser.plan(&table, &vectors, &config, &model, Ok(outcome));

        assert_eq!(plan.status, DietStatus::OptimalInaccurate);
        assert_eq!(plan.status.to_string(), "optimal_inaccurate");
        assert_eq!(plan.backend, Some(SolverBackend::CoinCbc));
        let solution = plan.solution.expect("inaccurate answers carry a plan");
        assert_eq!(solution.items.len(), 1);
        assert_eq!(solution.items[0].food, "lentils");
        assert!((solution.total_cost - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(DietStatus::from(OptimisationStatus::InfeasibleOrUnbounded), DietStatus::Infeasible);
        assert_eq!(DietStatus::from(OptimisationStatus::Unbounded), DietStatus::Unbounded);
        assert!(DietStatus::from(OptimisationStatus::OptimalInaccurate).is_success());
        assert!(!DietStatus::from(OptimisationStatus::Infeasible).is_success());
        assert_eq!(
            DietStatus::from(OptimisationStatus::Other("aborted")).to_string(),
            "error: aborted"
        );
    }
}
