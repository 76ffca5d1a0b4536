//! Food-category diversity.
//!
//! Each distinct category `c` gets a binary indicator `y_c`, linked to the grams
//! drawn from it:
//!
//! ```text
//! sum(x_i for i in c) <= max_per_food * y_c
//! sum(x_i for i in c) >= DIVERSITY_MIN_GRAMS * y_c
//! sum(y_c) >= k
//! ```
//!
//! so a category counts as used only when at least one gram comes from it, and
//! no food of an unused category can be bought. `k` is the requested minimum,
//! capped at the number of categories present. `max_per_food` is the big-M of
//! the upper link, so it must be finite whenever diversity is requested.

use anyhow::{Result, bail};
use itertools::Itertools;
use tracing::{debug, info};

use crate::constraint;
use crate::lp_solver::{LPModelBuilder, LinearExpression, VariableId, VariableType};

use super::config::ConstraintConfig;

/// Grams a category must contribute to count as used
pub const DIVERSITY_MIN_GRAMS: f64 = 1.0;

/// The binary indicator of one category.
#[derive(Debug, Clone)]
pub struct CategoryIndicator<Brand> {
    pub label: String,
    pub used: VariableId<Brand>,
}

/// Number of categories the plan must use.
pub fn required_categories(requested: u32, available: usize) -> usize {
    (requested as usize).min(available)
}

/// Add indicator variables and linking constraints for every category in
/// `labels` (one label per entry of `grams`).
///
/// Returns the indicators in sorted label order, or nothing when diversity is
/// disabled. Fails when `max_per_food` is not a finite big-M.
pub fn add_diversity_constraints<Brand>(
    builder: &mut LPModelBuilder<Brand>,
    grams: &[VariableId<Brand>],
    labels: &[&str],
    config: &ConstraintConfig,
) -> Result<Vec<CategoryIndicator<Brand>>> {
    let categories: Vec<&str> = labels.iter().copied().sorted().dedup().collect();
    if config.min_categories == 0 || categories.is_empty() {
        return Ok(Vec::new());
    }

    if !config.max_per_food.is_finite() {
        bail!(
            "min_categories = {} needs a finite max_per_food, got {}",
            config.min_categories,
            config.max_per_food
        );
    }

    let required = required_categories(config.min_categories, categories.len());
    if required < config.min_categories as usize {
        debug!(
            requested = config.min_categories,
            available = categories.len(),
            "minimum categories capped"
        );
    }

    let indicators: Vec<CategoryIndicator<Brand>> = categories
        .into_iter()
        .map(|label| {
            let used = builder.add_variable(
                format!("category_used[{label}]"),
                VariableType::Binary,
                0.0,
                1.0,
            );

            let drawn = || -> LinearExpression<Brand> {
                labels
                    .iter()
                    .zip(grams)
                    .filter(|(l, _)| **l == label)
                    .map(|(_, &x)| (1.0, x))
                    .collect()
            };

            builder.add_constraint(constraint!(
                format!("category_upper[{label}]"),
                (drawn() - config.max_per_food * used) <= 0.0
            ));
            builder.add_constraint(constraint!(
                format!("category_lower[{label}]"),
                (drawn() - DIVERSITY_MIN_GRAMS * used) >= 0.0
            ));

            CategoryIndicator {
                label: label.to_string(),
                used,
            }
        })
        .collect();

    let total_used: LinearExpression<Brand> = indicators.iter().map(|c| (1.0, c.used)).collect();
    builder.add_constraint(constraint!("min_categories", (total_used) >= required));

    info!(categories = indicators.len(), required, "diversity constraints added");
    Ok(indicators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp_model_builder;
    use crate::lp_solver::ConstraintSense;
    use crate::optimise::config::Profile;

    #[test]
    fn test_required_is_capped() {
        assert_eq!(required_categories(5, 3), 3);
        assert_eq!(required_categories(2, 3), 2);
        assert_eq!(required_categories(0, 3), 0);
    }

    #[test]
    fn test_indicators_and_links() {
        let mut builder = lp_model_builder!();
        let grams: Vec<_> = (0..3)
            .map(|i| builder.add_variable(format!("x{i}"), VariableType::Continuous, 0.0, f64::INFINITY))
            .collect();
        let config = ConstraintConfig {
            min_categories: 4,
            ..Profile::YoungAdultMale.config()
        };

        let indicators =
            add_diversity_constraints(&mut builder, &grams, &["Meat", "Dairy", "Meat"], &config)
                .unwrap();

        let labels: Vec<_> = indicators.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Dairy", "Meat"]);
        assert!(builder.is_mixed_integer());

        let upper = builder.constraint("category_upper[Meat]").unwrap();
        assert_eq!(upper.sense(), ConstraintSense::LessEqual);
        assert_eq!(
            upper.expression().compact(),
            vec![(0, 1.0), (2, 1.0), (indicators[1].used.index(), -300.0)]
        );

        let lower = builder.constraint("category_lower[Dairy]").unwrap();
        assert_eq!(
            lower.expression().compact(),
            vec![(1, 1.0), (indicators[0].used.index(), -1.0)]
        );

        let total = builder.constraint("min_categories").unwrap();
        assert_eq!(total.rhs(), 2.0);
    }

    #[test]
    fn test_disabled_without_minimum() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", VariableType::Continuous, 0.0, f64::INFINITY);

        let indicators = add_diversity_constraints(
            &mut builder,
            &[x],
            &["Meat"],
            &Profile::YoungAdultMale.config(),
        )
        .unwrap();

        assert!(indicators.is_empty());
        assert!(builder.constraints().is_empty());
        assert!(!builder.is_mixed_integer());
    }

    #[test]
    fn test_unbounded_cap_is_rejected() {
        let mut builder = lp_model_builder!();
        let x = builder.add_variable("x", VariableType::Continuous, 0.0, f64::INFINITY);
        let config = ConstraintConfig {
            min_categories: 2,
            max_per_food: f64::INFINITY,
            ..Profile::YoungAdultMale.config()
        };

        let err = add_diversity_constraints(&mut builder, &[x], &["Meat"], &config)
            .err()
            .expect("an open cap cannot link categories");
        assert!(err.to_string().contains("finite max_per_food"), "{}", err);
        assert!(builder.constraints().is_empty());

        // Without a diversity requirement the cap may stay open
        let open = ConstraintConfig {
            min_categories: 0,
            ..config
        };
        assert!(add_diversity_constraints(&mut builder, &[x], &["Meat"], &open)
            .unwrap()
            .is_empty());
    }
}
