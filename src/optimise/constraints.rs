//! Nutritional inequalities over the grams-per-food decision vector.

use crate::constraint;
use crate::lp_solver::{Constraint, LinearExpression, VariableId};
use crate::nutrients::{Nutrient, NutrientVectors};

use super::config::ConstraintConfig;

/// `coefficients · x`
pub fn weighted_sum<Brand>(coefficients: &[f64], grams: &[VariableId<Brand>]) -> LinearExpression<Brand> {
    coefficients.iter().copied().zip(grams.iter().copied()).collect()
}

/// Build the nutrient, per-food cap and meal-weight constraints.
///
/// Every bound in `config` yields exactly one inequality, whatever its value,
/// so the model shape only depends on the config layout. Unbounded sides
/// (infinite maxima) are left for the backend to discard.
pub fn nutrient_constraints<Brand>(
    grams: &[VariableId<Brand>],
    vectors: &NutrientVectors,
    config: &ConstraintConfig,
) -> Vec<Constraint<Brand>> {
    let mut constraints: Vec<Constraint<Brand>> = grams
        .iter()
        .enumerate()
        .map(|(i, &x)| constraint!(format!("max_per_food[{i}]"), (x) <= config.max_per_food))
        .collect();

    for nutrient in Nutrient::ALL {
        let coefficients = vectors.nutrient(nutrient);

        if let Some(min) = config.lower_bound(nutrient) {
            constraints.push(constraint!(
                format!("{}_min", nutrient.key()),
                (weighted_sum(coefficients, grams)) >= min
            ));
        }
        if let Some(max) = config.upper_bound(nutrient) {
            constraints.push(constraint!(
                format!("{}_max", nutrient.key()),
                (weighted_sum(coefficients, grams)) <= max
            ));
        }
    }

    if let Some((min, max)) = config.meal_weight {
        let total = || -> LinearExpression<Brand> { grams.iter().map(|&x| (1.0, x)).collect() };
        constraints.push(constraint!("meal_weight_min", (total()) >= min));
        constraints.push(constraint!("meal_weight_max", (total()) <= max));
    }

    constraints
}
