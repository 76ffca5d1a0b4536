//! Diet model: grams per food under nutrient bounds.

use anyhow::Result;
use tracing::info;

use crate::dataset::FoodTable;
use crate::lp_solver::{LPModelBuilder, OptimisationSense, VariableId, VariableType};
use crate::nutrients::{Nutrient, NutrientVectors};

use super::config::{ConstraintConfig, Objective};
use super::constraints::{nutrient_constraints, weighted_sum};
use super::diversity::{CategoryIndicator, add_diversity_constraints};

/// A built model and the handles needed to read its solution back.
pub struct DietModel<Brand> {
    pub builder: LPModelBuilder<Brand>,
    /// Grams of each food, in catalog order
    pub grams: Vec<VariableId<Brand>>,
    /// Empty unless diversity is enforced
    pub categories: Vec<CategoryIndicator<Brand>>,
}

/// Optimise `config.objective` subject to the nutrient bounds of `config`, with
/// one non-negative grams variable per food of `table`.
///
/// Minimising cost uses `price · x`; maximising protein uses `protein · x`.
pub fn build_model<Brand>(
    mut builder: LPModelBuilder<Brand>,
    table: &FoodTable,
    vectors: &NutrientVectors,
    config: &ConstraintConfig,
) -> Result<DietModel<Brand>> {
    let grams: Vec<VariableId<Brand>> = table
        .foods()
        .iter()
        .map(|food| {
            builder.add_variable(
                format!("grams[{}]", food.name),
                VariableType::Continuous,
                0.0,
                f64::INFINITY,
            )
        })
        .collect();

    match config.objective {
        Objective::MinCost => {
            builder.set_objective(weighted_sum(&vectors.price, &grams), OptimisationSense::Minimise)
        }
        Objective::MaxProtein => builder.set_objective(
            weighted_sum(vectors.nutrient(Nutrient::Protein), &grams),
            OptimisationSense::Maximise,
        ),
    }

    for constraint in nutrient_constraints(&grams, vectors, config) {
        builder.add_constraint(constraint);
    }

    let categories = if table.has_categories() {
        let labels: Vec<&str> = table.foods().iter().map(|f| f.category.as_str()).collect();
        add_diversity_constraints(&mut builder, &grams, &labels, config)?
    } else {
        Vec::new()
    };

    info!(
        variables = builder.num_variables(),
        constraints = builder.constraints().len(),
        mixed_integer = builder.is_mixed_integer(),
        objective = %config.objective,
        "diet model built"
    );

    Ok(DietModel {
        builder,
        grams,
        categories,
    })
}
