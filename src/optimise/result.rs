//! Turning a raw solution vector into a shopping list and nutrient totals.

use std::collections::BTreeMap;

use crate::dataset::FoodTable;
use crate::nutrients::{Nutrient, NutrientVectors, dot};

/// Allocations at or below this many grams are solver noise
pub const SIGNIFICANCE_THRESHOLD: f64 = 1e-3;

/// One food to buy.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub food: String,
    /// Rounded to 0.1 g
    pub grams: f64,
    /// Rounded to the cent
    pub cost: f64,
}

/// Grams drawn from one category, and whether it counted towards diversity.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUsage {
    pub category: String,
    pub grams: f64,
    pub counted: bool,
}

/// The readable form of an optimal plan.
///
/// Nutrient and vitamin totals are computed from the unrounded solution.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionResult {
    pub total_cost: f64,
    pub items: Vec<LineItem>,
    pub totals: BTreeMap<Nutrient, f64>,
    pub vitamin_totals: BTreeMap<String, f64>,
    pub category_usage: Vec<CategoryUsage>,
}

impl SolutionResult {
    pub fn total(&self, nutrient: Nutrient) -> f64 {
        self.totals.get(&nutrient).copied().unwrap_or(0.0)
    }

    /// Weight of the shopping list, from the rounded line items
    pub fn total_grams(&self) -> f64 {
        self.items.iter().map(|item| item.grams).sum()
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}

/// Read a raw solution back into line items and totals.
///
/// Foods with more than `threshold` grams become line items, in catalog order.
pub fn extract_solution(
    table: &FoodTable,
    vectors: &NutrientVectors,
    raw: &[f64],
    threshold: f64,
) -> SolutionResult {
    let items = table
        .foods()
        .iter()
        .zip(raw)
        .zip(&vectors.price)
        .filter(|((_, grams), _)| **grams > threshold)
        .map(|((food, &grams), &price)| LineItem {
            food: food.name.clone(),
            grams: round_to(grams, 1),
            cost: round_to(grams * price, 2),
        })
        .collect();

    let totals = Nutrient::ALL
        .into_iter()
        .map(|n| (n, dot(vectors.nutrient(n), raw)))
        .collect();

    let vitamin_totals = vectors
        .vitamins()
        .iter()
        .map(|(name, coefficients)| (name.clone(), dot(coefficients, raw)))
        .collect();

    SolutionResult {
        total_cost: dot(&vectors.price, raw),
        items,
        totals,
        vitamin_totals,
        category_usage: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FoodItem;
    use crate::nutrients::NutrientCatalog;

    fn table() -> FoodTable {
        let columns = ["food", "Market Price (USD per gram)", "Caloric Value", "Protein", "Carbohydrates", "Fat", "Vitamin A"]
            .map(String::from)
            .to_vec();
        FoodTable::new(
            columns,
            vec![
                FoodItem::new("lentils", 0.004, "Legumes")
                    .with_value("Caloric Value", 116.0)
                    .with_value("Protein", 9.0)
                    .with_value("Vitamin A", 8.0),
                FoodItem::new("salt", 0.001, "Condiments"),
                FoodItem::new("tofu", 0.007, "Legumes")
                    .with_value("Caloric Value", 76.0)
                    .with_value("Protein", 8.0),
            ],
        )
    }

    #[test]
    fn test_threshold_and_rounding() {
        let table = table();
        let vectors = NutrientVectors::extract(&table, &NutrientCatalog::discover(table.columns()));

        let result = extract_solution(&table, &vectors, &[123.456, 0.0009, 10.04], SIGNIFICANCE_THRESHOLD);

        assert_eq!(
            result.items,
            vec![
                LineItem {
                    food: "lentils".into(),
                    grams: 123.5,
                    cost: 0.49,
                },
                LineItem {
                    food: "tofu".into(),
                    grams: 10.0,
                    cost: 0.07,
                },
            ]
        );
        assert!(result.items.iter().all(|item| item.grams > SIGNIFICANCE_THRESHOLD));
    }

    #[test]
    fn test_totals_use_unrounded_values() {
        let table = table();
        let vectors = NutrientVectors::extract(&table, &NutrientCatalog::discover(table.columns()));
        let raw = [123.456, 0.0009, 10.04];

        let result = extract_solution(&table, &vectors, &raw, SIGNIFICANCE_THRESHOLD);

        let protein = 0.09 * 123.456 + 0.08 * 10.04;
        assert!((result.total(Nutrient::Protein) - protein).abs() < 1e-9);
        assert!((result.vitamin_totals["Vitamin A"] - 0.08 * 123.456).abs() < 1e-9);
        assert_eq!(result.total(Nutrient::Sodium), 0.0);

        let cost = 0.004 * 123.456 + 0.001 * 0.0009 + 0.007 * 10.04;
        assert!((result.total_cost - cost).abs() < 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345678, 2), 2.35);
        assert_eq!(round_to(99.94, 1), 99.9);
        assert_eq!(round_to(0.0, 1), 0.0);
    }
}
