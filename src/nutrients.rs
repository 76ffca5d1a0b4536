//! Nutrient catalog and per-gram coefficient vectors.
//!
//! Catalog values are given per 100 g of food. The optimiser works in grams, so
//! every nutrient column is turned into a vector of per-gram coefficients, one
//! entry per food, in catalog order. Prices are already per gram.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::dataset::{FoodTable, PRICE_COLUMN};

/// Nutrient columns are per 100 g of food
pub const PER_100G: f64 = 100.0;

/// Columns starting with this prefix are reported as vitamins
pub const VITAMIN_PREFIX: &str = "Vitamin ";

/// Nutrients the optimiser knows how to bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Nutrient {
    Calories,
    Protein,
    Carbohydrates,
    Fat,
    SaturatedFat,
    Fibre,
    Sugars,
    Sodium,
    Cholesterol,
    Calcium,
    Iron,
    Magnesium,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 14] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbohydrates,
        Nutrient::Fat,
        Nutrient::SaturatedFat,
        Nutrient::Fibre,
        Nutrient::Sugars,
        Nutrient::Sodium,
        Nutrient::Cholesterol,
        Nutrient::Calcium,
        Nutrient::Iron,
        Nutrient::Magnesium,
        Nutrient::Phosphorus,
        Nutrient::Potassium,
    ];

    /// The nutrients shown in the summary of every plan, in display order
    pub const SUMMARY: [Nutrient; 9] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbohydrates,
        Nutrient::Fat,
        Nutrient::Fibre,
        Nutrient::Sugars,
        Nutrient::Sodium,
        Nutrient::Cholesterol,
        Nutrient::SaturatedFat,
    ];

    /// Catalog column holding the per-100 g value
    pub fn column(self) -> &'static str {
        match self {
            Nutrient::Calories => "Caloric Value",
            Nutrient::Protein => "Protein",
            Nutrient::Carbohydrates => "Carbohydrates",
            Nutrient::Fat => "Fat",
            Nutrient::SaturatedFat => "Saturated Fats",
            Nutrient::Fibre => "Dietary Fiber",
            Nutrient::Sugars => "Sugars",
            Nutrient::Sodium => "Sodium",
            Nutrient::Cholesterol => "Cholesterol",
            Nutrient::Calcium => "Calcium",
            Nutrient::Iron => "Iron",
            Nutrient::Magnesium => "Magnesium",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Potassium => "Potassium",
        }
    }

    /// Short label used in reports
    pub fn label(self) -> &'static str {
        match self {
            Nutrient::Calories => "Calories",
            Nutrient::Protein => "Protein",
            Nutrient::Carbohydrates => "Carbs",
            Nutrient::Fat => "Fat",
            Nutrient::SaturatedFat => "Saturated Fat",
            Nutrient::Fibre => "Fiber",
            Nutrient::Sugars => "Sugar",
            Nutrient::Sodium => "Sodium",
            Nutrient::Cholesterol => "Cholesterol",
            Nutrient::Calcium => "Calcium",
            Nutrient::Iron => "Iron",
            Nutrient::Magnesium => "Magnesium",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Potassium => "Potassium",
        }
    }

    /// Identifier used in constraint names, e.g. `calories_min`
    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbohydrates => "carbs",
            Nutrient::Fat => "fat",
            Nutrient::SaturatedFat => "saturated_fat",
            Nutrient::Fibre => "fibre",
            Nutrient::Sugars => "sugar",
            Nutrient::Sodium => "sodium",
            Nutrient::Cholesterol => "cholesterol",
            Nutrient::Calcium => "calcium",
            Nutrient::Iron => "iron",
            Nutrient::Magnesium => "magnesium",
            Nutrient::Phosphorus => "phosphorus",
            Nutrient::Potassium => "potassium",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Protein
            | Nutrient::Carbohydrates
            | Nutrient::Fat
            | Nutrient::SaturatedFat
            | Nutrient::Fibre
            | Nutrient::Sugars => "g",
            Nutrient::Sodium
            | Nutrient::Cholesterol
            | Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::Magnesium
            | Nutrient::Phosphorus
            | Nutrient::Potassium => "mg",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which nutrient columns a catalog actually carries.
///
/// Discovered once after loading and shared by model construction and result
/// extraction, so both agree on the vitamin columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutrientCatalog {
    present: Vec<Nutrient>,
    vitamins: Vec<String>,
}

impl NutrientCatalog {
    pub fn discover<S: AsRef<str>>(headers: &[S]) -> Self {
        let has = |name: &str| headers.iter().any(|h| h.as_ref() == name);

        let present: Vec<Nutrient> = Nutrient::ALL
            .into_iter()
            .filter(|n| has(n.column()))
            .collect();

        let vitamins: Vec<String> = headers
            .iter()
            .map(AsRef::as_ref)
            .filter(|h| h.starts_with(VITAMIN_PREFIX))
            .map(String::from)
            .collect();

        for missing in Nutrient::ALL.iter().filter(|n| !present.contains(n)) {
            debug!(column = missing.column(), "nutrient column absent, treated as zero");
        }

        Self { present, vitamins }
    }

    pub fn is_present(&self, nutrient: Nutrient) -> bool {
        self.present.contains(&nutrient)
    }

    /// Vitamin columns in catalog order
    pub fn vitamins(&self) -> &[String] {
        &self.vitamins
    }
}

/// Per-gram vector of `column` across all foods.
///
/// An absent column or cell contributes zero.
pub fn extract(table: &FoodTable, column: &str, conversion_factor: f64) -> Vec<f64> {
    table
        .foods()
        .iter()
        .map(|food| food.value(column).unwrap_or(0.0) / conversion_factor)
        .collect()
}

pub fn dot(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients.iter().zip(values).map(|(c, v)| c * v).sum()
}

/// Every coefficient vector needed to build and read back one model.
#[derive(Debug, Clone)]
pub struct NutrientVectors {
    pub price: Vec<f64>,
    nutrients: BTreeMap<Nutrient, Vec<f64>>,
    vitamins: Vec<(String, Vec<f64>)>,
}

impl NutrientVectors {
    pub fn extract(table: &FoodTable, catalog: &NutrientCatalog) -> Self {
        let price = extract(table, PRICE_COLUMN, 1.0);

        let nutrients = Nutrient::ALL
            .into_iter()
            .map(|n| (n, extract(table, n.column(), PER_100G)))
            .collect();

        let vitamins = catalog
            .vitamins()
            .iter()
            .map(|v| (v.clone(), extract(table, v, PER_100G)))
            .collect();

        Self {
            price,
            nutrients,
            vitamins,
        }
    }

    pub fn nutrient(&self, nutrient: Nutrient) -> &[f64] {
        self.nutrients
            .get(&nutrient)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn vitamins(&self) -> &[(String, Vec<f64>)] {
        &self.vitamins
    }

    /// Number of foods
    pub fn len(&self) -> usize {
        self.price.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FoodItem;

    fn table() -> FoodTable {
        let columns = [
            "food",
            "Market Price (USD per gram)",
            "Caloric Value",
            "Protein",
            "Carbohydrates",
            "Fat",
            "Vitamin C",
            "Vitamin B12",
        ]
        .map(String::from)
        .to_vec();

        FoodTable::new(
            columns,
            vec![
                FoodItem::new("oatmeal", 0.0025, "Grains")
                    .with_value("Caloric Value", 150.0)
                    .with_value("Protein", 5.0),
                FoodItem::new("broccoli", 0.0035, "Vegetables")
                    .with_value("Caloric Value", 35.0)
                    .with_value("Protein", 2.4)
                    .with_value("Vitamin C", 89.2),
            ],
        )
    }

    #[test]
    fn test_extract_scales_per_gram() {
        let table = table();
        assert_eq!(extract(&table, "Caloric Value", PER_100G), vec![1.5, 0.35]);
        assert_eq!(extract(&table, PRICE_COLUMN, 1.0), vec![0.0025, 0.0035]);
    }

    #[test]
    fn test_absent_column_is_zero() {
        let table = table();
        assert_eq!(extract(&table, "Saturated Fats", PER_100G), vec![0.0, 0.0]);
    }

    #[test]
    fn test_catalog_discovery() {
        let table = table();
        let catalog = NutrientCatalog::discover(table.columns());

        assert!(catalog.is_present(Nutrient::Calories));
        assert!(!catalog.is_present(Nutrient::Sodium));
        assert_eq!(catalog.vitamins(), &["Vitamin C", "Vitamin B12"]);
    }

    #[test]
    fn test_vectors_cover_every_nutrient() {
        let table = table();
        let vectors = NutrientVectors::extract(&table, &NutrientCatalog::discover(table.columns()));

        assert_eq!(vectors.len(), 2);
        for nutrient in Nutrient::ALL {
            assert_eq!(vectors.nutrient(nutrient).len(), 2);
        }
        assert_eq!(vectors.nutrient(Nutrient::Potassium), &[0.0, 0.0]);
        assert!((vectors.vitamins()[0].1[1] - 0.892).abs() < 1e-12);
        assert!((dot(vectors.nutrient(Nutrient::Protein), &[100.0, 50.0]) - 6.2).abs() < 1e-12);
    }
}
