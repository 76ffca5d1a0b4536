//! Food catalog loading and cleaning.
//!
//! A catalog is a CSV table with one food per row and one column per nutrient,
//! expressed per 100 g of food, plus a price per gram. Loading applies the same
//! cleaning to every source:
//!
//! - the required columns must all be present ([`validate_columns`]),
//! - rows with a missing or unparsable price, calorie or protein value are dropped,
//! - rows with a non-positive price or an empty name are dropped,
//! - a missing category becomes [`UNSPECIFIED_CATEGORY`].
//!
//! Any other empty or non-numeric cell is simply absent from the [`FoodItem`];
//! downstream it contributes zero.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::AppError;

pub const FOOD_COLUMN: &str = "food";
pub const PRICE_COLUMN: &str = "Market Price (USD per gram)";
pub const CALORIES_COLUMN: &str = "Caloric Value";
pub const PROTEIN_COLUMN: &str = "Protein";
pub const CATEGORY_COLUMN: &str = "Category";
pub const UNSPECIFIED_CATEGORY: &str = "Unspecified";

/// Columns every catalog must provide
pub const REQUIRED_COLUMNS: [&str; 6] = [
    FOOD_COLUMN,
    PRICE_COLUMN,
    CALORIES_COLUMN,
    PROTEIN_COLUMN,
    "Carbohydrates",
    "Fat",
];

/// One row of the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodItem {
    pub name: String,
    /// USD per gram, always > 0
    pub price_per_gram: f64,
    pub category: String,
    values: BTreeMap<String, f64>,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, price_per_gram: f64, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price_per_gram,
            category: category.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a per-100 g column value
    pub fn with_value(mut self, column: impl Into<String>, value: f64) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    /// Raw cell value; the price column reads back the price per gram.
    pub fn value(&self, column: &str) -> Option<f64> {
        if column == PRICE_COLUMN {
            Some(self.price_per_gram)
        } else {
            self.values.get(column).copied()
        }
    }
}

/// A cleaned catalog: the header row plus the surviving foods.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodTable {
    columns: Vec<String>,
    foods: Vec<FoodItem>,
}

impl FoodTable {
    pub fn new(columns: Vec<String>, foods: Vec<FoodItem>) -> Self {
        Self { columns, foods }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Whether the catalog carries category labels at all
    pub fn has_categories(&self) -> bool {
        self.has_column(CATEGORY_COLUMN)
    }

    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// Sorted distinct category labels
    pub fn categories(&self) -> Vec<&str> {
        self.foods
            .iter()
            .map(|f| f.category.as_str())
            .sorted()
            .dedup()
            .collect()
    }

    /// Keep only foods in the selected categories.
    ///
    /// An empty selection, or a catalog without categories, keeps every food.
    /// Fails with [`AppError::NoFoods`] when nothing is left.
    pub fn with_categories<S: AsRef<str>>(&self, selected: &[S]) -> Result<FoodTable> {
        if selected.is_empty() {
            return Ok(self.clone());
        }
        if !self.has_categories() {
            warn!("catalog has no {} column, ignoring category filter", CATEGORY_COLUMN);
            return Ok(self.clone());
        }

        let foods: Vec<FoodItem> = self
            .foods
            .iter()
            .filter(|f| selected.iter().any(|s| s.as_ref() == f.category))
            .cloned()
            .collect();

        if foods.is_empty() {
            return Err(AppError::NoFoods.into());
        }

        debug!(kept = foods.len(), total = self.foods.len(), "category filter applied");
        Ok(FoodTable::new(self.columns.clone(), foods))
    }
}

/// Return the required columns missing from a header row.
pub fn validate_columns<S: AsRef<str>>(headers: &[S]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h.as_ref() == *required))
        .collect()
}

fn parse_number(cell: Option<&str>) -> Option<f64> {
    cell.filter(|c| !c.is_empty())
        .and_then(|c| c.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse and clean a catalog from any CSV source.
///
/// Rows shorter than the header are accepted; their missing trailing cells are
/// treated as blank.
pub fn from_reader<R: io::Read>(reader: R) -> Result<FoodTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let missing = validate_columns(&columns);
    if !missing.is_empty() {
        return Err(
            AppError::MissingColumns(missing.into_iter().map(String::from).collect()).into(),
        );
    }

    let position = |name: &str| columns.iter().position(|c| c == name);
    let food_idx = position(FOOD_COLUMN);
    let price_idx = position(PRICE_COLUMN);
    let calories_idx = position(CALORIES_COLUMN);
    let protein_idx = position(PROTEIN_COLUMN);
    let category_idx = position(CATEGORY_COLUMN);

    let mut foods = Vec::new();
    let mut dropped = 0usize;

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));

        let name = cell(food_idx).unwrap_or_default();
        let price = parse_number(cell(price_idx));
        let calories = parse_number(cell(calories_idx));
        let protein = parse_number(cell(protein_idx));

        let price = match (price, calories, protein) {
            (Some(price), Some(_), Some(_)) if price > 0.0 && !name.is_empty() => price,
            _ => {
                debug!(row = line + 1, name, "dropping incomplete row");
                dropped += 1;
                continue;
            }
        };

        let category = cell(category_idx)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNSPECIFIED_CATEGORY);

        let mut food = FoodItem::new(name, price, category);
        for (idx, column) in columns.iter().enumerate() {
            if Some(idx) == food_idx || Some(idx) == category_idx || Some(idx) == price_idx {
                continue;
            }
            if let Some(value) = parse_number(record.get(idx)) {
                food.values.insert(column.clone(), value);
            }
        }
        foods.push(food);
    }

    info!(foods = foods.len(), dropped, "catalog loaded");
    Ok(FoodTable::new(columns, foods))
}

/// Read and clean a catalog from a CSV file.
pub fn read_file(path: &Path) -> Result<FoodTable> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    from_reader(file).with_context(|| format!("reading {}", path.display()))
}
