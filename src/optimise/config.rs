//! Nutritional bounds and named profiles.
//!
//! Configuration is layered, lowest precedence first: a built-in [`Profile`], an
//! optional JSON file of [`ConfigOverrides`], then individual command-line flags
//! (another [`ConfigOverrides`]).

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;

use crate::nutrients::Nutrient;

/// Bounds applied to one optimisation.
///
/// Energy is in kcal, macronutrients and saturated fat in grams, sodium,
/// cholesterol and minerals in milligrams, all over the whole plan. A maximum of
/// `f64::INFINITY` or a minimum of `0.0` leaves that nutrient effectively free.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintConfig {
    pub cal_min: f64,
    pub cal_max: f64,
    pub protein_min: f64,
    pub carb_min: f64,
    pub carb_max: f64,
    pub fat_min: f64,
    pub fat_max: f64,
    pub fibre_min: f64,
    pub sugar_max: f64,
    pub sodium_max: f64,
    pub cholesterol_max: f64,
    pub sat_fat_max: f64,
    pub calcium_min: f64,
    pub iron_min: f64,
    pub magnesium_min: f64,
    pub phosphorus_min: f64,
    pub potassium_min: f64,
    /// Upper bound on the grams of any single food
    pub max_per_food: f64,
    /// Distinct categories the plan must draw from; 0 disables diversity
    pub min_categories: u32,
    /// Total weight range in grams, for single-meal plans
    pub meal_weight: Option<(f64, f64)>,
    pub objective: Objective,
}

/// What the plan is optimised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    /// Cheapest plan meeting the bounds
    #[default]
    MinCost,
    /// Most protein within the bounds, whatever the price
    MaxProtein,
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MinCost => write!(f, "minimise cost"),
            Objective::MaxProtein => write!(f, "maximise protein"),
        }
    }
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Profile::YoungAdultMale.config()
    }
}

impl ConstraintConfig {
    /// Lower bound on the plan total of `nutrient`, if one is imposed
    pub fn lower_bound(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => Some(self.cal_min),
            Nutrient::Protein => Some(self.protein_min),
            Nutrient::Carbohydrates => Some(self.carb_min),
            Nutrient::Fat => Some(self.fat_min),
            Nutrient::Fibre => Some(self.fibre_min),
            Nutrient::Calcium => Some(self.calcium_min),
            Nutrient::Iron => Some(self.iron_min),
            Nutrient::Magnesium => Some(self.magnesium_min),
            Nutrient::Phosphorus => Some(self.phosphorus_min),
            Nutrient::Potassium => Some(self.potassium_min),
            Nutrient::SaturatedFat | Nutrient::Sugars | Nutrient::Sodium | Nutrient::Cholesterol => {
                None
            }
        }
    }

    /// Upper bound on the plan total of `nutrient`, if one is imposed
    pub fn upper_bound(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => Some(self.cal_max),
            Nutrient::Carbohydrates => Some(self.carb_max),
            Nutrient::Fat => Some(self.fat_max),
            Nutrient::Sugars => Some(self.sugar_max),
            Nutrient::Sodium => Some(self.sodium_max),
            Nutrient::Cholesterol => Some(self.cholesterol_max),
            Nutrient::SaturatedFat => Some(self.sat_fat_max),
            Nutrient::Protein
            | Nutrient::Fibre
            | Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::Magnesium
            | Nutrient::Phosphorus
            | Nutrient::Potassium => None,
        }
    }

    /// Overwrite every field the overrides set.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        let ConfigOverrides {
            cal_min,
            cal_max,
            protein_min,
            carb_min,
            carb_max,
            fat_min,
            fat_max,
            fibre_min,
            sugar_max,
            sodium_max,
            cholesterol_max,
            sat_fat_max,
            calcium_min,
            iron_min,
            magnesium_min,
            phosphorus_min,
            potassium_min,
            max_per_food,
            min_categories,
            meal_weight_min,
            meal_weight_max,
            objective,
        } = *overrides;

        let fields = [
            (&mut self.cal_min, cal_min),
            (&mut self.cal_max, cal_max),
            (&mut self.protein_min, protein_min),
            (&mut self.carb_min, carb_min),
            (&mut self.carb_max, carb_max),
            (&mut self.fat_min, fat_min),
            (&mut self.fat_max, fat_max),
            (&mut self.fibre_min, fibre_min),
            (&mut self.sugar_max, sugar_max),
            (&mut self.sodium_max, sodium_max),
            (&mut self.cholesterol_max, cholesterol_max),
            (&mut self.sat_fat_max, sat_fat_max),
            (&mut self.calcium_min, calcium_min),
            (&mut self.iron_min, iron_min),
            (&mut self.magnesium_min, magnesium_min),
            (&mut self.phosphorus_min, phosphorus_min),
            (&mut self.potassium_min, potassium_min),
            (&mut self.max_per_food, max_per_food),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }

        if let Some(k) = min_categories {
            self.min_categories = k;
        }
        if let Some(objective) = objective {
            self.objective = objective;
        }

        // A single meal-weight bound opens the range on the other side
        self.meal_weight = match (meal_weight_min, meal_weight_max, self.meal_weight) {
            (None, None, current) => current,
            (min, max, current) => {
                let (cur_min, cur_max) = current.unwrap_or((0.0, f64::INFINITY));
                Some((min.unwrap_or(cur_min), max.unwrap_or(cur_max)))
            }
        };
    }
}

/// Built-in requirement profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    YoungAdultMale,
    AdultFemale,
    SeniorHypertension,
    /// One meal rather than a full day
    SingleMeal,
    /// One meal with as much protein as the bounds allow
    HighProteinBowl,
}

impl Profile {
    pub const ALL: [Profile; 5] = [
        Profile::YoungAdultMale,
        Profile::AdultFemale,
        Profile::SeniorHypertension,
        Profile::SingleMeal,
        Profile::HighProteinBowl,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Profile::YoungAdultMale => "Young Adult Male",
            Profile::AdultFemale => "Adult Female",
            Profile::SeniorHypertension => "Senior with Hypertension",
            Profile::SingleMeal => "Single Meal",
            Profile::HighProteinBowl => "High-Protein Bowl",
        }
    }

    pub fn config(self) -> ConstraintConfig {
        let daily = |cal: (f64, f64),
                     protein_min: f64,
                     carb: (f64, f64),
                     fat: (f64, f64),
                     sodium_max: f64,
                     sugar_max: f64,
                     cholesterol_max: f64,
                     sat_fat_max: f64| ConstraintConfig {
            cal_min: cal.0,
            cal_max: cal.1,
            protein_min,
            carb_min: carb.0,
            carb_max: carb.1,
            fat_min: fat.0,
            fat_max: fat.1,
            fibre_min: 25.0,
            sugar_max,
            sodium_max,
            cholesterol_max,
            sat_fat_max,
            calcium_min: 800.0,
            iron_min: 8.0,
            magnesium_min: 200.0,
            phosphorus_min: 700.0,
            potassium_min: 2500.0,
            max_per_food: 300.0,
            min_categories: 0,
            meal_weight: None,
            objective: Objective::MinCost,
        };

        match self {
            Profile::YoungAdultMale => daily(
                (2600.0, 2900.0),
                130.0,
                (260.0, 380.0),
                (70.0, 100.0),
                2300.0,
                50.0,
                300.0,
                30.0,
            ),
            Profile::AdultFemale => daily(
                (1800.0, 2100.0),
                80.0,
                (180.0, 260.0),
                (50.0, 80.0),
                2000.0,
                35.0,
                250.0,
                22.0,
            ),
            Profile::SeniorHypertension => daily(
                (1700.0, 2000.0),
                90.0,
                (160.0, 240.0),
                (50.0, 75.0),
                1500.0,
                35.0,
                200.0,
                20.0,
            ),
            // Sodium here is in catalog units, as in the meal-planning data
            Profile::SingleMeal => ConstraintConfig {
                cal_min: 1200.0,
                cal_max: 1400.0,
                protein_min: 25.0,
                carb_min: 50.0,
                carb_max: 110.0,
                fat_min: 10.0,
                fat_max: 35.0,
                fibre_min: 8.0,
                sugar_max: 20.0,
                sodium_max: 2.0,
                cholesterol_max: f64::INFINITY,
                sat_fat_max: f64::INFINITY,
                calcium_min: 0.0,
                iron_min: 0.0,
                magnesium_min: 0.0,
                phosphorus_min: 0.0,
                potassium_min: 0.0,
                max_per_food: 300.0,
                min_categories: 0,
                meal_weight: Some((350.0, 600.0)),
                objective: Objective::MinCost,
            },
            // No per-food cap beyond the meal weight itself
            Profile::HighProteinBowl => ConstraintConfig {
                cal_min: 500.0,
                cal_max: 800.0,
                protein_min: 0.0,
                fibre_min: 8.0,
                sugar_max: 40.0,
                max_per_food: 600.0,
                objective: Objective::MaxProtein,
                ..Profile::SingleMeal.config()
            },
        }
    }
}

/// Individual bound overrides.
///
/// Used both as command-line flags and as the schema of the JSON config file;
/// unset fields leave the profile value alone.
#[derive(Args, Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    /// Minimum daily calories (kcal)
    #[clap(long)]
    pub cal_min: Option<f64>,
    /// Maximum daily calories (kcal)
    #[clap(long)]
    pub cal_max: Option<f64>,
    /// Minimum protein (g)
    #[clap(long)]
    pub protein_min: Option<f64>,
    /// Minimum carbohydrates (g)
    #[clap(long)]
    pub carb_min: Option<f64>,
    /// Maximum carbohydrates (g)
    #[clap(long)]
    pub carb_max: Option<f64>,
    /// Minimum fat (g)
    #[clap(long)]
    pub fat_min: Option<f64>,
    /// Maximum fat (g)
    #[clap(long)]
    pub fat_max: Option<f64>,
    /// Minimum dietary fibre (g)
    #[clap(long)]
    pub fibre_min: Option<f64>,
    /// Maximum sugars (g)
    #[clap(long)]
    pub sugar_max: Option<f64>,
    /// Maximum sodium (mg)
    #[clap(long)]
    pub sodium_max: Option<f64>,
    /// Maximum cholesterol (mg)
    #[clap(long)]
    pub cholesterol_max: Option<f64>,
    /// Maximum saturated fat (g)
    #[clap(long)]
    pub sat_fat_max: Option<f64>,
    /// Minimum calcium (mg)
    #[clap(long)]
    pub calcium_min: Option<f64>,
    /// Minimum iron (mg)
    #[clap(long)]
    pub iron_min: Option<f64>,
    /// Minimum magnesium (mg)
    #[clap(long)]
    pub magnesium_min: Option<f64>,
    /// Minimum phosphorus (mg)
    #[clap(long)]
    pub phosphorus_min: Option<f64>,
    /// Minimum potassium (mg)
    #[clap(long)]
    pub potassium_min: Option<f64>,
    /// Maximum grams of any single food
    #[clap(long)]
    pub max_per_food: Option<f64>,
    /// Minimum number of distinct food categories; 3 when the catalog has
    /// categories, 0 disables
    #[clap(long)]
    pub min_categories: Option<u32>,
    /// Minimum total weight of the plan (g)
    #[clap(long)]
    pub meal_weight_min: Option<f64>,
    /// Maximum total weight of the plan (g)
    #[clap(long)]
    pub meal_weight_max: Option<f64>,
    /// What to optimise for
    #[clap(long, value_enum)]
    pub objective: Option<Objective>,
}

impl ConfigOverrides {
    /// Parse a JSON object holding any subset of the override fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| format!("opening {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Categories a plan must span when the catalog is labelled and no layer sets
/// `min_categories`
pub const DEFAULT_MIN_CATEGORIES: u32 = 3;

/// Resolve the effective bounds from a profile and its override layers.
pub fn resolve(profile: Profile, layers: &[ConfigOverrides]) -> ConstraintConfig {
    let mut config = profile.config();
    for layer in layers {
        config.apply(layer);
    }
    config
}

/// [`resolve`] for a concrete catalog: a labelled catalog defaults to
/// [`DEFAULT_MIN_CATEGORIES`] unless a layer chose a value.
pub fn resolve_for_catalog(
    profile: Profile,
    layers: &[ConfigOverrides],
    has_categories: bool,
) -> ConstraintConfig {
    let mut config = resolve(profile, layers);
    if has_categories && layers.iter().all(|layer| layer.min_categories.is_none()) {
        config.min_categories = DEFAULT_MIN_CATEGORIES;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lookup() {
        let config = Profile::SeniorHypertension.config();
        assert_eq!(config.sodium_max, 1500.0);
        assert_eq!(config.cal_min, 1700.0);
        assert_eq!(config.potassium_min, 2500.0);
        assert_eq!(config.max_per_food, 300.0);
        assert_eq!(config.meal_weight, None);

        assert_eq!(ConstraintConfig::default(), Profile::YoungAdultMale.config());
    }

    #[test]
    fn test_bound_table_matches_fields() {
        let config = Profile::AdultFemale.config();

        assert_eq!(config.lower_bound(Nutrient::Calories), Some(1800.0));
        assert_eq!(config.upper_bound(Nutrient::Calories), Some(2100.0));
        assert_eq!(config.lower_bound(Nutrient::Protein), Some(80.0));
        assert_eq!(config.upper_bound(Nutrient::Protein), None);
        assert_eq!(config.lower_bound(Nutrient::Sodium), None);
        assert_eq!(config.upper_bound(Nutrient::SaturatedFat), Some(22.0));

        let ranged = Nutrient::ALL
            .iter()
            .filter(|n| config.lower_bound(**n).is_some() && config.upper_bound(**n).is_some())
            .count();
        assert_eq!(ranged, 3);
    }

    #[test]
    fn test_layers_apply_in_order() {
        let file = ConfigOverrides::from_json(r#"{"cal_min": 2000, "protein_min": 100}"#).unwrap();
        let flags = ConfigOverrides {
            cal_min: Some(2100.0),
            min_categories: Some(3),
            ..Default::default()
        };

        let config = resolve(Profile::YoungAdultMale, &[file, flags]);
        assert_eq!(config.cal_min, 2100.0);
        assert_eq!(config.protein_min, 100.0);
        assert_eq!(config.cal_max, 2900.0);
        assert_eq!(config.min_categories, 3);
    }

    #[test]
    fn test_labelled_catalog_defaults_to_three_categories() {
        assert_eq!(resolve_for_catalog(Profile::AdultFemale, &[], true).min_categories, 3);
        assert_eq!(resolve_for_catalog(Profile::AdultFemale, &[], false).min_categories, 0);

        let disabled = ConfigOverrides {
            min_categories: Some(0),
            ..Default::default()
        };
        assert_eq!(
            resolve_for_catalog(Profile::AdultFemale, &[disabled], true).min_categories,
            0
        );
    }

    #[test]
    fn test_meal_weight_override() {
        let mut config = Profile::SingleMeal.config();
        config.apply(&ConfigOverrides {
            meal_weight_max: Some(500.0),
            ..Default::default()
        });
        assert_eq!(config.meal_weight, Some((350.0, 500.0)));

        let mut config = Profile::YoungAdultMale.config();
        config.apply(&ConfigOverrides {
            meal_weight_min: Some(1000.0),
            ..Default::default()
        });
        assert_eq!(config.meal_weight, Some((1000.0, f64::INFINITY)));
    }

    #[test]
    fn test_high_protein_bowl_maximises_protein() {
        let config = Profile::HighProteinBowl.config();
        assert_eq!(config.objective, Objective::MaxProtein);
        assert_eq!((config.cal_min, config.cal_max), (500.0, 800.0));
        assert_eq!((config.carb_min, config.carb_max), (50.0, 110.0));
        assert_eq!((config.fat_min, config.fat_max), (10.0, 35.0));
        assert_eq!(config.sugar_max, 40.0);
        assert_eq!(config.sodium_max, 2.0);
        assert_eq!(config.meal_weight, Some((350.0, 600.0)));

        let file = ConfigOverrides::from_json(r#"{"objective": "min-cost"}"#).unwrap();
        assert_eq!(
            resolve(Profile::HighProteinBowl, &[file]).objective,
            Objective::MinCost
        );
    }

    #[test]
    fn test_unknown_json_field_rejected() {
        assert!(ConfigOverrides::from_json(r#"{"calories": 2000}"#).is_err());
    }
}
