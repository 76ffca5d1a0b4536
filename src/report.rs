//! Plain-text reports and the shopping-list CSV.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use prettytable::*;

use crate::nutrients::Nutrient;
use crate::optimise::{DietPlan, LineItem, Profile, SolutionResult};

pub const RELAX_HINT: &str = "Try relaxing some constraints or adjusting your requirements.";

/// Write the shopping list as `Food,Amount (g),Cost ($)`.
pub fn write_shopping_list<W: Write>(out: W, items: &[LineItem]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    writer.write_record(["Food", "Amount (g)", "Cost ($)"])?;
    for item in items {
        writer.write_record([
            item.food.clone(),
            format!("{:.1}", item.grams),
            format!("{:.2}", item.cost),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the human-readable report of a plan.
///
/// A plan without a solution reports only its status and a hint.
pub fn write_report<W: Write>(out: &mut W, plan: &DietPlan) -> Result<()> {
    writeln!(out, "Status: {}", plan.status)?;
    if let Some(backend) = plan.backend {
        writeln!(out, "Solver: {}", backend)?;
    }
    for failure in &plan.failures {
        writeln!(out, "Solver failed: {}", failure)?;
    }

    let Some(solution) = &plan.solution else {
        writeln!(out, "{}", RELAX_HINT)?;
        return Ok(());
    };

    writeln!(out, "Objective: {}", plan.objective)?;
    writeln!(out, "Total cost: ${:.2}", solution.total_cost)?;
    writeln!(out, "Foods: {}", solution.items.len())?;
    writeln!(out, "Total weight: {:.1} g", solution.total_grams())?;

    writeln!(out, "\nShopping list")?;
    let mut table = Table::new();
    table.set_titles(row!["Food", r->"Amount (g)", r->"Cost ($)"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for item in &solution.items {
        table.add_row(row![
            item.food,
            r->format!("{:.1}", item.grams),
            r->format!("{:.2}", item.cost),
        ]);
    }
    table.print(out)?;

    writeln!(out, "\nNutrient summary")?;
    let mut table = Table::new();
    table.set_titles(row!["Nutrient", r->"Total", "Unit"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for nutrient in Nutrient::SUMMARY {
        table.add_row(row![
            nutrient.label(),
            r->format!("{:.1}", solution.total(nutrient)),
            nutrient.unit(),
        ]);
    }
    table.print(out)?;

    if !solution.vitamin_totals.is_empty() {
        writeln!(out, "\nVitamins")?;
        let mut table = Table::new();
        table.set_titles(row!["Vitamin", r->"Total"]);
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for (vitamin, total) in &solution.vitamin_totals {
            table.add_row(row![vitamin, r->format!("{:.2}", total)]);
        }
        table.print(out)?;
    }

    if !solution.category_usage.is_empty() {
        writeln!(out, "\nCategories")?;
        let mut table = Table::new();
        table.set_titles(row!["Category", r->"Amount (g)", "Counted"]);
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        for usage in &solution.category_usage {
            table.add_row(row![
                usage.category,
                r->format!("{:.1}", usage.grams),
                if usage.counted { "yes" } else { "no" },
            ]);
        }
        table.print(out)?;
    }

    write_macro_distribution(out, solution)
}

fn write_macro_distribution<W: Write>(out: &mut W, solution: &SolutionResult) -> Result<()> {
    let macros = [Nutrient::Protein, Nutrient::Carbohydrates, Nutrient::Fat];
    let total: f64 = macros.iter().map(|&n| solution.total(n)).sum();
    if total <= 0.0 {
        return Ok(());
    }

    writeln!(out, "\nMacronutrient distribution")?;
    let mut table = Table::new();
    table.set_titles(row!["Macronutrient", r->"Grams", r->"Share"]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for nutrient in macros {
        let grams = solution.total(nutrient);
        table.add_row(row![
            nutrient.label(),
            r->format!("{:.1}", grams),
            r->format!("{:.1}%", 100.0 * grams / total),
        ]);
    }
    table.print(out)?;

    Ok(())
}

/// Write the bounds of every built-in profile.
pub fn write_profiles<W: Write>(out: &mut W) -> Result<()> {
    let mut table = Table::new();
    table.set_titles(row![
        "Profile",
        "Calories (kcal)",
        "Protein (g)",
        "Carbs (g)",
        "Fat (g)",
        "Sodium max",
        "Sugar max (g)",
        "Meal weight (g)",
        "Objective",
    ]);
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    for profile in Profile::ALL {
        let config = profile.config();
        let name = profile
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_else(|| profile.description().to_string());

        table.add_row(row![
            format!("{} ({})", name, profile.description()),
            format!("{:.0}-{:.0}", config.cal_min, config.cal_max),
            format!(">= {:.0}", config.protein_min),
            format!("{:.0}-{:.0}", config.carb_min, config.carb_max),
            format!("{:.0}-{:.0}", config.fat_min, config.fat_max),
            format!("{}", config.sodium_max),
            format!("{:.0}", config.sugar_max),
            config
                .meal_weight
                .map(|(min, max)| format!("{:.0}-{:.0}", min, max))
                .unwrap_or_else(|| "-".to_string()),
            config.objective,
        ]);
    }
    table.print(out)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimise::{DietStatus, Objective};
    use std::collections::BTreeMap;

    fn solved_plan() -> DietPlan {
        let totals = BTreeMap::from([
            (Nutrient::Calories, 2200.0),
            (Nutrient::Protein, 120.0),
            (Nutrient::Carbohydrates, 240.0),
            (Nutrient::Fat, 40.0),
        ]);
        DietPlan {
            status: DietStatus::Optimal,
            objective: Objective::MinCost,
            backend: Some(crate::lp_solver::SolverBackend::MicroLp),
            failures: Vec::new(),
            solution: Some(SolutionResult {
                total_cost: 4.2,
                items: vec![
                    LineItem {
                        food: "Oatmeal".into(),
                        grams: 400.0,
                        cost: 1.0,
                    },
                    LineItem {
                        food: "Chicken, breast".into(),
                        grams: 213.3,
                        cost: 3.2,
                    },
                ],
                totals,
                vitamin_totals: BTreeMap::from([("Vitamin C".to_string(), 12.5)]),
                category_usage: Vec::new(),
            }),
        }
    }

    #[test]
    fn test_shopping_list_csv() {
        let mut out = Vec::new();
        write_shopping_list(&mut out, &solved_plan().solution.unwrap().items).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Food,Amount (g),Cost ($)\nOatmeal,400.0,1.00\n\"Chicken, breast\",213.3,3.20\n"
        );
    }

    #[test]
    fn test_report_sections() {
        let mut out = Vec::new();
        write_report(&mut out, &solved_plan()).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(report.contains("Status: optimal"));
        assert!(report.contains("Objective: minimise cost"));
        assert!(report.contains("Total cost: $4.20"));
        assert!(report.contains("Total weight: 613.3 g"));
        assert!(report.contains("Vitamin C"));
        assert!(report.contains("Macronutrient distribution"));
        assert!(report.contains("60.0%"));
        assert!(!report.contains(RELAX_HINT));
    }

    #[test]
    fn test_failed_plan_shows_only_status_and_hint() {
        let plan = DietPlan {
            status: DietStatus::Infeasible,
            objective: Objective::MinCost,
            backend: Some(crate::lp_solver::SolverBackend::MicroLp),
            failures: Vec::new(),
            solution: None,
        };

        let mut out = Vec::new();
        write_report(&mut out, &plan).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert_eq!(
            report,
            format!("Status: infeasible\nSolver: microlp\n{}\n", RELAX_HINT)
        );
    }

    #[test]
    fn test_profiles_table() {
        let mut out = Vec::new();
        write_profiles(&mut out).unwrap();
        let table = String::from_utf8(out).unwrap();

        assert!(table.contains("senior-hypertension"));
        assert!(table.contains("350-600"));
        assert!(table.contains("high-protein-bowl"));
        assert!(table.contains("maximise protein"));
    }
}
