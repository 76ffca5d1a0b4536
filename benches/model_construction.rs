//! Benchmarks for diet model construction and solving
//!
//! Catalogs are synthetic and deterministic so runs are comparable: each food
//! gets nutrient values derived from its index, spread over a handful of
//! categories.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dietopt::dataset::{FoodItem, FoodTable, REQUIRED_COLUMNS};
use dietopt::lp_model_builder;
use dietopt::lp_solver::{SolverBackend, SolverChain};
use dietopt::nutrients::{Nutrient, NutrientCatalog, NutrientVectors};
use dietopt::optimise::{ConstraintConfig, DietOptimiser, Profile, build_model};

const CATALOG_SIZES: &[usize] = &[50, 200, 1000];
const CATEGORIES: &[&str] = &["Grain", "Dairy", "Meat", "Vegetable", "Fruit", "Nuts"];

/// Build a catalog of `size` foods with every tracked nutrient present
fn synthetic_catalog(size: usize) -> FoodTable {
    let mut columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.extend(
        Nutrient::ALL
            .iter()
            .map(|n| n.column().to_string())
            .filter(|c| !REQUIRED_COLUMNS.contains(&c.as_str())),
    );
    columns.push("Category".to_string());
    columns.push("Vitamin C".to_string());

    let foods = (0..size)
        .map(|i| {
            let spread = (i % 17) as f64 + 1.0;
            let mut food = FoodItem::new(
                format!("food {i}"),
                0.001 + 0.0005 * (i % 23) as f64,
                CATEGORIES[i % CATEGORIES.len()],
            );
            for (k, nutrient) in Nutrient::ALL.iter().enumerate() {
                food = food.with_value(nutrient.column(), spread * (k as f64 + 1.0) * 3.0);
            }
            food.with_value("Vitamin C", spread)
        })
        .collect();

    FoodTable::new(columns, foods)
}

fn diverse_config() -> ConstraintConfig {
    ConstraintConfig {
        min_categories: 4,
        ..Profile::AdultFemale.config()
    }
}

/// Benchmark model construction, with and without diversity indicators
fn bench_model_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("model_construction");

    for &size in CATALOG_SIZES {
        let table = synthetic_catalog(size);
        let vectors = NutrientVectors::extract(&table, &NutrientCatalog::discover(table.columns()));
        group.throughput(Throughput::Elements(size as u64));

        for (label, config) in [
            ("linear", Profile::AdultFemale.config()),
            ("diverse", diverse_config()),
        ] {
            group.bench_with_input(
                BenchmarkId::new(label, size),
                &(&table, &vectors, config),
                |b, (table, vectors, config)| {
                    b.iter(|| {
                        let model =
                            build_model(lp_model_builder!(), black_box(table), vectors, config);
                        black_box(model.map(|m| m.builder.constraints().len()).ok())
                    })
                },
            );
        }
    }

    group.finish();
}

/// Benchmark the whole optimisation on the pure Rust backend
fn bench_optimise(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimise_microlp");
    group.sample_size(10);

    let optimiser = DietOptimiser::new(SolverChain::new(
        vec![SolverBackend::MicroLp],
        SolverBackend::MicroLp,
    ));

    for &size in &CATALOG_SIZES[..2] {
        let table = synthetic_catalog(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("linear", size), &table, |b, table| {
            b.iter(|| black_box(optimiser.optimise(table, &Profile::AdultFemale.config())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_model_construction, bench_optimise);
criterion_main!(benches);
