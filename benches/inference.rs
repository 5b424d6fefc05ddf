//! Benchmarks for the calculate path

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fuzzy_dpi::fuzzy::{parse_rule, DefuzzificationMethod, Implication};
use fuzzy_dpi::model::Registry;
use fuzzy_dpi::simulation::{DailyInput, DpiCalculator, EngineSettings, Simulator};

fn calculator(settings: EngineSettings) -> DpiCalculator {
    let registry = Arc::new(Registry::builtin().unwrap());
    DpiCalculator::new(Simulator::new(registry, settings).unwrap()).unwrap()
}

fn days() -> Vec<(&'static str, DailyInput)> {
    vec![
        ("high", DailyInput::new(8.0, 1.0, 8.0, 9.0, 5.0)),
        ("medium", DailyInput::new(4.0, 5.0, 6.0, 5.0, 5.0)),
        ("low", DailyInput::new(1.0, 15.0, 4.0, 2.0, 10.0)),
    ]
}

fn calculate_benchmark(c: &mut Criterion) {
    let calc = calculator(EngineSettings::default());
    let mut group = c.benchmark_group("calculate");

    for (name, day) in days() {
        group.bench_with_input(BenchmarkId::new("centroid", name), &day, |b, day| {
            b.iter(|| black_box(calc.calculate(day).unwrap()));
        });
    }

    group.finish();
}

fn resolution_benchmark(c: &mut Criterion) {
    let day = DailyInput::new(4.0, 5.0, 7.0, 7.0, 5.0);
    let mut group = c.benchmark_group("resolution");

    for resolution in [10usize, 200, 1000, 5000] {
        let calc = calculator(EngineSettings {
            resolution,
            ..EngineSettings::default()
        });
        group.bench_with_input(BenchmarkId::from_parameter(resolution), &day, |b, day| {
            b.iter(|| black_box(calc.calculate(day).unwrap()));
        });
    }

    group.finish();
}

fn method_benchmark(c: &mut Criterion) {
    let day = DailyInput::new(4.0, 5.0, 7.0, 7.0, 5.0);
    let mut group = c.benchmark_group("defuzzification");

    let methods = [
        DefuzzificationMethod::Centroid,
        DefuzzificationMethod::Bisector,
        DefuzzificationMethod::MeanOfMaximum,
        DefuzzificationMethod::SmallestOfMaximum,
        DefuzzificationMethod::LargestOfMaximum,
    ];
    for method in methods {
        for implication in [Implication::Minimum, Implication::Product] {
            let calc = calculator(EngineSettings {
                defuzzification: method,
                implication,
                ..EngineSettings::default()
            });
            let id = BenchmarkId::new(method.as_str(), implication.as_str());
            group.bench_with_input(id, &day, |b, day| {
                b.iter(|| black_box(calc.calculate(day).unwrap()));
            });
        }
    }

    group.finish();
}

fn load_benchmark(c: &mut Criterion) {
    c.bench_function("load_builtin_model", |b| {
        b.iter(|| black_box(Registry::builtin().unwrap()));
    });

    c.bench_function("parse_rule", |b| {
        let text = "IF (FocusTime IS High AND Distractions IS Low) OR NOT SleepQuality IS Poor THEN Productivity IS Good";
        b.iter(|| black_box(parse_rule(black_box(text)).unwrap()));
    });
}

criterion_group!(
    benches,
    calculate_benchmark,
    resolution_benchmark,
    method_benchmark,
    load_benchmark,
);
criterion_main!(benches);
