//! Criterion benchmarks for schedgen_forecast.
//!
//! Benchmarks cover:
//! - Integerization over growing OD networks
//! - Index selection for clone distribution
//! - Full engine runs, single and parallel instances

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use schedgen_core::rng::StreamGenerator;
use schedgen_forecast::prelude::*;
use schedgen_forecast::synth::choose_indices;

/// Fully connected network of `airports` airports, `per_pair` records each.
fn network(airports: usize, per_pair: usize) -> Vec<OdPairForecast> {
    let mut next_id = 0u64;
    let mut pairs = Vec::new();
    for o in 0..airports {
        for d in 0..airports {
            if o == d {
                continue;
            }
            let records: Vec<FlightRecord> = (0..per_pair)
                .map(|_| {
                    next_id += 100;
                    FlightRecord::new(FlightId(next_id), "BENCH")
                })
                .collect();
            pairs.push(OdPairForecast::from_flights(
                format!("AP{:03}", o),
                format!("AP{:03}", d),
                records,
            ));
        }
    }
    pairs
}

fn growth(airports: usize) -> BTreeMap<AirportId, AirportGrowth> {
    (0..airports)
        .map(|i| {
            let g = 0.8 + 0.05 * (i % 10) as f64;
            (AirportId::new(format!("AP{:03}", i)), AirportGrowth::new(g, 2.0 - g))
        })
        .collect()
}

fn bench_integerize(c: &mut Criterion) {
    let mut group = c.benchmark_group("integerize");

    for airports in [10, 30, 60] {
        let mut pairs = network(airports, 3);
        let integerizer = DemandIntegerizer::default();
        integerizer.project(&mut pairs, &growth(airports)).unwrap();

        group.bench_with_input(BenchmarkId::new("pairs", pairs.len()), &pairs, |b, pairs| {
            b.iter(|| {
                let mut local = pairs.clone();
                black_box(integerizer.integerize(&mut local).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("choose_indices");

    for n in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("half_of", n), &n, |b, &n| {
            let stream = StreamGenerator::new(1);
            b.iter(|| black_box(choose_indices(n / 2, n, &stream)));
        });
    }

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.sample_size(20);

    let airports = 30;
    let pairs = network(airports, 4);
    let growth = growth(airports);
    let engine = ForecastEngine::new(
        ForecastConfig::builder()
            .clone_time_shift_std_dev_minutes(5.0)
            .scaling(ScalingConfig {
                min: 0.9,
                mode: 1.0,
                max: 1.2,
                correlations: Vec::new(),
            })
            .build()
            .unwrap(),
    )
    .unwrap();

    group.bench_function("single_run", |b| {
        b.iter(|| {
            let mut local = pairs.clone();
            black_box(engine.run(&mut local, &growth).unwrap())
        });
    });

    for count in [4, 16] {
        group.bench_with_input(BenchmarkId::new("instances", count), &count, |b, &count| {
            b.iter(|| black_box(engine.run_instances(&pairs, &growth, 7, count).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_integerize, bench_selection, bench_engine);
criterion_main!(benches);
