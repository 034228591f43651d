//! Criterion benchmarks for schedgen_core sampling.
//!
//! Benchmarks cover:
//! - Raw stream throughput (single draws and buffered uniforms)
//! - Inverse-CDF normal and triangular sampling
//! - Correlated vector sampling for growing dimensions

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use schedgen_core::correlation::{CorrelatedSampler, CorrelatedTriangular, CorrelationMatrix};
use schedgen_core::distributions::{Normal, Triangular, UnivariateSampler};
use schedgen_core::rng::StreamGenerator;

/// Equicorrelated matrix with off-diagonal `rho`.
fn equicorrelated(dim: usize, rho: f64) -> CorrelationMatrix<f64> {
    let data: Vec<f64> = (0..dim * dim)
        .map(|k| if k / dim == k % dim { 1.0 } else { rho })
        .collect();
    CorrelationMatrix::new(&data, dim).unwrap()
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");

    for n in [1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("next_u64", n), &n, |b, &n| {
            let stream = StreamGenerator::new(42);
            b.iter(|| {
                let mut acc = 0u64;
                for _ in 0..n {
                    acc ^= stream.next_u64();
                }
                black_box(acc)
            });
        });

        group.bench_with_input(BenchmarkId::new("fill_uniform", n), &n, |b, &n| {
            let stream = StreamGenerator::new(42);
            let mut buffer = vec![0.0; n];
            b.iter(|| {
                stream.fill_uniform(&mut buffer);
                black_box(buffer.iter().sum::<f64>())
            });
        });
    }

    group.finish();
}

fn bench_univariate(c: &mut Criterion) {
    let mut group = c.benchmark_group("univariate");
    let normal = Normal::new(500.0, 5.0).unwrap();
    let triangular = Triangular::new(5.0, 7.0, 10.0).unwrap();

    for n in [1_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("normal_fill", n), &n, |b, &n| {
            let stream = StreamGenerator::new(7);
            let mut buffer = vec![0.0; n];
            b.iter(|| {
                normal.fill(&stream, &mut buffer);
                black_box(buffer.iter().sum::<f64>())
            });
        });

        group.bench_with_input(BenchmarkId::new("triangular_fill", n), &n, |b, &n| {
            let stream = StreamGenerator::new(7);
            let mut buffer = vec![0.0; n];
            b.iter(|| {
                triangular.fill(&stream, &mut buffer);
                black_box(buffer.iter().sum::<f64>())
            });
        });
    }

    group.finish();
}

fn bench_correlated(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlated");

    for dim in [2, 10, 50] {
        let corr = equicorrelated(dim, 0.3);
        let sampler = CorrelatedSampler::standard(&corr);
        group.bench_with_input(BenchmarkId::new("normal_vector", dim), &dim, |b, &dim| {
            let stream = StreamGenerator::new(11);
            let mut out = vec![0.0; dim];
            b.iter(|| {
                sampler.fill_vector(&stream, &mut out);
                black_box(out[dim - 1])
            });
        });

        let marginal = Triangular::new(0.8, 1.0, 1.3).unwrap();
        let copula = CorrelatedTriangular::new(marginal, &corr);
        group.bench_with_input(BenchmarkId::new("triangular_vector", dim), &dim, |b, _| {
            let stream = StreamGenerator::new(11);
            b.iter(|| black_box(copula.next_vector(&stream)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stream, bench_univariate, bench_correlated);
criterion_main!(benches);
