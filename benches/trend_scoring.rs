//! Trend scoring benchmarks.
//!
//! Run with: cargo bench --bench trend_scoring

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use soil_scorer_rust::{estimate_trend, score_and_label, synthesize_series};

/// Slowly declining series with a seasonal wobble
fn make_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            0.7 - 0.002 * t + 0.05 * (t / 4.0).sin()
        })
        .collect()
}

fn bench_estimate_trend(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_trend");

    // a parcel sees ~23 Landsat passes a year
    for size in [12, 70, 1_000] {
        let series = make_series(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &series, |b, s| {
            b.iter(|| estimate_trend(black_box(s)).unwrap());
        });
    }
    group.finish();
}

fn bench_score_and_label(c: &mut Criterion) {
    let series = make_series(70);
    c.bench_function("score_and_label_70", |b| {
        b.iter(|| score_and_label(black_box(&series)).unwrap());
    });
}

fn bench_synthesize(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("synthesize_series", |b| {
        b.iter(|| synthesize_series(&mut rng, black_box(today)));
    });
}

criterion_group!(benches, bench_estimate_trend, bench_score_and_label, bench_synthesize);
criterion_main!(benches);
