//! Aggregation math benchmarks.

#![allow(missing_docs, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use quote_consensus::domain::entities::{AggregateResult, Quote};
use quote_consensus::domain::value_objects::{Region, SourceId};
use std::hint::black_box;

fn quotes(n: usize) -> Vec<Quote> {
    (0..n)
        .map(|i| {
            let buy = 1_150.0 + (i % 17) as f64 * 3.25;
            Quote::observe(SourceId::new(format!("https://source-{i}.test")), buy, buy + 40.0)
                .unwrap()
        })
        .collect()
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_compute");
    for n in [3usize, 10, 100] {
        let input = quotes(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, input| {
            b.iter(|| AggregateResult::compute(Region::Ars, black_box(input.clone()), Vec::new()));
        });
    }
    group.finish();
}

fn bench_slippage(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_slippage");
    for n in [3usize, 10, 100] {
        let result = AggregateResult::compute(Region::Ars, quotes(n), Vec::new());
        group.bench_with_input(BenchmarkId::from_parameter(n), &result, |b, result| {
            b.iter(|| black_box(result).slippage());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute, bench_slippage);
criterion_main!(benches);
