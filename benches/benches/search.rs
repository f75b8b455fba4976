//! Search Engine Benchmarks
//!
//! End-to-end DFS throughput (spec §4.5) on the built-in NeoAlzette fixture,
//! across round counts and gate weight caps, to track regressions in the
//! kernel/pruning hot path.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use arxhull_core::fixtures::neoalzette;
use arxhull_core::runtime::RuntimeContext;
use arxhull_core::{BranchPair, Engine, SearchConfiguration, SearchContext};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn bench_two_round_search(c: &mut Criterion) {
    let desc = neoalzette::cipher_description();
    let runtime = RuntimeContext::new();
    let start = BranchPair::new(0x1234_5678, 0x9ABC_DEF0);

    let mut group = c.benchmark_group("search/2-round");
    for cap in [4u32, 6, 8] {
        group.bench_function(format!("gate_weight_cap={cap}"), |b| {
            b.iter(|| {
                let mut config = SearchConfiguration::new(2);
                config.gate_weight_cap = cap;
                config.max_nodes = 2_000_000;
                let engine = Engine::new(&desc, &config, &runtime, start);
                let mut ctx = SearchContext::new(start, 2, true);
                black_box(engine.run(&mut ctx))
            });
        });
    }
    group.finish();
}

fn bench_memoization_impact(c: &mut Criterion) {
    let desc = neoalzette::cipher_description();
    let runtime = RuntimeContext::new();
    let start = BranchPair::new(0x0000_0001, 0x0000_0001);

    let mut group = c.benchmark_group("search/memoization");
    for memoize in [false, true] {
        group.bench_function(format!("memoize={memoize}"), |b| {
            b.iter(|| {
                let mut config = SearchConfiguration::new(3);
                config.gate_weight_cap = 6;
                config.max_nodes = 500_000;
                config.memoization_enabled = memoize;
                let engine = Engine::new(&desc, &config, &runtime, start);
                let mut ctx = SearchContext::new(start, 3, memoize);
                black_box(engine.run(&mut ctx))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_two_round_search, bench_memoization_impact);
criterion_main!(benches);
