//! Operator Microbenchmarks
//!
//! Throughput of the exact per-gate weight operators (spec §4.1) and the
//! injection model's rank computation (spec §4.2) in isolation from the
//! search engine.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use arxhull_core::fixtures::neoalzette;
use arxhull_core::weight::{add_var_const, add_var_var, wallen};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use std::hint::black_box;

fn bench_schulte_geers_weight(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let triples: Vec<(u32, u32, u32)> = (0..4096)
        .map(|_| (rng.gen(), rng.gen(), rng.gen()))
        .collect();

    c.bench_function("add_var_var::weight", |b| {
        b.iter(|| {
            for &(u, v, w) in &triples {
                black_box(add_var_var::weight(black_box(u), black_box(v), black_box(w)));
            }
        });
    });
}

fn bench_wallen_weight(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let triples: Vec<(u32, u32, u32)> = (0..4096)
        .map(|_| (rng.gen(), rng.gen(), rng.gen()))
        .collect();

    c.bench_function("wallen::weight", |b| {
        b.iter(|| {
            for &(u, v, w) in &triples {
                black_box(wallen::weight(black_box(u), black_box(v), black_box(w)));
            }
        });
    });
}

fn bench_add_var_var_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_var_var::enumerate");
    for cap in [2u32, 4, 8] {
        group.bench_function(format!("cap={cap}"), |b| {
            b.iter(|| black_box(add_var_var::enumerate(black_box(0x8000_0001), black_box(cap))));
        });
    }
    group.finish();
}

fn bench_var_const_weight(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let triples: Vec<(u32, u32, u32)> = (0..4096)
        .map(|_| (rng.gen(), rng.gen(), rng.gen()))
        .collect();

    c.bench_function("add_var_const::weight", |b| {
        b.iter(|| {
            for &(alpha, beta, konst) in &triples {
                black_box(add_var_const::weight(
                    black_box(alpha),
                    black_box(beta),
                    black_box(konst),
                ));
            }
        });
    });
}

fn bench_injection_transition(c: &mut Criterion) {
    let desc = neoalzette::cipher_description();
    let mut rng = rand::thread_rng();
    let masks: Vec<u32> = (0..4096).map(|_| rng.gen()).collect();

    c.bench_function("injection_a::transition", |b| {
        b.iter(|| {
            for &u in &masks {
                black_box(desc.injection_a.transition(black_box(u)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_schulte_geers_weight,
    bench_wallen_weight,
    bench_add_var_var_enumerate,
    bench_var_const_weight,
    bench_injection_transition,
);
criterion_main!(benches);
