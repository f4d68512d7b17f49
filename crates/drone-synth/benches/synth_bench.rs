//! Criterion benchmarks for drone-synth
//!
//! Run with: cargo bench -p drone-synth
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use drone_core::HeadlessEngine;
use drone_synth::{DroneSynth, RoutingAlgorithm};

const ALGORITHMS: &[(&str, &str)] = &[
    ("stack", r#"{"mod": [[3, 2], [2, 1], [1, 0]], "out": [0]}"#),
    ("ring", r#"{"mod": [[0, 1], [1, 2], [2, 3], [3, 0]], "out": [0, 1, 2, 3]}"#),
    ("cross", r#"{"mod": [[0, 2], [1, 3], [2, 0], [3, 1]], "out": [0, 1, 2, 3]}"#),
];

// ============================================================================
// Algorithm switching
// ============================================================================

fn bench_algorithm_switch(c: &mut Criterion) {
    let mut group = c.benchmark_group("Synth_Switch");

    for &(name, json) in ALGORITHMS {
        let target = RoutingAlgorithm::from_json(json).unwrap_or_default();
        let mut synth = DroneSynth::new(HeadlessEngine::new(), RoutingAlgorithm::default());
        let _ = synth.start();

        group.bench_with_input(BenchmarkId::new(name, 2), &target, |b, target| {
            b.iter(|| {
                black_box(synth.set_algorithm(target.clone()));
                black_box(synth.set_algorithm(RoutingAlgorithm::default()));
            })
        });
    }

    group.finish();
}

// ============================================================================
// Smoothing tick
// ============================================================================

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("Synth_Tick");

    for &(name, json) in ALGORITHMS {
        let algorithm = RoutingAlgorithm::from_json(json).unwrap_or_default();
        let mut synth = DroneSynth::new(HeadlessEngine::new(), algorithm);
        let _ = synth.start();
        synth.set_position(0.8, 0.3);

        group.bench_function(name, |b| b.iter(|| black_box(synth.tick().ok())));
    }

    group.finish();
}

criterion_group!(benches, bench_algorithm_switch, bench_tick);
criterion_main!(benches);
