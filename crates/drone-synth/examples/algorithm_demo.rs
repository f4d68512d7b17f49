//! Algorithm demo: build, inspect and switch FM routings on the headless engine.
//!
//! Run with: cargo run -p drone-synth --example algorithm_demo

use drone_core::HeadlessEngine;
use drone_synth::{DroneSynth, RoutingAlgorithm};

fn main() {
    let algorithms = [
        ("Stack", r#"{"mod": [[3, 2], [2, 1], [1, 0]], "out": [0]}"#),
        ("Ring", r#"{"mod": [[0, 1], [1, 0]], "out": [0, 1]}"#),
        ("Cross", r#"{"mod": [[0, 2], [1, 3], [2, 0], [3, 1]], "out": [0, 1, 2, 3]}"#),
    ];

    let mut synth = DroneSynth::new(HeadlessEngine::new(), RoutingAlgorithm::default());
    if let Err(err) = synth.start() {
        eprintln!("start failed: {err}");
        return;
    }

    for (name, json) in &algorithms {
        let summary = match synth.set_algorithm_json(json) {
            Ok(Some(summary)) => summary,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("{name}: {err}");
                continue;
            }
        };

        println!("=== {name} ===");
        println!(
            "{} modulation paths, {} outputs, {} delay nodes, {} connections\n",
            summary.modulation_paths,
            summary.outputs,
            summary.delays.len(),
            synth.graph().connection_count()
        );
        println!("{}", synth.graph().describe());
    }

    // --- Smoothing ---
    println!("=== Smoothing toward the top-right corner ===\n");
    synth.set_position(1.0, 0.0);
    for frame in 0..10 {
        let _ = synth.tick();
        let amps = synth.amplitudes();
        println!(
            "frame {frame:>2}: {:>6.3} {:>6.3} {:>6.3} {:>6.3}",
            amps[0], amps[1], amps[2], amps[3]
        );
    }

    let _ = synth.stop();
}
