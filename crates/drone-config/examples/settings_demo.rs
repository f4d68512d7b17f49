//! Settings demo: load a settings file, resolve algorithms, build a synth.
//!
//! Run with: cargo run -p drone-config --example settings_demo

use drone_config::{FACTORY_ALGORITHMS, SynthConfig, resolve_algorithm};
use drone_core::HeadlessEngine;

fn main() {
    println!("=== Factory Algorithms ===\n");
    for factory in FACTORY_ALGORITHMS {
        let algorithm = factory.algorithm();
        println!(
            "{:<14} feedback={:<5} {}",
            factory.name,
            algorithm.has_feedback(),
            algorithm.to_json()
        );
    }

    println!("\n=== Settings ===\n");
    let toml = r#"
base_frequency = 41.2
modulation_depth = 0.6
volume_db = -6.0
algorithm = { mod = [[0, 1], [1, 2], [2, 0]], out = [0] }

[smoothing]
amplitude_factor = 0.2
"#;
    let config = match SynthConfig::from_toml(toml) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid settings: {err}");
            return;
        }
    };
    match config.to_toml() {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("serialize failed: {err}"),
    }

    let mut synth = match config.build_synth(HeadlessEngine::new()) {
        Ok(synth) => synth,
        Err(err) => {
            eprintln!("build failed: {err}");
            return;
        }
    };
    match synth.start() {
        Ok(summary) => println!(
            "Started: {} paths, {} delays\n{}",
            summary.modulation_paths,
            summary.delays.len(),
            synth.graph().describe()
        ),
        Err(err) => eprintln!("start failed: {err}"),
    }

    println!("=== Resolving references ===\n");
    for reference in ["stack", r#"{"mod": [[3, 3]], "out": [3]}"#, "missing_one"] {
        match resolve_algorithm(reference) {
            Ok(algorithm) => println!("{reference:<32} -> {}", algorithm.to_json()),
            Err(err) => println!("{reference:<32} -> error: {err}"),
        }
    }
}
