//! Drone Synth - four-operator FM drone built on the drone routing graph
//!
//! This crate turns declarative FM routing descriptions into routing-graph
//! operations and keeps the resulting node graph in step with live control
//! changes.
//!
//! # Core Components
//!
//! ## Algorithms
//!
//! - [`RoutingAlgorithm`] - Modulation pairs and output set, with a JSON form
//!
//! ## Chain Builder
//!
//! - [`FmChain`] - Operators and modulation gains; build, teardown, live parameter updates
//! - [`Operator`] - One oscillator plus its carrier gain
//! - [`ChainSummary`] - What a rebuild wired, skipped, and delayed
//!
//! ## Synthesizer
//!
//! - [`DroneSynth`] - Lifecycle, output stage (master → clipper → destination), smoothing
//! - [`SmoothingSettings`] - Per-tick amplitude and volume smoothing constants
//!
//! # Example
//!
//! ```rust
//! use drone_core::HeadlessEngine;
//! use drone_synth::{DroneSynth, RoutingAlgorithm};
//!
//! let alg = RoutingAlgorithm::from_json(r#"{"mod": [[0, 2], [1, 3], [2, 0], [3, 1]], "out": [0, 1, 2, 3]}"#).unwrap();
//! let mut synth = DroneSynth::new(HeadlessEngine::new(), alg);
//!
//! let summary = synth.start().unwrap();
//! assert_eq!(summary.modulation_paths, 4);
//! assert_eq!(summary.outputs, 4);
//!
//! synth.set_base_frequency(110.0).unwrap();
//! synth.set_volume_db(-6.0, false);
//! synth.tick().unwrap();
//! ```

pub mod algorithm;
pub mod chain;
pub mod error;
pub mod operator;
pub mod smoothing;
pub mod synth;

pub use algorithm::{AlgorithmError, OperatorIndex, RoutingAlgorithm, operator_slot};
pub use chain::{ChainSummary, FmChain, ModulationGain};
pub use error::SynthError;
pub use operator::{
    BEAT_OFFSETS, DEFAULT_AMPLITUDE, FREQUENCY_RATIOS, OPERATOR_COUNT, Operator, corner_weights,
};
pub use smoothing::SmoothingSettings;
pub use synth::{
    CLIP_CURVE_POINTS, DEFAULT_BASE_FREQUENCY, DEFAULT_CLIP_THRESHOLD, DEFAULT_MODULATION_DEPTH,
    DEFAULT_VOLUME, DroneSynth, SynthState,
};
