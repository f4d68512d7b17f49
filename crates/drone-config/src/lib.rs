//! Configuration and algorithm management for the drone synthesizer.
//!
//! # Features
//!
//! - **Settings**: Load and save [`SynthConfig`] TOML files and build a synth from them
//! - **Algorithms**: Resolve algorithm references (factory name, inline JSON, file, user name)
//! - **Paths**: Platform-specific config and user algorithm directories
//! - **Factory Algorithms**: Built-in routings that need no file on disk
//!
//! # Example
//!
//! ```rust
//! use drone_config::SynthConfig;
//! use drone_core::HeadlessEngine;
//!
//! let config = SynthConfig::from_toml(r#"
//! base_frequency = 41.2
//! algorithm = "feedback_pair"
//! "#).unwrap();
//!
//! let mut synth = config.build_synth(HeadlessEngine::new()).unwrap();
//! synth.start().unwrap();
//! assert_eq!(synth.graph().delay_nodes().count(), 1);
//! ```

mod config;
mod error;

/// Platform-specific paths for settings and user algorithms.
pub mod paths;

/// Factory algorithms bundled with the library.
pub mod factory_algorithms;

pub use config::{AlgorithmSource, SynthConfig, resolve_algorithm};
pub use error::ConfigError;
pub use factory_algorithms::{
    DEFAULT_ALGORITHM, FACTORY_ALGORITHMS, FactoryAlgorithm, factory_algorithm_names,
    get_factory_algorithm, is_factory_algorithm,
};
pub use paths::{
    algorithm_name_from_path, default_config_path, ensure_user_algorithms_dir,
    ensure_user_config_dir, find_algorithm_file, list_user_algorithms, user_algorithms_dir,
    user_config_dir,
};
