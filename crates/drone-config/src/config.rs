//! Synth settings file format.

use std::path::Path;

use drone_core::{AudioEngine, linear_to_db};
use drone_synth::{
    DEFAULT_AMPLITUDE, DEFAULT_BASE_FREQUENCY, DEFAULT_CLIP_THRESHOLD, DEFAULT_MODULATION_DEPTH,
    DEFAULT_VOLUME, DroneSynth, OPERATOR_COUNT, RoutingAlgorithm, SmoothingSettings,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::factory_algorithms::{DEFAULT_ALGORITHM, get_factory_algorithm};
use crate::paths::find_algorithm_file;

/// Where the routing algorithm comes from.
///
/// In TOML either a name (`algorithm = "cross"`) or an inline table
/// (`algorithm = { mod = [[0, 1]], out = [1] }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmSource {
    /// Factory algorithm name, descriptor file path, or user algorithm name.
    Named(String),
    /// Descriptor written out in place.
    Inline(RoutingAlgorithm),
}

impl Default for AlgorithmSource {
    fn default() -> Self {
        Self::Named(DEFAULT_ALGORITHM.to_string())
    }
}

impl AlgorithmSource {
    /// Resolves to a concrete algorithm.
    pub fn resolve(&self) -> Result<RoutingAlgorithm, ConfigError> {
        match self {
            Self::Inline(algorithm) => Ok(algorithm.clone()),
            Self::Named(name) => resolve_algorithm(name),
        }
    }
}

/// Resolves an algorithm reference.
///
/// Tries, in order: a factory algorithm name, an inline JSON descriptor
/// (anything starting with `{`), a descriptor file path, and a user
/// algorithm name.
pub fn resolve_algorithm(reference: &str) -> Result<RoutingAlgorithm, ConfigError> {
    if let Some(algorithm) = get_factory_algorithm(reference) {
        return Ok(algorithm);
    }
    let trimmed = reference.trim_start();
    if trimmed.starts_with('{') {
        return Ok(RoutingAlgorithm::from_json(trimmed)?);
    }
    let Some(path) = find_algorithm_file(reference) else {
        return Err(ConfigError::UnknownAlgorithm(reference.to_string()));
    };
    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::read_file(&path, e))?;
    tracing::debug!("loaded algorithm {reference} from {}", path.display());
    Ok(RoutingAlgorithm::from_json(&content)?)
}

/// Synth settings.
///
/// # TOML Format
///
/// ```toml
/// base_frequency = 55.0
/// modulation_depth = 1.0
/// volume_db = -1.94
/// amplitudes = [0.25, 0.25, 0.25, 0.25]
/// clip_threshold = 0.8
/// algorithm = "cross"
///
/// [smoothing]
/// amplitude_factor = 0.1
/// volume_factor = 0.5
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Base frequency in Hz.
    pub base_frequency: f32,
    /// Modulation depth.
    pub modulation_depth: f32,
    /// Master volume in dB.
    pub volume_db: f32,
    /// Initial operator amplitudes (0–1).
    pub amplitudes: [f32; OPERATOR_COUNT],
    /// Clipper threshold (0–1].
    pub clip_threshold: f32,
    /// Routing algorithm.
    pub algorithm: AlgorithmSource,
    /// Smoothing constants.
    pub smoothing: SmoothingSettings,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            modulation_depth: DEFAULT_MODULATION_DEPTH,
            volume_db: linear_to_db(DEFAULT_VOLUME),
            amplitudes: [DEFAULT_AMPLITUDE; OPERATOR_COUNT],
            clip_threshold: DEFAULT_CLIP_THRESHOLD,
            algorithm: AlgorithmSource::default(),
            smoothing: SmoothingSettings::default(),
        }
    }
}

impl SynthConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Checks every value against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return Err(ConfigError::invalid(
                "base_frequency",
                format!("must be a positive frequency, got {}", self.base_frequency),
            ));
        }
        if !(self.modulation_depth.is_finite() && self.modulation_depth >= 0.0) {
            return Err(ConfigError::invalid(
                "modulation_depth",
                format!("must be non-negative, got {}", self.modulation_depth),
            ));
        }
        if !self.volume_db.is_finite() || self.volume_db > 12.0 {
            return Err(ConfigError::invalid(
                "volume_db",
                format!("must be at most 12 dB, got {}", self.volume_db),
            ));
        }
        if let Some(a) = self.amplitudes.iter().find(|a| !(0.0..=1.0).contains(*a)) {
            return Err(ConfigError::invalid(
                "amplitudes",
                format!("each must be within 0..=1, got {a}"),
            ));
        }
        if !(self.clip_threshold > 0.0 && self.clip_threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "clip_threshold",
                format!("must be within (0, 1], got {}", self.clip_threshold),
            ));
        }
        for (field, factor) in [
            ("smoothing.amplitude_factor", self.smoothing.amplitude_factor),
            ("smoothing.volume_factor", self.smoothing.volume_factor),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be within (0, 1], got {factor}"),
                ));
            }
        }
        if self.smoothing.lookahead < 0.0 || self.smoothing.time_constant <= 0.0 {
            return Err(ConfigError::invalid(
                "smoothing",
                "lookahead must be >= 0 and time_constant > 0",
            ));
        }
        Ok(())
    }

    /// Validates the settings, resolves the algorithm, and builds an idle
    /// synth around `engine`.
    pub fn build_synth<E: AudioEngine>(&self, engine: E) -> Result<DroneSynth<E>, ConfigError> {
        self.validate()?;
        let algorithm = self.algorithm.resolve()?;
        if !algorithm.is_in_range() {
            tracing::warn!(
                "algorithm {} names missing operators; they will be skipped",
                algorithm.to_json()
            );
        }

        let mut synth = DroneSynth::with_settings(engine, algorithm, self.smoothing);
        synth.set_base_frequency(self.base_frequency)?;
        synth.set_modulation_depth(self.modulation_depth)?;
        synth.set_volume_db(self.volume_db, true);
        synth.set_clip_threshold(self.clip_threshold);
        for (index, amplitude) in self.amplitudes.iter().enumerate() {
            synth.set_amplitude(index, *amplitude)?;
        }
        Ok(synth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drone_core::HeadlessEngine;
    use tempfile::TempDir;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = SynthConfig::from_toml("").unwrap();
        assert_eq!(config, SynthConfig::default());
        assert!((config.volume_db - (-1.938)).abs() < 0.01);
    }

    #[test]
    fn named_and_inline_algorithms_parse() {
        let named = SynthConfig::from_toml(r#"algorithm = "stack""#).unwrap();
        assert_eq!(named.algorithm, AlgorithmSource::Named("stack".into()));

        let inline =
            SynthConfig::from_toml("algorithm = { mod = [[0, 1], [1, 0]], out = [0] }").unwrap();
        assert_eq!(
            inline.algorithm,
            AlgorithmSource::Inline(RoutingAlgorithm::new([(0, 1), (1, 0)], [0]))
        );
    }

    #[test]
    fn unknown_algorithm_name_fails_to_resolve() {
        let err = resolve_algorithm("no_such_algorithm_12345").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAlgorithm(_)));
    }

    #[test]
    fn inline_json_reference_resolves() {
        let alg = resolve_algorithm(r#"{"mod": [[2, 3]], "out": [3]}"#).unwrap();
        assert_eq!(alg, RoutingAlgorithm::new([(2, 3)], [3]));
        assert!(matches!(
            resolve_algorithm("{broken"),
            Err(ConfigError::Algorithm(_))
        ));
    }

    #[test]
    fn algorithm_file_resolves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mine.json");
        std::fs::write(&path, r#"{"mod": [[1, 0]], "out": [0]}"#).unwrap();

        let alg = resolve_algorithm(path.to_str().unwrap()).unwrap();
        assert_eq!(alg.modulations, vec![(1, 0)]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("drone.toml");
        let config = SynthConfig {
            base_frequency: 73.4,
            algorithm: AlgorithmSource::Inline(RoutingAlgorithm::new([(0, 1)], [1])),
            ..SynthConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(SynthConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = SynthConfig::load("/nonexistent/drone.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/drone.toml"));
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let bad = [
            SynthConfig {
                base_frequency: 0.0,
                ..SynthConfig::default()
            },
            SynthConfig {
                modulation_depth: -1.0,
                ..SynthConfig::default()
            },
            SynthConfig {
                amplitudes: [0.25, 1.5, 0.25, 0.25],
                ..SynthConfig::default()
            },
            SynthConfig {
                clip_threshold: 0.0,
                ..SynthConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { .. })
            ));
        }
        assert!(SynthConfig::default().validate().is_ok());
    }

    #[test]
    fn build_synth_applies_settings() {
        let config = SynthConfig::from_toml(
            r#"
base_frequency = 110.0
modulation_depth = 0.5
volume_db = 0.0
amplitudes = [1.0, 0.0, 0.0, 0.0]
algorithm = "stack"
"#,
        )
        .unwrap();

        let synth = config.build_synth(HeadlessEngine::new()).unwrap();
        assert_eq!(synth.chain().base_frequency(), 110.0);
        assert_eq!(synth.chain().modulation_depth(), 0.5);
        assert!((synth.volume() - 1.0).abs() < 1e-6);
        assert_eq!(synth.amplitudes(), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(synth.algorithm().outputs, vec![0]);
        assert!(!synth.is_running());
    }
}
