//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use clap::Args;
use drone_config::{AlgorithmSource, SynthConfig, default_config_path};

/// Settings shared by commands that build a synth.
#[derive(Args, Debug, Clone, Default)]
pub struct SynthOptions {
    /// Settings file (defaults to the user config file if it exists)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Algorithm: factory name, descriptor file, user algorithm, or inline JSON
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Base frequency in Hz
    #[arg(short = 'f', long)]
    pub base_frequency: Option<f32>,

    /// Modulation depth
    #[arg(short, long)]
    pub depth: Option<f32>,

    /// Master volume in dB
    #[arg(long, allow_hyphen_values = true)]
    pub volume_db: Option<f32>,
}

impl SynthOptions {
    /// Loads the settings file and applies command-line overrides.
    pub fn load(&self) -> anyhow::Result<SynthConfig> {
        let mut config = match self.config_path() {
            Some(path) => {
                tracing::debug!("loading settings from {}", path.display());
                SynthConfig::load(&path)?
            }
            None => SynthConfig::default(),
        };

        if let Some(algorithm) = &self.algorithm {
            config.algorithm = AlgorithmSource::Named(algorithm.clone());
        }
        if let Some(frequency) = self.base_frequency {
            config.base_frequency = frequency;
        }
        if let Some(depth) = self.depth {
            config.modulation_depth = depth;
        }
        if let Some(db) = self.volume_db {
            config.volume_db = db;
        }
        config.validate()?;
        Ok(config)
    }

    fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => {
                let path = default_config_path();
                path.is_file().then_some(path)
            }
        }
    }
}

/// Parse an `x,y` position for clap's `value_parser`.
pub fn parse_position(s: &str) -> Result<(f32, f32), String> {
    let Some((x, y)) = s.split_once(',') else {
        return Err(format!("Invalid position: '{s}' (expected x,y)"));
    };
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("Invalid coordinate '{v}': {e}"))
    };
    Ok((parse(x)?, parse(y)?))
}

/// A one-line level meter: `[#####     ] 0.50`.
pub fn meter(value: f32, width: usize) -> String {
    let filled = ((value.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("[{}{}] {value:.2}", "#".repeat(filled), " ".repeat(width - filled))
}

/// Displays a path relative to the working directory when possible.
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
