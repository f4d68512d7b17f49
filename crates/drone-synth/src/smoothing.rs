//! Amplitude and volume smoothing constants.
//!
//! Each control tick moves operator amplitudes and the master volume a fixed
//! fraction toward their targets, then schedules a short exponential ramp on
//! the matching gain node slightly ahead of the engine clock.

use drone_core::cos_weighting;
use serde::{Deserialize, Serialize};

/// Per-tick smoothing and ramp constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingSettings {
    /// Fraction of the remaining amplitude distance covered per tick.
    pub amplitude_factor: f32,
    /// Fraction of the remaining volume distance covered per tick.
    pub volume_factor: f32,
    /// Seconds ahead of the engine clock at which ramps begin.
    pub lookahead: f64,
    /// Ramp time constant in seconds.
    pub time_constant: f64,
    /// Carrier gain at full amplitude.
    pub carrier_scale: f32,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            amplitude_factor: 0.1,
            volume_factor: 0.5,
            lookahead: 0.05,
            time_constant: 0.015,
            carrier_scale: 0.2,
        }
    }
}

impl SmoothingSettings {
    /// Carrier gain for an operator amplitude: `cos_weighting(a) × carrier_scale`.
    #[inline]
    pub fn carrier_level(&self, amplitude: f32) -> f32 {
        cos_weighting(amplitude) * self.carrier_scale
    }
}
