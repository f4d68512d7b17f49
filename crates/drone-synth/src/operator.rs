//! FM operators.
//!
//! An operator is one oscillator plus the carrier gain that routes it to the
//! output bus. Its frequency is derived from the shared base frequency through
//! a fixed ratio and a small fixed beat offset, so operators drift against
//! each other slowly even when the ratios are harmonic.

use drone_core::{ControlSmoother, NodeId};

/// Number of operators in the synth.
pub const OPERATOR_COUNT: usize = 4;

/// Frequency ratio of each operator relative to the base frequency.
pub const FREQUENCY_RATIOS: [f32; OPERATOR_COUNT] = [1.0, 2.0, 3.0, 4.0];

/// Beat offset of each operator in Hz.
pub const BEAT_OFFSETS: [f32; OPERATOR_COUNT] = [0.0, 1.5135, 2.3035, 2.46];

/// Resting amplitude of every operator.
pub const DEFAULT_AMPLITUDE: f32 = 0.25;

/// One FM operator.
#[derive(Debug, Clone)]
pub struct Operator {
    index: usize,
    ratio: f32,
    beat: f32,
    pub(crate) osc: Option<NodeId>,
    pub(crate) carrier: Option<NodeId>,
    amplitude: ControlSmoother,
}

impl Operator {
    /// Creates operator `index` with the given amplitude smoothing factor.
    ///
    /// Ratio and beat come from [`FREQUENCY_RATIOS`] and [`BEAT_OFFSETS`];
    /// indices past the table fall back to ratio 1 with no beat.
    pub fn new(index: usize, amplitude_factor: f32) -> Self {
        Self {
            index,
            ratio: FREQUENCY_RATIOS.get(index).copied().unwrap_or(1.0),
            beat: BEAT_OFFSETS.get(index).copied().unwrap_or(0.0),
            osc: None,
            carrier: None,
            amplitude: ControlSmoother::new(DEFAULT_AMPLITUDE, amplitude_factor),
        }
    }

    /// Operator index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Frequency ratio.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Beat offset in Hz.
    pub fn beat(&self) -> f32 {
        self.beat
    }

    /// Oscillator frequency for a base frequency: `base × ratio + beat`.
    #[inline]
    pub fn frequency(&self, base: f32) -> f32 {
        base * self.ratio + self.beat
    }

    /// Oscillator node, while nodes exist.
    pub fn osc(&self) -> Option<NodeId> {
        self.osc
    }

    /// Carrier gain node, while nodes exist.
    pub fn carrier(&self) -> Option<NodeId> {
        self.carrier
    }

    /// Amplitude smoother.
    pub fn amplitude(&self) -> &ControlSmoother {
        &self.amplitude
    }

    /// Mutable amplitude smoother.
    pub fn amplitude_mut(&mut self) -> &mut ControlSmoother {
        &mut self.amplitude
    }
}

/// The full operator bank.
pub fn operators(amplitude_factor: f32) -> [Operator; OPERATOR_COUNT] {
    core::array::from_fn(|i| Operator::new(i, amplitude_factor))
}

/// Bilinear corner weights for a normalized 2-D position.
///
/// Operators sit at the corners of the unit square: 0 top-left, 1 top-right,
/// 2 bottom-left, 3 bottom-right. Coordinates are clamped to `[0, 1]`; the
/// weights always sum to 1.
pub fn corner_weights(x: f32, y: f32) -> [f32; OPERATOR_COUNT] {
    let x = x.clamp(0.0, 1.0);
    let y = y.clamp(0.0, 1.0);
    [(1.0 - x) * (1.0 - y), x * (1.0 - y), (1.0 - x) * y, x * y]
}
