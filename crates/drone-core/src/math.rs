//! Level and shaping helpers.

use libm::{cosf, expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use drone_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// # Example
/// ```rust
/// use drone_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Hard clip to ±threshold range.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Quarter-cosine loudness curve: `cos((1 - t) · π/2)`.
///
/// Maps 0 → 0 and 1 → 1 with a steep start, so equal steps in `t` near zero
/// are not heard as equal steps in loudness.
#[inline]
pub fn cos_weighting(t: f32) -> f32 {
    cosf((1.0 - t) * core::f32::consts::FRAC_PI_2)
}

/// Hard-clip transfer curve for a wave-shaper with `points` samples
/// spanning input [-1, 1).
///
/// Sample `i` is `hard_clip(i / (points / 2) - 1, threshold)`.
pub fn clip_curve(points: usize, threshold: f32) -> Vec<f32> {
    let half = (points / 2).max(1) as f32;
    (0..points)
        .map(|i| hard_clip(i as f32 / half - 1.0, threshold))
        .collect()
}
