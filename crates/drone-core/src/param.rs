//! Control-rate parameter smoothing.
//!
//! Control values (operator amplitudes, master volume) change in steps when a
//! user moves a control. [`ControlSmoother`] turns those steps into an
//! exponential glide that advances once per control tick rather than once per
//! sample.
//!
//! ## Usage
//!
//! ```rust
//! use drone_core::ControlSmoother;
//!
//! let mut amp = ControlSmoother::new(0.25, 0.1);
//! amp.set_target(1.0);
//!
//! // Once per frame
//! let value = amp.advance();
//! assert!((value - 0.325).abs() < 1e-6);
//! ```

/// A control value that moves a fixed fraction of the way to its target on
/// every tick.
///
/// `current += (target - current) * factor`
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSmoother {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Fraction of the remaining distance covered per tick (0 = frozen, 1 = instant)
    factor: f32,
}

impl ControlSmoother {
    /// Creates a smoother resting at `initial`.
    ///
    /// `factor` is clamped to `[0, 1]`.
    pub fn new(initial: f32, factor: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            factor: factor.clamp(0.0, 1.0),
        }
    }

    /// Sets the value to glide towards.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Sets target and current value at once (no glide).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Changes the per-tick smoothing factor.
    pub fn set_factor(&mut self, factor: f32) {
        self.factor = factor.clamp(0.0, 1.0);
    }

    /// Advances one tick and returns the new current value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.factor;
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Per-tick smoothing factor.
    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Jumps the current value to the target.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// Returns `true` when current is within `epsilon` of target.
    #[inline]
    pub fn is_settled(&self, epsilon: f32) -> bool {
        (self.target - self.current).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_covers_factor_of_remaining_distance() {
        let mut p = ControlSmoother::new(0.0, 0.5);
        p.set_target(1.0);
        assert_eq!(p.advance(), 0.5);
        assert_eq!(p.advance(), 0.75);
        assert_eq!(p.target(), 1.0);
    }

    #[test]
    fn converges_to_target() {
        let mut p = ControlSmoother::new(0.25, 0.1);
        p.set_target(0.9);
        for _ in 0..200 {
            p.advance();
        }
        assert!(p.is_settled(1e-4), "current = {}", p.get());
    }

    #[test]
    fn immediate_and_snap_skip_the_glide() {
        let mut p = ControlSmoother::new(0.0, 0.1);
        p.set_immediate(0.8);
        assert_eq!(p.get(), 0.8);

        p.set_target(0.2);
        p.snap_to_target();
        assert_eq!(p.get(), 0.2);
    }

    #[test]
    fn factor_is_clamped() {
        let mut p = ControlSmoother::new(0.0, 3.0);
        assert_eq!(p.factor(), 1.0);
        p.set_factor(-1.0);
        assert_eq!(p.factor(), 0.0);
        p.set_target(1.0);
        assert_eq!(p.advance(), 0.0);
    }
}
