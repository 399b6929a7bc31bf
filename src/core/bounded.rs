// Bounded scalar arithmetic shared by neuron activations and synapse
// strengths. Every write into the engine clamps through a `Bounds`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::prng::Prng;

/// Inclusive value range `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Clamp `value` into the range.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Draw a value uniformly from `[lower, upper]`.
    #[inline]
    pub fn sample(&self, rng: &mut Prng) -> f64 {
        rng.gen_range_f64(self.lower, self.upper)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err("bounds must be finite");
        }
        if self.lower > self.upper {
            return Err("lower bound must be <= upper bound");
        }
        Ok(())
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            lower: -1.0,
            upper: 1.0,
        }
    }
}

/// Round to a fixed number of decimal digits.
///
/// Hopfield uses `digits = 0`, yielding integral ±1/0-valued weights for a
/// binary network.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_pins_to_range() {
        let b = Bounds::new(-1.0, 1.0);
        assert_eq!(b.clamp(3.5), 1.0);
        assert_eq!(b.clamp(-3.5), -1.0);
        assert_eq!(b.clamp(0.25), 0.25);
    }

    #[test]
    fn sample_stays_in_range() {
        let b = Bounds::new(-2.0, 0.5);
        let mut rng = Prng::new(11);
        for _ in 0..500 {
            assert!(b.contains(b.sample(&mut rng)));
        }
    }

    #[test]
    fn validate_rejects_inverted_and_nonfinite() {
        assert!(Bounds::new(1.0, -1.0).validate().is_err());
        assert!(Bounds::new(f64::NAN, 1.0).validate().is_err());
        assert!(Bounds::new(-1.0, f64::INFINITY).validate().is_err());
        assert!(Bounds::new(-1.0, 1.0).validate().is_ok());
    }

    #[test]
    fn round_to_zero_digits_gives_integers() {
        assert_eq!(round_to(0.6, 0), 1.0);
        assert_eq!(round_to(-0.6, 0), -1.0);
        assert_eq!(round_to(0.4, 0), 0.0);
        assert_eq!(round_to(0.125, 2), 0.13);
    }
}
