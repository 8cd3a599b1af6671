//! Density-independent units
//!
//! Layout values are authored in [`Dp`] and converted to pixels through a
//! [`Density`] at the edges; gesture math runs in pixels.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Linear interpolation between `start` and `stop` by `fraction`
///
/// `fraction` is not clamped.
#[inline]
pub fn lerp(start: f32, stop: f32, fraction: f32) -> f32 {
    start + (stop - start) * fraction
}

/// A length in density-independent pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dp(pub f32);

impl Dp {
    pub const ZERO: Dp = Dp(0.0);

    pub const fn new(value: f32) -> Self {
        Dp(value)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Interpolate between two lengths
    pub fn lerp(start: Dp, stop: Dp, fraction: f32) -> Dp {
        Dp(lerp(start.0, stop.0, fraction))
    }

    pub fn coerce_at_least(self, minimum: Dp) -> Dp {
        Dp(self.0.max(minimum.0))
    }
}

impl Add for Dp {
    type Output = Dp;
    fn add(self, rhs: Dp) -> Dp {
        Dp(self.0 + rhs.0)
    }
}

impl Sub for Dp {
    type Output = Dp;
    fn sub(self, rhs: Dp) -> Dp {
        Dp(self.0 - rhs.0)
    }
}

impl Mul<f32> for Dp {
    type Output = Dp;
    fn mul(self, rhs: f32) -> Dp {
        Dp(self.0 * rhs)
    }
}

impl Div<f32> for Dp {
    type Output = Dp;
    fn div(self, rhs: f32) -> Dp {
        Dp(self.0 / rhs)
    }
}

impl Neg for Dp {
    type Output = Dp;
    fn neg(self) -> Dp {
        Dp(-self.0)
    }
}

/// Screen density: pixels per dp
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Density {
    pub density: f32,
}

impl Default for Density {
    fn default() -> Self {
        Self { density: 1.0 }
    }
}

impl Density {
    pub const fn new(density: f32) -> Self {
        Self { density }
    }

    pub fn to_px(&self, dp: Dp) -> f32 {
        dp.0 * self.density
    }

    pub fn to_dp(&self, px: f32) -> Dp {
        if self.density == 0.0 {
            Dp::ZERO
        } else {
            Dp(px / self.density)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(32.0, 26.0, 1.0), 26.0);
        assert_eq!(lerp(2.0, 12.0, 0.0), 2.0);
    }

    #[test]
    fn test_dp_lerp_and_ops() {
        assert_eq!(Dp::lerp(Dp(12.0), Dp(26.0), 0.5), Dp(19.0));
        assert_eq!(Dp(4.0) + Dp(2.0), Dp(6.0));
        assert_eq!(Dp(4.0) * 0.5, Dp(2.0));
        assert_eq!(Dp(-1.0).coerce_at_least(Dp::ZERO), Dp::ZERO);
    }

    #[test]
    fn test_density_conversion() {
        let density = Density::new(2.5);
        assert_eq!(density.to_px(Dp(18.0)), 45.0);
        assert_eq!(density.to_dp(45.0), Dp(18.0));
        assert_eq!(Density::new(0.0).to_dp(10.0), Dp::ZERO);
    }
}
