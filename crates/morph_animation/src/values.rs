//! Interpolated value kinds
//!
//! Derived sheet visuals blend scalars, lengths and colors between their
//! collapsed and expanded forms through [`Interpolate`].

use morph_core::{units, Color, Dp};

/// A value that can be blended toward another one
pub trait Interpolate: Clone {
    /// Blend toward `other`; `t = 0` is `self`, `t = 1` is `other`
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Equal within `epsilon` on every component
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        units::lerp(*self, *other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Interpolate for Dp {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Dp::lerp(*self, *other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.0.approx_eq(&other.0, epsilon)
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        [
            (self.r, other.r),
            (self.g, other.g),
            (self.b, other.b),
            (self.a, other.a),
        ]
        .iter()
        .all(|(a, b)| a.approx_eq(b, epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_blend() {
        assert_eq!(Interpolate::lerp(&0.0f32, &10.0, 0.25), 2.5);
        assert!(1.0f32.approx_eq(&1.0005, 0.001));
    }

    #[test]
    fn test_elevation_midpoint() {
        assert_eq!(Interpolate::lerp(&Dp(2.0), &Dp(12.0), 0.5), Dp(7.0));
        assert!(Dp(26.0).approx_eq(&Dp(26.004), 0.01));
    }

    #[test]
    fn test_color_blend_is_per_channel() {
        let mid = Interpolate::lerp(&Color::BLACK, &Color::WHITE, 0.5);
        assert!(mid.approx_eq(&Color::rgb(0.5, 0.5, 0.5), 1e-6));
        assert!(!mid.approx_eq(&Color::WHITE, 0.1));
    }
}
