//! Easing curves for duration-based animations

use serde::{Deserialize, Serialize};

/// An easing curve mapping linear time progress to value progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    /// Material standard curve, cubic-bezier(0.4, 0.0, 0.2, 1.0)
    FastOutSlowIn,
    /// Material decelerate curve, cubic-bezier(0.0, 0.0, 0.2, 1.0)
    LinearOutSlowIn,
    /// Material accelerate curve, cubic-bezier(0.4, 0.0, 1.0, 1.0)
    FastOutLinearIn,
    /// Custom cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the curve to `t` in `0.0..=1.0`
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, t),
            Easing::LinearOutSlowIn => cubic_bezier(0.0, 0.0, 0.2, 1.0, t),
            Easing::FastOutLinearIn => cubic_bezier(0.4, 0.0, 1.0, 1.0, t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

fn bezier(a: f32, b: f32, t: f32) -> f32 {
    // Cubic bezier through (0, a, b, 1)
    let u = 1.0 - t;
    3.0 * a * u * u * t + 3.0 * b * u * t * t + t * t * t
}

fn bezier_slope(a: f32, b: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * a * u * u + 6.0 * (b - a) * u * t + 3.0 * (1.0 - b) * t * t
}

/// Evaluate a CSS-style cubic bezier easing at time `x`
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson on the x curve, falling back to bisection
    let mut t = x;
    for _ in 0..8 {
        let error = bezier(x1, x2, t) - x;
        if error.abs() < 1e-6 {
            return bezier(y1, y2, t);
        }
        let slope = bezier_slope(x1, x2, t);
        if slope.abs() < 1e-6 {
            break;
        }
        t -= error / slope;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    t = x;
    for _ in 0..32 {
        let value = bezier(x1, x2, t);
        if (value - x).abs() < 1e-6 {
            break;
        }
        if value < x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    bezier(y1, y2, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::FastOutSlowIn,
            Easing::LinearOutSlowIn,
            Easing::FastOutLinearIn,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn test_fast_out_slow_in_shape() {
        let easing = Easing::FastOutSlowIn;
        // Ahead of linear in the middle, monotonic throughout
        assert!(easing.apply(0.5) > 0.5);
        let mut previous = 0.0;
        for i in 1..=100 {
            let value = easing.apply(i as f32 / 100.0);
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_linear_bezier_matches_linear() {
        let easing = Easing::CubicBezier(0.25, 0.25, 0.75, 0.75);
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((easing.apply(t) - t).abs() < 1e-3);
        }
    }
}
