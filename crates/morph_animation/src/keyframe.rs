//! Keyframe animation specs
//!
//! A keyframe spec is a timed sequence of absolute values. Between two
//! keyframes the value is interpolated with the easing of the later one.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::easing::Easing;

/// A single keyframe
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time position in milliseconds from the start
    pub at_ms: u32,
    /// Value at this keyframe
    pub value: f32,
    /// Easing used when transitioning TO this keyframe
    pub easing: Easing,
}

/// Keyframes over a fixed duration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyframesSpec {
    pub duration_ms: u32,
    keyframes: SmallVec<[Keyframe; 4]>,
}

impl KeyframesSpec {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            keyframes: SmallVec::new(),
        }
    }

    /// Add a keyframe with linear easing
    pub fn at(self, at_ms: u32, value: f32) -> Self {
        self.at_with(at_ms, value, Easing::Linear)
    }

    /// Add a keyframe with the given easing
    pub fn at_with(mut self, at_ms: u32, value: f32, easing: Easing) -> Self {
        let at_ms = at_ms.min(self.duration_ms);
        let index = self
            .keyframes
            .iter()
            .position(|k| k.at_ms > at_ms)
            .unwrap_or(self.keyframes.len());
        self.keyframes.insert(
            index,
            Keyframe {
                at_ms,
                value,
                easing,
            },
        );
        self
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Sample the value at `time_ms`
    ///
    /// `start` and `end` stand in for the implicit keyframes at 0 and at the
    /// duration when none were given there.
    pub fn value_at(&self, time_ms: f32, start: f32, end: f32) -> f32 {
        let time_ms = time_ms.clamp(0.0, self.duration_ms as f32);

        let mut previous = Keyframe {
            at_ms: 0,
            value: start,
            easing: Easing::Linear,
        };
        for keyframe in self
            .keyframes
            .iter()
            .copied()
            .chain(std::iter::once(Keyframe {
                at_ms: self.duration_ms,
                value: end,
                easing: Easing::Linear,
            }))
        {
            if time_ms <= keyframe.at_ms as f32 {
                let span = keyframe.at_ms.saturating_sub(previous.at_ms) as f32;
                if span <= 0.0 {
                    return keyframe.value;
                }
                let local = (time_ms - previous.at_ms as f32) / span;
                let eased = keyframe.easing.apply(local);
                return previous.value + (keyframe.value - previous.value) * eased;
            }
            previous = keyframe;
        }
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse() -> KeyframesSpec {
        KeyframesSpec::new(250)
            .at(0, 1.0)
            .at(125, 1.05)
            .at(250, 1.0)
    }

    #[test]
    fn test_keyframes_sorted_and_clamped() {
        let spec = KeyframesSpec::new(100).at(80, 2.0).at(20, 1.0).at(500, 3.0);
        let times: Vec<u32> = spec.keyframes().iter().map(|k| k.at_ms).collect();
        assert_eq!(times, vec![20, 80, 100]);
    }

    #[test]
    fn test_pulse_values() {
        let spec = pulse();
        assert_eq!(spec.value_at(0.0, 1.0, 1.0), 1.0);
        assert!((spec.value_at(62.5, 1.0, 1.0) - 1.025).abs() < 1e-5);
        assert!((spec.value_at(125.0, 1.0, 1.0) - 1.05).abs() < 1e-6);
        assert!((spec.value_at(250.0, 1.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_implicit_endpoints() {
        let spec = KeyframesSpec::new(100).at(50, 10.0);
        assert_eq!(spec.value_at(0.0, 0.0, 20.0), 0.0);
        assert_eq!(spec.value_at(50.0, 0.0, 20.0), 10.0);
        assert_eq!(spec.value_at(100.0, 0.0, 20.0), 20.0);
        assert_eq!(spec.value_at(75.0, 0.0, 20.0), 15.0);
    }
}
