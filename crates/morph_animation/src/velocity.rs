//! Pointer velocity estimation
//!
//! Keeps a short history of `(time, position)` samples and estimates the
//! velocity at the newest sample with a least-squares line fit. Samples
//! older than the horizon, or separated from the newer ones by a pause,
//! are ignored so that a drag that stops before release reports no fling.

/// Number of samples retained
const HISTORY_SIZE: usize = 20;
/// Samples older than this (relative to the newest) are ignored
const HORIZON_MS: u64 = 100;
/// A gap this long between samples means the pointer stopped
const ASSUME_STOPPED_MS: u64 = 40;

#[derive(Clone, Copy, Debug)]
struct Sample {
    time_ms: u64,
    position: f32,
}

/// One-dimensional velocity tracker
#[derive(Clone, Debug, Default)]
pub struct VelocityTracker {
    samples: [Option<Sample>; HISTORY_SIZE],
    index: usize,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pointer position at `time_ms`
    pub fn add_position(&mut self, time_ms: u64, position: f32) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(Sample { time_ms, position });
    }

    /// Estimated velocity in units per second
    pub fn calculate_velocity(&self) -> f32 {
        let Some(newest) = self.samples[self.index] else {
            return 0.0;
        };

        // Walk backwards from the newest sample
        let mut times = [0.0f32; HISTORY_SIZE];
        let mut positions = [0.0f32; HISTORY_SIZE];
        let mut count = 0;
        let mut previous_time = newest.time_ms;
        let mut index = self.index;

        while let Some(sample) = self.samples[index] {
            let age = newest.time_ms.saturating_sub(sample.time_ms);
            let gap = previous_time.saturating_sub(sample.time_ms);
            if age > HORIZON_MS || gap > ASSUME_STOPPED_MS {
                break;
            }
            times[count] = -(age as f32);
            positions[count] = sample.position;
            previous_time = sample.time_ms;
            count += 1;
            if count == HISTORY_SIZE {
                break;
            }
            index = (index + HISTORY_SIZE - 1) % HISTORY_SIZE;
        }

        if count < 2 {
            return 0.0;
        }
        least_squares_slope(&times[..count], &positions[..count]) * 1000.0
    }

    /// Forget all samples
    pub fn reset(&mut self) {
        self.samples = [None; HISTORY_SIZE];
        self.index = 0;
    }
}

fn least_squares_slope(xs: &[f32], ys: &[f32]) -> f32 {
    let n = xs.len() as f32;
    let mean_x = xs.iter().sum::<f32>() / n;
    let mean_y = ys.iter().sum::<f32>() / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        covariance += (x - mean_x) * (y - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }
    if variance <= f32::EPSILON {
        0.0
    } else {
        covariance / variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker() {
        let tracker = VelocityTracker::new();
        assert_eq!(tracker.calculate_velocity(), 0.0);
    }

    #[test]
    fn test_constant_velocity() {
        let mut tracker = VelocityTracker::new();
        // -0.7 px/ms == -700 px/s
        for i in 0..10u64 {
            tracker.add_position(i * 8, -0.7 * (i * 8) as f32);
        }
        let velocity = tracker.calculate_velocity();
        assert!((velocity + 700.0).abs() < 1.0, "velocity {velocity}");
    }

    #[test]
    fn test_pause_before_release_kills_fling() {
        let mut tracker = VelocityTracker::new();
        for i in 0..10u64 {
            tracker.add_position(i * 8, i as f32 * 10.0);
        }
        // Held still, then one last sample long after
        tracker.add_position(72 + 80, 90.0);
        assert_eq!(tracker.calculate_velocity(), 0.0);
    }

    #[test]
    fn test_old_samples_ignored() {
        let mut tracker = VelocityTracker::new();
        // Slow start
        for i in 0..30u64 {
            tracker.add_position(i * 10, i as f32);
        }
        // Recent fast segment
        for i in 0..5u64 {
            tracker.add_position(300 + i * 10, 30.0 + i as f32 * 20.0);
        }
        // The slow segment alone would be 100 px/s
        assert!(tracker.calculate_velocity() > 500.0);
    }

    #[test]
    fn test_reset() {
        let mut tracker = VelocityTracker::new();
        tracker.add_position(0, 0.0);
        tracker.add_position(10, 10.0);
        tracker.reset();
        assert_eq!(tracker.calculate_velocity(), 0.0);
    }
}
