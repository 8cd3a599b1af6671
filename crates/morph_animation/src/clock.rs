//! Frame clock
//!
//! Animations advance once per frame. The clock paces frames on the tokio
//! timer at a target frame rate and reports the real delta between frames,
//! so a late frame advances an animation further instead of slowing it down.

use std::ops::ControlFlow;
use std::time::Duration;

use morph_core::MutationScope;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::spec::{AnimationDriver, AnimationResult, FrameSample};

/// Default frame rate for animations
pub const DEFAULT_FPS: u32 = 120;

/// Frame pacing configuration (cheap to copy)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    fps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl FrameClock {
    /// Create a clock ticking at `fps` frames per second (at least 1)
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Duration of one frame
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }

    /// Start a new frame sequence
    ///
    /// Must be called from within a tokio runtime.
    pub fn ticker(&self) -> FrameTicker {
        let mut interval = tokio::time::interval(self.frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        FrameTicker {
            interval,
            last: None,
        }
    }
}

/// A running sequence of frames
#[derive(Debug)]
pub struct FrameTicker {
    interval: Interval,
    last: Option<Instant>,
}

impl FrameTicker {
    /// Wait for the next frame and return the seconds elapsed since the
    /// previous one (0 for the first frame)
    pub async fn next_frame(&mut self) -> f32 {
        let now = self.interval.tick().await;
        let dt = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        dt
    }
}

/// Step `driver` once per frame until it finishes
///
/// `on_frame` commits each sample and may stop the animation early with
/// `ControlFlow::Break`. The scope is checked after every frame wait, so a
/// superseded animation never commits another sample.
pub async fn drive<F>(
    clock: FrameClock,
    scope: &MutationScope,
    mut driver: AnimationDriver,
    mut on_frame: F,
) -> AnimationResult
where
    F: FnMut(FrameSample) -> ControlFlow<()>,
{
    let mut ticker = clock.ticker();
    loop {
        let dt = ticker.next_frame().await;
        if !scope.is_active() {
            return AnimationResult::Cancelled;
        }

        let sample = driver.step(dt);
        if on_frame(sample).is_break() {
            return AnimationResult::BoundReached;
        }
        if sample.finished {
            return AnimationResult::Finished;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::spec::AnimationSpec;
    use morph_core::{MutatePriority, MutatorMutex};

    #[tokio::test(start_paused = true)]
    async fn test_ticker_reports_frame_delta() {
        let clock = FrameClock::new(100);
        let mut ticker = clock.ticker();
        assert_eq!(ticker.next_frame().await, 0.0);
        let dt = ticker.next_frame().await;
        assert!((dt - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        assert_eq!(FrameClock::new(0).fps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_tween_to_completion() {
        let mutex = MutatorMutex::new();
        let mut values = Vec::new();

        let result = mutex
            .mutate(MutatePriority::Default, |scope| {
                let values = &mut values;
                async move {
                    let driver = AnimationSpec::tween(100, Easing::Linear).driver(0.0, 1.0, 0.0, 0.001);
                    drive(FrameClock::new(100), &scope, driver, |sample| {
                        values.push(sample.value);
                        ControlFlow::Continue(())
                    })
                    .await
                }
            })
            .await;

        assert_eq!(result, Ok(AnimationResult::Finished));
        assert_eq!(values.first(), Some(&0.0));
        assert_eq!(values.last(), Some(&1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_can_break_early() {
        let mutex = MutatorMutex::new();
        let result = mutex
            .mutate(MutatePriority::Default, |scope| async move {
                let driver = AnimationSpec::tween(1000, Easing::Linear).driver(0.0, 1.0, 0.0, 0.001);
                drive(FrameClock::default(), &scope, driver, |sample| {
                    if sample.value > 0.5 {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                })
                .await
            })
            .await;
        assert_eq!(result, Ok(AnimationResult::BoundReached));
    }
}
