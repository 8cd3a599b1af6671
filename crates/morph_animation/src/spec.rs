//! Animation specs and their frame drivers
//!
//! An [`AnimationSpec`] describes *how* a value travels to a target. Turning
//! it into an [`AnimationDriver`] binds it to a concrete start, target and
//! initial velocity; the driver is then stepped once per frame.
//!
//! Every driver finishes exactly on its target value, so callers never have
//! to correct for residual drift after an animation completes.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::keyframe::KeyframesSpec;
use crate::spring::{Spring, SpringConfig};

/// How an animation ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationResult {
    /// Reached its target
    Finished,
    /// Stopped early because the value hit the animatable's bounds
    BoundReached,
    /// Superseded by a newer animation, snap or stop
    Cancelled,
}

impl AnimationResult {
    pub fn is_finished(&self) -> bool {
        matches!(self, AnimationResult::Finished)
    }
}

/// Description of an animation curve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AnimationSpec {
    /// Duration-based animation with easing; ignores initial velocity
    Tween {
        duration_ms: u32,
        delay_ms: u32,
        easing: Easing,
    },
    /// Physics-based animation that carries initial velocity
    Spring(SpringConfig),
    /// Timed sequence of absolute values
    Keyframes(KeyframesSpec),
    /// Jump to the target after an optional delay
    Snap { delay_ms: u32 },
}

impl Default for AnimationSpec {
    fn default() -> Self {
        AnimationSpec::Spring(SpringConfig::default())
    }
}

impl AnimationSpec {
    pub fn tween(duration_ms: u32, easing: Easing) -> Self {
        AnimationSpec::Tween {
            duration_ms,
            delay_ms: 0,
            easing,
        }
    }

    pub fn spring(config: SpringConfig) -> Self {
        AnimationSpec::Spring(config)
    }

    pub fn keyframes(spec: KeyframesSpec) -> Self {
        AnimationSpec::Keyframes(spec)
    }

    /// Bind this spec to a concrete animation
    ///
    /// `threshold` is the distance (in the value's units) under which a
    /// physics-based animation is considered settled.
    pub fn driver(
        &self,
        start: f32,
        target: f32,
        initial_velocity: f32,
        threshold: f32,
    ) -> AnimationDriver {
        match self {
            AnimationSpec::Tween {
                duration_ms,
                delay_ms,
                easing,
            } => AnimationDriver::Tween {
                start,
                target,
                elapsed_ms: 0.0,
                duration_ms: *duration_ms as f32,
                delay_ms: *delay_ms as f32,
                easing: *easing,
                last_value: start,
            },
            AnimationSpec::Spring(config) => {
                let mut spring = Spring::new(*config, start).with_threshold(threshold);
                spring.set_target(target);
                spring.set_velocity(initial_velocity);
                AnimationDriver::Spring(spring)
            }
            AnimationSpec::Keyframes(spec) => AnimationDriver::Keyframes {
                spec: spec.clone(),
                start,
                target,
                elapsed_ms: 0.0,
                last_value: start,
            },
            AnimationSpec::Snap { delay_ms } => AnimationDriver::Snap {
                start,
                target,
                elapsed_ms: 0.0,
                delay_ms: *delay_ms as f32,
            },
        }
    }
}

/// One frame of a running animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    pub value: f32,
    pub velocity: f32,
    pub finished: bool,
}

/// A spec bound to a start, target and initial velocity
#[derive(Clone, Debug)]
pub enum AnimationDriver {
    Tween {
        start: f32,
        target: f32,
        elapsed_ms: f32,
        duration_ms: f32,
        delay_ms: f32,
        easing: Easing,
        last_value: f32,
    },
    Spring(Spring),
    Keyframes {
        spec: KeyframesSpec,
        start: f32,
        target: f32,
        elapsed_ms: f32,
        last_value: f32,
    },
    Snap {
        start: f32,
        target: f32,
        elapsed_ms: f32,
        delay_ms: f32,
    },
}

impl AnimationDriver {
    /// Advance by `dt` seconds and sample
    pub fn step(&mut self, dt: f32) -> FrameSample {
        let dt = dt.max(0.0);
        match self {
            AnimationDriver::Tween {
                start,
                target,
                elapsed_ms,
                duration_ms,
                delay_ms,
                easing,
                last_value,
            } => {
                *elapsed_ms += dt * 1000.0;
                let play_ms = (*elapsed_ms - *delay_ms).max(0.0);
                if play_ms >= *duration_ms {
                    *last_value = *target;
                    return FrameSample {
                        value: *target,
                        velocity: 0.0,
                        finished: true,
                    };
                }
                let progress = easing.apply(play_ms / *duration_ms);
                let value = *start + (*target - *start) * progress;
                let velocity = finite_velocity(*last_value, value, dt);
                *last_value = value;
                FrameSample {
                    value,
                    velocity,
                    finished: false,
                }
            }
            AnimationDriver::Spring(spring) => {
                spring.step(dt);
                let finished = spring.is_settled();
                FrameSample {
                    value: if finished {
                        spring.target()
                    } else {
                        spring.value()
                    },
                    velocity: if finished { 0.0 } else { spring.velocity() },
                    finished,
                }
            }
            AnimationDriver::Keyframes {
                spec,
                start,
                target,
                elapsed_ms,
                last_value,
            } => {
                *elapsed_ms += dt * 1000.0;
                if *elapsed_ms >= spec.duration_ms as f32 {
                    *last_value = *target;
                    return FrameSample {
                        value: *target,
                        velocity: 0.0,
                        finished: true,
                    };
                }
                let value = spec.value_at(*elapsed_ms, *start, *target);
                let velocity = finite_velocity(*last_value, value, dt);
                *last_value = value;
                FrameSample {
                    value,
                    velocity,
                    finished: false,
                }
            }
            AnimationDriver::Snap {
                start,
                target,
                elapsed_ms,
                delay_ms,
            } => {
                *elapsed_ms += dt * 1000.0;
                let finished = *elapsed_ms >= *delay_ms;
                FrameSample {
                    value: if finished { *target } else { *start },
                    velocity: 0.0,
                    finished,
                }
            }
        }
    }
}

fn finite_velocity(previous: f32, current: f32, dt: f32) -> f32 {
    if dt > 0.0 {
        (current - previous) / dt
    } else {
        0.0
    }
}
