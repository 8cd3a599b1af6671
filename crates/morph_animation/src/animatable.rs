//! Animatable values
//!
//! An [`Animatable`] is a shared `f32` with a single owner at a time: at
//! most one animation drives it toward a target, guarded by its own
//! [`MutatorMutex`]. Starting an animation or a snap cancels whatever was
//! running, and the cancelled animation never writes again.
//!
//! Drags bypass the mutex entirely through [`Animatable::set_immediate`],
//! which stops any running animation synchronously before writing.
//!
//! ```ignore
//! let offset = Animatable::new(0.0, FrameClock::default());
//! offset.set_bounds(Some(-width), Some(width));
//!
//! // During a drag
//! offset.set_immediate(offset.value() + delta);
//!
//! // On release
//! let result = offset.animate_to(0.0, &AnimationSpec::default(), Some(velocity)).await;
//! ```

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};

use morph_core::sync::lock;
use morph_core::{
    AtomicF32, MutatePriority, MutatorMutex, Observable, ObserverId, Subscription,
};
use tracing::trace;

use crate::clock::{drive, FrameClock};
use crate::spec::{AnimationResult, AnimationSpec};

/// Distance under which physics-based animations settle, in value units
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.01;

#[derive(Clone, Copy, Debug, Default)]
struct Bounds {
    lower: Option<f32>,
    upper: Option<f32>,
}

impl Bounds {
    /// Clamp `value`, reporting whether a bound was hit
    fn clamp(&self, value: f32) -> (f32, bool) {
        if let Some(lower) = self.lower {
            if value < lower {
                return (lower, true);
            }
        }
        if let Some(upper) = self.upper {
            if value > upper {
                return (upper, true);
            }
        }
        (value, false)
    }
}

struct AnimatableInner {
    label: &'static str,
    value: Observable<f32>,
    velocity: AtomicF32,
    target: AtomicF32,
    running: Observable<bool>,
    bounds: Mutex<Bounds>,
    threshold: AtomicF32,
    mutex: MutatorMutex,
    clock: FrameClock,
}

/// A shared animated scalar (cheap to clone)
#[derive(Clone)]
pub struct Animatable {
    inner: Arc<AnimatableInner>,
}

impl std::fmt::Debug for Animatable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animatable")
            .field("label", &self.inner.label)
            .field("value", &self.value())
            .field("velocity", &self.velocity())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Animatable {
    pub fn new(initial: f32, clock: FrameClock) -> Self {
        Self::named("animatable", initial, clock)
    }

    /// Create an animatable with a label used in trace output
    pub fn named(label: &'static str, initial: f32, clock: FrameClock) -> Self {
        Self {
            inner: Arc::new(AnimatableInner {
                label,
                value: Observable::new(initial),
                velocity: AtomicF32::new(0.0),
                target: AtomicF32::new(initial),
                running: Observable::new(false),
                bounds: Mutex::new(Bounds::default()),
                threshold: AtomicF32::new(DEFAULT_VISIBILITY_THRESHOLD),
                mutex: MutatorMutex::new(),
                clock,
            }),
        }
    }

    pub fn value(&self) -> f32 {
        self.inner.value.get()
    }

    pub fn velocity(&self) -> f32 {
        self.inner.velocity.load()
    }

    /// Target of the running animation, or the resting value
    pub fn target(&self) -> f32 {
        self.inner.target.load()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn clock(&self) -> FrameClock {
        self.inner.clock
    }

    /// Restrict the value to `[lower, upper]`
    ///
    /// The current value is clamped immediately. An animation that reaches
    /// a bound stops there with [`AnimationResult::BoundReached`].
    pub fn set_bounds(&self, lower: Option<f32>, upper: Option<f32>) {
        let bounds = Bounds { lower, upper };
        *lock(&self.inner.bounds) = bounds;
        let (clamped, hit) = bounds.clamp(self.value());
        if hit {
            self.inner.value.set(clamped);
        }
    }

    pub fn set_visibility_threshold(&self, threshold: f32) {
        self.inner.threshold.store(threshold.abs());
    }

    /// Animate to `target`
    ///
    /// `initial_velocity` defaults to the current velocity, so interrupting
    /// one animation with another keeps momentum. Returns
    /// [`AnimationResult::Cancelled`] if a newer animation, snap or stop
    /// took over first.
    pub async fn animate_to(
        &self,
        target: f32,
        spec: &AnimationSpec,
        initial_velocity: Option<f32>,
    ) -> AnimationResult {
        let inner = &*self.inner;
        let bounds = *lock(&inner.bounds);
        let (target, _) = bounds.clamp(target);

        let result = inner
            .mutex
            .mutate(MutatePriority::Default, |scope| async move {
                let start = inner.value.get();
                let velocity = initial_velocity.unwrap_or_else(|| inner.velocity.load());
                inner.target.store(target);
                inner.running.set(true);
                trace!(label = inner.label, start, target, velocity, "animate");

                let driver = spec.driver(start, target, velocity, inner.threshold.load());
                let result = drive(inner.clock, &scope, driver, |sample| {
                    let (value, hit) = bounds.clamp(sample.value);
                    inner.value.set(value);
                    if hit {
                        inner.velocity.store(0.0);
                        ControlFlow::Break(())
                    } else {
                        inner.velocity.store(sample.velocity);
                        ControlFlow::Continue(())
                    }
                })
                .await;

                if result != AnimationResult::Cancelled {
                    inner.velocity.store(0.0);
                    inner.target.store(inner.value.get());
                    inner.running.set(false);
                }
                result
            })
            .await;

        result.unwrap_or_else(|err| {
            trace!(label = inner.label, %err, "animation superseded");
            AnimationResult::Cancelled
        })
    }

    /// Cancel any animation and jump to `value`
    pub async fn snap_to(&self, value: f32) {
        let inner = &*self.inner;
        let result = inner
            .mutex
            .mutate(MutatePriority::Default, |_| async move {
                inner.write_resting(value);
            })
            .await;
        if let Err(err) = result {
            trace!(label = inner.label, %err, "snap superseded");
        }
    }

    /// Cancel any animation and rest at the current value
    pub async fn stop(&self) {
        let inner = &*self.inner;
        let result = inner
            .mutex
            .mutate(MutatePriority::Default, |_| async move {
                inner.write_resting(inner.value.get());
            })
            .await;
        if let Err(err) = result {
            trace!(label = inner.label, %err, "stop superseded");
        }
    }

    /// Cancel any animation synchronously
    ///
    /// The cancelled animation never commits another frame.
    pub fn stop_now(&self) {
        if self.inner.mutex.cancel_current() {
            trace!(label = self.inner.label, "stopped");
        }
        self.inner.write_resting(self.value());
    }

    /// Set the value directly, stopping any animation first
    pub fn set_immediate(&self, value: f32) {
        self.inner.mutex.cancel_current();
        self.inner.write_resting(value);
    }

    /// Subscribe to value changes
    pub fn subscribe(&self) -> Subscription<f32> {
        self.inner.value.subscribe()
    }

    /// Observe value changes synchronously
    pub fn observe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&f32) + Send + Sync + 'static,
    {
        self.inner.value.observe(observer)
    }

    /// The underlying value cell, for deriving other observables
    pub fn as_observable(&self) -> &Observable<f32> {
        &self.inner.value
    }

    pub fn running_observable(&self) -> &Observable<bool> {
        &self.inner.running
    }
}

impl AnimatableInner {
    fn write_resting(&self, value: f32) {
        let (value, _) = lock(&self.bounds).clamp(value);
        self.velocity.store(0.0);
        self.target.store(value);
        self.value.set(value);
        self.running.set(false);
    }
}
