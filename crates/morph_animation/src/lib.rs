//! Morph Animation System
//!
//! Frame-driven animations for gesture-heavy surfaces.
//!
//! # Features
//!
//! - **Spring Physics**: RK4-integrated springs, including damping-ratio presets
//! - **Easing**: Material cubic-bezier curves for duration-based tweens
//! - **Keyframes**: Timed sequences of absolute values
//! - **Animatables**: Shared values owned by at most one animation at a time;
//!   a newer animation cancels and replaces the running one
//! - **Velocity Tracking**: Least-squares velocity estimation for fling decisions

pub mod animatable;
pub mod clock;
pub mod easing;
pub mod keyframe;
pub mod spec;
pub mod spring;
pub mod values;
pub mod velocity;

pub use animatable::{Animatable, DEFAULT_VISIBILITY_THRESHOLD};
pub use clock::{drive, FrameClock, FrameTicker, DEFAULT_FPS};
pub use easing::Easing;
pub use keyframe::{Keyframe, KeyframesSpec};
pub use spec::{AnimationDriver, AnimationResult, AnimationSpec, FrameSample};
pub use spring::{Spring, SpringConfig};
pub use values::Interpolate;
pub use velocity::VelocityTracker;
