//! Spring physics
//!
//! Springs are described by stiffness, damping and mass, or more commonly
//! by a damping ratio plus a stiffness constant. Motion is integrated with
//! fourth-order Runge-Kutta; long frames are split into sub-steps so a
//! hitch never makes a stiff spring explode.

use serde::{Deserialize, Serialize};

// ============================================================================
// Parameters
// ============================================================================

pub const DAMPING_RATIO_HIGH_BOUNCY: f32 = 0.2;
pub const DAMPING_RATIO_MEDIUM_BOUNCY: f32 = 0.5;
pub const DAMPING_RATIO_LOW_BOUNCY: f32 = 0.75;
/// Critically damped, settles without crossing the target
pub const DAMPING_RATIO_NO_BOUNCY: f32 = 1.0;

pub const STIFFNESS_HIGH: f32 = 10_000.0;
pub const STIFFNESS_MEDIUM: f32 = 1_500.0;
pub const STIFFNESS_MEDIUM_LOW: f32 = 400.0;
pub const STIFFNESS_LOW: f32 = 200.0;
pub const STIFFNESS_VERY_LOW: f32 = 50.0;

/// Distance from the target (in value units) below which a spring may rest
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Longest single integration step in seconds
const MAX_STEP: f32 = 1.0 / 120.0;

/// Physical parameters of a spring
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Unit-mass spring from a damping ratio and a stiffness
    pub fn from_ratio(damping_ratio: f32, stiffness: f32) -> Self {
        Self::new(stiffness, damping_ratio * 2.0 * stiffness.sqrt(), 1.0)
    }

    /// Settles a released drag onto its resting state without bouncing
    pub fn fling_settle() -> Self {
        Self::from_ratio(DAMPING_RATIO_NO_BOUNCY, STIFFNESS_MEDIUM_LOW)
    }

    /// Soft, visibly bouncing spring for the collapse rebound
    pub fn collapse_bounce() -> Self {
        Self::from_ratio(DAMPING_RATIO_MEDIUM_BOUNCY, STIFFNESS_LOW)
    }

    /// Quick spring with a hint of overshoot
    pub fn snappy() -> Self {
        Self::from_ratio(DAMPING_RATIO_LOW_BOUNCY, STIFFNESS_MEDIUM)
    }

    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    pub fn damping_ratio(&self) -> f32 {
        self.damping / self.critical_damping()
    }

    /// Whether the spring crosses its target before resting
    pub fn is_underdamped(&self) -> bool {
        self.damping_ratio() < 1.0
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::from_ratio(DAMPING_RATIO_NO_BOUNCY, STIFFNESS_MEDIUM)
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Position and velocity of the simulated mass
#[derive(Clone, Copy, Debug, PartialEq)]
struct Phase {
    x: f32,
    v: f32,
}

impl Phase {
    fn advance(self, d: Phase, h: f32) -> Phase {
        Phase {
            x: self.x + d.x * h,
            v: self.v + d.v * h,
        }
    }
}

/// A single spring driving one scalar toward a target
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    config: SpringConfig,
    phase: Phase,
    target: f32,
    threshold: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            phase: Phase { x: initial, v: 0.0 },
            target: initial,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Rest threshold in the value's own units
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.abs().max(f32::EPSILON);
        self
    }

    pub fn value(&self) -> f32 {
        self.phase.x
    }

    pub fn velocity(&self) -> f32 {
        self.phase.v
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Retarget without touching the current motion
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.phase.v = velocity;
    }

    /// Close to the target and nearly still
    pub fn is_settled(&self) -> bool {
        (self.phase.x - self.target).abs() < self.threshold
            && self.phase.v.abs() < self.threshold * 10.0
    }

    /// Advance by `dt` seconds; pins to the target once settled
    pub fn step(&mut self, dt: f32) {
        let mut left = dt.max(0.0);
        while left > 0.0 && !self.is_settled() {
            let h = left.min(MAX_STEP);
            self.phase = self.integrate(self.phase, h);
            left -= h;
        }
        if self.is_settled() {
            self.phase = Phase {
                x: self.target,
                v: 0.0,
            };
        }
    }

    fn derivative(&self, p: Phase) -> Phase {
        let force = -self.config.stiffness * (p.x - self.target) - self.config.damping * p.v;
        Phase {
            x: p.v,
            v: force / self.config.mass,
        }
    }

    fn integrate(&self, p: Phase, h: f32) -> Phase {
        let a = self.derivative(p);
        let b = self.derivative(p.advance(a, h / 2.0));
        let c = self.derivative(p.advance(b, h / 2.0));
        let d = self.derivative(p.advance(c, h));
        Phase {
            x: p.x + h / 6.0 * (a.x + 2.0 * (b.x + c.x) + d.x),
            v: p.v + h / 6.0 * (a.v + 2.0 * (b.v + c.v) + d.v),
        }
    }
}
