//! Vertical sheet drag
//!
//! While a drag is in progress the sheet follows the pointer directly: the
//! translation moves by the drag delta and the expansion fraction is
//! derived from it proportionally. On release the handler decides which
//! resting state to settle into; the caller starts the settle animation.

use std::sync::Mutex;

use morph_animation::VelocityTracker;
use morph_core::sync::lock;
use morph_core::Observable;
use tracing::{debug, trace};

use crate::motion::SheetMotionController;

/// Outcome of a released drag
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SheetRelease {
    pub target_expanded: bool,
    /// Release velocity in px/s, negative upward
    pub velocity: f32,
}

#[derive(Debug, Default)]
struct DragSession {
    /// Total pointer travel since the drag started
    accumulated: f32,
    tracker: VelocityTracker,
}

#[derive(Debug, Default)]
enum DragPhase {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Vertical drag state machine for the primary sheet
pub struct SheetDragHandler {
    motion: SheetMotionController,
    phase: Mutex<DragPhase>,
    is_dragging: Observable<bool>,
    enabled: Observable<bool>,
    fling_velocity: f32,
}

impl std::fmt::Debug for SheetDragHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetDragHandler")
            .field("is_dragging", &self.is_dragging())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}

impl SheetDragHandler {
    pub fn new(motion: SheetMotionController, fling_velocity: f32) -> Self {
        Self {
            motion,
            phase: Mutex::new(DragPhase::Idle),
            is_dragging: Observable::new(false),
            enabled: Observable::new(true),
            fling_velocity,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging.get()
    }

    /// Raised for the lifetime of a drag session
    pub fn dragging_observable(&self) -> &Observable<bool> {
        &self.is_dragging
    }

    /// Gate new drags; a drag already in progress is not affected
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Begin a drag session, stopping any sheet animation
    ///
    /// Returns `false` when drags are disabled.
    pub fn on_drag_start(&self, time_ms: u64) -> bool {
        if !self.enabled.get() {
            trace!("sheet drag rejected while disabled");
            return false;
        }

        self.motion.stop_now();
        let mut session = DragSession::default();
        session.tracker.add_position(time_ms, 0.0);
        *lock(&self.phase) = DragPhase::Dragging(session);
        self.is_dragging.set(true);
        trace!(time_ms, "sheet drag start");
        true
    }

    /// Move the sheet by `delta` px (positive downward)
    pub fn on_drag(&self, delta: f32, time_ms: u64, collapsed_y: f32) {
        let mut phase = lock(&self.phase);
        let DragPhase::Dragging(session) = &mut *phase else {
            return;
        };
        session.accumulated += delta;
        session.tracker.add_position(time_ms, session.accumulated);

        let expanded_y = self.motion.expanded_y();
        let (low, high) = (collapsed_y.min(expanded_y), collapsed_y.max(expanded_y));
        let translation_y = (self.motion.translation_y() + delta).clamp(low, high);

        let range = collapsed_y - expanded_y;
        let fraction = if range.abs() > f32::EPSILON {
            ((collapsed_y - translation_y) / range).clamp(0.0, 1.0)
        } else {
            self.motion.expansion_fraction()
        };
        self.motion.set_immediate(translation_y, fraction);
    }

    /// Finish the drag and decide where the sheet settles
    ///
    /// A fast fling follows its direction (upward expands); otherwise the
    /// sheet settles on the nearer side. Returns `None` if no drag was in
    /// progress.
    pub fn on_drag_end(&self) -> Option<SheetRelease> {
        let session = self.finish()?;
        let velocity = session.tracker.calculate_velocity();
        Some(self.decide(velocity))
    }

    /// Pointer cancelled: settle like a release without velocity
    pub fn cancel(&self) -> Option<SheetRelease> {
        self.finish()?;
        Some(self.decide(0.0))
    }

    fn finish(&self) -> Option<DragSession> {
        let previous = std::mem::take(&mut *lock(&self.phase));
        self.is_dragging.set(false);
        match previous {
            DragPhase::Dragging(session) => Some(session),
            DragPhase::Idle => None,
        }
    }

    fn decide(&self, velocity: f32) -> SheetRelease {
        let fraction = self.motion.expansion_fraction();
        let target_expanded = if velocity.abs() > self.fling_velocity {
            velocity < 0.0
        } else {
            fraction > 0.5
        };
        debug!(velocity, fraction, target_expanded, "sheet drag released");
        SheetRelease {
            target_expanded,
            velocity,
        }
    }
}
