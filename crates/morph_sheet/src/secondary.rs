//! Secondary sheets (queue and cast)
//!
//! A secondary sheet slides up over the expanded player. Its position is a
//! single offset from the fully open position: `0` is open, the hidden
//! offset (sheet height plus bottom padding) is closed. It follows the same
//! animate-or-snap discipline as the primary sheet, through its own
//! [`Animatable`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use morph_animation::{Animatable, AnimationResult, AnimationSpec, FrameClock};
use morph_core::sync::lock;
use morph_core::{AtomicF32, Observable};
use tracing::{debug, trace};

use crate::host::{HapticFeedback, HapticKind};

/// Release and edge tuning for a secondary sheet, in pixels
#[derive(Clone, Debug, PartialEq)]
pub struct SecondarySheetConfig {
    /// Velocity (px/s) that counts as a fling
    pub fling_velocity: f32,
    /// Upward travel required before an upward fling may open the sheet
    pub min_fling_travel: f32,
    /// Position threshold as a fraction of the hidden offset
    pub threshold_fraction: f32,
    /// Offset under which the sheet counts as fully open
    pub open_edge_epsilon: f32,
    /// Open/close animation
    pub spec: AnimationSpec,
}

#[derive(Clone, Copy, Debug, Default)]
struct Geometry {
    sheet_height: f32,
    bottom_padding: f32,
}

impl Geometry {
    fn hidden_offset(&self) -> f32 {
        if self.sheet_height == 0.0 {
            0.0
        } else {
            self.sheet_height + self.bottom_padding
        }
    }
}

struct SecondaryInner {
    label: &'static str,
    offset: Animatable,
    shown: Observable<bool>,
    geometry: Mutex<Geometry>,
    hidden_offset: AtomicF32,
    interaction_allowed: AtomicBool,
    /// Edge latch for the fully-open haptic
    hit_open_edge: AtomicBool,
    config: SecondarySheetConfig,
    haptics: Arc<dyn HapticFeedback>,
}

/// A draggable sheet with a single offset (cheap to clone)
#[derive(Clone)]
pub struct SecondarySheet {
    inner: Arc<SecondaryInner>,
}

impl std::fmt::Debug for SecondarySheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondarySheet")
            .field("label", &self.inner.label)
            .field("offset", &self.offset())
            .field("hidden_offset", &self.hidden_offset())
            .field("shown", &self.is_shown())
            .finish()
    }
}

impl SecondarySheet {
    /// Create a hidden sheet resting at `initial_offset` until its height is known
    pub fn new(
        label: &'static str,
        initial_offset: f32,
        config: SecondarySheetConfig,
        clock: FrameClock,
        haptics: Arc<dyn HapticFeedback>,
    ) -> Self {
        let offset = Animatable::named(label, initial_offset, clock);
        offset.set_visibility_threshold(0.5);

        let inner = Arc::new(SecondaryInner {
            label,
            offset,
            shown: Observable::new(false),
            geometry: Mutex::new(Geometry::default()),
            hidden_offset: AtomicF32::new(0.0),
            interaction_allowed: AtomicBool::new(false),
            hit_open_edge: AtomicBool::new(false),
            config,
            haptics,
        });

        let weak = Arc::downgrade(&inner);
        inner.offset.observe(move |_| check_open_edge(&weak));
        let weak = Arc::downgrade(&inner);
        inner.shown.observe(move |_| check_open_edge(&weak));

        Self { inner }
    }

    pub fn label(&self) -> &'static str {
        self.inner.label
    }

    pub fn offset(&self) -> f32 {
        self.inner.offset.value()
    }

    pub fn offset_animatable(&self) -> &Animatable {
        &self.inner.offset
    }

    pub fn is_shown(&self) -> bool {
        self.inner.shown.get()
    }

    pub fn shown_observable(&self) -> &Observable<bool> {
        &self.inner.shown
    }

    /// Offset of the closed sheet; `0` while its height is unknown
    pub fn hidden_offset(&self) -> f32 {
        self.inner.hidden_offset.load()
    }

    pub fn is_interaction_allowed(&self) -> bool {
        self.inner.interaction_allowed.load(Ordering::Acquire)
    }

    /// Threshold for the position and travel release rules
    pub fn drag_threshold(&self) -> f32 {
        self.hidden_offset() * self.inner.config.threshold_fraction
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Measured height of the sheet content (px)
    pub fn set_sheet_height(&self, height: f32) {
        lock(&self.inner.geometry).sheet_height = height.max(0.0);
        self.relayout();
    }

    /// Extra offset below the sheet (px)
    pub fn set_bottom_padding(&self, padding: f32) {
        lock(&self.inner.geometry).bottom_padding = padding.max(0.0);
        self.relayout();
    }

    fn relayout(&self) {
        let hidden = lock(&self.inner.geometry).hidden_offset();
        let previous = self.inner.hidden_offset.swap(hidden);
        if hidden <= 0.0 {
            return;
        }

        let target = if self.is_shown() {
            self.offset().clamp(0.0, hidden)
        } else {
            hidden
        };
        if previous != hidden || self.offset() != target {
            trace!(label = self.inner.label, hidden, target, "secondary sheet relayout");
            self.inner.offset.set_immediate(target);
        }
        self.inner
            .hit_open_edge
            .store(self.is_fully_open(), Ordering::Release);
    }

    /// Allow or forbid interaction; forbidding hides the sheet at once
    pub fn set_interaction_allowed(&self, allowed: bool) {
        self.inner
            .interaction_allowed
            .store(allowed, Ordering::Release);
        if allowed {
            return;
        }
        self.inner.shown.set(false);
        let hidden = self.hidden_offset();
        if hidden > 0.0 {
            self.inner.offset.set_immediate(hidden);
        }
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    fn accepts_gestures(&self) -> bool {
        self.hidden_offset() != 0.0 && self.is_interaction_allowed()
    }

    pub fn begin_drag(&self) {
        if !self.accepts_gestures() {
            return;
        }
        self.inner.shown.set(true);
        self.inner.offset.stop_now();
    }

    /// Move by `delta` px (positive downward, toward hidden)
    pub fn drag_by(&self, delta: f32) {
        if !self.accepts_gestures() {
            return;
        }
        let offset = (self.offset() + delta).clamp(0.0, self.hidden_offset());
        self.inner.offset.set_immediate(offset);
    }

    /// Decide whether a released drag opens the sheet
    ///
    /// `total_drag` is the signed pointer travel of the session and
    /// `velocity` the release velocity, both negative upward. Returns
    /// `None` when gestures are not accepted.
    pub fn release_decision(&self, total_drag: f32, velocity: f32) -> Option<bool> {
        if !self.accepts_gestures() {
            return None;
        }
        let config = &self.inner.config;
        let hidden = self.hidden_offset();
        let threshold = self.drag_threshold();

        let fast_upward = velocity < -config.fling_velocity;
        let fast_downward = velocity > config.fling_velocity;
        let meaningful_upward_travel = total_drag < -config.min_fling_travel;

        let expand = (fast_upward && meaningful_upward_travel)
            || (!fast_downward && (self.offset() < hidden - threshold || total_drag < -threshold));
        debug!(
            label = self.inner.label,
            total_drag, velocity, expand, "secondary sheet released"
        );
        Some(expand)
    }

    /// Finish a drag and animate to the decided state
    pub async fn end_drag(&self, total_drag: f32, velocity: f32) -> Option<AnimationResult> {
        let expand = self.release_decision(total_drag, velocity)?;
        self.animate(expand).await
    }

    /// Open or close the sheet
    ///
    /// Opening is refused (`None`) while interaction is not allowed.
    /// `shown` follows the target only once the animation finishes.
    pub async fn animate(&self, target_expanded: bool) -> Option<AnimationResult> {
        let allowed = self.is_interaction_allowed();
        if target_expanded && !allowed {
            return None;
        }
        let target_expanded = target_expanded && allowed;

        let hidden = self.hidden_offset();
        if hidden == 0.0 {
            self.inner.shown.set(target_expanded);
            return Some(AnimationResult::Finished);
        }

        let target = if target_expanded { 0.0 } else { hidden };
        self.inner.shown.set(true);
        let result = self
            .inner
            .offset
            .animate_to(target, &self.inner.config.spec, None)
            .await;
        if result != AnimationResult::Cancelled {
            self.inner.shown.set(target_expanded);
        }
        Some(result)
    }

    // =========================================================================
    // Derived
    // =========================================================================

    /// On screen at all
    pub fn is_visible(&self) -> bool {
        let hidden = self.hidden_offset();
        self.is_shown() && hidden > 0.0 && self.offset() < hidden
    }

    pub fn is_fully_open(&self) -> bool {
        self.inner.is_fully_open()
    }

    /// How much of the screen the sheet covers, in `[0, 1]`
    pub fn visual_open_fraction(&self, screen_height: f32) -> f32 {
        if !self.is_shown() || screen_height <= 0.0 {
            return 0.0;
        }
        let reveal = (screen_height - self.offset()).max(0.0);
        (reveal / screen_height).clamp(0.0, 1.0)
    }

    /// Open progress relative to the sheet's own travel, in `[0, 1]`
    pub fn open_fraction(&self) -> f32 {
        if !self.is_shown() {
            return 0.0;
        }
        let hidden = self.hidden_offset();
        if hidden <= 0.0 {
            return 1.0;
        }
        (1.0 - self.offset() / hidden).clamp(0.0, 1.0)
    }

    /// Scrim behind the sheet
    pub fn scrim_alpha(&self, screen_height: f32) -> f32 {
        (self.visual_open_fraction(screen_height) * 0.45).clamp(0.0, 0.45)
    }
}

impl SecondaryInner {
    fn is_fully_open(&self) -> bool {
        self.shown.get() && self.offset.value() <= self.config.open_edge_epsilon
    }
}

fn check_open_edge(inner: &Weak<SecondaryInner>) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    if inner.hidden_offset.load() == 0.0 {
        return;
    }
    if inner.is_fully_open() {
        if !inner.hit_open_edge.swap(true, Ordering::AcqRel) {
            inner.haptics.perform(HapticKind::LongPress);
        }
    } else {
        inner.hit_open_edge.store(false, Ordering::Release);
    }
}
