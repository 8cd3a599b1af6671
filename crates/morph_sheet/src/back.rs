//! Predictive back
//!
//! While the system back gesture is in progress the expanded sheet shrinks
//! toward its collapsed geometry. The progress only ever shapes the visuals;
//! the sheet's own motion pair is untouched until the gesture commits.

use morph_animation::{Animatable, AnimationResult, AnimationSpec, FrameClock};
use morph_core::{lerp, Observable};
use tracing::debug;

use crate::state::SheetState;

/// Back gesture progress for the expanded sheet
#[derive(Debug)]
pub struct PredictiveBack {
    progress: Animatable,
}

impl PredictiveBack {
    pub fn new(clock: FrameClock) -> Self {
        let progress = Animatable::named("back_progress", 0.0, clock);
        progress.set_bounds(Some(0.0), Some(1.0));
        progress.set_visibility_threshold(0.001);
        Self { progress }
    }

    /// Whether a back gesture may drive the sheet
    pub fn is_enabled(shows_player_content: bool, state: SheetState, is_dragging: bool) -> bool {
        shows_player_content && state == SheetState::Expanded && !is_dragging
    }

    pub fn progress(&self) -> f32 {
        self.progress.value()
    }

    pub fn observable(&self) -> &Observable<f32> {
        self.progress.as_observable()
    }

    pub fn is_active(&self) -> bool {
        self.progress() > 0.0
    }

    /// Follow the system gesture
    pub fn update(&self, progress: f32) {
        self.progress.set_immediate(progress.clamp(0.0, 1.0));
    }

    /// Sheet pair matching what is currently drawn
    ///
    /// Committing snaps the sheet here so the collapse animation starts
    /// where the shrunken sheet visually is.
    pub fn commit_pair(&self, expanded_y: f32, collapsed_y: f32) -> (f32, f32) {
        let progress = self.progress();
        (lerp(expanded_y, collapsed_y, progress), 1.0 - progress)
    }

    /// Clear the progress once a commit has moved the sheet to
    /// [`commit_pair`](Self::commit_pair)
    pub fn finish(&self) {
        self.progress.set_immediate(0.0);
    }

    /// Gesture abandoned: ease the sheet back to full size
    pub async fn cancel(&self, spec: &AnimationSpec) -> AnimationResult {
        debug!(progress = self.progress(), "predictive back cancelled");
        self.progress.animate_to(0.0, spec, Some(0.0)).await
    }
}
