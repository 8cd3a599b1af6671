//! Vertical overshoot on sheet state changes
//!
//! Expanding plays a short stretch pulse; collapsing from the full player
//! squashes the sheet slightly and springs it back.

use morph_animation::{
    Animatable, AnimationResult, AnimationSpec, FrameClock, KeyframesSpec, SpringConfig,
};
use morph_core::Observable;
use tracing::trace;

use crate::state::SheetState;

const PULSE_DURATION_MS: u32 = 250;
const PULSE_PEAK: f32 = 1.05;
const COLLAPSE_SQUASH: f32 = 0.96;

/// Vertical scale applied on top of the sheet
#[derive(Debug)]
pub struct OvershootScale {
    scale: Animatable,
}

impl OvershootScale {
    pub fn new(clock: FrameClock) -> Self {
        let scale = Animatable::named("overshoot_scale", 1.0, clock);
        scale.set_visibility_threshold(0.001);
        Self { scale }
    }

    pub fn value(&self) -> f32 {
        self.scale.value()
    }

    pub fn observable(&self) -> &Observable<f32> {
        self.scale.as_observable()
    }

    pub fn pulse_spec() -> AnimationSpec {
        AnimationSpec::keyframes(
            KeyframesSpec::new(PULSE_DURATION_MS)
                .at(0, 1.0)
                .at(PULSE_DURATION_MS / 2, PULSE_PEAK)
                .at(PULSE_DURATION_MS, 1.0),
        )
    }

    /// Drags always draw the sheet unscaled
    pub fn reset_now(&self) {
        self.scale.set_immediate(1.0);
    }

    /// React to the sheet settling into `next`
    pub async fn on_state_change(
        &self,
        previous: SheetState,
        next: SheetState,
        shows_player_content: bool,
    ) -> AnimationResult {
        match next {
            SheetState::Expanded => {
                trace!("overshoot pulse");
                self.scale.snap_to(1.0).await;
                self.scale.animate_to(1.0, &Self::pulse_spec(), Some(0.0)).await
            }
            SheetState::Collapsed
                if previous == SheetState::Expanded && shows_player_content =>
            {
                trace!("overshoot collapse bounce");
                self.scale.snap_to(COLLAPSE_SQUASH).await;
                let spec = AnimationSpec::spring(SpringConfig::collapse_bounce());
                self.scale.animate_to(1.0, &spec, Some(0.0)).await
            }
            SheetState::Collapsed => {
                self.scale.snap_to(1.0).await;
                AnimationResult::Finished
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Track the lowest and highest scale seen
    fn record_range(overshoot: &OvershootScale) -> Arc<Mutex<(f32, f32)>> {
        let range = Arc::new(Mutex::new((1.0f32, 1.0f32)));
        let sink = range.clone();
        overshoot.observable().observe(move |v| {
            let mut range = sink.lock().unwrap();
            range.0 = range.0.min(*v);
            range.1 = range.1.max(*v);
        });
        range
    }

    #[tokio::test(start_paused = true)]
    async fn test_expand_pulses_and_settles() {
        let overshoot = OvershootScale::new(FrameClock::default());
        let range = record_range(&overshoot);

        let result = overshoot
            .on_state_change(SheetState::Collapsed, SheetState::Expanded, true)
            .await;
        assert_eq!(result, AnimationResult::Finished);
        assert_eq!(overshoot.value(), 1.0);

        let (_, max) = *range.lock().unwrap();
        assert!(max > 1.04 && max <= 1.0501, "peak was {max}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_collapse_squashes_then_springs_back() {
        let overshoot = OvershootScale::new(FrameClock::default());
        let range = record_range(&overshoot);

        overshoot
            .on_state_change(SheetState::Expanded, SheetState::Collapsed, true)
            .await;
        assert_eq!(overshoot.value(), 1.0);

        let (min, _) = *range.lock().unwrap();
        assert_eq!(min, 0.96);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collapse_without_content_snaps() {
        let overshoot = OvershootScale::new(FrameClock::default());
        let range = record_range(&overshoot);

        overshoot
            .on_state_change(SheetState::Expanded, SheetState::Collapsed, false)
            .await;
        assert_eq!(overshoot.value(), 1.0);
        assert_eq!(*range.lock().unwrap(), (1.0, 1.0));
    }
}
