//! Horizontal swipe-to-dismiss on the mini player
//!
//! The mini player can be flung sideways off screen to clear the queue.
//! The horizontal offset has its own [`Animatable`], independent of the
//! sheet's vertical motion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use morph_animation::{
    Animatable, AnimationResult, AnimationSpec, FrameClock, SpringConfig, VelocityTracker,
};
use morph_core::sync::lock;
use morph_core::Observable;
use tracing::debug;

use crate::host::{HapticFeedback, HapticKind, PlaybackIntents};

/// How a released swipe ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissOutcome {
    /// Flung off screen; the queue was dismissed
    Dismissed,
    /// Returned to rest
    Restored,
    /// Superseded by a newer gesture before settling
    Interrupted,
}

#[derive(Debug, Default)]
struct SwipeSession {
    accumulated: f32,
    tracker: VelocityTracker,
    threshold_crossed: bool,
}

/// Horizontal dismiss gesture for the collapsed mini player
pub struct MiniPlayerDismissHandler {
    offset: Animatable,
    progress: Observable<f32>,
    session: Mutex<Option<SwipeSession>>,
    enabled: AtomicBool,
    screen_width: f32,
    threshold: f32,
    fling_velocity: f32,
    haptics: Arc<dyn HapticFeedback>,
    intents: Arc<dyn PlaybackIntents>,
}

impl std::fmt::Debug for MiniPlayerDismissHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniPlayerDismissHandler")
            .field("offset", &self.offset.value())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl MiniPlayerDismissHandler {
    pub fn new(
        screen_width: f32,
        threshold_fraction: f32,
        fling_velocity: f32,
        clock: FrameClock,
        haptics: Arc<dyn HapticFeedback>,
        intents: Arc<dyn PlaybackIntents>,
    ) -> Self {
        let offset = Animatable::named("dismiss_offset", 0.0, clock);
        offset.set_bounds(Some(-screen_width), Some(screen_width));
        offset.set_visibility_threshold(0.5);

        let threshold = screen_width * threshold_fraction;
        let progress = offset.as_observable().map(move |value| {
            if threshold == 0.0 {
                0.0
            } else {
                (value.abs() / threshold).clamp(0.0, 1.0)
            }
        });

        Self {
            offset,
            progress,
            session: Mutex::new(None),
            enabled: AtomicBool::new(true),
            screen_width,
            threshold,
            fling_velocity,
            haptics,
            intents,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset.value()
    }

    /// Distance past which a release dismisses
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// `|offset| / threshold`, clamped to `[0, 1]`
    pub fn swipe_dismiss_progress(&self) -> f32 {
        self.progress.get()
    }

    pub fn progress_observable(&self) -> &Observable<f32> {
        &self.progress
    }

    /// Only enabled while the sheet is collapsed
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// A swipe session is open
    pub fn is_swiping(&self) -> bool {
        lock(&self.session).is_some()
    }

    pub fn on_drag_start(&self, time_ms: u64) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.offset.stop_now();
        let mut session = SwipeSession::default();
        session.tracker.add_position(time_ms, 0.0);
        *lock(&self.session) = Some(session);
        true
    }

    /// Move by `delta` px (positive to the right)
    pub fn on_drag(&self, delta: f32, time_ms: u64) {
        let crossed_now = {
            let mut session = lock(&self.session);
            let Some(session) = session.as_mut() else {
                return;
            };
            session.accumulated += delta;
            session.tracker.add_position(time_ms, session.accumulated);

            self.offset.set_immediate(self.offset.value() + delta);

            let crossed = self.offset.value().abs() > self.threshold;
            let first = crossed && !session.threshold_crossed;
            session.threshold_crossed |= crossed;
            first
        };
        if crossed_now {
            self.haptics.perform(HapticKind::TextHandleMove);
        }
    }

    /// Finish the swipe: fling off screen and dismiss, or return to rest
    pub async fn on_drag_end(&self) -> DismissOutcome {
        let session = lock(&self.session).take();
        let Some(session) = session else {
            return DismissOutcome::Interrupted;
        };
        let velocity = session.tracker.calculate_velocity();
        let offset = self.offset.value();

        let direction = if offset != 0.0 {
            offset.signum()
        } else {
            velocity.signum()
        };
        let fling = velocity.abs() > self.fling_velocity && velocity.signum() == direction;
        let dismiss = offset.abs() > self.threshold || fling;
        debug!(offset, velocity, dismiss, "mini player swipe released");

        let spec = AnimationSpec::spring(SpringConfig::fling_settle());
        if dismiss {
            let result = self
                .offset
                .animate_to(direction * self.screen_width, &spec, Some(velocity))
                .await;
            if result == AnimationResult::Cancelled {
                return DismissOutcome::Interrupted;
            }
            self.intents.dismiss_queue_and_show_undo();
            self.offset.snap_to(0.0).await;
            DismissOutcome::Dismissed
        } else {
            match self.offset.animate_to(0.0, &spec, Some(velocity)).await {
                AnimationResult::Cancelled => DismissOutcome::Interrupted,
                _ => DismissOutcome::Restored,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    const WIDTH: f32 = 1000.0;

    #[derive(Default)]
    struct Recorder {
        dismissed: AtomicUsize,
        haptics: AtomicUsize,
    }

    impl PlaybackIntents for Recorder {
        fn dismiss_queue_and_show_undo(&self) {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl HapticFeedback for Recorder {
        fn perform(&self, _kind: HapticKind) {
            self.haptics.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn handler() -> (MiniPlayerDismissHandler, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let handler = MiniPlayerDismissHandler::new(
            WIDTH,
            0.4,
            1000.0,
            FrameClock::default(),
            recorder.clone(),
            recorder.clone(),
        );
        (handler, recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_far_swipe_dismisses() {
        let (handler, recorder) = handler();
        handler.on_drag_start(0);
        for i in 1..=10u64 {
            // 50 px every 100 ms: slow, but far
            handler.on_drag(50.0, i * 100);
        }
        assert_eq!(handler.offset(), 500.0);
        assert_eq!(handler.swipe_dismiss_progress(), 1.0);

        assert_eq!(handler.on_drag_end().await, DismissOutcome::Dismissed);
        assert_eq!(recorder.dismissed.load(Ordering::SeqCst), 1);
        assert_eq!(handler.offset(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_slow_swipe_restores() {
        let (handler, recorder) = handler();
        assert!(!handler.is_swiping());
        handler.on_drag_start(0);
        for i in 1..=4u64 {
            handler.on_drag(-50.0, i * 100);
        }
        assert!(handler.is_swiping());
        assert_eq!(handler.swipe_dismiss_progress(), 0.5);
        assert_eq!(handler.on_drag_end().await, DismissOutcome::Restored);
        assert!(!handler.is_swiping());
        assert_eq!(recorder.dismissed.load(Ordering::SeqCst), 0);
        assert_eq!(handler.offset(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_fling_dismisses() {
        let (handler, recorder) = handler();
        handler.on_drag_start(0);
        // 120 px in 40 ms == 3000 px/s to the left
        for i in 1..=5u64 {
            handler.on_drag(-24.0, i * 8);
        }
        assert_eq!(handler.on_drag_end().await, DismissOutcome::Dismissed);
        assert_eq!(recorder.dismissed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offset_clamped_to_screen() {
        let (handler, _) = handler();
        handler.on_drag_start(0);
        handler.on_drag(5000.0, 16);
        assert_eq!(handler.offset(), WIDTH);
    }

    #[tokio::test(start_paused = true)]
    async fn test_haptic_once_per_session() {
        let (handler, recorder) = handler();
        handler.on_drag_start(0);
        handler.on_drag(450.0, 100);
        handler.on_drag(-100.0, 200);
        handler.on_drag(100.0, 300);
        assert_eq!(recorder.haptics.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_while_expanded() {
        let (handler, _) = handler();
        handler.set_enabled(false);
        assert!(!handler.on_drag_start(0));
        handler.on_drag(300.0, 16);
        assert_eq!(handler.offset(), 0.0);
    }
}
