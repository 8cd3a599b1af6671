//! Sheet motion controller
//!
//! Owns the two values that place the sheet: its vertical translation and
//! its expansion fraction. They always move together. An animation drives
//! a single normalized progress and derives both outputs from it on every
//! frame, so the pair stays consistent even when the animation is cut off
//! halfway.
//!
//! One [`MutatorMutex`] guards the pair: animations and snaps cancel
//! whatever is in flight, and drags stop it synchronously before writing.

use std::ops::ControlFlow;
use std::sync::Arc;

use morph_animation::{drive, AnimationResult, AnimationSpec, FrameClock};
use morph_core::{
    lerp, MutatePriority, MutationError, MutationTicket, MutatorMutex, Observable, ObserverId,
};
use tracing::{debug, trace};

/// Translation of the fully expanded sheet
pub const EXPANDED_Y: f32 = 0.0;

/// Half a pixel of travel, as a fraction of the animation distance
fn progress_threshold(distance: f32) -> f32 {
    if distance.abs() > f32::EPSILON {
        (0.5 / distance.abs()).clamp(1e-4, 0.01)
    } else {
        0.001
    }
}

struct MotionInner {
    translation_y: Observable<f32>,
    expansion_fraction: Observable<f32>,
    running: Observable<bool>,
    mutex: MutatorMutex,
    clock: FrameClock,
    expanded_y: f32,
}

impl MotionInner {
    fn write(&self, translation_y: f32, expansion_fraction: f32) {
        self.translation_y.set(translation_y);
        self.expansion_fraction.set(expansion_fraction.clamp(0.0, 1.0));
    }
}

/// The right to move the pair, taken at call time
///
/// Claims are ordered by when [`SheetMotionController::claim`] ran, so a
/// task started later but scheduled earlier still loses to a newer claim.
#[must_use = "the pair stays claimed until the claim is used"]
#[derive(Debug)]
pub struct MotionClaim(Result<MutationTicket, MutationError>);

impl MotionClaim {
    /// Whether no newer claim, snap or drag has taken over
    pub fn is_active(&self) -> bool {
        self.0.as_ref().is_ok_and(MutationTicket::is_active)
    }
}

/// Owner of the sheet's translation / expansion pair (cheap to clone)
#[derive(Clone)]
pub struct SheetMotionController {
    inner: Arc<MotionInner>,
}

impl std::fmt::Debug for SheetMotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetMotionController")
            .field("translation_y", &self.translation_y())
            .field("expansion_fraction", &self.expansion_fraction())
            .field("running", &self.is_running())
            .finish()
    }
}

impl SheetMotionController {
    /// Create a controller resting at `(translation_y, expansion_fraction)`
    pub fn new(translation_y: f32, expansion_fraction: f32, clock: FrameClock) -> Self {
        Self {
            inner: Arc::new(MotionInner {
                translation_y: Observable::new(translation_y),
                expansion_fraction: Observable::new(expansion_fraction.clamp(0.0, 1.0)),
                running: Observable::new(false),
                mutex: MutatorMutex::new(),
                clock,
                expanded_y: EXPANDED_Y,
            }),
        }
    }

    pub fn translation_y(&self) -> f32 {
        self.inner.translation_y.get()
    }

    pub fn expansion_fraction(&self) -> f32 {
        self.inner.expansion_fraction.get()
    }

    pub fn expanded_y(&self) -> f32 {
        self.inner.expanded_y
    }

    /// Whether an animation is driving the pair
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    pub fn translation_observable(&self) -> &Observable<f32> {
        &self.inner.translation_y
    }

    pub fn fraction_observable(&self) -> &Observable<f32> {
        &self.inner.expansion_fraction
    }

    pub fn running_observable(&self) -> &Observable<bool> {
        &self.inner.running
    }

    pub fn observe_fraction<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&f32) + Send + Sync + 'static,
    {
        self.inner.expansion_fraction.observe(observer)
    }

    pub fn observe_translation<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&f32) + Send + Sync + 'static,
    {
        self.inner.translation_y.observe(observer)
    }

    /// Cancel whatever moves the pair and claim it for a later call
    pub fn claim(&self) -> MotionClaim {
        let ticket = self.inner.mutex.reserve(MutatePriority::Default);
        if ticket.is_ok() {
            self.inner.running.set(true);
        }
        MotionClaim(ticket)
    }

    /// Animate to the expanded or collapsed resting pair
    ///
    /// Refuses to expand when `can_expand` is false and returns `None`.
    /// `initial_velocity` is the sheet's vertical velocity in px/s.
    pub async fn animate_to(
        &self,
        target_expanded: bool,
        can_expand: bool,
        collapsed_y: f32,
        spec: &AnimationSpec,
        initial_velocity: f32,
    ) -> Option<AnimationResult> {
        let claim = self.claim();
        self.animate_claimed(
            claim,
            target_expanded,
            can_expand,
            collapsed_y,
            spec,
            initial_velocity,
        )
        .await
    }

    /// [`animate_to`](Self::animate_to) under an earlier claim
    pub async fn animate_claimed(
        &self,
        claim: MotionClaim,
        target_expanded: bool,
        can_expand: bool,
        collapsed_y: f32,
        spec: &AnimationSpec,
        initial_velocity: f32,
    ) -> Option<AnimationResult> {
        let inner = &*self.inner;
        let ticket = match claim.0 {
            Ok(ticket) => ticket,
            Err(err) => {
                trace!(%err, "sheet animation not started");
                return Some(AnimationResult::Cancelled);
            }
        };
        if target_expanded && !can_expand {
            debug!("expand refused: no player content");
            if inner.mutex.abandon(ticket) {
                inner.running.set(false);
            }
            return None;
        }

        let (target_y, target_fraction) = if target_expanded {
            (inner.expanded_y, 1.0)
        } else {
            (collapsed_y, 0.0)
        };

        let result = inner
            .mutex
            .mutate_reserved(ticket, |scope| async move {
                let start_y = inner.translation_y.get();
                let start_fraction = inner.expansion_fraction.get();
                if start_y == target_y && start_fraction == target_fraction {
                    inner.running.set(false);
                    return AnimationResult::Finished;
                }

                // Progress velocity: px/s over the px covered by progress 0..1
                let distance = target_y - start_y;
                let progress_velocity = if distance.abs() > f32::EPSILON {
                    initial_velocity / distance
                } else {
                    0.0
                };

                inner.running.set(true);
                trace!(
                    start_y,
                    target_y,
                    start_fraction,
                    target_fraction,
                    progress_velocity,
                    "sheet animation"
                );

                let driver = spec.driver(0.0, 1.0, progress_velocity, progress_threshold(distance));
                let result = drive(inner.clock, &scope, driver, |sample| {
                    let progress = sample.value.clamp(0.0, 1.0);
                    inner.write(
                        lerp(start_y, target_y, progress),
                        lerp(start_fraction, target_fraction, progress),
                    );
                    ControlFlow::Continue(())
                })
                .await;

                if result != AnimationResult::Cancelled {
                    inner.write(target_y, target_fraction);
                    inner.running.set(false);
                }
                result
            })
            .await;

        Some(result.unwrap_or_else(|err| {
            trace!(%err, "sheet animation superseded");
            AnimationResult::Cancelled
        }))
    }

    /// Cancel any animation and jump to `(translation_y, expansion_fraction)`
    pub async fn snap_to(&self, translation_y: f32, expansion_fraction: f32) {
        let claim = self.claim();
        self.snap_claimed(claim, translation_y, expansion_fraction).await;
    }

    /// [`snap_to`](Self::snap_to) under an earlier claim
    pub async fn snap_claimed(
        &self,
        claim: MotionClaim,
        translation_y: f32,
        expansion_fraction: f32,
    ) {
        let inner = &*self.inner;
        let result = match claim.0 {
            Ok(ticket) => {
                inner
                    .mutex
                    .mutate_reserved(ticket, |_| async move {
                        inner.write(translation_y, expansion_fraction);
                        inner.running.set(false);
                    })
                    .await
            }
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            trace!(%err, "sheet snap superseded");
        }
    }

    pub async fn snap_collapsed(&self, collapsed_y: f32) {
        self.snap_to(collapsed_y, 0.0).await;
    }

    /// Re-derive the translation for a new collapsed position
    ///
    /// The fraction is kept. Any animation in flight is cancelled, since it
    /// was heading for the old collapsed position.
    pub async fn sync_to_expansion(&self, collapsed_y: f32) {
        let claim = self.claim();
        self.sync_claimed(claim, collapsed_y).await;
    }

    /// [`sync_to_expansion`](Self::sync_to_expansion) under an earlier claim
    pub async fn sync_claimed(&self, claim: MotionClaim, collapsed_y: f32) {
        let fraction = self.expansion_fraction();
        let translation_y = lerp(collapsed_y, self.inner.expanded_y, fraction);
        self.snap_claimed(claim, translation_y, fraction).await;
    }

    /// Cancel any animation synchronously, leaving the pair where it is
    pub fn stop_now(&self) {
        if self.inner.mutex.cancel_current() {
            trace!("sheet animation stopped");
        }
        self.inner.running.set(false);
    }

    /// Write the pair directly, stopping any animation first
    pub fn set_immediate(&self, translation_y: f32, expansion_fraction: f32) {
        self.stop_now();
        self.inner.write(translation_y, expansion_fraction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_animation::{Easing, SpringConfig};
    use std::sync::Mutex;
    use std::time::Duration;

    const COLLAPSED_Y: f32 = 2000.0;

    fn tween() -> AnimationSpec {
        AnimationSpec::tween(255, Easing::FastOutSlowIn)
    }

    fn collapsed() -> SheetMotionController {
        SheetMotionController::new(COLLAPSED_Y, 0.0, FrameClock::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_animate_lands_on_exact_pair() {
        let motion = collapsed();
        let result = motion
            .animate_to(true, true, COLLAPSED_Y, &tween(), 0.0)
            .await;

        assert_eq!(result, Some(AnimationResult::Finished));
        assert_eq!(motion.translation_y(), EXPANDED_Y);
        assert_eq!(motion.expansion_fraction(), 1.0);
        assert!(!motion.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expand_refused_without_content() {
        let motion = collapsed();
        let result = motion
            .animate_to(true, false, COLLAPSED_Y, &tween(), 0.0)
            .await;
        assert_eq!(result, None);
        assert_eq!(motion.translation_y(), COLLAPSED_Y);
        assert_eq!(motion.expansion_fraction(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pair_stays_consistent_every_frame() {
        let motion = collapsed();
        let pairs = Arc::new(Mutex::new(Vec::new()));
        {
            let pairs = pairs.clone();
            let reader = motion.clone();
            motion.observe_fraction(move |fraction| {
                pairs.lock().unwrap().push((reader.translation_y(), *fraction));
            });
        }

        motion
            .animate_to(true, true, COLLAPSED_Y, &tween(), 0.0)
            .await;

        let pairs = pairs.lock().unwrap();
        assert!(pairs.len() > 10);
        for (y, fraction) in pairs.iter() {
            let expected = lerp(COLLAPSED_Y, EXPANDED_Y, *fraction);
            assert!((y - expected).abs() < 0.5, "y {y} fraction {fraction}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_animation_wins() {
        let motion = collapsed();
        let expand = {
            let motion = motion.clone();
            tokio::spawn(async move {
                motion
                    .animate_to(true, true, COLLAPSED_Y, &tween(), 0.0)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let midway = motion.expansion_fraction();
        assert!(midway > 0.0 && midway < 1.0);

        let collapse = motion
            .animate_to(false, true, COLLAPSED_Y, &tween(), 0.0)
            .await;

        assert_eq!(expand.await.unwrap(), Some(AnimationResult::Cancelled));
        assert_eq!(collapse, Some(AnimationResult::Finished));
        assert_eq!(motion.translation_y(), COLLAPSED_Y);
        assert_eq!(motion.expansion_fraction(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snap_during_animation() {
        let motion = collapsed();
        let expand = {
            let motion = motion.clone();
            tokio::spawn(async move {
                motion
                    .animate_to(true, true, COLLAPSED_Y, &tween(), 0.0)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        motion.snap_to(500.0, 0.75).await;
        assert_eq!(motion.translation_y(), 500.0);
        assert_eq!(motion.expansion_fraction(), 0.75);

        assert_eq!(expand.await.unwrap(), Some(AnimationResult::Cancelled));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(motion.translation_y(), 500.0);
        assert_eq!(motion.expansion_fraction(), 0.75);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spring_with_fling_velocity() {
        let motion = SheetMotionController::new(1200.0, 0.4, FrameClock::default());
        // Upward fling toward the expanded position
        let result = motion
            .animate_to(
                true,
                true,
                COLLAPSED_Y,
                &AnimationSpec::spring(SpringConfig::fling_settle()),
                -3000.0,
            )
            .await;
        assert_eq!(result, Some(AnimationResult::Finished));
        assert_eq!(motion.translation_y(), EXPANDED_Y);
        assert_eq!(motion.expansion_fraction(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_to_expansion_keeps_fraction() {
        let motion = SheetMotionController::new(1000.0, 0.5, FrameClock::default());
        motion.sync_to_expansion(3000.0).await;
        assert_eq!(motion.expansion_fraction(), 0.5);
        assert_eq!(motion.translation_y(), 1500.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_immediate_stops_animation() {
        let motion = collapsed();
        let expand = {
            let motion = motion.clone();
            tokio::spawn(async move {
                motion
                    .animate_to(true, true, COLLAPSED_Y, &tween(), 0.0)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        motion.set_immediate(1900.0, 0.05);
        assert_eq!(expand.await.unwrap(), Some(AnimationResult::Cancelled));
        assert_eq!(motion.translation_y(), 1900.0);
        assert!(!motion.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_claim_order_decides_winner() {
        let motion = collapsed();
        let expand_claim = motion.claim();
        let collapse_claim = motion.claim();
        assert!(!expand_claim.is_active());
        assert!(motion.is_running());

        // The collapse runs first; the stale expand must not move the pair
        let collapse = motion
            .animate_claimed(collapse_claim, false, true, COLLAPSED_Y, &tween(), 0.0)
            .await;
        let expand = motion
            .animate_claimed(expand_claim, true, true, COLLAPSED_Y, &tween(), 0.0)
            .await;

        assert_eq!(collapse, Some(AnimationResult::Finished));
        assert_eq!(expand, Some(AnimationResult::Cancelled));
        assert_eq!(motion.translation_y(), COLLAPSED_Y);
        assert_eq!(motion.expansion_fraction(), 0.0);
        assert!(!motion.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_claim_releases_pair() {
        let motion = collapsed();
        let claim = motion.claim();
        let result = motion
            .animate_claimed(claim, true, false, COLLAPSED_Y, &tween(), 0.0)
            .await;
        assert_eq!(result, None);
        assert!(!motion.is_running());
    }
}
