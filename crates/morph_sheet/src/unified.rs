//! The unified player sheet
//!
//! [`UnifiedPlayerSheet`] wires the motion controller, the gesture handlers,
//! the secondary sheets and the derived state into the one surface the
//! playback layer talks to. Host calls are synchronous, like the UI events
//! they come from; anything that animates is spawned on the tokio runtime
//! the sheet was built on.
//!
//! # Example
//!
//! ```rust,no_run
//! use morph_sheet::{Collaborators, PlayerSnapshot, SheetConfig, Song, UnifiedPlayerSheet};
//!
//! # async fn run() -> morph_sheet::Result<()> {
//! let sheet = UnifiedPlayerSheet::new(SheetConfig::default(), Collaborators::noop())?;
//! sheet.update_player(PlayerSnapshot::with_song(Song::new("1", "Intro")));
//! sheet.expand();
//! sheet.wait_idle().await;
//! assert_eq!(sheet.expansion_fraction(), 1.0);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;

use morph_animation::{Animatable, AnimationSpec, Easing, SpringConfig};
use morph_core::sync::lock;
use morph_core::{AtomicF32, Dp, Observable};
use tracing::{debug, trace};

use crate::back::PredictiveBack;
use crate::config::SheetConfig;
use crate::dismiss::MiniPlayerDismissHandler;
use crate::drag::SheetDragHandler;
use crate::error::{Result, SheetError};
use crate::host::{Collaborators, Navigator, Route};
use crate::motion::{MotionClaim, SheetMotionController};
use crate::overlay::{SaveQueueOverlay, SaveQueueRequest};
use crate::overshoot::OvershootScale;
use crate::scheme::{ResolvedSchemes, SchemeResolver, SchemeSource};
use crate::secondary::{SecondarySheet, SecondarySheetConfig};
use crate::state::{PlayerSnapshot, SheetState, Song, StylePreferences};
use crate::visuals::{self, SheetVisuals, VisualInputs};

/// How the sheet moves into a new resting state
#[derive(Clone, Copy, Debug, PartialEq)]
enum Settle {
    /// The standard tween
    Tween,
    /// A released drag carrying its velocity (px/s)
    Fling(f32),
}

/// Everything observable about the sheet at one instant
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SheetFrame {
    pub state: SheetState,
    pub translation_y: f32,
    pub expansion_fraction: f32,
    pub is_dragging: bool,
    pub back_progress: f32,
    pub dismiss_offset: f32,
    pub queue_offset: f32,
    pub queue_open_fraction: f32,
    pub cast_open_fraction: f32,
    pub bottom_sheet_open_fraction: f32,
    pub scrim_alpha: f32,
    pub shows_sheet_content: bool,
    pub overlay_pending: bool,
    pub prewarm: bool,
    pub visuals: SheetVisuals,
    pub schemes: ResolvedSchemes,
}

struct SheetInner {
    runtime: Handle,
    config: SheetConfig,
    screen_height: f32,

    motion: SheetMotionController,
    drag: SheetDragHandler,
    dismiss: MiniPlayerDismissHandler,
    queue: SecondarySheet,
    cast: SecondarySheet,
    overlay: SaveQueueOverlay,
    back: PredictiveBack,
    overshoot: OvershootScale,
    mini_appear: Animatable,

    state: Observable<SheetState>,
    player: Observable<PlayerSnapshot>,
    style: Observable<StylePreferences>,
    keyboard_visible: Observable<bool>,
    selected_song_info: Observable<Option<Song>>,
    prewarm: Observable<bool>,
    prewarm_generation: AtomicU64,
    collapsed_y: AtomicF32,
    queue_base_padding: AtomicF32,

    resolver: Mutex<SchemeResolver>,
    schemes: Observable<ResolvedSchemes>,

    navigator: Arc<dyn Navigator>,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count when a spawned task ends or is dropped
struct InFlight(Arc<SheetInner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The player sheet host (cheap to clone)
#[derive(Clone)]
pub struct UnifiedPlayerSheet {
    inner: Arc<SheetInner>,
}

impl std::fmt::Debug for UnifiedPlayerSheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiedPlayerSheet")
            .field("state", &self.state())
            .field("motion", &self.inner.motion)
            .field("queue", &self.inner.queue)
            .field("cast", &self.inner.cast)
            .finish()
    }
}

impl UnifiedPlayerSheet {
    /// Build a collapsed sheet on the current tokio runtime
    pub fn new(config: SheetConfig, collaborators: Collaborators) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SheetError::NoRuntime)?;
        Self::with_runtime(config, collaborators, runtime)
    }

    /// Build a collapsed sheet whose animations run on `runtime`
    pub fn with_runtime(
        config: SheetConfig,
        collaborators: Collaborators,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let layout = &config.layout;
        let density = layout.density();
        let screen_width = layout.screen_width_px();
        let screen_height = layout.screen_height_px();
        let mini_height = density.to_px(layout.mini_player_height());
        if mini_height >= screen_height {
            return Err(SheetError::InvalidGeometry(format!(
                "mini player ({mini_height}px) does not fit the screen ({screen_height}px)"
            )));
        }

        let clock = config.clock();
        let collapsed_y = screen_height - mini_height;
        let motion = SheetMotionController::new(collapsed_y, 0.0, clock);
        let drag = SheetDragHandler::new(motion.clone(), config.gestures.sheet_fling_velocity);
        let dismiss = MiniPlayerDismissHandler::new(
            screen_width,
            config.gestures.dismiss_threshold_fraction,
            config.gestures.dismiss_fling_velocity,
            clock,
            collaborators.haptics.clone(),
            collaborators.intents.clone(),
        );

        let secondary = SecondarySheetConfig {
            fling_velocity: config.gestures.secondary_fling_velocity,
            min_fling_travel: density.to_px(Dp(config.gestures.secondary_min_fling_travel_dp)),
            threshold_fraction: config.gestures.secondary_drag_threshold_fraction,
            open_edge_epsilon: config.gestures.open_edge_epsilon_px,
            spec: config.tween(),
        };
        let queue = SecondarySheet::new(
            "queue_sheet",
            screen_height,
            secondary.clone(),
            clock,
            collaborators.haptics.clone(),
        );
        let cast = SecondarySheet::new(
            "cast_sheet",
            screen_height,
            secondary,
            clock,
            collaborators.haptics.clone(),
        );

        let mini_appear = Animatable::named("mini_appear", 0.0, clock);
        mini_appear.set_bounds(Some(0.0), Some(1.0));
        mini_appear.set_visibility_threshold(0.001);

        let mut resolver = SchemeResolver::default();
        let style = StylePreferences::default();
        let schemes = resolver.resolve(None, &style);

        debug!(screen_width, screen_height, collapsed_y, "player sheet created");

        let sheet = Self {
            inner: Arc::new(SheetInner {
                runtime,
                screen_height,
                motion,
                drag,
                dismiss,
                queue,
                cast,
                overlay: SaveQueueOverlay::new(),
                back: PredictiveBack::new(clock),
                overshoot: OvershootScale::new(clock),
                mini_appear,
                state: Observable::new(SheetState::Collapsed),
                player: Observable::new(PlayerSnapshot::default()),
                style: Observable::new(style),
                keyboard_visible: Observable::new(false),
                selected_song_info: Observable::new(None),
                prewarm: Observable::new(false),
                prewarm_generation: AtomicU64::new(0),
                collapsed_y: AtomicF32::new(collapsed_y),
                queue_base_padding: AtomicF32::new(0.0),
                resolver: Mutex::new(resolver),
                schemes: Observable::new(schemes),
                navigator: collaborators.navigator,
                in_flight: AtomicUsize::new(0),
                config,
            }),
        };
        sheet.refresh_gates();
        Ok(sheet)
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlight(self.inner.clone());
        self.inner.runtime.spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    /// Resolve once every spawned animation and delay has finished
    pub async fn wait_idle(&self) {
        let interval = self.inner.config.clock().frame_interval();
        while self.inner.in_flight.load(Ordering::Acquire) > 0 {
            tokio::time::sleep(interval).await;
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &SheetConfig {
        &self.inner.config
    }

    pub fn state(&self) -> SheetState {
        self.inner.state.get()
    }

    pub fn state_observable(&self) -> &Observable<SheetState> {
        &self.inner.state
    }

    pub fn motion(&self) -> &SheetMotionController {
        &self.inner.motion
    }

    pub fn translation_y(&self) -> f32 {
        self.inner.motion.translation_y()
    }

    pub fn expansion_fraction(&self) -> f32 {
        self.inner.motion.expansion_fraction()
    }

    pub fn collapsed_y(&self) -> f32 {
        self.inner.collapsed_y.load()
    }

    pub fn queue(&self) -> &SecondarySheet {
        &self.inner.queue
    }

    pub fn cast(&self) -> &SecondarySheet {
        &self.inner.cast
    }

    pub fn dismiss(&self) -> &MiniPlayerDismissHandler {
        &self.inner.dismiss
    }

    pub fn back(&self) -> &PredictiveBack {
        &self.inner.back
    }

    pub fn overlay(&self) -> &SaveQueueOverlay {
        &self.inner.overlay
    }

    pub fn player(&self) -> PlayerSnapshot {
        self.inner.player.get()
    }

    pub fn style(&self) -> StylePreferences {
        self.inner.style.get()
    }

    pub fn is_dragging(&self) -> bool {
        self.inner.drag.is_dragging()
    }

    pub fn is_prewarming(&self) -> bool {
        self.inner.prewarm.get()
    }

    pub fn mini_appear_progress(&self) -> f32 {
        self.inner.mini_appear.value()
    }

    pub fn overshoot_scale(&self) -> f32 {
        self.inner.overshoot.value()
    }

    pub fn selected_song_info(&self) -> Option<Song> {
        self.inner.selected_song_info.get()
    }

    // =========================================================================
    // Derived state
    // =========================================================================

    /// A song is loaded or a cast session is connecting
    pub fn shows_player_content(&self) -> bool {
        self.inner.player.with(PlayerSnapshot::shows_player_content)
    }

    pub fn should_show_sheet(&self) -> bool {
        self.shows_player_content() && !self.inner.style.with(|style| style.hide_mini_player)
    }

    /// The sheet is shown and not pushed away by the keyboard
    pub fn shows_sheet_content(&self) -> bool {
        self.should_show_sheet()
            && (!self.inner.keyboard_visible.get()
                || self.state().is_expanded()
                || self.inner.overlay.is_pending()
                || self.inner.selected_song_info.with(Option::is_some))
    }

    /// Position to display: the remote one while casting
    pub fn display_position(&self) -> u64 {
        self.inner.player.with(PlayerSnapshot::display_position_ms)
    }

    pub fn predictive_back_enabled(&self) -> bool {
        PredictiveBack::is_enabled(self.shows_player_content(), self.state(), self.is_dragging())
    }

    /// How far any secondary sheet covers the player
    pub fn bottom_sheet_open_fraction(&self) -> f32 {
        let queue = self.inner.queue.visual_open_fraction(self.inner.screen_height);
        queue.max(self.inner.cast.open_fraction())
    }

    pub fn color_schemes(&self) -> ResolvedSchemes {
        self.inner.schemes.get()
    }

    pub fn schemes_observable(&self) -> &Observable<ResolvedSchemes> {
        &self.inner.schemes
    }

    pub fn visual_inputs(&self) -> VisualInputs {
        let inner = &*self.inner;
        let player = inner.player.get();
        VisualInputs {
            expansion_fraction: inner.motion.expansion_fraction(),
            translation_y: inner.motion.translation_y(),
            collapsed_y: inner.collapsed_y.load(),
            sheet_state: inner.state.get(),
            back_progress: inner.back.progress(),
            shows_player_content: player.shows_player_content(),
            has_song: player.current_song.is_some(),
            is_playing: player.is_playing,
            swipe_dismiss_progress: inner.dismiss.swipe_dismiss_progress(),
            mini_appear_progress: inner.mini_appear.value(),
            overshoot_scale_y: inner.overshoot.value(),
            is_dragging: inner.drag.is_dragging(),
            fraction_animating: inner.motion.is_running(),
            container_height: Dp(inner.config.layout.screen_height_dp),
        }
    }

    pub fn visuals(&self) -> SheetVisuals {
        let style = self.inner.style.get();
        visuals::compute(&self.visual_inputs(), &style, &self.inner.config.layout)
    }

    /// Snapshot everything at once
    pub fn frame(&self) -> SheetFrame {
        let inner = &*self.inner;
        let screen_height = inner.screen_height;
        SheetFrame {
            state: self.state(),
            translation_y: self.translation_y(),
            expansion_fraction: self.expansion_fraction(),
            is_dragging: self.is_dragging(),
            back_progress: inner.back.progress(),
            dismiss_offset: inner.dismiss.offset(),
            queue_offset: inner.queue.offset(),
            queue_open_fraction: inner.queue.visual_open_fraction(screen_height),
            cast_open_fraction: inner.cast.open_fraction(),
            bottom_sheet_open_fraction: self.bottom_sheet_open_fraction(),
            scrim_alpha: inner.queue.scrim_alpha(screen_height),
            shows_sheet_content: self.shows_sheet_content(),
            overlay_pending: inner.overlay.is_pending(),
            prewarm: self.is_prewarming(),
            visuals: self.visuals(),
            schemes: self.color_schemes(),
        }
    }

    /// Re-derive which gestures are accepted
    fn refresh_gates(&self) {
        let inner = &*self.inner;
        let shows = self.shows_player_content();
        let state = inner.state.get();

        inner.dismiss.set_enabled(state == SheetState::Collapsed);
        inner.drag.set_enabled(shows && !inner.back.is_active());

        let secondary_allowed = shows && state == SheetState::Expanded;
        for sheet in [&inner.queue, &inner.cast] {
            if sheet.is_interaction_allowed() != secondary_allowed {
                trace!(label = sheet.label(), secondary_allowed, "secondary sheet gate");
                sheet.set_interaction_allowed(secondary_allowed);
            }
        }
    }

    /// Queue closed position: host padding plus the back-gesture inset
    fn refresh_queue_padding(&self) {
        let inner = &*self.inner;
        let layout = &inner.config.layout;
        let inset = layout
            .density()
            .to_px(visuals::bottom_padding(&self.visual_inputs(), layout));
        inner
            .queue
            .set_bottom_padding(inner.queue_base_padding.load() + inset);
    }

    fn refresh_schemes(&self) {
        let inner = &*self.inner;
        let player = inner.player.get();
        let style = inner.style.get();
        let resolved = lock(&inner.resolver).resolve(player.current_song.as_ref(), &style);
        inner.schemes.set(resolved);
    }

    // =========================================================================
    // Sheet state
    // =========================================================================

    pub fn expand(&self) {
        self.transition(SheetState::Expanded, Settle::Tween);
    }

    pub fn collapse(&self) {
        self.transition(SheetState::Collapsed, Settle::Tween);
    }

    pub fn toggle(&self) {
        self.transition(self.state().toggled(), Settle::Tween);
    }

    /// Tap on the player surface
    pub fn on_player_tap(&self) {
        let closes = self.inner.style.with(|style| style.tap_background_closes_player);
        if closes || self.state() == SheetState::Collapsed {
            self.toggle();
        }
    }

    fn transition(&self, requested: SheetState, settle: Settle) {
        let shows = self.shows_player_content();
        let next = if requested.is_expanded() && !shows {
            debug!("expand refused: no player content");
            SheetState::Collapsed
        } else {
            requested
        };

        let previous = self.inner.state.get();
        if self.inner.state.set(next) {
            debug!(?previous, ?next, "sheet state");
        }
        self.refresh_gates();

        // Claimed here so the latest call wins whatever order tasks run in
        let claim = self.inner.motion.claim();
        let this = self.clone();
        self.spawn(async move {
            this.settle(claim, shows, previous, next, settle).await
        });
    }

    async fn settle(
        &self,
        claim: MotionClaim,
        shows: bool,
        previous: SheetState,
        next: SheetState,
        settle: Settle,
    ) {
        let inner = &*self.inner;
        let collapsed_y = inner.collapsed_y.load();
        let (spec, velocity) = match settle {
            Settle::Tween => (inner.config.tween(), 0.0),
            Settle::Fling(velocity) => {
                (AnimationSpec::spring(SpringConfig::fling_settle()), velocity)
            }
        };

        let sheet = inner.motion.animate_claimed(
            claim,
            next.is_expanded(),
            shows,
            collapsed_y,
            &spec,
            velocity,
        );
        if previous != next {
            let overshoot = inner.overshoot.on_state_change(previous, next, shows);
            let (result, _) = tokio::join!(sheet, overshoot);
            trace!(?result, ?next, "sheet settled");
        } else {
            let result = sheet.await;
            trace!(?result, ?next, "sheet settled");
        }
    }

    /// Collapse without animating, e.g. before navigating away
    ///
    /// The state changes and the pair is claimed before this returns; the
    /// returned future applies the snap.
    fn snap_collapsed(&self) -> impl Future<Output = ()> + Send + 'static {
        let inner = &*self.inner;
        let claim = inner.motion.claim();
        let collapsed_y = inner.collapsed_y.load();
        let previous = inner.state.get();
        inner.state.set(SheetState::Collapsed);
        self.refresh_gates();

        let this = self.clone();
        async move {
            let inner = &*this.inner;
            inner.motion.snap_claimed(claim, collapsed_y, 0.0).await;
            inner
                .overshoot
                .on_state_change(previous, SheetState::Collapsed, false)
                .await;
        }
    }

    // =========================================================================
    // Primary sheet drag
    // =========================================================================

    /// Refused while the mini player is being swiped sideways
    pub fn on_sheet_drag_start(&self, time_ms: u64) -> bool {
        if self.inner.dismiss.is_swiping() {
            trace!("sheet drag refused during mini player swipe");
            return false;
        }
        let started = self.inner.drag.on_drag_start(time_ms);
        if started {
            self.inner.overshoot.reset_now();
        }
        started
    }

    pub fn on_sheet_drag(&self, delta: f32, time_ms: u64) {
        self.inner.drag.on_drag(delta, time_ms, self.collapsed_y());
    }

    pub fn on_sheet_drag_end(&self) {
        if let Some(release) = self.inner.drag.on_drag_end() {
            let next = if release.target_expanded {
                SheetState::Expanded
            } else {
                SheetState::Collapsed
            };
            self.transition(next, Settle::Fling(release.velocity));
        }
    }

    pub fn on_sheet_drag_cancel(&self) {
        if let Some(release) = self.inner.drag.cancel() {
            let next = if release.target_expanded {
                SheetState::Expanded
            } else {
                SheetState::Collapsed
            };
            self.transition(next, Settle::Tween);
        }
    }

    // =========================================================================
    // Mini player swipe
    // =========================================================================

    /// Refused while the sheet is being dragged vertically
    pub fn on_mini_swipe_start(&self, time_ms: u64) -> bool {
        if self.inner.drag.is_dragging() {
            trace!("mini player swipe refused during sheet drag");
            return false;
        }
        self.inner.dismiss.on_drag_start(time_ms)
    }

    pub fn on_mini_swipe(&self, delta: f32, time_ms: u64) {
        self.inner.dismiss.on_drag(delta, time_ms);
    }

    pub fn on_mini_swipe_end(&self) {
        let this = self.clone();
        self.spawn(async move {
            let outcome = this.inner.dismiss.on_drag_end().await;
            debug!(?outcome, "mini player swipe settled");
        });
    }

    // =========================================================================
    // Queue and cast sheets
    // =========================================================================

    pub fn set_queue_sheet_height(&self, height: f32) {
        self.inner.queue.set_sheet_height(height);
    }

    pub fn set_queue_bottom_padding(&self, padding: f32) {
        self.inner.queue_base_padding.store(padding.max(0.0));
        self.refresh_queue_padding();
    }

    pub fn set_cast_sheet_height(&self, height: f32) {
        self.inner.cast.set_sheet_height(height);
    }

    pub fn open_queue(&self) {
        self.animate_secondary(SecondaryKind::Queue, true);
    }

    pub fn close_queue(&self) {
        self.animate_secondary(SecondaryKind::Queue, false);
    }

    pub fn open_cast(&self) {
        self.animate_secondary(SecondaryKind::Cast, true);
    }

    pub fn dismiss_cast(&self) {
        self.animate_secondary(SecondaryKind::Cast, false);
    }

    pub fn on_queue_drag_start(&self) {
        self.inner.queue.begin_drag();
    }

    pub fn on_queue_drag(&self, delta: f32) {
        self.inner.queue.drag_by(delta);
    }

    pub fn on_queue_drag_end(&self, total_drag: f32, velocity: f32) {
        let this = self.clone();
        self.spawn(async move {
            this.inner.queue.end_drag(total_drag, velocity).await;
        });
    }

    fn animate_secondary(&self, kind: SecondaryKind, open: bool) {
        let this = self.clone();
        self.spawn(async move {
            let sheet = match kind {
                SecondaryKind::Queue => &this.inner.queue,
                SecondaryKind::Cast => &this.inner.cast,
            };
            if sheet.animate(open).await.is_none() {
                trace!(label = sheet.label(), "secondary sheet open refused");
            }
        });
    }

    // =========================================================================
    // Back handling
    // =========================================================================

    /// System back press; returns whether the sheet consumed it
    pub fn handle_back(&self) -> bool {
        let inner = &*self.inner;
        if inner.queue.is_visible() && !inner.keyboard_visible.get() {
            self.close_queue();
            true
        } else if inner.cast.is_visible() {
            self.dismiss_cast();
            true
        } else if self.shows_player_content() && self.state().is_expanded() {
            self.collapse();
            true
        } else {
            false
        }
    }

    /// Follow an in-progress predictive back gesture
    pub fn update_predictive_back(&self, progress: f32) {
        if !self.predictive_back_enabled() {
            return;
        }
        self.inner.back.update(progress);
        self.refresh_gates();
        self.refresh_queue_padding();
    }

    /// The back gesture completed: collapse from where the sheet is drawn
    ///
    /// Applies even when no progress was reported.
    pub fn commit_back(&self) {
        if !self.predictive_back_enabled() {
            return;
        }
        let inner = &*self.inner;
        let (translation_y, fraction) =
            inner.back.commit_pair(inner.motion.expanded_y(), inner.collapsed_y.load());
        debug!(translation_y, fraction, "predictive back committed");
        inner.motion.set_immediate(translation_y, fraction);
        inner.back.finish();
        self.transition(SheetState::Collapsed, Settle::Tween);
        self.refresh_queue_padding();
    }

    /// The back gesture was abandoned
    pub fn cancel_back(&self) {
        let this = self.clone();
        self.spawn(async move {
            let spec = this.inner.config.tween();
            this.inner.back.cancel(&spec).await;
            this.refresh_gates();
            this.refresh_queue_padding();
            this.transition(this.state(), Settle::Tween);
        });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn navigate_to_album(&self, song: &Song) {
        self.navigate_from_queue(Route::AlbumDetail(song.album_id));
    }

    pub fn navigate_to_artist(&self, song: &Song) {
        self.navigate_from_queue(Route::ArtistDetail(song.artist_id));
    }

    fn navigate_from_queue(&self, route: Route) {
        let snap = self.snap_collapsed();
        let this = self.clone();
        self.spawn(async move {
            snap.await;
            this.inner.queue.animate(false).await;
            this.inner.selected_song_info.set(None);
            this.navigate(route);
        });
    }

    /// Artist navigation requested by the playback layer
    pub fn on_artist_navigation_request(&self, artist_id: i64) {
        let snap = self.snap_collapsed();
        let this = self.clone();
        self.spawn(async move {
            snap.await;
            this.navigate(Route::ArtistDetail(artist_id));
        });
    }

    fn navigate(&self, route: Route) {
        if route.is_known() {
            debug!(?route, "navigating");
            self.inner.navigator.navigate(route);
        } else {
            debug!(?route, "unknown id, not navigating");
        }
    }

    // =========================================================================
    // Save queue overlay
    // =========================================================================

    /// Get the sheet out of the way, then show the save-queue overlay
    ///
    /// Ignored while another request is launching or on screen.
    pub fn save_queue_as_playlist(&self, songs: Vec<Song>, default_name: impl Into<String>) {
        let request = SaveQueueRequest {
            songs,
            default_name: default_name.into(),
        };
        if !self.inner.overlay.begin(request) {
            return;
        }

        self.close_queue();
        self.collapse();
        let delay = Duration::from_millis(u64::from(self.inner.config.motion.animation_duration_ms));
        let this = self.clone();
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            this.inner.overlay.publish();
            debug!("save queue overlay shown");
        });
    }

    pub fn dismiss_save_queue_overlay(&self) -> Option<SaveQueueRequest> {
        self.inner.overlay.dismiss()
    }

    // =========================================================================
    // Inputs from the playback layer
    // =========================================================================

    pub fn update_player(&self, snapshot: PlayerSnapshot) {
        let inner = &*self.inner;
        let previous = inner.player.get();
        let song_changed = previous.current_song.as_ref().map(|song| &song.id)
            != snapshot.current_song.as_ref().map(|song| &song.id);
        let has_song = snapshot.current_song.is_some();
        let shows = snapshot.shows_player_content();
        if !inner.player.set(snapshot) {
            return;
        }

        if song_changed {
            self.refresh_schemes();
            if has_song {
                self.start_prewarm();
            }
        }

        if has_song {
            if inner.mini_appear.value() < 1.0 && !inner.mini_appear.is_running() {
                let this = self.clone();
                self.spawn(async move {
                    let duration = this.inner.config.motion.mini_appear_duration_ms;
                    let spec = AnimationSpec::tween(duration, Easing::FastOutSlowIn);
                    this.inner.mini_appear.animate_to(1.0, &spec, None).await;
                });
            }
        } else {
            inner.mini_appear.set_immediate(0.0);
        }

        if !shows && self.state().is_expanded() {
            self.collapse();
        } else {
            self.refresh_gates();
        }
    }

    fn start_prewarm(&self) {
        let inner = &*self.inner;
        let generation = inner.prewarm_generation.fetch_add(1, Ordering::AcqRel) + 1;
        inner.prewarm.set(true);

        let duration = Duration::from_millis(u64::from(inner.config.motion.prewarm_duration_ms));
        let this = self.clone();
        self.spawn(async move {
            tokio::time::sleep(duration).await;
            if this.inner.prewarm_generation.load(Ordering::Acquire) == generation {
                this.inner.prewarm.set(false);
            }
        });
    }

    pub fn update_style(&self, style: StylePreferences) {
        if self.inner.style.set(style) {
            self.refresh_schemes();
        }
    }

    /// New artwork theming result
    pub fn update_scheme_source(&self, source: SchemeSource) {
        lock(&self.inner.resolver).set_source(source);
        self.refresh_schemes();
    }

    pub fn set_dark_theme(&self, dark: bool) {
        lock(&self.inner.resolver).set_dark(dark);
        self.refresh_schemes();
    }

    /// The collapsed position moved (layout change)
    pub fn set_collapsed_target_y(&self, collapsed_y: f32) {
        let inner = &*self.inner;
        if !collapsed_y.is_finite() {
            debug!(collapsed_y, "ignoring non-finite collapsed position");
            return;
        }
        if inner.collapsed_y.swap(collapsed_y) == collapsed_y {
            return;
        }

        // A drag in progress picks up the new position on its next delta
        if inner.drag.is_dragging() {
            return;
        }
        // Only a pair resting where its state puts it can be resynced in
        // place; anything else is heading somewhere and gets re-aimed
        let state = inner.state.get();
        let resting_fraction = if state.is_expanded() { 1.0 } else { 0.0 };
        if inner.motion.is_running() || inner.motion.expansion_fraction() != resting_fraction {
            self.transition(state, Settle::Tween);
        } else {
            let claim = inner.motion.claim();
            let this = self.clone();
            self.spawn(async move {
                this.inner.motion.sync_claimed(claim, collapsed_y).await;
            });
        }
    }

    pub fn set_keyboard_visible(&self, visible: bool) {
        self.inner.keyboard_visible.set(visible);
    }

    /// Song whose info sheet is open, if any
    pub fn select_song_info(&self, song: Option<Song>) {
        self.inner.selected_song_info.set(song);
    }
}

#[derive(Clone, Copy, Debug)]
enum SecondaryKind {
    Queue,
    Cast,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> UnifiedPlayerSheet {
        UnifiedPlayerSheet::new(SheetConfig::default(), Collaborators::noop()).unwrap()
    }

    fn playing() -> PlayerSnapshot {
        PlayerSnapshot {
            is_playing: true,
            ..PlayerSnapshot::with_song(Song::new("1", "Intro").with_art("content://art/1"))
        }
    }

    #[test]
    fn test_requires_runtime() {
        let err = UnifiedPlayerSheet::new(SheetConfig::default(), Collaborators::noop());
        assert!(matches!(err, Err(SheetError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_invalid_geometry() {
        let mut config = SheetConfig::default();
        config.layout.mini_player_height_dp = 2000.0;
        let err = UnifiedPlayerSheet::new(config, Collaborators::noop());
        assert!(matches!(err, Err(SheetError::InvalidGeometry(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_collapsed_at_bottom() {
        let sheet = sheet();
        let layout = &sheet.config().layout;
        let expected = layout.screen_height_px() - layout.density().to_px(layout.mini_player_height());
        assert_eq!(sheet.state(), SheetState::Collapsed);
        assert_eq!(sheet.translation_y(), expected);
        assert_eq!(sheet.expansion_fraction(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prewarm_pulse() {
        let sheet = sheet();
        sheet.update_player(playing());
        assert!(sheet.is_prewarming());
        sheet.wait_idle().await;
        assert!(!sheet.is_prewarming());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mini_player_appears_once() {
        let sheet = sheet();
        assert_eq!(sheet.mini_appear_progress(), 0.0);

        sheet.update_player(playing());
        sheet.wait_idle().await;
        assert_eq!(sheet.mini_appear_progress(), 1.0);

        sheet.update_player(PlayerSnapshot::default());
        assert_eq!(sheet.mini_appear_progress(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_position_prefers_remote() {
        let sheet = sheet();
        sheet.update_player(PlayerSnapshot {
            position_ms: 1_000,
            remote_position_ms: 5_000,
            remote_playback_active: true,
            ..playing()
        });
        assert_eq!(sheet.display_position(), 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keyboard_hides_collapsed_content() {
        let sheet = sheet();
        sheet.update_player(playing());
        assert!(sheet.shows_sheet_content());

        sheet.set_keyboard_visible(true);
        assert!(!sheet.shows_sheet_content());

        sheet.select_song_info(Some(Song::new("1", "Intro")));
        assert!(sheet.shows_sheet_content());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hidden_mini_player_hides_sheet() {
        let sheet = sheet();
        sheet.update_player(playing());
        sheet.update_style(StylePreferences {
            hide_mini_player: true,
            ..StylePreferences::default()
        });
        assert!(!sheet.should_show_sheet());
        assert!(sheet.shows_player_content());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gates_follow_state() {
        let sheet = sheet();
        sheet.update_player(playing());
        assert!(sheet.dismiss().is_enabled());
        assert!(!sheet.queue().is_interaction_allowed());

        sheet.expand();
        assert!(!sheet.dismiss().is_enabled());
        assert!(sheet.queue().is_interaction_allowed());
        assert!(sheet.cast().is_interaction_allowed());
        sheet.wait_idle().await;
    }
}
