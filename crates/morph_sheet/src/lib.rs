//! Morph Sheet
//!
//! The unified player sheet: one surface that morphs continuously between a
//! compact mini player and the full now-playing view, and hosts the queue
//! sheet, the cast sheet and the save-queue overlay.
//!
//! # Features
//!
//! - **Paired Motion**: translation and expansion fraction driven by a single
//!   progress, so they never disagree
//! - **Gestures**: vertical drag with fling decisions, horizontal swipe to
//!   dismiss, draggable secondary sheets
//! - **Derived Visuals**: corners, padding, elevation and opacity as pure
//!   functions of the sheet state
//! - **Color Schemes**: artwork-driven schemes cached per song
//! - **Predictive Back**: the expanded sheet shrinks with the back gesture
//!
//! Everything outside the sheet (playback, navigation, haptics) is reached
//! through the traits in [`host`].

pub mod back;
pub mod config;
pub mod dismiss;
pub mod drag;
pub mod error;
pub mod host;
pub mod motion;
pub mod overlay;
pub mod overshoot;
pub mod scheme;
pub mod secondary;
pub mod state;
pub mod unified;
pub mod visuals;

pub use back::PredictiveBack;
pub use config::{GestureConfig, LayoutConfig, MotionConfig, SheetConfig};
pub use dismiss::{DismissOutcome, MiniPlayerDismissHandler};
pub use drag::{SheetDragHandler, SheetRelease};
pub use error::{Result, SheetError};
pub use host::{Collaborators, HapticFeedback, HapticKind, Navigator, NoopHost, PlaybackIntents, Route};
pub use motion::{MotionClaim, SheetMotionController, EXPANDED_Y};
pub use overlay::{OverlaySlot, SaveQueueOverlay, SaveQueueRequest};
pub use overshoot::OvershootScale;
pub use scheme::{ColorScheme, ResolvedSchemes, SchemePair, SchemeResolver, SchemeSource};
pub use secondary::{SecondarySheet, SecondarySheetConfig};
pub use state::{NavBarStyle, PlayerSnapshot, SheetState, Song, StylePreferences, ThemePreference};
pub use unified::{SheetFrame, UnifiedPlayerSheet};
pub use visuals::{SheetVisuals, VisualInputs};
