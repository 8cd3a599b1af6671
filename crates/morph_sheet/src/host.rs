//! Collaborators the sheet talks to
//!
//! The playback layer, the navigation graph and the haptics engine live
//! outside this crate. The sheet only sees them through these traits.

use std::sync::Arc;

/// Intents the sheet sends to the playback layer
pub trait PlaybackIntents: Send + Sync {
    /// Remove the current queue and show an undo affordance
    fn dismiss_queue_and_show_undo(&self);
}

/// Navigation destinations reachable from the sheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    AlbumDetail(i64),
    ArtistDetail(i64),
}

impl Route {
    /// Ids of `-1` are unknown and never navigated to
    pub fn is_known(&self) -> bool {
        match *self {
            Route::AlbumDetail(id) | Route::ArtistDetail(id) => id != -1,
        }
    }
}

/// Navigation layer
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HapticKind {
    LongPress,
    TextHandleMove,
}

/// Haptics engine
pub trait HapticFeedback: Send + Sync {
    fn perform(&self, kind: HapticKind);
}

/// Everything outside the crate the sheet needs to reach
#[derive(Clone)]
pub struct Collaborators {
    pub intents: Arc<dyn PlaybackIntents>,
    pub navigator: Arc<dyn Navigator>,
    pub haptics: Arc<dyn HapticFeedback>,
}

impl Collaborators {
    /// Collaborators that ignore every call
    pub fn noop() -> Self {
        Self {
            intents: Arc::new(NoopHost),
            navigator: Arc::new(NoopHost),
            haptics: Arc::new(NoopHost),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Collaborators that do nothing, for headless use
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHost;

impl PlaybackIntents for NoopHost {
    fn dismiss_queue_and_show_undo(&self) {}
}

impl Navigator for NoopHost {
    fn navigate(&self, _route: Route) {}
}

impl HapticFeedback for NoopHost {
    fn perform(&self, _kind: HapticKind) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_ids() {
        assert!(!Route::AlbumDetail(-1).is_known());
        assert!(Route::ArtistDetail(7).is_known());
    }
}
