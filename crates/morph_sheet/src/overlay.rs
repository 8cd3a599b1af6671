//! Save-queue overlay slot
//!
//! Saving the queue as a playlist opens a full-screen overlay. The sheet
//! first gets out of the way, so a request goes through a short launching
//! phase before it becomes pending. There is only ever one slot.

use serde::Serialize;

use morph_core::Observable;
use tracing::debug;

use crate::state::Song;

/// The songs to save and the suggested playlist name
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SaveQueueRequest {
    pub songs: Vec<Song>,
    pub default_name: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum OverlaySlot {
    #[default]
    Empty,
    /// The sheet is collapsing before the overlay shows
    Launching(SaveQueueRequest),
    /// The overlay is on screen
    Pending(SaveQueueRequest),
}

/// Single-slot holder for the save-queue overlay
#[derive(Debug)]
pub struct SaveQueueOverlay {
    slot: Observable<OverlaySlot>,
}

impl Default for SaveQueueOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveQueueOverlay {
    pub fn new() -> Self {
        Self {
            slot: Observable::new(OverlaySlot::Empty),
        }
    }

    pub fn slot(&self) -> OverlaySlot {
        self.slot.get()
    }

    pub fn observable(&self) -> &Observable<OverlaySlot> {
        &self.slot
    }

    /// The overlay currently on screen
    pub fn pending(&self) -> Option<SaveQueueRequest> {
        self.slot.with(|slot| match slot {
            OverlaySlot::Pending(request) => Some(request.clone()),
            _ => None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.slot.with(|slot| matches!(slot, OverlaySlot::Pending(_)))
    }

    /// Claim the slot; `false` if a request is already launching or shown
    pub fn begin(&self, request: SaveQueueRequest) -> bool {
        let accepted = self.slot.update(|slot| match slot {
            OverlaySlot::Empty => OverlaySlot::Launching(request),
            other => other.clone(),
        });
        if accepted {
            debug!("save queue overlay launching");
        } else {
            debug!("save queue overlay already requested, ignoring");
        }
        accepted
    }

    /// Move a launching request on screen
    pub fn publish(&self) -> bool {
        self.slot.update(|slot| match slot {
            OverlaySlot::Launching(request) => OverlaySlot::Pending(request.clone()),
            other => other.clone(),
        })
    }

    /// Close the overlay, returning what it showed
    pub fn dismiss(&self) -> Option<SaveQueueRequest> {
        let previous = self.pending();
        if previous.is_some() {
            self.slot.set(OverlaySlot::Empty);
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> SaveQueueRequest {
        SaveQueueRequest {
            songs: vec![Song::new("1", "One"), Song::new("2", "Two")],
            default_name: name.into(),
        }
    }

    #[test]
    fn test_single_slot() {
        let overlay = SaveQueueOverlay::new();
        assert!(overlay.begin(request("first")));
        assert!(!overlay.begin(request("second")));
        assert!(!overlay.is_pending());

        assert!(overlay.publish());
        assert!(!overlay.begin(request("third")));
        assert_eq!(overlay.pending().unwrap().default_name, "first");
    }

    #[test]
    fn test_dismiss_frees_slot() {
        let overlay = SaveQueueOverlay::new();
        assert_eq!(overlay.dismiss(), None);

        overlay.begin(request("first"));
        overlay.publish();
        assert_eq!(overlay.dismiss().unwrap().songs.len(), 2);
        assert_eq!(overlay.slot(), OverlaySlot::Empty);
        assert!(overlay.begin(request("again")));
    }

    #[test]
    fn test_publish_without_launch() {
        let overlay = SaveQueueOverlay::new();
        assert!(!overlay.publish());
        assert_eq!(overlay.slot(), OverlaySlot::Empty);
    }
}
