//! Player and style state pushed into the sheet

use serde::{Deserialize, Serialize};

use morph_core::Dp;

/// Resting state of the sheet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetState {
    #[default]
    Collapsed,
    Expanded,
}

impl SheetState {
    pub fn is_expanded(self) -> bool {
        self == SheetState::Expanded
    }

    pub fn toggled(self) -> Self {
        match self {
            SheetState::Collapsed => SheetState::Expanded,
            SheetState::Expanded => SheetState::Collapsed,
        }
    }
}

/// A song, as far as the sheet cares
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// `-1` when unknown
    pub album_id: i64,
    /// `-1` when unknown
    pub artist_id: i64,
    pub album_art_uri: Option<String>,
}

impl Default for Song {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl Song {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: String::new(),
            album_id: -1,
            artist_id: -1,
            album_art_uri: None,
        }
    }

    pub fn with_art(mut self, uri: impl Into<String>) -> Self {
        self.album_art_uri = Some(uri.into());
        self
    }

    pub fn with_album(mut self, album_id: i64) -> Self {
        self.album_id = album_id;
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>, artist_id: i64) -> Self {
        self.artist = artist.into();
        self.artist_id = artist_id;
        self
    }

    pub fn has_art(&self) -> bool {
        self.album_art_uri.as_deref().is_some_and(|uri| !uri.is_empty())
    }
}

/// Latest playback state pushed by the playback layer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    pub current_song: Option<Song>,
    pub is_playing: bool,
    /// Local playback position (ms)
    pub position_ms: u64,
    /// Position reported by the cast device (ms)
    pub remote_position_ms: u64,
    pub remote_playback_active: bool,
    pub is_favorite: bool,
    pub queue: Vec<Song>,
    pub queue_source_name: String,
    /// Song being prepared for playback, if any
    pub preparing_song_id: Option<String>,
    pub cast_connecting: bool,
    /// An undo affordance for a dismissed queue is on screen
    pub show_dismiss_undo_bar: bool,
}

impl PlayerSnapshot {
    pub fn with_song(song: Song) -> Self {
        Self {
            current_song: Some(song),
            ..Self::default()
        }
    }

    /// Whether the player content area (mini and full player) exists
    pub fn shows_player_content(&self) -> bool {
        self.current_song.is_some() || self.cast_connecting
    }

    /// The current song is still being prepared
    pub fn is_preparing_playback(&self) -> bool {
        match (&self.preparing_song_id, &self.current_song) {
            (Some(preparing), Some(song)) => *preparing == song.id,
            _ => false,
        }
    }

    /// Position to display: the remote one while casting
    pub fn display_position_ms(&self) -> u64 {
        if self.remote_playback_active {
            self.remote_position_ms
        } else {
            self.position_ms
        }
    }
}

/// Navigation bar look
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavBarStyle {
    #[default]
    Default,
    FullWidth,
}

/// Where the player color scheme comes from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    /// Derived from the current song's artwork
    #[default]
    AlbumArt,
    /// System wallpaper colors
    Dynamic,
    /// App default colors
    Default,
}

/// User style preferences
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePreferences {
    pub nav_bar_style: NavBarStyle,
    pub nav_bar_corner_radius: Dp,
    pub nav_bar_hidden: bool,
    pub theme: ThemePreference,
    pub smooth_corners: bool,
    /// Tapping the expanded player background collapses it
    pub tap_background_closes_player: bool,
    pub hide_mini_player: bool,
}

impl Default for StylePreferences {
    fn default() -> Self {
        Self {
            nav_bar_style: NavBarStyle::Default,
            nav_bar_corner_radius: Dp(32.0),
            nav_bar_hidden: false,
            theme: ThemePreference::AlbumArt,
            smooth_corners: true,
            tap_background_closes_player: true,
            hide_mini_player: false,
        }
    }
}

impl StylePreferences {
    pub fn is_full_width(&self) -> bool {
        self.nav_bar_style == NavBarStyle::FullWidth
    }

    pub fn album_art_theme(&self) -> bool {
        self.theme == ThemePreference::AlbumArt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        assert_eq!(SheetState::Collapsed.toggled(), SheetState::Expanded);
        assert_eq!(SheetState::Expanded.toggled(), SheetState::Collapsed);
    }

    #[test]
    fn test_display_position_prefers_remote_while_casting() {
        let mut snapshot = PlayerSnapshot {
            position_ms: 1_000,
            remote_position_ms: 5_000,
            ..PlayerSnapshot::default()
        };
        assert_eq!(snapshot.display_position_ms(), 1_000);
        snapshot.remote_playback_active = true;
        assert_eq!(snapshot.display_position_ms(), 5_000);
    }

    #[test]
    fn test_song_art() {
        assert!(!Song::new("1", "a").has_art());
        assert!(!Song::new("1", "a").with_art("").has_art());
        assert!(Song::new("1", "a").with_art("content://art/1").has_art());
    }

    #[test]
    fn test_snapshot_deserializes_with_defaults() {
        let snapshot: PlayerSnapshot =
            serde_json::from_str(r#"{"is_playing": true, "position_ms": 42}"#).unwrap();
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.position_ms, 42);
        assert!(!snapshot.shows_player_content());
    }

    #[test]
    fn test_content_shown_while_cast_connecting() {
        let snapshot = PlayerSnapshot {
            cast_connecting: true,
            ..PlayerSnapshot::default()
        };
        assert!(snapshot.shows_player_content());
    }

    #[test]
    fn test_preparing_playback() {
        let mut snapshot = PlayerSnapshot::with_song(Song::new("a", "A"));
        assert!(!snapshot.is_preparing_playback());
        snapshot.preparing_song_id = Some("b".into());
        assert!(!snapshot.is_preparing_playback());
        snapshot.preparing_song_id = Some("a".into());
        assert!(snapshot.is_preparing_playback());
    }
}
