//! Color scheme selection
//!
//! The player themes itself from the current song's artwork. Schemes are
//! extracted elsewhere and pushed in as a [`SchemeSource`]; the resolver
//! decides which scheme the album surfaces and the mini player use:
//!
//! 1. the freshly extracted scheme, if it belongs to the current artwork
//! 2. the last scheme seen for the same song
//! 3. the system scheme
//!
//! Once a song has had a scheme it never falls back to the system scheme
//! while that song stays current, even if the source goes stale.

use serde::{Deserialize, Serialize};

use morph_animation::Interpolate;
use morph_core::Color;
use tracing::trace;

use crate::state::{Song, StylePreferences};

/// The color roles the sheet surfaces read
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorScheme {
    pub primary: Color,
    pub on_primary: Color,
    pub primary_container: Color,
    pub on_primary_container: Color,
    pub surface_container: Color,
    pub on_surface: Color,
}

impl ColorScheme {
    pub fn system_light() -> Self {
        Self {
            primary: Color::from_hex(0x6750A4),
            on_primary: Color::WHITE,
            primary_container: Color::from_hex(0xEADDFF),
            on_primary_container: Color::from_hex(0x21005D),
            surface_container: Color::from_hex(0xF3EDF7),
            on_surface: Color::from_hex(0x1D1B20),
        }
    }

    pub fn system_dark() -> Self {
        Self {
            primary: Color::from_hex(0xD0BCFF),
            on_primary: Color::from_hex(0x381E72),
            primary_container: Color::from_hex(0x4F378B),
            on_primary_container: Color::from_hex(0xEADDFF),
            surface_container: Color::from_hex(0x211F26),
            on_surface: Color::from_hex(0xE6E0E9),
        }
    }
}

impl Interpolate for ColorScheme {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            primary: self.primary.lerp(&other.primary, t),
            on_primary: self.on_primary.lerp(&other.on_primary, t),
            primary_container: self.primary_container.lerp(&other.primary_container, t),
            on_primary_container: self
                .on_primary_container
                .lerp(&other.on_primary_container, t),
            surface_container: self.surface_container.lerp(&other.surface_container, t),
            on_surface: self.on_surface.lerp(&other.on_surface, t),
        }
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.primary.approx_eq(&other.primary, epsilon)
            && self.on_primary.approx_eq(&other.on_primary, epsilon)
            && self.primary_container.approx_eq(&other.primary_container, epsilon)
            && self
                .on_primary_container
                .approx_eq(&other.on_primary_container, epsilon)
            && self.surface_container.approx_eq(&other.surface_container, epsilon)
            && self.on_surface.approx_eq(&other.on_surface, epsilon)
    }
}

/// A light and dark variant of one scheme
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemePair {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl SchemePair {
    pub fn system() -> Self {
        Self {
            light: ColorScheme::system_light(),
            dark: ColorScheme::system_dark(),
        }
    }

    pub fn for_mode(&self, dark: bool) -> &ColorScheme {
        if dark {
            &self.dark
        } else {
            &self.light
        }
    }
}

/// The most recent artwork theming result
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeSource {
    /// Artwork the scheme was extracted from
    pub themed_art_uri: Option<String>,
    pub pair: Option<SchemePair>,
}

/// Schemes for the two themed surfaces
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedSchemes {
    pub album: ColorScheme,
    pub mini_player: ColorScheme,
}

/// Picks schemes and remembers the last good one per song
#[derive(Debug)]
pub struct SchemeResolver {
    system: SchemePair,
    dark: bool,
    source: SchemeSource,
    /// Song the cache belongs to
    cached_song_id: Option<String>,
    last_good: Option<ColorScheme>,
}

impl Default for SchemeResolver {
    fn default() -> Self {
        Self::new(SchemePair::system(), true)
    }
}

impl SchemeResolver {
    pub fn new(system: SchemePair, dark: bool) -> Self {
        Self {
            system,
            dark,
            source: SchemeSource::default(),
            cached_song_id: None,
            last_good: None,
        }
    }

    pub fn set_dark(&mut self, dark: bool) {
        self.dark = dark;
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    pub fn set_source(&mut self, source: SchemeSource) {
        self.source = source;
    }

    pub fn system_scheme(&self) -> &ColorScheme {
        self.system.for_mode(self.dark)
    }

    /// The extracted scheme, if it was extracted from `song`'s artwork
    fn active_for(&self, song: &Song) -> Option<ColorScheme> {
        let uri = song.album_art_uri.as_deref().filter(|uri| !uri.trim().is_empty())?;
        if self.source.themed_art_uri.as_deref() != Some(uri) {
            return None;
        }
        self.source
            .pair
            .as_ref()
            .map(|pair| pair.for_mode(self.dark).clone())
    }

    /// Resolve both surfaces for the current song
    pub fn resolve(&mut self, song: Option<&Song>, style: &StylePreferences) -> ResolvedSchemes {
        let song_id = song.map(|song| song.id.clone());
        if song_id != self.cached_song_id {
            trace!(?song_id, "scheme cache cleared for new song");
            self.cached_song_id = song_id;
            self.last_good = None;
        }

        let active = song.and_then(|song| self.active_for(song));
        if let Some(active) = &active {
            self.last_good = Some(active.clone());
        }

        let themed = active
            .or_else(|| self.last_good.clone())
            .unwrap_or_else(|| self.system_scheme().clone());

        let album = if style.album_art_theme() {
            themed.clone()
        } else {
            self.system_scheme().clone()
        };

        let needs_album_scheme = style.album_art_theme() && song.is_some_and(Song::has_art);
        let mini_player = if needs_album_scheme {
            themed
        } else {
            self.system_scheme().clone()
        };

        ResolvedSchemes { album, mini_player }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ThemePreference;

    fn art_scheme() -> SchemePair {
        let mut dark = ColorScheme::system_dark();
        dark.primary = Color::from_hex(0xFF5722);
        let mut light = ColorScheme::system_light();
        light.primary = Color::from_hex(0xBF360C);
        SchemePair { light, dark }
    }

    fn song() -> Song {
        Song::new("s1", "Song").with_art("content://art/1")
    }

    fn album_style() -> StylePreferences {
        StylePreferences {
            theme: ThemePreference::AlbumArt,
            ..StylePreferences::default()
        }
    }

    #[test]
    fn test_matching_source_wins() {
        let mut resolver = SchemeResolver::default();
        resolver.set_source(SchemeSource {
            themed_art_uri: Some("content://art/1".into()),
            pair: Some(art_scheme()),
        });

        let resolved = resolver.resolve(Some(&song()), &album_style());
        assert_eq!(resolved.album, art_scheme().dark);
        assert_eq!(resolved.mini_player, art_scheme().dark);
    }

    #[test]
    fn test_stale_source_falls_back_to_last_good() {
        let mut resolver = SchemeResolver::default();
        resolver.set_source(SchemeSource {
            themed_art_uri: Some("content://art/1".into()),
            pair: Some(art_scheme()),
        });
        resolver.resolve(Some(&song()), &album_style());

        // Theming moved on to another uri while the song is unchanged
        resolver.set_source(SchemeSource {
            themed_art_uri: Some("content://art/other".into()),
            pair: Some(SchemePair::system()),
        });
        let resolved = resolver.resolve(Some(&song()), &album_style());
        assert_eq!(resolved.album, art_scheme().dark);

        resolver.set_source(SchemeSource::default());
        let resolved = resolver.resolve(Some(&song()), &album_style());
        assert_eq!(resolved.album, art_scheme().dark);
    }

    #[test]
    fn test_song_change_clears_cache() {
        let mut resolver = SchemeResolver::default();
        resolver.set_source(SchemeSource {
            themed_art_uri: Some("content://art/1".into()),
            pair: Some(art_scheme()),
        });
        resolver.resolve(Some(&song()), &album_style());

        let next = Song::new("s2", "Next").with_art("content://art/2");
        let resolved = resolver.resolve(Some(&next), &album_style());
        assert_eq!(resolved.album, ColorScheme::system_dark());
    }

    #[test]
    fn test_theme_off_uses_system() {
        let mut resolver = SchemeResolver::new(SchemePair::system(), false);
        resolver.set_source(SchemeSource {
            themed_art_uri: Some("content://art/1".into()),
            pair: Some(art_scheme()),
        });
        let style = StylePreferences {
            theme: ThemePreference::Dynamic,
            ..StylePreferences::default()
        };
        let resolved = resolver.resolve(Some(&song()), &style);
        assert_eq!(resolved.album, ColorScheme::system_light());
        assert_eq!(resolved.mini_player, ColorScheme::system_light());
    }

    #[test]
    fn test_mini_player_without_art_uses_system() {
        let mut resolver = SchemeResolver::default();
        let bare = Song::new("s3", "No art");
        let resolved = resolver.resolve(Some(&bare), &album_style());
        assert_eq!(resolved.mini_player, ColorScheme::system_dark());
    }

    #[test]
    fn test_blank_art_never_matches() {
        let mut resolver = SchemeResolver::default();
        resolver.set_source(SchemeSource {
            themed_art_uri: Some("  ".into()),
            pair: Some(art_scheme()),
        });
        let blank = Song::new("s4", "Blank").with_art("  ");
        let resolved = resolver.resolve(Some(&blank), &album_style());
        assert_eq!(resolved.album, ColorScheme::system_dark());
    }

    #[test]
    fn test_scheme_crossfade() {
        let from = ColorScheme::system_dark();
        let to = art_scheme().dark;
        assert!(from.lerp(&to, 1.0).approx_eq(&to, 1e-6));
        assert!(from.lerp(&to, 0.0).approx_eq(&from, 1e-6));
    }
}
