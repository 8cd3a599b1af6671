//! Sheet configuration
//!
//! Tuning constants for motion, gesture decisions and layout, loaded from a
//! TOML file. Every section and field is optional; missing values fall back
//! to the defaults below.
//!
//! ```toml
//! [motion]
//! animation_duration_ms = 255
//!
//! [gestures]
//! sheet_fling_velocity = 650.0
//!
//! [layout]
//! density = 2.75
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use morph_animation::{AnimationSpec, Easing, FrameClock};
use morph_core::{Density, Dp};

use crate::error::{Result, SheetError};

// =============================================================================
// Sections
// =============================================================================

/// Top-level sheet configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Animation timing
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Duration of sheet, queue and overlay tweens
    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u32,
    /// Frame rate animations are stepped at
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Fade/scale-in of the mini player when the first song arrives
    #[serde(default = "default_mini_appear_duration_ms")]
    pub mini_appear_duration_ms: u32,
    /// How long the prewarm flag stays raised after a song change
    #[serde(default = "default_prewarm_duration_ms")]
    pub prewarm_duration_ms: u32,
}

fn default_animation_duration_ms() -> u32 {
    255
}

fn default_target_fps() -> u32 {
    120
}

fn default_mini_appear_duration_ms() -> u32 {
    260
}

fn default_prewarm_duration_ms() -> u32 {
    32
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            animation_duration_ms: default_animation_duration_ms(),
            target_fps: default_target_fps(),
            mini_appear_duration_ms: default_mini_appear_duration_ms(),
            prewarm_duration_ms: default_prewarm_duration_ms(),
        }
    }
}

/// Fling and threshold decisions
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GestureConfig {
    /// Release velocity (px/s) above which the sheet follows the fling direction
    #[serde(default = "default_fling_velocity")]
    pub sheet_fling_velocity: f32,
    /// Fling velocity (px/s) for the queue and cast sheets
    #[serde(default = "default_fling_velocity")]
    pub secondary_fling_velocity: f32,
    /// Minimum drag travel before an opening fling counts
    #[serde(default = "default_min_fling_travel_dp")]
    pub secondary_min_fling_travel_dp: f32,
    /// Position threshold as a fraction of the hidden offset
    #[serde(default = "default_drag_threshold_fraction")]
    pub secondary_drag_threshold_fraction: f32,
    /// Horizontal dismiss distance as a fraction of the screen width
    #[serde(default = "default_dismiss_threshold_fraction")]
    pub dismiss_threshold_fraction: f32,
    /// Horizontal fling velocity (px/s) that dismisses regardless of distance
    #[serde(default = "default_dismiss_fling_velocity")]
    pub dismiss_fling_velocity: f32,
    /// Offset (px) under which a secondary sheet counts as fully open
    #[serde(default = "default_open_edge_epsilon_px")]
    pub open_edge_epsilon_px: f32,
}

fn default_fling_velocity() -> f32 {
    650.0
}

fn default_min_fling_travel_dp() -> f32 {
    18.0
}

fn default_drag_threshold_fraction() -> f32 {
    0.08
}

fn default_dismiss_threshold_fraction() -> f32 {
    0.4
}

fn default_dismiss_fling_velocity() -> f32 {
    1000.0
}

fn default_open_edge_epsilon_px() -> f32 {
    0.5
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            sheet_fling_velocity: default_fling_velocity(),
            secondary_fling_velocity: default_fling_velocity(),
            secondary_min_fling_travel_dp: default_min_fling_travel_dp(),
            secondary_drag_threshold_fraction: default_drag_threshold_fraction(),
            dismiss_threshold_fraction: default_dismiss_threshold_fraction(),
            dismiss_fling_velocity: default_dismiss_fling_velocity(),
            open_edge_epsilon_px: default_open_edge_epsilon_px(),
        }
    }
}

/// Screen and sheet geometry
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Pixels per dp
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_screen_width_dp")]
    pub screen_width_dp: f32,
    #[serde(default = "default_screen_height_dp")]
    pub screen_height_dp: f32,
    #[serde(default = "default_mini_player_height_dp")]
    pub mini_player_height_dp: f32,
    /// Horizontal inset of the collapsed sheet with the default nav bar
    #[serde(default = "default_collapsed_horizontal_padding_dp")]
    pub collapsed_horizontal_padding_dp: f32,
    /// Horizontal inset of the collapsed sheet with the full-width nav bar
    #[serde(default = "default_full_width_horizontal_padding_dp")]
    pub full_width_horizontal_padding_dp: f32,
    /// Slide distance of the full player content while it fades in
    #[serde(default = "default_initial_full_player_offset_dp")]
    pub initial_full_player_offset_dp: f32,
}

fn default_density() -> f32 {
    2.75
}

fn default_screen_width_dp() -> f32 {
    411.0
}

fn default_screen_height_dp() -> f32 {
    891.0
}

fn default_mini_player_height_dp() -> f32 {
    64.0
}

fn default_collapsed_horizontal_padding_dp() -> f32 {
    12.0
}

fn default_full_width_horizontal_padding_dp() -> f32 {
    14.0
}

fn default_initial_full_player_offset_dp() -> f32 {
    24.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            density: default_density(),
            screen_width_dp: default_screen_width_dp(),
            screen_height_dp: default_screen_height_dp(),
            mini_player_height_dp: default_mini_player_height_dp(),
            collapsed_horizontal_padding_dp: default_collapsed_horizontal_padding_dp(),
            full_width_horizontal_padding_dp: default_full_width_horizontal_padding_dp(),
            initial_full_player_offset_dp: default_initial_full_player_offset_dp(),
        }
    }
}

impl LayoutConfig {
    pub fn density(&self) -> Density {
        Density::new(self.density)
    }

    pub fn screen_width_px(&self) -> f32 {
        self.density().to_px(Dp(self.screen_width_dp))
    }

    pub fn screen_height_px(&self) -> f32 {
        self.density().to_px(Dp(self.screen_height_dp))
    }

    pub fn mini_player_height(&self) -> Dp {
        Dp(self.mini_player_height_dp)
    }
}

// =============================================================================
// Loading
// =============================================================================

impl SheetConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SheetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serialize to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values no sheet can work with
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        let gestures = &self.gestures;

        if self.motion.target_fps == 0 {
            return Err(SheetError::Config("motion.target_fps must be positive".into()));
        }
        for (name, value) in [
            ("layout.density", layout.density),
            ("layout.screen_width_dp", layout.screen_width_dp),
            ("layout.screen_height_dp", layout.screen_height_dp),
            ("layout.mini_player_height_dp", layout.mini_player_height_dp),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SheetError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [
            (
                "gestures.secondary_drag_threshold_fraction",
                gestures.secondary_drag_threshold_fraction,
            ),
            (
                "gestures.dismiss_threshold_fraction",
                gestures.dismiss_threshold_fraction,
            ),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(SheetError::Config(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        for (name, value) in [
            ("gestures.sheet_fling_velocity", gestures.sheet_fling_velocity),
            ("gestures.secondary_fling_velocity", gestures.secondary_fling_velocity),
            ("gestures.dismiss_fling_velocity", gestures.dismiss_fling_velocity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SheetError::Config(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Frame clock for all sheet animations
    pub fn clock(&self) -> FrameClock {
        FrameClock::new(self.motion.target_fps)
    }

    /// The standard sheet tween
    pub fn tween(&self) -> AnimationSpec {
        AnimationSpec::tween(self.motion.animation_duration_ms, Easing::FastOutSlowIn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SheetConfig::default();
        assert_eq!(config.motion.animation_duration_ms, 255);
        assert_eq!(config.gestures.secondary_fling_velocity, 650.0);
        assert_eq!(config.gestures.secondary_min_fling_travel_dp, 18.0);
        assert_eq!(config.gestures.dismiss_threshold_fraction, 0.4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SheetConfig::from_toml_str(
            r#"
            [gestures]
            sheet_fling_velocity = 900.0

            [layout]
            density = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.gestures.sheet_fling_velocity, 900.0);
        assert_eq!(config.gestures.secondary_fling_velocity, 650.0);
        assert_eq!(config.layout.density, 3.0);
        assert_eq!(config.layout.screen_width_dp, 411.0);
        assert_eq!(config.motion, MotionConfig::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = SheetConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[motion]"));
        assert_eq!(SheetConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_validation_errors() {
        let err = SheetConfig::from_toml_str("[layout]\ndensity = 0.0\n").unwrap_err();
        assert!(matches!(err, SheetError::Config(ref msg) if msg.contains("layout.density")));

        let err = SheetConfig::from_toml_str("[gestures]\ndismiss_threshold_fraction = 1.5\n")
            .unwrap_err();
        assert!(matches!(err, SheetError::Config(_)));

        let err = SheetConfig::from_toml_str("[motion]\ntarget_fps = 0\n").unwrap_err();
        assert!(matches!(err, SheetError::Config(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SheetConfig::from_toml_str("[motion\n").unwrap_err();
        assert!(matches!(err, SheetError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SheetConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, SheetError::Io(_)));
    }

    #[test]
    fn test_layout_in_pixels() {
        let layout = LayoutConfig::default();
        assert!((layout.screen_width_px() - 411.0 * 2.75).abs() < 1e-3);
    }
}
