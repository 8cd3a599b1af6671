//! Derived visual state
//!
//! Everything the render layer needs to draw the sheet is a pure function
//! of a handful of inputs: the expansion fraction, the resting state, the
//! predictive-back progress, the dismiss-swipe progress and the style
//! preferences. Nothing here is stored; the host recomputes on demand.

use serde::Serialize;

use morph_core::{lerp, Dp};
use morph_animation::Interpolate;

use crate::config::LayoutConfig;
use crate::state::{SheetState, StylePreferences};

/// Top corners of the collapsed sheet with the full-width nav bar
const FULL_WIDTH_CORNER: Dp = Dp(32.0);
/// Corners used when the nav bar is hidden
const HIDDEN_NAV_CORNER: Dp = Dp(60.0);
/// Bottom corners of the expanded player content
const EXPANDED_BOTTOM_CORNER: Dp = Dp(26.0);
/// Bottom corners of the collapsed mini player above a visible nav bar
const COLLAPSED_BOTTOM_CORNER: Dp = Dp(12.0);
/// Bottom corners with a hidden nav bar and no content
const HIDDEN_NAV_BOTTOM_CORNER: Dp = Dp(32.0);
/// Fraction over which the bottom corners open up
const BOTTOM_CORNER_RAMP: f32 = 0.2;

const COLLAPSED_ELEVATION: Dp = Dp(2.0);
const EXPANDED_ELEVATION: Dp = Dp(12.0);

const MINI_APPEAR_MIN_SCALE: f32 = 0.985;

/// Current values the visuals are derived from
#[derive(Clone, Debug, PartialEq)]
pub struct VisualInputs {
    pub expansion_fraction: f32,
    pub translation_y: f32,
    pub collapsed_y: f32,
    pub sheet_state: SheetState,
    /// Predictive-back collapse progress in `[0, 1]`
    pub back_progress: f32,
    pub shows_player_content: bool,
    pub has_song: bool,
    pub is_playing: bool,
    /// Mini-player swipe progress in `[0, 1]`
    pub swipe_dismiss_progress: f32,
    /// Mini-player appear animation progress in `[0, 1]`
    pub mini_appear_progress: f32,
    pub overshoot_scale_y: f32,
    pub is_dragging: bool,
    pub fraction_animating: bool,
    pub container_height: Dp,
}

impl Default for VisualInputs {
    fn default() -> Self {
        Self {
            expansion_fraction: 0.0,
            translation_y: 0.0,
            collapsed_y: 0.0,
            sheet_state: SheetState::Collapsed,
            back_progress: 0.0,
            shows_player_content: true,
            has_song: true,
            is_playing: true,
            swipe_dismiss_progress: 0.0,
            mini_appear_progress: 1.0,
            overshoot_scale_y: 1.0,
            is_dragging: false,
            fraction_animating: false,
            container_height: Dp(891.0),
        }
    }
}

impl VisualInputs {
    /// Predictive back is shrinking the expanded sheet
    fn back_collapsing(&self) -> bool {
        self.back_progress > 0.0
            && self.shows_player_content
            && self.sheet_state == SheetState::Expanded
    }
}

/// Everything the render layer reads
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SheetVisuals {
    pub sheet_y: f32,
    pub top_corner_radius: Dp,
    pub bottom_corner_radius: Dp,
    pub horizontal_padding: Dp,
    pub bottom_padding: Dp,
    pub content_height: Dp,
    pub elevation: Dp,
    pub mini_alpha: f32,
    pub full_content_alpha: f32,
    pub full_content_translation_y: Dp,
    pub mini_appear_alpha: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub smooth_corners: bool,
}

/// Derive every visual property at once
pub fn compute(inputs: &VisualInputs, style: &StylePreferences, layout: &LayoutConfig) -> SheetVisuals {
    let fraction = inputs.expansion_fraction;
    let full_alpha = full_content_alpha(fraction);
    let appear_scale = mini_appear_scale(inputs.mini_appear_progress);

    SheetVisuals {
        sheet_y: visual_sheet_y(inputs.translation_y, inputs.collapsed_y, inputs.back_progress),
        top_corner_radius: top_corner_radius(inputs, style),
        bottom_corner_radius: bottom_corner_radius(inputs, style),
        horizontal_padding: horizontal_padding(inputs, style, layout),
        bottom_padding: bottom_padding(inputs, layout),
        content_height: content_area_height(inputs, layout),
        elevation: elevation(fraction, inputs.mini_appear_progress),
        mini_alpha: mini_alpha(fraction),
        full_content_alpha: full_alpha,
        full_content_translation_y: full_content_translation(
            full_alpha,
            Dp(layout.initial_full_player_offset_dp),
        ),
        mini_appear_alpha: inputs.mini_appear_progress,
        scale_x: appear_scale,
        scale_y: inputs.overshoot_scale_y * appear_scale,
        smooth_corners: use_smooth_shape(style, inputs.is_dragging, inputs.fraction_animating),
    }
}

// ============================================================================
// Corners
// ============================================================================

fn collapsed_top_corner(style: &StylePreferences) -> Dp {
    if style.is_full_width() {
        FULL_WIDTH_CORNER
    } else if style.nav_bar_hidden {
        HIDDEN_NAV_CORNER
    } else {
        style.nav_bar_corner_radius
    }
}

pub fn top_corner_radius(inputs: &VisualInputs, style: &StylePreferences) -> Dp {
    if !inputs.shows_player_content {
        return if style.is_full_width() {
            Dp::ZERO
        } else if style.nav_bar_hidden {
            HIDDEN_NAV_CORNER
        } else {
            style.nav_bar_corner_radius
        };
    }

    let collapsed = collapsed_top_corner(style);
    if inputs.back_progress > 0.0 && inputs.sheet_state == SheetState::Expanded {
        Dp::ZERO.lerp(&collapsed, inputs.back_progress)
    } else {
        collapsed.lerp(&Dp::ZERO, inputs.expansion_fraction)
    }
}

pub fn bottom_corner_radius(inputs: &VisualInputs, style: &StylePreferences) -> Dp {
    let fraction = inputs.expansion_fraction;
    if style.is_full_width() {
        return FULL_WIDTH_CORNER.lerp(&EXPANDED_BOTTOM_CORNER, fraction);
    }

    let collapsed = if style.nav_bar_hidden {
        HIDDEN_NAV_CORNER
    } else {
        COLLAPSED_BOTTOM_CORNER
    };

    let regular = if inputs.back_collapsing() {
        EXPANDED_BOTTOM_CORNER.lerp(&collapsed, inputs.back_progress)
    } else if inputs.shows_player_content {
        if fraction < BOTTOM_CORNER_RAMP {
            collapsed.lerp(
                &EXPANDED_BOTTOM_CORNER,
                (fraction / BOTTOM_CORNER_RAMP).clamp(0.0, 1.0),
            )
        } else {
            EXPANDED_BOTTOM_CORNER
        }
    } else if !inputs.is_playing || !inputs.has_song {
        if style.nav_bar_hidden {
            HIDDEN_NAV_BOTTOM_CORNER
        } else {
            style.nav_bar_corner_radius
        }
    } else if style.nav_bar_hidden {
        HIDDEN_NAV_BOTTOM_CORNER
    } else {
        COLLAPSED_BOTTOM_CORNER
    };

    // Swiping the mini player sideways morphs it toward the nav bar shape
    if inputs.sheet_state == SheetState::Collapsed
        && inputs.swipe_dismiss_progress > 0.0
        && inputs.shows_player_content
        && fraction < 0.01
    {
        let base = if style.nav_bar_hidden {
            HIDDEN_NAV_BOTTOM_CORNER
        } else {
            COLLAPSED_BOTTOM_CORNER
        };
        base.lerp(&style.nav_bar_corner_radius, inputs.swipe_dismiss_progress)
    } else {
        regular
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Horizontal inset of the collapsed sheet
pub fn collapsed_horizontal_padding(style: &StylePreferences, layout: &LayoutConfig) -> Dp {
    if style.is_full_width() {
        Dp(layout.full_width_horizontal_padding_dp)
    } else {
        Dp(layout.collapsed_horizontal_padding_dp)
    }
}

pub fn horizontal_padding(
    inputs: &VisualInputs,
    style: &StylePreferences,
    layout: &LayoutConfig,
) -> Dp {
    let padding = collapsed_horizontal_padding(style, layout);
    if inputs.back_collapsing() {
        Dp::ZERO.lerp(&padding, inputs.back_progress)
    } else if inputs.shows_player_content {
        padding.lerp(&Dp::ZERO, inputs.expansion_fraction)
    } else {
        padding
    }
}

/// Gap under the sheet; only opens up while predictive back shrinks it
pub fn bottom_padding(inputs: &VisualInputs, layout: &LayoutConfig) -> Dp {
    if inputs.back_collapsing() {
        Dp::ZERO.lerp(&Dp(layout.collapsed_horizontal_padding_dp), inputs.back_progress)
    } else {
        Dp::ZERO
    }
}

/// Sheet translation as drawn, pulled toward the collapsed position by back
pub fn visual_sheet_y(translation_y: f32, collapsed_y: f32, back_progress: f32) -> f32 {
    translation_y * (1.0 - back_progress) + collapsed_y * back_progress
}

pub fn content_area_height(inputs: &VisualInputs, layout: &LayoutConfig) -> Dp {
    if inputs.shows_player_content {
        layout
            .mini_player_height()
            .lerp(&inputs.container_height, inputs.expansion_fraction)
    } else {
        Dp::ZERO
    }
}

pub fn elevation(fraction: f32, mini_appear_progress: f32) -> Dp {
    let elevation = COLLAPSED_ELEVATION.lerp(&EXPANDED_ELEVATION, fraction);
    Dp::ZERO.lerp(&elevation, mini_appear_progress)
}

// ============================================================================
// Opacity and scale
// ============================================================================

/// The mini player fades out over the first half of the expansion
pub fn mini_alpha(fraction: f32) -> f32 {
    (1.0 - fraction * 2.0).clamp(0.0, 1.0)
}

/// The full player fades in after a quarter of the expansion
pub fn full_content_alpha(fraction: f32) -> f32 {
    (fraction - 0.25).clamp(0.0, 0.75) / 0.75
}

pub fn full_content_translation(full_alpha: f32, initial_offset: Dp) -> Dp {
    initial_offset.lerp(&Dp::ZERO, full_alpha)
}

pub fn mini_appear_scale(progress: f32) -> f32 {
    lerp(MINI_APPEAR_MIN_SCALE, 1.0, progress)
}

/// Smooth (squircle) corners are only drawn while the sheet is at rest
pub fn use_smooth_shape(style: &StylePreferences, is_dragging: bool, fraction_animating: bool) -> bool {
    style.smooth_corners && !is_dragging && !fraction_animating
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NavBarStyle;

    fn style() -> StylePreferences {
        StylePreferences {
            nav_bar_corner_radius: Dp(28.0),
            ..StylePreferences::default()
        }
    }

    fn full_width() -> StylePreferences {
        StylePreferences {
            nav_bar_style: NavBarStyle::FullWidth,
            ..style()
        }
    }

    fn at(fraction: f32) -> VisualInputs {
        VisualInputs {
            expansion_fraction: fraction,
            sheet_state: if fraction >= 0.5 {
                SheetState::Expanded
            } else {
                SheetState::Collapsed
            },
            ..VisualInputs::default()
        }
    }

    fn assert_dp(actual: Dp, expected: f32) {
        assert!((actual.0 - expected).abs() < 1e-4, "{actual:?} != {expected}");
    }

    #[test]
    fn test_top_corner_follows_fraction() {
        assert_dp(top_corner_radius(&at(0.0), &style()), 28.0);
        assert_dp(top_corner_radius(&at(0.5), &style()), 14.0);
        assert_dp(top_corner_radius(&at(1.0), &style()), 0.0);
        assert_dp(top_corner_radius(&at(0.0), &full_width()), 32.0);

        let hidden = StylePreferences {
            nav_bar_hidden: true,
            ..style()
        };
        assert_dp(top_corner_radius(&at(0.0), &hidden), 60.0);
    }

    #[test]
    fn test_top_corner_during_back() {
        let inputs = VisualInputs {
            back_progress: 0.5,
            ..at(1.0)
        };
        assert_dp(top_corner_radius(&inputs, &style()), 14.0);
    }

    #[test]
    fn test_top_corner_without_content() {
        let inputs = VisualInputs {
            shows_player_content: false,
            ..at(0.0)
        };
        assert_dp(top_corner_radius(&inputs, &style()), 28.0);
        assert_dp(top_corner_radius(&inputs, &full_width()), 0.0);
    }

    #[test]
    fn test_bottom_corner_ramp() {
        assert_dp(bottom_corner_radius(&at(0.0), &style()), 12.0);
        assert_dp(bottom_corner_radius(&at(0.1), &style()), 19.0);
        assert_dp(bottom_corner_radius(&at(0.2), &style()), 26.0);
        assert_dp(bottom_corner_radius(&at(0.9), &style()), 26.0);
        assert_dp(bottom_corner_radius(&at(0.5), &full_width()), 29.0);
    }

    #[test]
    fn test_bottom_corner_during_back() {
        let inputs = VisualInputs {
            back_progress: 0.5,
            ..at(1.0)
        };
        assert_dp(bottom_corner_radius(&inputs, &style()), 19.0);
    }

    #[test]
    fn test_bottom_corner_without_content() {
        let idle = VisualInputs {
            shows_player_content: false,
            is_playing: false,
            ..at(0.0)
        };
        assert_dp(bottom_corner_radius(&idle, &style()), 28.0);

        let playing = VisualInputs {
            shows_player_content: false,
            ..at(0.0)
        };
        assert_dp(bottom_corner_radius(&playing, &style()), 12.0);
    }

    #[test]
    fn test_bottom_corner_follows_dismiss_swipe() {
        let inputs = VisualInputs {
            swipe_dismiss_progress: 0.5,
            ..at(0.0)
        };
        assert_dp(bottom_corner_radius(&inputs, &style()), 20.0);
    }

    #[test]
    fn test_padding() {
        let layout = LayoutConfig::default();
        assert_dp(horizontal_padding(&at(0.0), &style(), &layout), 12.0);
        assert_dp(horizontal_padding(&at(1.0), &style(), &layout), 0.0);
        assert_dp(horizontal_padding(&at(0.0), &full_width(), &layout), 14.0);

        let back = VisualInputs {
            back_progress: 0.25,
            ..at(1.0)
        };
        assert_dp(horizontal_padding(&back, &style(), &layout), 3.0);
        assert_dp(bottom_padding(&back, &layout), 3.0);
        assert_dp(bottom_padding(&at(1.0), &layout), 0.0);
    }

    #[test]
    fn test_alphas() {
        assert_eq!(mini_alpha(0.0), 1.0);
        assert_eq!(mini_alpha(0.25), 0.5);
        assert_eq!(mini_alpha(0.7), 0.0);

        assert_eq!(full_content_alpha(0.1), 0.0);
        assert!((full_content_alpha(0.625) - 0.5).abs() < 1e-6);
        assert_eq!(full_content_alpha(1.0), 1.0);
        assert_dp(full_content_translation(0.5, Dp(24.0)), 12.0);
    }

    #[test]
    fn test_visual_y_pulled_by_back() {
        assert_eq!(visual_sheet_y(0.0, 2000.0, 0.0), 0.0);
        assert_eq!(visual_sheet_y(0.0, 2000.0, 0.25), 500.0);
        assert_eq!(visual_sheet_y(100.0, 2000.0, 1.0), 2000.0);
    }

    #[test]
    fn test_elevation_and_appear() {
        assert_dp(elevation(0.0, 1.0), 2.0);
        assert_dp(elevation(1.0, 1.0), 12.0);
        assert_dp(elevation(1.0, 0.5), 6.0);
        assert_eq!(mini_appear_scale(1.0), 1.0);
        assert!((mini_appear_scale(0.0) - 0.985).abs() < 1e-6);
    }

    #[test]
    fn test_content_height() {
        let layout = LayoutConfig::default();
        let inputs = VisualInputs {
            container_height: Dp(864.0),
            ..at(0.5)
        };
        assert_dp(content_area_height(&inputs, &layout), 464.0);
    }

    #[test]
    fn test_smooth_shape_only_at_rest() {
        assert!(use_smooth_shape(&style(), false, false));
        assert!(!use_smooth_shape(&style(), true, false));
        assert!(!use_smooth_shape(&style(), false, true));
    }

    #[test]
    fn test_compute_collapsed_snapshot() {
        let visuals = compute(&at(0.0), &style(), &LayoutConfig::default());
        assert_eq!(visuals.mini_alpha, 1.0);
        assert_eq!(visuals.full_content_alpha, 0.0);
        assert_dp(visuals.full_content_translation_y, 24.0);
        assert_eq!(visuals.scale_y, 1.0);
        assert!(visuals.smooth_corners);
    }
}
