use crate::hsv::HsvRange;
use cube_tracker_core::{FaceColor, N_FACE_COLORS};
use serde::{Deserialize, Serialize};

/// How to label a pixel that falls inside more than one colour range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Take the first matching colour in `ColorSegmenterParams::priority`.
    #[default]
    Priority,
    /// Label ambiguous pixels as background.
    Background,
}

/// Configuration for [`crate::ColorSegmenter`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSegmenterParams {
    /// HSV acceptance range per colour, indexed by `FaceColor::index()`.
    pub ranges: [HsvRange; N_FACE_COLORS],
    pub ambiguity: AmbiguityPolicy,
    /// Tie-break order for [`AmbiguityPolicy::Priority`].
    pub priority: [FaceColor; N_FACE_COLORS],
    /// Relabel pixels to a colour held by at least 5 of their 8 neighbours.
    pub majority_filter: bool,
    /// Colours with fewer pixels than this are erased to background.
    pub min_color_pixels: usize,
}

impl Default for ColorSegmenterParams {
    fn default() -> Self {
        Self {
            ranges: [
                HsvRange::new(340.0, 20.0, 0.35, 0.15),  // red
                HsvRange::new(85.0, 150.0, 0.35, 0.15),  // green
                HsvRange::new(205.0, 260.0, 0.35, 0.15), // blue
                HsvRange::new(165.0, 200.0, 0.35, 0.15), // cyan
                HsvRange::new(280.0, 325.0, 0.35, 0.15), // magenta
                HsvRange::new(40.0, 75.0, 0.35, 0.15),   // yellow
            ],
            ambiguity: AmbiguityPolicy::Priority,
            priority: FaceColor::ALL,
            majority_filter: false,
            min_color_pixels: 20,
        }
    }
}

impl ColorSegmenterParams {
    #[inline]
    pub fn range(&self, color: FaceColor) -> &HsvRange {
        &self.ranges[color.index()]
    }
}
