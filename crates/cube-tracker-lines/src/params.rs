use serde::{Deserialize, Serialize};

/// Robust line fitting settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFitParams {
    /// Number of two-point RANSAC hypotheses.
    pub ransac_iters: usize,
    /// Max perpendicular distance (px) for a point to count as inlier.
    pub inlier_threshold_px: f64,
    /// Total-least-squares refinement rounds on the inlier set.
    pub refine_iters: usize,
    /// Base RNG seed; each colour pair derives its own stream from it.
    pub seed: u64,
}

impl Default for LineFitParams {
    fn default() -> Self {
        Self {
            ransac_iters: 200,
            inlier_threshold_px: 1.5,
            refine_iters: 3,
            seed: 0x5eed_c0be,
        }
    }
}

/// Configuration for [`crate::LineDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDetectorParams {
    /// Background pixels allowed between two touching faces (dark edge
    /// bevels on a physical cube).
    pub max_gap_px: usize,
    /// Pairs with fewer boundary points are treated as unobserved.
    pub min_boundary_pixels: usize,
    /// Minimal number of inliers of the final fit.
    pub min_inliers: usize,
    /// Minimal inlier fraction of the final fit.
    pub min_inlier_ratio: f64,
    /// Minimal extent of the inliers along the line, in pixels.
    pub min_line_length_px: f64,
    pub fit: LineFitParams,
}

impl Default for LineDetectorParams {
    fn default() -> Self {
        Self {
            max_gap_px: 3,
            min_boundary_pixels: 15,
            min_inliers: 12,
            min_inlier_ratio: 0.5,
            min_line_length_px: 8.0,
            fit: LineFitParams::default(),
        }
    }
}
