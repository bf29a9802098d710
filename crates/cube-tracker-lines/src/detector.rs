use std::sync::Arc;

use crate::boundary::extract_boundary_points;
use crate::fit::fit_line_ransac;
use crate::params::LineDetectorParams;
use cube_tracker_core::{ColorPairMap, CubeModel, LabelImage, Line};
use log::debug;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Per-camera output of [`LineDetector::detect_lines`].
#[derive(Clone, Debug, Default)]
pub struct LineDetection {
    /// One line per sufficiently supported colour-pair boundary.
    pub lines: ColorPairMap<Line>,
    /// Raw boundary points per colour pair (kept for visualisation).
    pub boundary_points: ColorPairMap<Vec<Point2<f64>>>,
}

/// Extracts one line per visible cube edge from a label image.
#[derive(Clone, Debug)]
pub struct LineDetector {
    model: Arc<CubeModel>,
    params: LineDetectorParams,
}

impl LineDetector {
    pub fn new(model: Arc<CubeModel>, params: LineDetectorParams) -> Self {
        Self { model, params }
    }

    #[inline]
    pub fn params(&self) -> &LineDetectorParams {
        &self.params
    }

    #[inline]
    pub fn model(&self) -> &CubeModel {
        &self.model
    }

    /// Detect edge lines in a segmented image.
    ///
    /// Pairs whose boundary is too weakly supported are left out of the
    /// result instead of producing a degenerate line.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, labels), fields(width = labels.width, height = labels.height))
    )]
    pub fn detect_lines(&self, labels: &LabelImage) -> LineDetection {
        let boundary_points = extract_boundary_points(labels, &self.model, self.params.max_gap_px);
        let mut lines = ColorPairMap::new();

        for (pair, points) in boundary_points.iter() {
            if points.len() < self.params.min_boundary_pixels {
                debug!(
                    "{pair}: {} boundary points < {}",
                    points.len(),
                    self.params.min_boundary_pixels
                );
                continue;
            }
            let seed = self.params.fit.seed ^ (pair.index() as u64).wrapping_mul(0x9e37_79b9);
            let Some(fit) = fit_line_ransac(points, &self.params.fit, seed) else {
                debug!("{pair}: line fit failed");
                continue;
            };
            let ratio = fit.line.support as f64 / points.len() as f64;
            if fit.line.support < self.params.min_inliers || ratio < self.params.min_inlier_ratio {
                debug!(
                    "{pair}: weak fit ({} inliers, ratio {ratio:.2})",
                    fit.line.support
                );
                continue;
            }
            if fit.line.length() < self.params.min_line_length_px {
                debug!("{pair}: line too short ({:.1}px)", fit.line.length());
                continue;
            }
            lines.insert(pair, fit.line);
        }

        debug!(
            "detected {} lines from {} boundary pairs",
            lines.len(),
            boundary_points.len()
        );
        LineDetection {
            lines,
            boundary_points,
        }
    }
}
