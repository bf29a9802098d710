//! Boundary points between touching face regions.

use cube_tracker_core::{ColorPair, ColorPairMap, CubeModel, FaceColor, LabelImage};
use nalgebra::Point2;

/// Collect boundary points between differently coloured regions.
///
/// From every labelled pixel the label image is scanned to the right and
/// downward, skipping at most `max_gap_px` background pixels. When the next
/// labelled pixel carries another colour and the two colours share an edge in
/// `model`, the midpoint of the two pixel centres is recorded for that pair.
pub fn extract_boundary_points(
    labels: &LabelImage,
    model: &CubeModel,
    max_gap_px: usize,
) -> ColorPairMap<Vec<Point2<f64>>> {
    let mut out: ColorPairMap<Vec<Point2<f64>>> = ColorPairMap::new();
    let (w, h) = (labels.width, labels.height);

    for y in 0..h {
        for x in 0..w {
            let Some(a) = labels.color_at(x, y) else {
                continue;
            };
            for (dx, dy) in [(1usize, 0usize), (0, 1)] {
                let Some((qx, qy, b)) = next_labelled(labels, x, y, dx, dy, max_gap_px) else {
                    continue;
                };
                if b == a {
                    continue;
                }
                let Some(pair) = ColorPair::new(a, b) else {
                    continue;
                };
                if !model.has_edge(pair) {
                    continue;
                }
                let mid = Point2::new((x + qx) as f64 * 0.5, (y + qy) as f64 * 0.5);
                out.entry_or_default(pair).push(mid);
            }
        }
    }
    out
}

/// First labelled pixel after `(x, y)` along `(dx, dy)` within the gap budget.
fn next_labelled(
    labels: &LabelImage,
    x: usize,
    y: usize,
    dx: usize,
    dy: usize,
    max_gap_px: usize,
) -> Option<(usize, usize, FaceColor)> {
    for k in 1..=max_gap_px + 1 {
        let qx = x + k * dx;
        let qy = y + k * dy;
        if qx >= labels.width || qy >= labels.height {
            return None;
        }
        if let Some(c) = labels.color_at(qx, qy) {
            return Some((qx, qy, c));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_labels(gap: usize) -> LabelImage {
        // Red on the left, background gap, Blue on the right.
        let mut labels = LabelImage::background(10, 4);
        for y in 0..4 {
            for x in 0..10 {
                if x < 4 {
                    labels.set(x, y, FaceColor::Red.label());
                } else if x >= 4 + gap {
                    labels.set(x, y, FaceColor::Blue.label());
                }
            }
        }
        labels
    }

    #[test]
    fn touching_regions_yield_midpoints() {
        let model = CubeModel::default();
        let pts = extract_boundary_points(&split_labels(0), &model, 0);
        let pair = ColorPair::new(FaceColor::Red, FaceColor::Blue).unwrap();
        let boundary = pts.get(pair).unwrap();
        assert_eq!(boundary.len(), 4);
        assert!(boundary.iter().all(|p| p.x == 3.5));
        assert_eq!(pts.len(), 1);
    }

    #[test]
    fn gaps_are_bridged_up_to_budget() {
        let model = CubeModel::default();
        let pair = ColorPair::new(FaceColor::Red, FaceColor::Blue).unwrap();
        let bridged = extract_boundary_points(&split_labels(2), &model, 2);
        assert!(bridged.get(pair).unwrap().iter().all(|p| p.x == 4.5));
        let too_wide = extract_boundary_points(&split_labels(3), &model, 2);
        assert!(too_wide.is_empty());
    }

    #[test]
    fn pairs_without_a_model_edge_are_ignored() {
        let model = CubeModel::default();
        // Red and Cyan are opposite faces in the default layout.
        let mut labels = LabelImage::background(4, 1);
        labels.set(0, 0, FaceColor::Red.label());
        labels.set(1, 0, FaceColor::Cyan.label());
        assert!(extract_boundary_points(&labels, &model, 0).is_empty());
    }
}
