//! Robust 2D line fitting: two-point RANSAC followed by total least squares.

use crate::params::LineFitParams;
use cube_tracker_core::Line;
use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of [`fit_line_ransac`].
#[derive(Clone, Debug)]
pub struct LineFit {
    pub line: Line,
    /// Indices of the inliers into the input slice.
    pub inliers: Vec<usize>,
}

/// Total-least-squares line through `points` (principal axis of their scatter).
///
/// Returns `(centroid, unit direction)`; `None` for fewer than two points or a
/// degenerate (single-location) set.
pub fn fit_line_tls(points: &[Point2<f64>]) -> Option<(Point2<f64>, Vector2<f64>)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let centroid = points.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / n;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let d = p.coords - centroid;
        sxx += d.x * d.x;
        sxy += d.x * d.y;
        syy += d.y * d.y;
    }
    if sxx + syy <= 1e-12 {
        return None;
    }
    let theta = 0.5 * (2.0 * sxy).atan2(sxx - syy);
    let dir = canonical_direction(Vector2::new(theta.cos(), theta.sin()));
    Some((Point2::from(centroid), dir))
}

/// Fit a line robustly; `None` when no hypothesis gathers two inliers.
///
/// The RNG is seeded from `seed`, so the result is a pure function of the
/// input points and parameters.
pub fn fit_line_ransac(
    points: &[Point2<f64>],
    params: &LineFitParams,
    seed: u64,
) -> Option<LineFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let thr = params.inlier_threshold_px.max(1e-6);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut best: Option<(Point2<f64>, Vector2<f64>)> = None;
    let mut best_count = 0usize;
    for _ in 0..params.ransac_iters.max(1) {
        let i = rng.gen_range(0..n);
        let j = rng.gen_range(0..n);
        if i == j {
            continue;
        }
        let Some(dir) = (points[j] - points[i]).try_normalize(1e-9) else {
            continue;
        };
        let normal = Vector2::new(-dir.y, dir.x);
        let count = points
            .iter()
            .filter(|p| normal.dot(&(*p - points[i])).abs() <= thr)
            .count();
        if count > best_count {
            best_count = count;
            best = Some((points[i], dir));
            if best_count * 20 >= n * 19 {
                break;
            }
        }
    }

    let (mut origin, mut dir) = best?;
    let mut inliers = select_inliers(points, origin, dir, thr);
    for _ in 0..params.refine_iters {
        let subset: Vec<Point2<f64>> = inliers.iter().map(|&i| points[i]).collect();
        let Some((o, d)) = fit_line_tls(&subset) else {
            break;
        };
        let next = select_inliers(points, o, d, thr);
        if next.len() < 2 {
            break;
        }
        let stable = next == inliers;
        origin = o;
        dir = d;
        inliers = next;
        if stable {
            break;
        }
    }
    if inliers.len() < 2 {
        return None;
    }

    let subset: Vec<Point2<f64>> = inliers.iter().map(|&i| points[i]).collect();
    let (point, direction) = fit_line_tls(&subset).unwrap_or((origin, dir));
    let normal = Vector2::new(-direction.y, direction.x);

    let mut t_min = f64::INFINITY;
    let mut t_max = f64::NEG_INFINITY;
    let mut sq = 0.0;
    for p in &subset {
        let d = p - point;
        let t = direction.dot(&d);
        t_min = t_min.min(t);
        t_max = t_max.max(t);
        sq += normal.dot(&d).powi(2);
    }

    Some(LineFit {
        line: Line {
            point,
            direction,
            endpoints: [point + direction * t_min, point + direction * t_max],
            support: inliers.len(),
            rms_px: (sq / subset.len() as f64).sqrt(),
        },
        inliers,
    })
}

fn select_inliers(
    points: &[Point2<f64>],
    origin: Point2<f64>,
    dir: Vector2<f64>,
    thr: f64,
) -> Vec<usize> {
    let normal = Vector2::new(-dir.y, dir.x);
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| normal.dot(&(*p - origin)).abs() <= thr)
        .map(|(i, _)| i)
        .collect()
}

/// Flip `dir` so that it points into the `x > 0` half-plane (or `+y` when vertical).
fn canonical_direction(dir: Vector2<f64>) -> Vector2<f64> {
    if dir.x < 0.0 || (dir.x == 0.0 && dir.y < 0.0) {
        -dir
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points_on_line(n: usize, origin: Point2<f64>, dir: Vector2<f64>) -> Vec<Point2<f64>> {
        (0..n).map(|i| origin + dir * i as f64).collect()
    }

    #[test]
    fn tls_recovers_exact_line() {
        let dir = Vector2::new(3.0, 4.0).normalize();
        let pts = points_on_line(20, Point2::new(10.0, 5.0), dir);
        let (c, d) = fit_line_tls(&pts).unwrap();
        assert_relative_eq!(d, dir, epsilon = 1e-9);
        assert_relative_eq!(c, Point2::new(10.0, 5.0) + dir * 9.5, epsilon = 1e-9);
    }

    #[test]
    fn tls_rejects_degenerate_sets() {
        assert!(fit_line_tls(&[Point2::new(1.0, 1.0)]).is_none());
        assert!(fit_line_tls(&[Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)]).is_none());
    }

    #[test]
    fn ransac_ignores_outliers() {
        let dir = Vector2::new(1.0, -0.5).normalize();
        let mut pts = points_on_line(60, Point2::new(0.0, 50.0), dir);
        // Small alternating jitter, plus a blob of gross outliers.
        for (i, p) in pts.iter_mut().enumerate() {
            p.y += if i % 2 == 0 { 0.3 } else { -0.3 };
        }
        for k in 0..15 {
            pts.push(Point2::new(20.0 + k as f64, 80.0 + (k % 4) as f64));
        }

        let fit = fit_line_ransac(&pts, &LineFitParams::default(), 7).unwrap();
        assert_eq!(fit.line.support, 60);
        assert!(fit.inliers.iter().all(|&i| i < 60));
        assert!(fit.line.angle_to(&Line {
            direction: dir,
            ..fit.line
        }) < 1e-3);
        assert!(fit.line.distance(&Point2::new(0.0, 50.0)) < 0.05);
        assert!(fit.line.rms_px < 0.35);
        assert!(fit.line.length() > 55.0);
    }

    #[test]
    fn ransac_is_deterministic_for_a_seed() {
        let dir = Vector2::new(0.2, 1.0).normalize();
        let mut pts = points_on_line(40, Point2::new(5.0, 0.0), dir);
        pts.push(Point2::new(40.0, 3.0));
        let params = LineFitParams::default();
        let a = fit_line_ransac(&pts, &params, 42).unwrap();
        let b = fit_line_ransac(&pts, &params, 42).unwrap();
        assert_eq!(a.line, b.line);
        assert_eq!(a.inliers, b.inliers);
    }
}
