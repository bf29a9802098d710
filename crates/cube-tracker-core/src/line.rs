use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A fitted 2D line observation in one camera's pixel frame.
///
/// An edge that was not observed has no `Line` at all; instances always
/// describe a sufficiently supported boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// A point on the line (centroid of the inliers).
    pub point: Point2<f64>,
    /// Unit direction.
    pub direction: Vector2<f64>,
    /// Extreme inlier projections onto the line.
    pub endpoints: [Point2<f64>; 2],
    /// Number of boundary pixels supporting the fit.
    pub support: usize,
    /// RMS perpendicular distance of the inliers, in pixels.
    pub rms_px: f64,
}

impl Line {
    /// Unit normal (direction rotated by +90 degrees).
    #[inline]
    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(-self.direction.y, self.direction.x)
    }

    /// Signed perpendicular distance from `p` to the infinite line.
    #[inline]
    pub fn signed_distance(&self, p: &Point2<f64>) -> f64 {
        self.normal().dot(&(p - self.point))
    }

    #[inline]
    pub fn distance(&self, p: &Point2<f64>) -> f64 {
        self.signed_distance(p).abs()
    }

    pub fn length(&self) -> f64 {
        (self.endpoints[1] - self.endpoints[0]).norm()
    }

    /// Acute angle between two lines, in radians (`0..=pi/2`).
    pub fn angle_to(&self, other: &Line) -> f64 {
        let c = self.direction.dot(&other.direction).abs().min(1.0);
        c.acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn horizontal() -> Line {
        Line {
            point: Point2::new(5.0, 2.0),
            direction: Vector2::new(1.0, 0.0),
            endpoints: [Point2::new(0.0, 2.0), Point2::new(10.0, 2.0)],
            support: 10,
            rms_px: 0.0,
        }
    }

    #[test]
    fn signed_distance_uses_left_normal() {
        let l = horizontal();
        assert_relative_eq!(l.signed_distance(&Point2::new(3.0, 5.0)), 3.0);
        assert_relative_eq!(l.signed_distance(&Point2::new(3.0, -1.0)), -3.0);
        assert_relative_eq!(l.length(), 10.0);
    }

    #[test]
    fn angle_ignores_direction_sign() {
        let a = horizontal();
        let mut b = horizontal();
        b.direction = Vector2::new(-1.0, 0.0);
        assert_relative_eq!(a.angle_to(&b), 0.0);
        b.direction = Vector2::new(0.0, 1.0);
        assert_relative_eq!(a.angle_to(&b), std::f64::consts::FRAC_PI_2);
    }
}
