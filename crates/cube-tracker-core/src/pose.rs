use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Rigid pose of the cube frame in the world frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Cube centre in world coordinates (metres).
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }

    /// Cube-to-world transform.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// Map a point from the cube frame into the world frame.
    #[inline]
    pub fn transform_point(&self, p_cube: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.orientation * p_cube.coords + self.position)
    }

    /// Orientation as `[x, y, z, w]`.
    pub fn quaternion_xyzw(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        [q.i, q.j, q.k, q.w]
    }

    /// Euclidean distance between positions.
    pub fn translation_distance(&self, other: &Pose) -> f64 {
        (self.position - other.position).norm()
    }

    /// Angle of the relative rotation, in radians.
    pub fn rotation_distance(&self, other: &Pose) -> f64 {
        self.orientation.angle_to(&other.orientation)
    }
}
