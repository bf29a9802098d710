//! Calibrated pinhole camera with Brown-Conrady distortion.
//!
//! Pixel coordinates follow the usual convention: the centre of pixel
//! `(col, row)` is at `(col, row)`, `x` to the right and `y` down. The camera
//! frame has `z` pointing forward.

use nalgebra::{Isometry3, Point2, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Points closer than this to the image plane are not projected.
pub const MIN_PROJECTION_DEPTH: f64 = 1e-6;

/// Pinhole camera intrinsics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Returns `true` when all values are finite and focal lengths non-zero.
    pub fn is_valid(self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    #[inline]
    pub fn normalized_to_pixel(self, xn: [f64; 2]) -> Point2<f64> {
        Point2::new(self.fx * xn[0] + self.cx, self.fy * xn[1] + self.cy)
    }

    #[inline]
    pub fn pixel_to_normalized(self, px: Point2<f64>) -> [f64; 2] {
        [(px.x - self.cx) / self.fx, (px.y - self.cy) / self.fy]
    }
}

/// Radial-tangential distortion, coefficients in OpenCV order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    /// Build from an OpenCV `[k1, k2, p1, p2, k3]` coefficient vector.
    pub fn from_opencv(c: [f64; 5]) -> Self {
        Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
            k3: c[4],
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    pub fn distort(&self, xn: [f64; 2]) -> [f64; 2] {
        let [x, y] = xn;
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        [x * radial + x_tan, y * radial + y_tan]
    }

    /// Fixed-point inversion of [`Distortion::distort`].
    pub fn undistort(&self, xd: [f64; 2]) -> Option<[f64; 2]> {
        if self.is_zero() {
            return Some(xd);
        }
        let mut x = xd;
        for _ in 0..20 {
            let [px, py] = x;
            let r2 = px * px + py * py;
            let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
            if !radial.is_finite() || radial.abs() < 1e-12 {
                return None;
            }
            let x_tan = 2.0 * self.p1 * px * py + self.p2 * (r2 + 2.0 * px * px);
            let y_tan = self.p1 * (r2 + 2.0 * py * py) + 2.0 * self.p2 * px * py;
            let next = [(xd[0] - x_tan) / radial, (xd[1] - y_tan) / radial];
            let delta = (next[0] - px).abs() + (next[1] - py).abs();
            x = next;
            if delta < 1e-12 {
                break;
            }
        }
        (x[0].is_finite() && x[1].is_finite()).then_some(x)
    }
}

/// Camera parameter validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("image size must be non-zero (width={width}, height={height})")]
    InvalidImageSize { width: u32, height: u32 },
    #[error("camera intrinsics must be finite with non-zero focal lengths")]
    InvalidIntrinsics,
    #[error("distortion coefficients must be finite")]
    InvalidDistortion,
}

/// Full calibration of one camera.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraParameters {
    pub image_width: u32,
    pub image_height: u32,
    pub intrinsics: CameraIntrinsics,
    #[serde(default)]
    pub distortion: Distortion,
    /// Rigid transform mapping world points into the camera frame.
    pub world_to_camera: Isometry3<f64>,
}

impl CameraParameters {
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(CameraError::InvalidImageSize {
                width: self.image_width,
                height: self.image_height,
            });
        }
        if !self.intrinsics.is_valid() {
            return Err(CameraError::InvalidIntrinsics);
        }
        let d = &self.distortion;
        if ![d.k1, d.k2, d.p1, d.p2, d.k3].iter().all(|v| v.is_finite()) {
            return Err(CameraError::InvalidDistortion);
        }
        Ok(())
    }

    /// Project a point given in the camera frame to (distorted) pixels.
    pub fn project_camera_point(&self, p_cam: &Point3<f64>) -> Option<Point2<f64>> {
        if !p_cam.z.is_finite() || p_cam.z <= MIN_PROJECTION_DEPTH {
            return None;
        }
        let xn = [p_cam.x / p_cam.z, p_cam.y / p_cam.z];
        let px = self.intrinsics.normalized_to_pixel(self.distortion.distort(xn));
        (px.x.is_finite() && px.y.is_finite()).then_some(px)
    }

    #[inline]
    pub fn project_world_point(&self, p_world: &Point3<f64>) -> Option<Point2<f64>> {
        self.project_camera_point(&(self.world_to_camera * p_world))
    }

    /// Undistorted normalized coordinates of a pixel.
    pub fn undistort_pixel(&self, px: Point2<f64>) -> Option<[f64; 2]> {
        self.distortion
            .undistort(self.intrinsics.pixel_to_normalized(px))
    }

    /// Camera centre expressed in the world frame.
    pub fn camera_center_world(&self) -> Point3<f64> {
        self.world_to_camera.inverse() * Point3::origin()
    }

    /// Viewing ray through a pixel centre, as `(origin, unit direction)` in
    /// the world frame.
    pub fn pixel_ray_world(&self, px: Point2<f64>) -> Option<(Point3<f64>, Vector3<f64>)> {
        let [x, y] = self.undistort_pixel(px)?;
        let camera_to_world = self.world_to_camera.inverse();
        let dir = camera_to_world.rotation * Vector3::new(x, y, 1.0).normalize();
        Some((camera_to_world * Point3::origin(), dir))
    }

    #[inline]
    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }
}

/// World->camera transform of a camera at `eye` looking at `target`.
///
/// `up` is the world direction that should appear upward in the image.
/// Returns `None` when `eye == target` or the view direction is parallel to
/// `up`.
pub fn world_to_camera_look_at(
    eye: &Point3<f64>,
    target: &Point3<f64>,
    up: &Vector3<f64>,
) -> Option<Isometry3<f64>> {
    let z = (target - eye).try_normalize(1e-12)?;
    let x = z.cross(up).try_normalize(1e-12)?;
    let y = z.cross(&x);
    let camera_axes = Rotation3::from_basis_unchecked(&[x, y, z]);
    let rotation = UnitQuaternion::from_rotation_matrix(&camera_axes.inverse());
    let translation = -(rotation * eye.coords);
    Some(Isometry3::from_parts(
        Translation3::from(translation),
        rotation,
    ))
}
