//! Ray-cast rendering of the coloured cube into a calibrated camera.
//!
//! Each pixel centre is back-projected through the camera (distortion
//! included), intersected with the cube and painted with the nominal colour
//! of the face it hits. Used for synthetic test data and for the filled-face
//! debug overlay.

use cube_tracker_core::{CameraParameters, CubeModel, FaceColor, Pose, RgbImage};
use nalgebra::{Point2, Point3, Vector3};

/// Render the cube at `pose` over a uniform `background`.
pub fn render_cube(
    camera: &CameraParameters,
    model: &CubeModel,
    pose: &Pose,
    background: [u8; 3],
) -> RgbImage {
    let mut img = RgbImage::filled(
        camera.image_width as usize,
        camera.image_height as usize,
        background,
    );
    paint_cube(&mut img, camera, model, pose);
    img
}

/// Paint the visible cube faces over `img`; returns the number of painted pixels.
pub fn paint_cube(
    img: &mut RgbImage,
    camera: &CameraParameters,
    model: &CubeModel,
    pose: &Pose,
) -> usize {
    let half = 0.5 * model.width();
    let cube_from_camera = pose.to_isometry().inverse() * camera.world_to_camera.inverse();
    let origin = cube_from_camera * Point3::origin();
    let face_colors = axis_face_colors(model);

    let (x0, x1, y0, y1) = pixel_bounds(img, camera, model, pose);
    let mut painted = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            let Some([xn, yn]) = camera.undistort_pixel(Point2::new(x as f64, y as f64)) else {
                continue;
            };
            let dir = cube_from_camera.rotation * Vector3::new(xn, yn, 1.0);
            if let Some((axis, positive)) = entry_face(&origin.coords, &dir, half) {
                img.put_pixel(x, y, face_colors[axis][positive as usize].rgb());
                painted += 1;
            }
        }
    }
    painted
}

/// `[axis][0 = negative side, 1 = positive side]` face colours.
fn axis_face_colors(model: &CubeModel) -> [[FaceColor; 2]; 3] {
    let layout = model.layout();
    [
        [layout.neg_x, layout.pos_x],
        [layout.neg_y, layout.pos_y],
        [layout.neg_z, layout.pos_z],
    ]
}

/// Pixel range that can contain the cube, from its projected vertices.
///
/// Falls back to the whole image when a vertex does not project.
fn pixel_bounds(
    img: &RgbImage,
    camera: &CameraParameters,
    model: &CubeModel,
    pose: &Pose,
) -> (usize, usize, usize, usize) {
    const MARGIN: f64 = 3.0;
    let full = (0, img.width, 0, img.height);
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for v in model.vertices() {
        let Some(p) = camera.project_world_point(&pose.transform_point(v)) else {
            return full;
        };
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let clamp = |v: f64, hi: usize| v.clamp(0.0, hi as f64) as usize;
    (
        clamp((min_x - MARGIN).floor(), img.width),
        clamp((max_x + MARGIN).ceil() + 1.0, img.width),
        clamp((min_y - MARGIN).floor(), img.height),
        clamp((max_y + MARGIN).ceil() + 1.0, img.height),
    )
}

/// Face through which the ray `origin + t * dir` (t > 0) enters the box
/// `[-half, half]^3`, as `(axis, positive side)`.
fn entry_face(origin: &Vector3<f64>, dir: &Vector3<f64>, half: f64) -> Option<(usize, bool)> {
    let mut t_near = f64::NEG_INFINITY;
    let mut t_far = f64::INFINITY;
    let mut face = None;
    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d.abs() < 1e-15 {
            if o.abs() > half {
                return None;
            }
            continue;
        }
        let t1 = (-half - o) / d;
        let t2 = (half - o) / d;
        let (lo, hi) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if lo > t_near {
            t_near = lo;
            face = Some((axis, d < 0.0));
        }
        t_far = t_far.min(hi);
    }
    if t_near > t_far || t_near <= 0.0 {
        return None;
    }
    face
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_tracker_core::{world_to_camera_look_at, CameraIntrinsics, Distortion};
    use nalgebra::UnitQuaternion;

    fn top_down_camera() -> CameraParameters {
        CameraParameters {
            image_width: 200,
            image_height: 200,
            intrinsics: CameraIntrinsics {
                fx: 400.0,
                fy: 400.0,
                cx: 100.0,
                cy: 100.0,
            },
            distortion: Distortion::default(),
            world_to_camera: world_to_camera_look_at(
                &Point3::new(0.0, 0.0, 0.5),
                &Point3::origin(),
                &Vector3::y(),
            )
            .unwrap(),
        }
    }

    #[test]
    fn entry_face_picks_the_facing_side() {
        let o = Vector3::new(0.0, 0.0, 1.0);
        let d = Vector3::new(0.0, 0.0, -1.0);
        assert_eq!(entry_face(&o, &d, 0.5), Some((2, true)));
        let o = Vector3::new(-2.0, 0.1, 0.0);
        let d = Vector3::new(1.0, 0.0, 0.0);
        assert_eq!(entry_face(&o, &d, 0.5), Some((0, false)));
        assert_eq!(entry_face(&o, &(-d), 0.5), None);
    }

    #[test]
    fn top_view_shows_only_the_top_face() {
        let camera = top_down_camera();
        let model = CubeModel::default();
        let pose = Pose::new(Vector3::zeros(), UnitQuaternion::identity());
        let img = render_cube(&camera, &model, &pose, [0, 0, 0]);

        assert_eq!(img.pixel(100, 100), FaceColor::Blue.rgb());
        assert_eq!(img.pixel(2, 2), [0, 0, 0]);
        // Top face at depth 0.4675 spans 400 * 0.065 / 0.4675 ≈ 55.6 px.
        let row: Vec<_> = (0..200).filter(|&x| img.pixel(x, 100) != [0, 0, 0]).collect();
        let width = row.len() as f64;
        assert!((width - 55.6).abs() < 2.0, "width {width}");
        assert!(row.iter().all(|&x| img.pixel(x, 100) == FaceColor::Blue.rgb()));
    }
}
