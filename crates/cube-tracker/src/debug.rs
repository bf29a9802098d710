//! Debug visualisation of the last processed frame.
//!
//! The composite is a grid with one row per camera and five columns: raw
//! image, segmentation, boundary points, detected lines and the reprojected
//! cube.

use crate::detector::{CameraFrame, FrameArtifacts};
use crate::render::paint_cube;
use cube_tracker_core::{CameraParameters, ColorPair, CubeModel, RgbImage, N_CAMERAS};
use nalgebra::Point2;

pub(crate) const DEBUG_COLUMNS: usize = 5;

const WIREFRAME_RGB: [u8; 3] = [255, 100, 0];

/// Compose the debug grid for `frame`.
pub(crate) fn compose(
    frame: &FrameArtifacts,
    model: &CubeModel,
    cameras: &[CameraParameters; N_CAMERAS],
    fill_faces: bool,
) -> RgbImage {
    let tile_w = frame.cameras.iter().map(|c| c.image.width).max().unwrap_or(0);
    let tile_h = frame.cameras.iter().map(|c| c.image.height).max().unwrap_or(0);
    let mut out = RgbImage::new(tile_w * DEBUG_COLUMNS, tile_h * N_CAMERAS);

    for (row, cam) in frame.cameras.iter().enumerate() {
        let mut overlay = cam.image.clone();
        if fill_faces {
            if let Some(pose) = &frame.pose {
                paint_cube(&mut overlay, &cameras[row], model, pose);
            }
        } else if let Some(projected) = &frame.projected {
            let vertices = &projected[row];
            for (_, &[a, b]) in model.edges().iter() {
                if let (Some(pa), Some(pb)) = (vertices[a], vertices[b]) {
                    draw_segment(&mut overlay, pa, pb, WIREFRAME_RGB);
                }
            }
        }

        let tiles = [
            cam.image.clone(),
            cam.labels.colorize(),
            boundary_tile(cam),
            lines_tile(cam),
            overlay,
        ];
        for (col, tile) in tiles.iter().enumerate() {
            out.blit(tile, col * tile_w, row * tile_h);
        }
    }
    out
}

fn boundary_tile(cam: &CameraFrame) -> RgbImage {
    let mut tile = RgbImage::new(cam.image.width, cam.image.height);
    for (pair, points) in cam.detection.boundary_points.iter() {
        let rgb = pair_rgb(pair);
        for p in points {
            tile.put_pixel_checked(p.x.round() as i64, p.y.round() as i64, rgb);
        }
    }
    tile
}

fn lines_tile(cam: &CameraFrame) -> RgbImage {
    let mut tile = cam.image.clone();
    for (pair, line) in cam.detection.lines.iter() {
        let [a, b] = line.endpoints;
        draw_segment(&mut tile, a, b, pair_rgb(pair));
        // Mark the line point so overlapping lines stay distinguishable.
        let (cx, cy) = (line.point.x.round() as i64, line.point.y.round() as i64);
        for d in -2..=2 {
            tile.put_pixel_checked(cx + d, cy, [255, 255, 255]);
            tile.put_pixel_checked(cx, cy + d, [255, 255, 255]);
        }
    }
    tile
}

/// Average of the two face colours, brightened.
fn pair_rgb(pair: ColorPair) -> [u8; 3] {
    let a = pair.first().rgb();
    let b = pair.second().rgb();
    std::array::from_fn(|i| ((a[i] as u16 + b[i] as u16) / 2 + 40).min(255) as u8)
}

/// Draw a 1px segment, clipped to the image.
pub(crate) fn draw_segment(img: &mut RgbImage, a: Point2<f64>, b: Point2<f64>, rgb: [u8; 3]) {
    let Some((a, b)) = clip_segment(a, b, img.width as f64, img.height as f64) else {
        return;
    };
    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        img.put_pixel_checked(x0, y0, rgb);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Liang-Barsky clipping against `[-1, w] x [-1, h]`.
fn clip_segment(
    a: Point2<f64>,
    b: Point2<f64>,
    w: f64,
    h: f64,
) -> Option<(Point2<f64>, Point2<f64>)> {
    if ![a.x, a.y, b.x, b.y].iter().all(|v| v.is_finite()) {
        return None;
    }
    let d = b - a;
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-d.x, a.x + 1.0),
        (d.x, w - a.x),
        (-d.y, a.y + 1.0),
        (d.y, h - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}
