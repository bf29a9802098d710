//! Edge line extraction from a colour label image.
//!
//! For every colour pair that shares an edge on the cube, boundary points
//! between the two regions are collected and a single robust line is fitted.
//! Boundaries with too little support are simply absent from the result.

mod boundary;
mod detector;
mod fit;
mod params;

pub use boundary::extract_boundary_points;
pub use detector::{LineDetection, LineDetector};
pub use fit::{fit_line_ransac, fit_line_tls, LineFit};
pub use params::{LineDetectorParams, LineFitParams};
