//! Multi-view pose estimation of the coloured cube.
//!
//! Every detected line is matched to the cube edge between its two face
//! colours. The pose minimises the pixel distances between the projected edge
//! endpoints and the observed lines over all cameras, using
//! Levenberg-Marquardt with multiple axis-aligned starting orientations.
//!
//! Too few or geometrically degenerate observations produce
//! [`PoseDetectError::Underconstrained`] rather than a pose.

mod detector;
mod params;
mod result;
mod seeds;
mod solver;

pub use detector::{PoseDetector, ProjectedCube};
pub use params::PoseDetectorParams;
pub use result::{PoseDetectError, PoseEstimate};
pub use seeds::{axis_aligned_rotations, seed_orientations};
