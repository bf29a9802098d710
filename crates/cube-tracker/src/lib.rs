//! Tri-camera 6-DoF pose tracking of a multi-coloured cube.
//!
//! Each face of the cube has its own colour, so every edge is identified by
//! the pair of colours meeting there. For each of three calibrated cameras
//! the pipeline
//! 1. segments the image into face colours,
//! 2. fits one line per visible colour-pair boundary,
//!
//! and then fuses all lines into one cube pose in the world frame.
//!
//! ## Quickstart
//!
//! ```no_run
//! use cube_tracker::{detect, CubeDetector, CubeTrackerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CubeTrackerConfig::load_json("tracker.json")?;
//! let detector = CubeDetector::new(cfg.cameras.clone())?;
//! let images = [
//!     detect::load_rgb(&cfg.image_paths[0])?,
//!     detect::load_rgb(&cfg.image_paths[1])?,
//!     detect::load_rgb(&cfg.image_paths[2])?,
//! ];
//! let views = [
//!     detect::rgb_view(&images[0]),
//!     detect::rgb_view(&images[1]),
//!     detect::rgb_view(&images[2]),
//! ];
//! let estimate = detector.detect_cube(&views)?;
//! println!("position {:?}", estimate.pose.position);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `cube_tracker::core`: colours, cube model, cameras, poses, image buffers.
//! - `cube_tracker::segmentation`: HSV colour segmentation.
//! - `cube_tracker::lines`: boundary extraction and robust line fitting.
//! - `cube_tracker::pose`: multi-view pose optimisation.
//! - `cube_tracker::detect` (feature `image`): `image` crate conversions.

pub use cube_tracker_core as core;
pub use cube_tracker_lines as lines;
pub use cube_tracker_pose as pose;
pub use cube_tracker_segmentation as segmentation;

mod debug;
mod detector;
mod io;
mod render;

pub use cube_tracker_core::{CameraParameters, CubeModel, FaceColor, Pose, RgbImage, RgbImageView};
pub use cube_tracker_pose::{PoseDetectError, PoseEstimate};
pub use detector::{CameraFrame, CubeDetectError, CubeDetector, CubeDetectorParams, FrameArtifacts};
pub use io::{CubeTrackerConfig, CubeTrackerConfigError, CubeTrackerIoError, CubeTrackerReport};
pub use render::{paint_cube, render_cube};

#[cfg(feature = "image")]
pub mod detect;
