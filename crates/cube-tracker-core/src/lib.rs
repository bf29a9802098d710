//! Core types for tracking a multi-coloured cube with calibrated cameras.
//!
//! This crate is purely geometric: colours and colour pairs, the static cube
//! model, camera calibration and projection, poses, fitted lines, and small
//! owned/borrowed image buffers. It does not depend on any image library.

mod camera;
mod color;
mod cube_model;
mod image;
mod line;
mod logger;
mod pose;

pub use camera::{
    world_to_camera_look_at, CameraError, CameraIntrinsics, CameraParameters, Distortion,
    MIN_PROJECTION_DEPTH,
};
pub use color::{
    ColorPair, ColorPairMap, FaceColor, BACKGROUND_LABEL, N_COLOR_PAIRS, N_FACE_COLORS,
};
pub use cube_model::{CubeFace, CubeModel, CubeModelError, FaceLayout, DEFAULT_CUBE_WIDTH};
pub use image::{LabelImage, RgbImage, RgbImageView};
pub use line::Line;
pub use pose::Pose;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};

/// Number of cameras in the tracking rig.
pub const N_CAMERAS: usize = 3;
