//! JSON configuration and report helpers for the tracker CLI.

use crate::detector::{CubeDetectError, CubeDetector, CubeDetectorParams};
use cube_tracker_core::{
    CameraParameters, ColorPairMap, CubeModel, CubeModelError, FaceLayout, Line, N_CAMERAS,
};
use cube_tracker_lines::LineDetectorParams;
use cube_tracker_pose::{PoseDetectorParams, PoseEstimate};
use cube_tracker_segmentation::ColorSegmenterParams;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum CubeTrackerIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

#[derive(thiserror::Error, Debug)]
pub enum CubeTrackerConfigError {
    #[error(transparent)]
    Model(#[from] CubeModelError),
    #[error(transparent)]
    Detector(#[from] CubeDetectError),
}

/// Inputs of one tracker run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeTrackerConfig {
    /// One image per camera, in camera order.
    pub image_paths: [String; N_CAMERAS],
    pub cameras: [CameraParameters; N_CAMERAS],
    #[serde(default)]
    pub cube_width: Option<f64>,
    #[serde(default)]
    pub face_layout: Option<FaceLayout>,
    #[serde(default)]
    pub segmenter: Option<ColorSegmenterParams>,
    #[serde(default)]
    pub lines: Option<LineDetectorParams>,
    #[serde(default)]
    pub pose: Option<PoseDetectorParams>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub debug_image_path: Option<String>,
}

impl CubeTrackerConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CubeTrackerIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CubeTrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Report path, defaulting to `cube_tracker_report.json`.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cube_tracker_report.json"))
    }

    pub fn build_model(&self) -> Result<CubeModel, CubeModelError> {
        let defaults = CubeModel::default();
        CubeModel::new(
            self.cube_width.unwrap_or(defaults.width()),
            self.face_layout.unwrap_or(defaults.layout()),
        )
    }

    /// Stage parameters with the overrides of this config applied.
    pub fn build_params(&self) -> CubeDetectorParams {
        let mut params = CubeDetectorParams::default();
        if let Some(segmenter) = self.segmenter.clone() {
            params.segmenter = segmenter;
        }
        if let Some(lines) = self.lines.clone() {
            params.lines = lines;
        }
        if let Some(pose) = self.pose.clone() {
            params.pose = pose;
        }
        params
    }

    pub fn build_detector(&self) -> Result<CubeDetector, CubeTrackerConfigError> {
        let model = self.build_model()?;
        Ok(CubeDetector::with_params(
            self.cameras.clone(),
            model,
            self.build_params(),
        )?)
    }
}

/// Result of one tracker run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CubeTrackerReport {
    pub image_paths: [String; N_CAMERAS],
    pub config_path: String,
    /// Detected lines per camera.
    #[serde(default)]
    pub lines: Vec<ColorPairMap<Line>>,
    #[serde(default)]
    pub estimate: Option<PoseEstimate>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CubeTrackerReport {
    pub fn new(cfg: &CubeTrackerConfig, config_path: &Path) -> Self {
        Self {
            image_paths: cfg.image_paths.clone(),
            config_path: config_path.to_string_lossy().into_owned(),
            lines: Vec::new(),
            estimate: None,
            error: None,
        }
    }

    pub fn set_lines(&mut self, lines: [ColorPairMap<Line>; N_CAMERAS]) {
        self.lines = lines.into();
    }

    /// Record the outcome of a detection.
    pub fn set_result(&mut self, result: Result<PoseEstimate, CubeDetectError>) {
        match result {
            Ok(estimate) => {
                self.estimate = Some(estimate);
                self.error = None;
            }
            Err(err) => {
                self.estimate = None;
                self.error = Some(err.to_string());
            }
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CubeTrackerIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CubeTrackerIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
