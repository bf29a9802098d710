use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::debug;
use cube_tracker_core::{
    CameraError, CameraParameters, ColorPairMap, CubeModel, LabelImage, Line, Pose, RgbImage,
    RgbImageView, N_CAMERAS,
};
use cube_tracker_lines::{LineDetection, LineDetector, LineDetectorParams};
use cube_tracker_pose::{
    PoseDetectError, PoseDetector, PoseDetectorParams, PoseEstimate, ProjectedCube,
};
use cube_tracker_segmentation::{ColorSegmenter, ColorSegmenterParams, SegmentationError};
use log::{debug, info};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by [`CubeDetector`].
#[derive(thiserror::Error, Debug)]
pub enum CubeDetectError {
    #[error("camera {camera}: expected a {}x{} image, got {}x{}", .expected.0, .expected.1, .got.0, .got.1)]
    ImageShape {
        camera: usize,
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("camera {camera}: {width}x{height} RGB image needs {expected_len} bytes, got {len}")]
    MalformedImage {
        camera: usize,
        width: usize,
        height: usize,
        expected_len: usize,
        len: usize,
    },
    #[error("camera {camera}: invalid calibration")]
    InvalidCamera {
        camera: usize,
        #[source]
        source: CameraError,
    },
    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
    #[error(transparent)]
    Pose(#[from] PoseDetectError),
}

/// Parameters of all pipeline stages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeDetectorParams {
    pub segmenter: ColorSegmenterParams,
    pub lines: LineDetectorParams,
    pub pose: PoseDetectorParams,
}

/// Intermediate results of one camera for one frame.
#[derive(Clone, Debug)]
pub struct CameraFrame {
    pub image: RgbImage,
    pub labels: LabelImage,
    pub detection: LineDetection,
}

/// Everything kept from the last `detect_cube` call.
#[derive(Clone, Debug)]
pub struct FrameArtifacts {
    pub cameras: [CameraFrame; N_CAMERAS],
    /// Pose used for reprojection; also set for a non-converged estimate.
    pub pose: Option<Pose>,
    pub projected: Option<ProjectedCube>,
}

impl FrameArtifacts {
    pub fn lines(&self) -> [ColorPairMap<Line>; N_CAMERAS] {
        std::array::from_fn(|c| self.cameras[c].detection.lines.clone())
    }
}

/// Detects the cube pose in synchronised images of the three cameras.
///
/// Per-camera segmentation and line detection run in parallel; the
/// observations are then fused by [`PoseDetector`]. The intermediate results
/// of the last call are kept for [`CubeDetector::create_debug_image`].
#[derive(Debug)]
pub struct CubeDetector {
    model: Arc<CubeModel>,
    segmenter: ColorSegmenter,
    line_detector: LineDetector,
    pose_detector: PoseDetector,
    last_frame: Mutex<Option<Arc<FrameArtifacts>>>,
}

impl CubeDetector {
    /// Detector for the default cube with default parameters.
    pub fn new(cameras: [CameraParameters; N_CAMERAS]) -> Result<Self, CubeDetectError> {
        Self::with_params(cameras, CubeModel::default(), CubeDetectorParams::default())
    }

    pub fn with_params(
        cameras: [CameraParameters; N_CAMERAS],
        model: CubeModel,
        params: CubeDetectorParams,
    ) -> Result<Self, CubeDetectError> {
        for (camera, cam) in cameras.iter().enumerate() {
            cam.validate()
                .map_err(|source| CubeDetectError::InvalidCamera { camera, source })?;
        }
        let model = Arc::new(model);
        Ok(Self {
            segmenter: ColorSegmenter::new(params.segmenter),
            line_detector: LineDetector::new(model.clone(), params.lines),
            pose_detector: PoseDetector::new(model.clone(), cameras, params.pose),
            model,
            last_frame: Mutex::new(None),
        })
    }

    #[inline]
    pub fn model(&self) -> &CubeModel {
        &self.model
    }

    #[inline]
    pub fn cameras(&self) -> &[CameraParameters; N_CAMERAS] {
        self.pose_detector.cameras()
    }

    #[inline]
    pub fn segmenter(&self) -> &ColorSegmenter {
        &self.segmenter
    }

    #[inline]
    pub fn line_detector(&self) -> &LineDetector {
        &self.line_detector
    }

    #[inline]
    pub fn pose_detector(&self) -> &PoseDetector {
        &self.pose_detector
    }

    /// Detect the cube pose, processing the cameras in parallel.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, images)))]
    pub fn detect_cube(
        &self,
        images: &[RgbImageView<'_>; N_CAMERAS],
    ) -> Result<PoseEstimate, CubeDetectError> {
        self.check_shapes(images)?;
        let (a, (b, c)) = rayon::join(
            || self.process_camera(&images[0]),
            || {
                rayon::join(
                    || self.process_camera(&images[1]),
                    || self.process_camera(&images[2]),
                )
            },
        );
        self.fuse([a?, b?, c?])
    }

    /// Same as [`CubeDetector::detect_cube`] without spawning parallel work.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self, images)))]
    pub fn detect_cube_single_thread(
        &self,
        images: &[RgbImageView<'_>; N_CAMERAS],
    ) -> Result<PoseEstimate, CubeDetectError> {
        self.check_shapes(images)?;
        let frames = [
            self.process_camera(&images[0])?,
            self.process_camera(&images[1])?,
            self.process_camera(&images[2])?,
        ];
        self.fuse(frames)
    }

    /// Run only segmentation and line detection. Does not touch the debug snapshot.
    pub fn detect_lines(
        &self,
        images: &[RgbImageView<'_>; N_CAMERAS],
    ) -> Result<[LineDetection; N_CAMERAS], CubeDetectError> {
        self.check_shapes(images)?;
        let (a, (b, c)) = rayon::join(
            || self.process_camera(&images[0]),
            || {
                rayon::join(
                    || self.process_camera(&images[1]),
                    || self.process_camera(&images[2]),
                )
            },
        );
        Ok([a?.detection, b?.detection, c?.detection])
    }

    /// Intermediate results of the last detection, if any.
    pub fn last_frame(&self) -> Option<Arc<FrameArtifacts>> {
        self.lock_frame().clone()
    }

    /// Compose the debug grid of the last detection; `None` before the first one.
    ///
    /// With `fill_faces` the estimated cube is painted with its face colours,
    /// otherwise only its wire frame is drawn.
    pub fn create_debug_image(&self, fill_faces: bool) -> Option<RgbImage> {
        let frame = self.last_frame()?;
        Some(debug::compose(&frame, &self.model, self.cameras(), fill_faces))
    }

    fn check_shapes(&self, images: &[RgbImageView<'_>; N_CAMERAS]) -> Result<(), CubeDetectError> {
        for (camera, (img, cam)) in images.iter().zip(self.cameras()).enumerate() {
            let expected = (cam.image_width as usize, cam.image_height as usize);
            let got = (img.width, img.height);
            if expected != got {
                return Err(CubeDetectError::ImageShape {
                    camera,
                    expected,
                    got,
                });
            }
            if !img.is_well_formed() {
                return Err(CubeDetectError::MalformedImage {
                    camera,
                    width: img.width,
                    height: img.height,
                    expected_len: img.width.saturating_mul(img.height).saturating_mul(3),
                    len: img.data.len(),
                });
            }
        }
        Ok(())
    }

    fn process_camera(&self, image: &RgbImageView<'_>) -> Result<CameraFrame, SegmentationError> {
        let segmentation = self.segmenter.segment(image)?;
        let detection = self.line_detector.detect_lines(&segmentation.labels);
        Ok(CameraFrame {
            image: image.to_owned_image(),
            labels: segmentation.labels,
            detection,
        })
    }

    fn fuse(&self, frames: [CameraFrame; N_CAMERAS]) -> Result<PoseEstimate, CubeDetectError> {
        let lines: [ColorPairMap<Line>; N_CAMERAS] =
            std::array::from_fn(|c| frames[c].detection.lines.clone());
        debug!(
            "lines per camera: {:?}",
            lines.iter().map(ColorPairMap::len).collect::<Vec<_>>()
        );

        let result = self.pose_detector.find_pose(&lines);
        let pose = match &result {
            Ok(estimate) => Some(estimate.pose),
            Err(PoseDetectError::NotConverged { estimate }) => Some(estimate.pose),
            Err(_) => None,
        };
        let projected = pose.map(|p| self.pose_detector.project_cube(&p));
        *self.lock_frame() = Some(Arc::new(FrameArtifacts {
            cameras: frames,
            pose,
            projected,
        }));

        let estimate = result?;
        info!(
            "cube at [{:.4}, {:.4}, {:.4}] (rms {:.3}px, {} edges)",
            estimate.pose.position.x,
            estimate.pose.position.y,
            estimate.pose.position.z,
            estimate.rms_residual_px,
            estimate.num_edges
        );
        Ok(estimate)
    }

    fn lock_frame(&self) -> MutexGuard<'_, Option<Arc<FrameArtifacts>>> {
        self.last_frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
