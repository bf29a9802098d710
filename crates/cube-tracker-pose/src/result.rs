use cube_tracker_core::Pose;
use serde::{Deserialize, Serialize};

/// Fused pose of the cube together with solve diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    pub pose: Pose,
    /// Heuristic quality score in `[0, 1]`.
    pub confidence: f64,
    /// RMS of the unweighted endpoint-to-line distances, in pixels.
    pub rms_residual_px: f64,
    /// LM iterations spent on the final refinement.
    pub iterations: usize,
    pub num_observations: usize,
    /// Distinct cube edges seen by at least one camera.
    pub num_edges: usize,
    pub converged: bool,
}

/// Reasons for not returning a pose.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseDetectError {
    #[error("pose is underconstrained ({observations} line observations of {edges} distinct edges)")]
    Underconstrained { observations: usize, edges: usize },
    #[error("optimisation did not converge (rms {:.3}px after {} iterations)", .estimate.rms_residual_px, .estimate.iterations)]
    NotConverged { estimate: Box<PoseEstimate> },
    #[error("cube edges could not be projected into the cameras from any initial pose")]
    ProjectionFailed,
}
