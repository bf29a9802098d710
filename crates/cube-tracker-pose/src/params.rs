use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Configuration for [`crate::PoseDetector`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseDetectorParams {
    /// Iteration budget of the final refinement.
    pub max_iters: usize,
    /// Iteration budget of each multi-start seed.
    pub coarse_max_iters: usize,
    pub initial_lambda: f64,
    /// Stop when the relative cost decrease of an accepted step drops below this.
    pub ftol: f64,
    /// Stop when the step norm drops below this.
    pub xtol: f64,
    /// Finite-difference step for the numeric Jacobian.
    pub jacobian_eps: f64,
    /// Minimal number of distinct cube edges observed over all cameras.
    pub min_distinct_edges: usize,
    /// Minimal `λ_min / λ_max` of the normal matrix at the solution.
    pub min_condition_ratio: f64,
    /// Position of every multi-start seed (world frame, metres).
    pub seed_position: Vector3<f64>,
    /// Extra rotations about world z applied to the 24 axis-aligned seeds.
    pub seed_yaw_offsets_deg: Vec<f64>,
    /// Support (inlier count) at which an observation gets full weight.
    pub weight_support_ref: f64,
    /// RMS residual (px) at which confidence has decayed to `1/e`.
    pub confidence_scale_px: f64,
}

impl Default for PoseDetectorParams {
    fn default() -> Self {
        Self {
            max_iters: 100,
            coarse_max_iters: 15,
            initial_lambda: 1e-3,
            ftol: 1e-10,
            xtol: 1e-10,
            jacobian_eps: 1e-6,
            min_distinct_edges: 2,
            min_condition_ratio: 1e-7,
            seed_position: Vector3::new(0.0, 0.0, 0.0325),
            seed_yaw_offsets_deg: vec![0.0, 45.0],
            weight_support_ref: 50.0,
            confidence_scale_px: 2.0,
        }
    }
}
