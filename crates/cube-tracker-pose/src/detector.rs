use std::sync::Arc;

use crate::params::PoseDetectorParams;
use crate::result::{PoseDetectError, PoseEstimate};
use crate::seeds::seed_orientations;
use crate::solver::{solve, LmOutcome, LmSettings, Observation, PoseProblem};
use cube_tracker_core::{CameraParameters, ColorPairMap, CubeModel, Line, Pose, N_CAMERAS};
use log::{debug, warn};
use nalgebra::{Point2, Vector2};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Projected cube vertices, per camera; `None` where a vertex is behind the camera.
pub type ProjectedCube = [[Option<Point2<f64>>; 8]; N_CAMERAS];

/// Fuses edge lines of all cameras into one cube pose.
#[derive(Clone, Debug)]
pub struct PoseDetector {
    model: Arc<CubeModel>,
    cameras: [CameraParameters; N_CAMERAS],
    params: PoseDetectorParams,
}

impl PoseDetector {
    pub fn new(
        model: Arc<CubeModel>,
        cameras: [CameraParameters; N_CAMERAS],
        params: PoseDetectorParams,
    ) -> Self {
        Self {
            model,
            cameras,
            params,
        }
    }

    #[inline]
    pub fn params(&self) -> &PoseDetectorParams {
        &self.params
    }

    #[inline]
    pub fn cameras(&self) -> &[CameraParameters; N_CAMERAS] {
        &self.cameras
    }

    #[inline]
    pub fn model(&self) -> &CubeModel {
        &self.model
    }

    /// Estimate the pose by multi-start optimisation over axis-aligned seeds.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, lines)))]
    pub fn find_pose(
        &self,
        lines: &[ColorPairMap<Line>; N_CAMERAS],
    ) -> Result<PoseEstimate, PoseDetectError> {
        let observations = self.observations(lines);
        let edges = self.check_observability(&observations)?;
        let problem = PoseProblem {
            cameras: &self.cameras,
            observations: &observations,
        };

        let coarse = LmSettings {
            max_iters: self.params.coarse_max_iters,
            ..self.lm_settings()
        };
        let mut best: Option<LmOutcome> = None;
        for orientation in seed_orientations(&self.params.seed_yaw_offsets_deg) {
            let seed = Pose::new(self.params.seed_position, orientation);
            let Some(outcome) = solve(&problem, &seed, &coarse) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| outcome.cost < b.cost) {
                best = Some(outcome);
            }
        }
        let Some(best) = best else {
            warn!("no seed pose projects into all cameras");
            return Err(PoseDetectError::ProjectionFailed);
        };
        debug!("best seed cost {:.4e} after coarse solve", best.cost);

        self.refine(&problem, &best.pose, edges)
    }

    /// Estimate the pose starting from a caller-provided initial guess.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, lines, seed)))]
    pub fn find_pose_from_seed(
        &self,
        lines: &[ColorPairMap<Line>; N_CAMERAS],
        seed: &Pose,
    ) -> Result<PoseEstimate, PoseDetectError> {
        let observations = self.observations(lines);
        let edges = self.check_observability(&observations)?;
        let problem = PoseProblem {
            cameras: &self.cameras,
            observations: &observations,
        };
        self.refine(&problem, seed, edges)
    }

    /// Project the 8 cube vertices at `pose` into every camera.
    pub fn project_cube(&self, pose: &Pose) -> ProjectedCube {
        let vertices = self.model.vertices();
        std::array::from_fn(|c| {
            std::array::from_fn(|v| {
                self.cameras[c].project_world_point(&pose.transform_point(&vertices[v]))
            })
        })
    }

    fn lm_settings(&self) -> LmSettings {
        LmSettings {
            max_iters: self.params.max_iters,
            initial_lambda: self.params.initial_lambda,
            ftol: self.params.ftol,
            xtol: self.params.xtol,
            jacobian_eps: self.params.jacobian_eps,
        }
    }

    fn observations(&self, lines: &[ColorPairMap<Line>; N_CAMERAS]) -> Vec<Observation> {
        let support_ref = self.params.weight_support_ref.max(1.0);
        let mut out = Vec::new();
        for (camera, per_camera) in lines.iter().enumerate() {
            for (pair, line) in per_camera.iter() {
                let Some(endpoints) = self.model.edge_points(pair) else {
                    debug!("camera {camera}: {pair} is not a cube edge, ignored");
                    continue;
                };
                let Some(dir) = line.direction.try_normalize(1e-12) else {
                    continue;
                };
                out.push(Observation {
                    camera,
                    pair,
                    endpoints,
                    line_point: line.point,
                    line_normal: Vector2::new(-dir.y, dir.x),
                    weight: (line.support as f64 / support_ref).sqrt().min(1.0),
                });
            }
        }
        out
    }

    /// Number of distinct edges, or `Underconstrained` when too few are seen.
    fn check_observability(&self, observations: &[Observation]) -> Result<usize, PoseDetectError> {
        let mut seen = ColorPairMap::new();
        for obs in observations {
            seen.insert(obs.pair, ());
        }
        let edges = seen.len();
        if observations.len() * 2 < 6 || edges < self.params.min_distinct_edges {
            debug!(
                "underconstrained: {} observations of {edges} edges",
                observations.len()
            );
            return Err(PoseDetectError::Underconstrained {
                observations: observations.len(),
                edges,
            });
        }
        Ok(edges)
    }

    fn refine(
        &self,
        problem: &PoseProblem<'_>,
        seed: &Pose,
        edges: usize,
    ) -> Result<PoseEstimate, PoseDetectError> {
        let settings = self.lm_settings();
        let outcome = solve(problem, seed, &settings).ok_or(PoseDetectError::ProjectionFailed)?;

        let normal = problem
            .normal_matrix(&outcome.pose, settings.jacobian_eps)
            .ok_or(PoseDetectError::ProjectionFailed)?;
        let eig = normal.symmetric_eigen().eigenvalues;
        let (lo, hi) = (eig.min(), eig.max());
        if hi.is_nan() || hi <= 0.0 || lo.max(0.0) / hi < self.params.min_condition_ratio {
            debug!("degenerate normal matrix (λmin={lo:.3e}, λmax={hi:.3e})");
            return Err(PoseDetectError::Underconstrained {
                observations: problem.observations.len(),
                edges,
            });
        }

        let raw = problem
            .raw_residuals(&outcome.pose)
            .ok_or(PoseDetectError::ProjectionFailed)?;
        let rms = (raw.norm_squared() / raw.len() as f64).sqrt();
        let scale = self.params.confidence_scale_px.max(1e-9);
        let confidence = ((-rms / scale).exp() * (edges as f64 / 4.0).min(1.0)).clamp(0.0, 1.0);

        let estimate = PoseEstimate {
            pose: outcome.pose,
            confidence,
            rms_residual_px: rms,
            iterations: outcome.iterations,
            num_observations: problem.observations.len(),
            num_edges: edges,
            converged: outcome.converged,
        };
        if !outcome.converged {
            warn!(
                "pose refinement hit the iteration limit ({}), rms {rms:.3}px",
                outcome.iterations
            );
            return Err(PoseDetectError::NotConverged {
                estimate: Box::new(estimate),
            });
        }
        debug!(
            "pose found: rms {rms:.3}px, {} observations, {edges} edges, {} iterations",
            estimate.num_observations, estimate.iterations
        );
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_tracker_core::{
        world_to_camera_look_at, CameraIntrinsics, ColorPair, Distortion, FaceColor,
    };
    use nalgebra::{Point3, UnitQuaternion, Vector3};

    fn rig() -> [CameraParameters; 3] {
        [60.0f64, 180.0, 300.0].map(|deg| {
            let a = deg.to_radians();
            CameraParameters {
                image_width: 640,
                image_height: 480,
                intrinsics: CameraIntrinsics {
                    fx: 600.0,
                    fy: 600.0,
                    cx: 320.0,
                    cy: 240.0,
                },
                distortion: Distortion::default(),
                world_to_camera: world_to_camera_look_at(
                    &Point3::new(0.35 * a.cos(), 0.35 * a.sin(), 0.3),
                    &Point3::new(0.0, 0.0, 0.05),
                    &Vector3::z(),
                )
                .unwrap(),
            }
        })
    }

    fn detector() -> PoseDetector {
        PoseDetector::new(
            Arc::new(CubeModel::default()),
            rig(),
            PoseDetectorParams::default(),
        )
    }

    /// Exact projected lines of every edge whose both endpoints project.
    fn exact_lines(det: &PoseDetector, truth: &Pose) -> [ColorPairMap<Line>; 3] {
        std::array::from_fn(|c| {
            let cam = &det.cameras()[c];
            let mut map = ColorPairMap::new();
            for (pair, _) in det.model().edges().iter() {
                let [a, b] = det.model().edge_points(pair).unwrap();
                let pa = cam.project_world_point(&truth.transform_point(&a)).unwrap();
                let pb = cam.project_world_point(&truth.transform_point(&b)).unwrap();
                let direction = (pb - pa).normalize();
                map.insert(
                    pair,
                    Line {
                        point: nalgebra::center(&pa, &pb),
                        direction,
                        endpoints: [pa, pb],
                        support: 100,
                        rms_px: 0.0,
                    },
                );
            }
            map
        })
    }

    fn assert_pose_close(found: &Pose, truth: &Pose) {
        let dt = found.translation_distance(truth);
        let dr = found.rotation_distance(truth).to_degrees();
        assert!(dt < 1e-4, "translation error {dt}");
        assert!(dr < 0.05, "rotation error {dr} deg");
    }

    #[test]
    fn recovers_pose_from_exact_lines() {
        let det = detector();
        let truth = Pose::new(
            Vector3::new(0.01, 0.005, 0.0325),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.35),
        );
        let est = det.find_pose(&exact_lines(&det, &truth)).unwrap();
        assert_pose_close(&est.pose, &truth);
        assert!(est.converged);
        assert_eq!(est.num_edges, 12);
        assert_eq!(est.num_observations, 36);
        assert!(est.confidence > 0.9);
    }

    #[test]
    fn recovers_tilted_pose() {
        let det = detector();
        let truth = Pose::new(
            Vector3::new(-0.01, 0.0, 0.05),
            UnitQuaternion::from_euler_angles(0.2, -0.15, 1.2),
        );
        let est = det.find_pose(&exact_lines(&det, &truth)).unwrap();
        assert_pose_close(&est.pose, &truth);
    }

    #[test]
    fn seeded_solve_refines_nearby_guess() {
        let det = detector();
        let truth = Pose::new(
            Vector3::new(0.0, 0.0, 0.1),
            UnitQuaternion::identity(),
        );
        let guess = Pose::new(
            Vector3::new(0.005, -0.004, 0.095),
            UnitQuaternion::from_euler_angles(0.05, 0.0, -0.08),
        );
        let est = det
            .find_pose_from_seed(&exact_lines(&det, &truth), &guess)
            .unwrap();
        assert_pose_close(&est.pose, &truth);
    }

    #[test]
    fn no_lines_is_underconstrained() {
        let det = detector();
        let empty: [ColorPairMap<Line>; 3] = Default::default();
        assert_eq!(
            det.find_pose(&empty),
            Err(PoseDetectError::Underconstrained {
                observations: 0,
                edges: 0
            })
        );
    }

    #[test]
    fn one_edge_seen_everywhere_is_underconstrained() {
        let det = detector();
        let truth = Pose::new(Vector3::new(0.0, 0.0, 0.0325), UnitQuaternion::identity());
        let full = exact_lines(&det, &truth);
        let pair = ColorPair::new(FaceColor::Red, FaceColor::Blue).unwrap();
        let only: [ColorPairMap<Line>; 3] = std::array::from_fn(|c| {
            let mut m = ColorPairMap::new();
            m.insert(pair, *full[c].get(pair).unwrap());
            m
        });
        match det.find_pose(&only) {
            Err(PoseDetectError::Underconstrained { observations, edges }) => {
                assert_eq!(observations, 3);
                assert_eq!(edges, 1);
            }
            other => panic!("expected Underconstrained, got {other:?}"),
        }
    }

    #[test]
    fn iteration_limit_surfaces_best_effort_estimate() {
        let params = PoseDetectorParams {
            max_iters: 1,
            coarse_max_iters: 1,
            ..PoseDetectorParams::default()
        };
        let det = PoseDetector::new(Arc::new(CubeModel::default()), rig(), params);
        let truth = Pose::new(
            Vector3::new(-0.01, 0.0, 0.05),
            UnitQuaternion::from_euler_angles(0.2, -0.15, 1.2),
        );
        match det.find_pose(&exact_lines(&det, &truth)) {
            Err(PoseDetectError::NotConverged { estimate }) => {
                assert!(!estimate.converged);
                assert_eq!(estimate.iterations, 1);
                assert_eq!(estimate.num_edges, 12);
                assert!(estimate.rms_residual_px.is_finite());
                assert!((0.0..=1.0).contains(&estimate.confidence));
            }
            other => panic!("expected NotConverged, got {other:?}"),
        }
    }

    #[test]
    fn seeds_around_a_camera_cannot_be_projected() {
        let cameras = rig();
        let eye = cameras[0].world_to_camera.inverse().translation.vector;
        let params = PoseDetectorParams {
            seed_position: eye,
            ..PoseDetectorParams::default()
        };
        let det = PoseDetector::new(Arc::new(CubeModel::default()), cameras, params);
        let truth = Pose::new(Vector3::new(0.0, 0.0, 0.0325), UnitQuaternion::identity());
        let lines = exact_lines(&det, &truth);

        assert_eq!(det.find_pose(&lines), Err(PoseDetectError::ProjectionFailed));
        let seed = Pose::new(eye, UnitQuaternion::identity());
        assert_eq!(
            det.find_pose_from_seed(&lines, &seed),
            Err(PoseDetectError::ProjectionFailed)
        );
    }

    #[test]
    fn projected_cube_matches_camera_projection() {
        let det = detector();
        let pose = Pose::new(Vector3::new(0.0, 0.0, 0.0325), UnitQuaternion::identity());
        let projected = det.project_cube(&pose);
        for (c, cam) in det.cameras().iter().enumerate() {
            for (v, p) in det.model().vertices().iter().enumerate() {
                let expected = cam.project_world_point(&pose.transform_point(p)).unwrap();
                let got = projected[c][v].unwrap();
                assert!((got - expected).norm() < 1e-12);
            }
        }
    }
}
