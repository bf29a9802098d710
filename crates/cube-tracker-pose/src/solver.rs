//! Damped Gauss-Newton (Levenberg-Marquardt) on the cube pose.
//!
//! The state is a [`Pose`]; each step is a 6-vector `[δθ, δt]` applied as
//! `R <- exp(δθ) R` and `t <- t + δt`.

use cube_tracker_core::{CameraParameters, ColorPair, Pose, N_CAMERAS};
use nalgebra::{DMatrix, DVector, Matrix6, Point2, Point3, UnitQuaternion, Vector2, Vector3, Vector6};

/// One observed edge line in one camera.
#[derive(Clone, Debug)]
pub(crate) struct Observation {
    pub camera: usize,
    pub pair: ColorPair,
    /// Edge endpoints in the cube frame.
    pub endpoints: [Point3<f64>; 2],
    pub line_point: Point2<f64>,
    /// Unit normal of the observed line.
    pub line_normal: Vector2<f64>,
    pub weight: f64,
}

pub(crate) struct PoseProblem<'a> {
    pub cameras: &'a [CameraParameters; N_CAMERAS],
    pub observations: &'a [Observation],
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct LmSettings {
    pub max_iters: usize,
    pub initial_lambda: f64,
    pub ftol: f64,
    pub xtol: f64,
    pub jacobian_eps: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct LmOutcome {
    pub pose: Pose,
    /// `0.5 * Σ (w r)²`
    pub cost: f64,
    pub iterations: usize,
    pub converged: bool,
}

const MAX_LAMBDA: f64 = 1e12;
const MIN_LAMBDA: f64 = 1e-12;

pub(crate) fn apply_increment(pose: &Pose, delta: &Vector6<f64>) -> Pose {
    let dtheta = Vector3::new(delta[0], delta[1], delta[2]);
    let dt = Vector3::new(delta[3], delta[4], delta[5]);
    Pose::new(
        pose.position + dt,
        UnitQuaternion::from_scaled_axis(dtheta) * pose.orientation,
    )
}

impl PoseProblem<'_> {
    #[inline]
    pub fn num_residuals(&self) -> usize {
        2 * self.observations.len()
    }

    /// Unweighted signed endpoint-to-line distances, two per observation.
    ///
    /// `None` when any endpoint cannot be projected.
    pub fn raw_residuals(&self, pose: &Pose) -> Option<DVector<f64>> {
        let mut r = DVector::zeros(self.num_residuals());
        for (i, obs) in self.observations.iter().enumerate() {
            let cam = &self.cameras[obs.camera];
            for (k, p) in obs.endpoints.iter().enumerate() {
                let px = cam.project_world_point(&pose.transform_point(p))?;
                r[2 * i + k] = obs.line_normal.dot(&(px - obs.line_point));
            }
        }
        Some(r)
    }

    pub fn weighted_residuals(&self, pose: &Pose) -> Option<DVector<f64>> {
        let mut r = self.raw_residuals(pose)?;
        for (i, obs) in self.observations.iter().enumerate() {
            r[2 * i] *= obs.weight;
            r[2 * i + 1] *= obs.weight;
        }
        Some(r)
    }

    #[cfg(test)]
    fn cost(&self, pose: &Pose) -> Option<f64> {
        self.weighted_residuals(pose).map(|r| 0.5 * r.norm_squared())
    }

    /// Central-difference Jacobian of the weighted residuals w.r.t. the increment.
    pub fn jacobian(&self, pose: &Pose, eps: f64) -> Option<DMatrix<f64>> {
        let mut j = DMatrix::zeros(self.num_residuals(), 6);
        for k in 0..6 {
            let mut delta = Vector6::zeros();
            delta[k] = eps;
            let plus = self.weighted_residuals(&apply_increment(pose, &delta))?;
            let minus = self.weighted_residuals(&apply_increment(pose, &(-delta)))?;
            j.set_column(k, &((plus - minus) / (2.0 * eps)));
        }
        Some(j)
    }

    /// Normal matrix `JᵀJ` at `pose`.
    pub fn normal_matrix(&self, pose: &Pose, eps: f64) -> Option<Matrix6<f64>> {
        let j = self.jacobian(pose, eps)?;
        Some((j.transpose() * &j).fixed_view::<6, 6>(0, 0).into_owned())
    }
}

/// Run LM from `seed`. `None` when the seed itself cannot be evaluated.
pub(crate) fn solve(problem: &PoseProblem<'_>, seed: &Pose, settings: &LmSettings) -> Option<LmOutcome> {
    let mut pose = *seed;
    let mut r = problem.weighted_residuals(&pose)?;
    let mut cost = 0.5 * r.norm_squared();
    let mut lambda = settings.initial_lambda.max(MIN_LAMBDA);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < settings.max_iters {
        if cost < 1e-18 {
            converged = true;
            break;
        }
        iterations += 1;

        let Some(j) = problem.jacobian(&pose, settings.jacobian_eps) else {
            break;
        };
        let jt = j.transpose();
        let h: Matrix6<f64> = (&jt * &j).fixed_view::<6, 6>(0, 0).into_owned();
        let g: Vector6<f64> = (&jt * &r).fixed_rows::<6>(0).into_owned();

        let mut accepted = false;
        while lambda <= MAX_LAMBDA {
            let mut damped = h;
            for d in 0..6 {
                damped[(d, d)] += lambda * h[(d, d)].max(1e-9);
            }
            let step = damped.cholesky().map(|c| c.solve(&(-g)));
            let Some(step) = step.filter(|s| s.iter().all(|v| v.is_finite())) else {
                lambda *= 10.0;
                continue;
            };

            let candidate = apply_increment(&pose, &step);
            match problem.weighted_residuals(&candidate) {
                Some(r_new) if 0.5 * r_new.norm_squared() < cost => {
                    let new_cost = 0.5 * r_new.norm_squared();
                    let decrease = cost - new_cost;
                    pose = candidate;
                    r = r_new;
                    lambda = (lambda / 10.0).max(MIN_LAMBDA);
                    accepted = true;
                    if decrease <= settings.ftol * cost
                        || step.norm() < settings.xtol
                        || new_cost < 1e-18
                    {
                        converged = true;
                    }
                    cost = new_cost;
                    break;
                }
                _ => lambda *= 10.0,
            }
        }

        if !accepted {
            // No descent left at any damping: local minimum.
            converged = true;
            break;
        }
        if converged {
            break;
        }
    }

    Some(LmOutcome {
        pose,
        cost,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_tracker_core::{world_to_camera_look_at, CameraIntrinsics, CubeModel, Distortion};

    fn camera(eye: Vector3<f64>) -> CameraParameters {
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
                &Point3::from(eye),
                &Point3::new(0.0, 0.0, 0.05),
                &Vector3::z(),
            )
            .unwrap(),
        }
    }

    fn rig() -> [CameraParameters; 3] {
        [0.0f64, 120.0, 240.0].map(|deg| {
            let a = deg.to_radians();
            camera(Vector3::new(0.4 * a.cos(), 0.4 * a.sin(), 0.3))
        })
    }

    /// Exact observations of every edge from every camera at `truth`.
    fn observations(cams: &[CameraParameters; 3], truth: &Pose) -> Vec<Observation> {
        let model = CubeModel::default();
        let mut out = Vec::new();
        for (c, cam) in cams.iter().enumerate() {
            for (pair, _) in model.edges().iter() {
                let [a, b] = model.edge_points(pair).unwrap();
                let pa = cam.project_world_point(&truth.transform_point(&a)).unwrap();
                let pb = cam.project_world_point(&truth.transform_point(&b)).unwrap();
                let d = (pb - pa).normalize();
                out.push(Observation {
                    camera: c,
                    pair,
                    endpoints: [a, b],
                    line_point: pa,
                    line_normal: Vector2::new(-d.y, d.x),
                    weight: 1.0,
                });
            }
        }
        out
    }

    fn settings() -> LmSettings {
        LmSettings {
            max_iters: 100,
            initial_lambda: 1e-3,
            ftol: 1e-12,
            xtol: 1e-12,
            jacobian_eps: 1e-6,
        }
    }

    #[test]
    fn increment_rotates_on_the_left() {
        let pose = Pose::new(
            Vector3::new(1.0, 0.0, 0.0),
            UnitQuaternion::from_euler_angles(0.1, 0.0, 0.0),
        );
        let delta = Vector6::new(0.0, 0.0, 0.2, 0.0, 0.5, 0.0);
        let out = apply_increment(&pose, &delta);
        let expected = UnitQuaternion::from_euler_angles(0.0, 0.0, 0.2) * pose.orientation;
        assert!(out.orientation.angle_to(&expected) < 1e-12);
        assert!((out.position - Vector3::new(1.0, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn residuals_vanish_at_the_true_pose() {
        let cams = rig();
        let truth = Pose::new(
            Vector3::new(0.01, -0.02, 0.04),
            UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3),
        );
        let obs = observations(&cams, &truth);
        let problem = PoseProblem {
            cameras: &cams,
            observations: &obs,
        };
        assert!(problem.cost(&truth).unwrap() < 1e-18);
    }

    #[test]
    fn lm_converges_from_a_perturbed_start() {
        let cams = rig();
        let truth = Pose::new(
            Vector3::new(0.01, -0.02, 0.04),
            UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3),
        );
        let obs = observations(&cams, &truth);
        let problem = PoseProblem {
            cameras: &cams,
            observations: &obs,
        };
        let start = apply_increment(&truth, &Vector6::new(0.08, -0.05, 0.1, 0.01, 0.008, -0.01));
        let out = solve(&problem, &start, &settings()).unwrap();
        assert!(out.converged);
        assert!(out.pose.translation_distance(&truth) < 1e-6);
        assert!(out.pose.rotation_distance(&truth) < 1e-6);
    }

    #[test]
    fn single_edge_leaves_the_normal_matrix_rank_deficient() {
        let cams = rig();
        let truth = Pose::new(Vector3::new(0.0, 0.0, 0.0325), UnitQuaternion::identity());
        let obs: Vec<_> = observations(&cams, &truth)
            .into_iter()
            .filter(|o| o.camera == 0)
            .take(1)
            .collect();
        let problem = PoseProblem {
            cameras: &cams,
            observations: &obs,
        };
        let h = problem.normal_matrix(&truth, 1e-6).unwrap();
        let eig = h.symmetric_eigen().eigenvalues;
        let (lo, hi) = (eig.min(), eig.max());
        assert!(hi > 0.0);
        assert!(lo.abs() / hi < 1e-7);
    }
}
