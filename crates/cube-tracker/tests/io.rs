use cube_tracker::core::{world_to_camera_look_at, CameraIntrinsics, Distortion};
use cube_tracker::{
    CameraParameters, CubeDetectError, CubeTrackerConfig, CubeTrackerConfigError,
    CubeTrackerReport, PoseDetectError,
};
use nalgebra::{Point3, Vector3};
use std::path::Path;

fn camera(x: f64, y: f64) -> CameraParameters {
    CameraParameters {
        image_width: 320,
        image_height: 240,
        intrinsics: CameraIntrinsics {
            fx: 300.0,
            fy: 300.0,
            cx: 159.5,
            cy: 119.5,
        },
        distortion: Distortion::from_opencv([-0.1, 0.01, 0.0, 0.0, 0.0]),
        world_to_camera: world_to_camera_look_at(
            &Point3::new(x, y, 0.3),
            &Point3::origin(),
            &Vector3::z(),
        )
        .unwrap(),
    }
}

fn config() -> CubeTrackerConfig {
    let json = serde_json::json!({
        "image_paths": ["cam0.png", "cam1.png", "cam2.png"],
        "cameras": [camera(0.3, 0.0), camera(-0.15, 0.26), camera(-0.15, -0.26)],
        "cube_width": 0.05,
        "pose": { "max_iters": 40 },
        "output_path": "out/report.json"
    });
    serde_json::from_value(json).unwrap()
}

#[test]
fn config_overrides_reach_the_detector() {
    let cfg = config();
    assert_eq!(cfg.output_path(), Path::new("out/report.json"));

    let detector = cfg.build_detector().unwrap();
    assert_eq!(detector.model().width(), 0.05);
    assert_eq!(detector.pose_detector().params().max_iters, 40);
    // Fields missing from the override keep their defaults.
    assert_eq!(detector.pose_detector().params().coarse_max_iters, 15);
    assert_eq!(detector.cameras()[1], cfg.cameras[1]);
}

#[test]
fn invalid_cube_width_is_a_config_error() {
    let mut cfg = config();
    cfg.cube_width = Some(-1.0);
    assert!(matches!(
        cfg.build_detector(),
        Err(CubeTrackerConfigError::Model(_))
    ));
}

#[test]
fn config_and_report_survive_a_disk_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("tracker.json");
    let cfg = config();
    cfg.write_json(&cfg_path).unwrap();
    let loaded = CubeTrackerConfig::load_json(&cfg_path).unwrap();
    assert_eq!(loaded.image_paths, cfg.image_paths);
    for (a, b) in loaded.cameras.iter().zip(&cfg.cameras) {
        assert_eq!(a.intrinsics, b.intrinsics);
        assert_eq!(a.image_size(), b.image_size());
        let drift = (a.world_to_camera.inverse() * b.world_to_camera).translation.vector.norm();
        assert!(drift < 1e-12);
    }

    let mut report = CubeTrackerReport::new(&loaded, &cfg_path);
    report.set_result(Err(CubeDetectError::Pose(
        PoseDetectError::Underconstrained {
            observations: 1,
            edges: 1,
        },
    )));
    let report_path = dir.path().join("report.json");
    report.write_json(&report_path).unwrap();

    let back = CubeTrackerReport::load_json(&report_path).unwrap();
    assert!(back.estimate.is_none());
    assert!(back.error.unwrap().contains("underconstrained"));
    assert_eq!(back.image_paths[2], "cam2.png");
}

#[test]
fn missing_config_is_an_io_error() {
    let err = CubeTrackerConfig::load_json("/nonexistent/tracker.json").unwrap_err();
    assert!(matches!(err, cube_tracker::CubeTrackerIoError::Io(_)));
}
