//! cube-tracker CLI: estimate the cube pose from three camera images.

use clap::Parser;
use cube_tracker::{core, detect, CubeTrackerConfig, CubeTrackerReport};
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "cube-tracker")]
#[command(about = "Estimate the 6-DoF pose of a coloured cube from three calibrated cameras")]
#[command(version)]
struct Cli {
    /// JSON config with image paths and camera calibrations.
    config: PathBuf,

    /// Write the debug grid (raw, segmentation, boundaries, lines, pose) here.
    #[arg(long)]
    debug_image: Option<PathBuf>,

    /// Paint the estimated cube faces in the debug image instead of a wire frame.
    #[arg(long)]
    fill_faces: bool,

    /// Process the cameras sequentially.
    #[arg(long)]
    single_thread: bool,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let cfg = CubeTrackerConfig::load_json(&cli.config)?;
    let detector = cfg.build_detector()?;

    let mut images = Vec::with_capacity(core::N_CAMERAS);
    for path in &cfg.image_paths {
        images.push(detect::load_rgb(path)?);
    }
    let views = [
        detect::rgb_view(&images[0]),
        detect::rgb_view(&images[1]),
        detect::rgb_view(&images[2]),
    ];

    let result = if cli.single_thread {
        detector.detect_cube_single_thread(&views)
    } else {
        detector.detect_cube(&views)
    };
    match &result {
        Ok(estimate) => {
            let p = estimate.pose.position;
            let [qx, qy, qz, qw] = estimate.pose.quaternion_xyzw();
            println!(
                "position: [{:.5}, {:.5}, {:.5}]  orientation (xyzw): [{qx:.5}, {qy:.5}, {qz:.5}, {qw:.5}]  confidence: {:.3}",
                p.x, p.y, p.z, estimate.confidence
            );
        }
        Err(err) => log::warn!("no pose: {err}"),
    }

    let mut report = CubeTrackerReport::new(&cfg, &cli.config);
    if let Some(frame) = detector.last_frame() {
        report.set_lines(frame.lines());
    }
    report.set_result(result);
    let out = cfg.output_path();
    report.write_json(&out)?;
    log::info!("report written to {}", out.display());

    let debug_path = cli
        .debug_image
        .clone()
        .or_else(|| cfg.debug_image_path.as_ref().map(PathBuf::from));
    if let Some(path) = debug_path {
        match detector.create_debug_image(cli.fill_faces) {
            Some(img) => {
                detect::save_rgb(&img, &path)?;
                log::info!("debug image written to {}", path.display());
            }
            None => log::warn!("no frame processed, debug image skipped"),
        }
    }
    Ok(())
}

fn init_logging(level: &str) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        core::init_with_level(core::parse_level(level))?;
        Ok(())
    }
}
