//! Shared "fit pipeline" logic for the CLI.
//!
//! load capture -> build ROI / basis / config -> engine fit
//!
//! The front-end can then focus on presentation (printing and exports).

use std::path::Path;
use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::Vector3;

use crate::cli::FitArgs;
use crate::domain::{BasisKind, FitConfig, PointSampleSet, ReferenceBasis, Roi};
use crate::engine::{FitOutcome, fit_detailed};
use crate::error::AppError;
use crate::io::{IngestedCapture, load_capture};

/// All computed outputs of a single `vfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub capture: IngestedCapture,
    pub config: FitConfig,
    pub outcome: FitOutcome,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(args: &FitArgs) -> Result<RunOutput, AppError> {
    let config = fit_config_from_args(args)?;

    let capture = load_logged(&args.file)?;
    let roi = roi_from_args(args)?;
    let points = PointSampleSet::new(capture.samples.clone(), roi);
    let basis = basis_from_args(args)?;

    let started = Instant::now();
    let outcome = fit_detailed(&points, args.target, &basis, &config, args.seed).map_err(|e| {
        warn!("fit failed for target {}: {e}", args.target.code());
        AppError::from(e)
    })?;
    let report = &outcome.report;
    info!(
        "target {} fitted in {:.1?}: pitch={:.1} roll={:.1} inliers={}/{} valid={}",
        report.target.code(),
        started.elapsed(),
        report.pitch_deg,
        report.roll_deg,
        report.inlier_count,
        report.point_count,
        report.is_valid,
    );
    if !report.is_valid {
        warn!(
            "fit is below quality thresholds (ratio {:.3}, rms {:.4} m)",
            report.inlier_ratio, report.residual_rms
        );
    }

    Ok(RunOutput {
        capture,
        config,
        outcome,
    })
}

fn load_logged(path: &Path) -> Result<IngestedCapture, AppError> {
    let capture = load_capture(path)?;
    info!(
        "loaded {}: {} rows, {} used",
        path.display(),
        capture.rows_read,
        capture.rows_used()
    );
    for e in &capture.row_errors {
        debug!("{}:{}: {}", path.display(), e.line, e.message);
    }
    if !capture.row_errors.is_empty() {
        warn!("{} row(s) skipped in {}", capture.row_errors.len(), path.display());
    }
    Ok(capture)
}

/// Build the engine config: defaults, then `--config`, then flags.
pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
            serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid config JSON: {e}")))?
        }
        None => FitConfig::default(),
    };

    if let Some(v) = args.threshold {
        config.inlier_threshold_m = v;
    }
    if let Some(v) = args.min_inlier_ratio {
        config.min_inlier_ratio = v;
    }
    if let Some(v) = args.max_rms {
        config.max_residual_rms_m = v;
    }
    if let Some(v) = args.max_iterations {
        config.max_ransac_iterations = v;
    }
    if let Some(v) = args.confidence {
        config.target_confidence = v;
    }
    if let Some(v) = args.min_points {
        config.min_point_count = v;
    }
    if let Some(v) = args.max_points {
        config.max_point_count = v;
    }
    if let Some(v) = args.min_confidence {
        config.min_confidence = v;
    }
    if args.outlier_filter || args.outlier_neighbors.is_some() || args.outlier_std_ratio.is_some() {
        let mut filter = config.outlier_filter.unwrap_or_default();
        if let Some(k) = args.outlier_neighbors {
            filter.neighbors = k;
        }
        if let Some(r) = args.outlier_std_ratio {
            filter.std_ratio = r;
        }
        config.outlier_filter = Some(filter);
    }

    config.validate()?;
    debug!("config: {config:?}");
    Ok(config)
}

/// Resolve the reference basis from flags, loading the ground capture if needed.
pub fn basis_from_args(args: &FitArgs) -> Result<ReferenceBasis, AppError> {
    match args.basis {
        BasisKind::Imu => match (&args.up, &args.gravity) {
            (Some(up), _) => Ok(ReferenceBasis::imu(vec3(up, "--up")?)),
            (None, Some(g)) => Ok(ReferenceBasis::from_gravity(vec3(g, "--gravity")?)),
            (None, None) => Err(AppError::new(2, "The imu basis needs `--up x,y,z` or `--gravity x,y,z`.")),
        },
        BasisKind::Plane => {
            let path = args
                .ground
                .as_deref()
                .ok_or_else(|| AppError::new(2, "The plane basis needs `--ground <capture>`."))?;
            let ground = load_logged(path)?;
            Ok(ReferenceBasis::ground_plane(
                PointSampleSet::unbounded(ground.samples),
                vec3(&args.up_hint, "--up-hint")?,
            ))
        }
    }
}

fn roi_from_args(args: &FitArgs) -> Result<Roi, AppError> {
    match (&args.roi_center, &args.roi_size) {
        (Some(center), Some(size)) => {
            let size = vec3(size, "--roi-size")?;
            if !size.iter().all(|v| v.is_finite() && *v > 0.0) {
                return Err(AppError::new(2, "ROI extent must be finite and > 0."));
            }
            Ok(Roi::axis_aligned(vec3(center, "--roi-center")?, size.x, size.y, size.z))
        }
        _ => Ok(Roi::unbounded()),
    }
}

/// Parse a 3-component flag value.
pub fn vec3(values: &[f64], flag: &str) -> Result<Vector3<f64>, AppError> {
    match values {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(AppError::new(
            2,
            format!("{flag} expects three comma-separated numbers (got {})", values.len()),
        )),
    }
}
