//! The engine entry point.
//!
//! `fit` is a pure function of its arguments: no I/O, no logging, no clock.
//! Two calls with identical inputs (in any point order) return identical
//! reports.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::data::prepare_samples;
use crate::domain::{FitConfig, FitReport, PointSample, PointSampleSet, ReferenceBasis, TargetSpecification};
use crate::error::FitError;
use crate::fit::{FitOptions, fit_primitive};
use crate::orient::{resolve_angles, resolve_up};
use crate::report::assess_quality;

/// A report plus the canonical point set and consensus it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub report: FitReport,
    /// Points the fit ran on, in canonical order.
    pub samples: Vec<PointSample>,
    /// Indices into `samples`.
    pub inliers: Vec<usize>,
    /// Residual of each inlier, in `inliers` order.
    pub residuals: Vec<f64>,
}

/// Fit `target` in `points` and report its orientation against `basis`.
pub fn fit(
    points: &PointSampleSet,
    target: TargetSpecification,
    basis: &ReferenceBasis,
    config: &FitConfig,
    seed: u64,
) -> Result<FitReport, FitError> {
    fit_detailed(points, target, basis, config, seed).map(|outcome| outcome.report)
}

/// [`fit`], keeping the per-point consensus for callers that export it.
pub fn fit_detailed(
    points: &PointSampleSet,
    target: TargetSpecification,
    basis: &ReferenceBasis,
    config: &FitConfig,
    seed: u64,
) -> Result<FitOutcome, FitError> {
    config.validate()?;
    let kind = target.primitive();

    let mut rng = StdRng::seed_from_u64(seed);
    let prepared = prepare_samples(points, kind, config, &mut rng)?;
    let up = resolve_up(basis, config, seed)?;

    let opts = FitOptions::for_target(kind, config)?;
    let fitted = fit_primitive(&prepared, kind, &opts, &mut rng)?;

    let orientation = resolve_angles(
        kind,
        &fitted.primitive.principal_direction(),
        &up,
        config.orientation_epsilon,
    )?;
    let quality = assess_quality(prepared.len(), &fitted.residuals, config.inlier_threshold_m, config);

    let report = FitReport {
        target,
        primitive: fitted.primitive.kind(),
        basis: basis.kind(),
        pitch_deg: orientation.pitch_deg,
        roll_deg: orientation.roll_deg,
        point_count: prepared.len(),
        inlier_count: fitted.inlier_count(),
        inlier_ratio: quality.inlier_ratio,
        residual_rms: quality.residual_rms,
        quality_score: quality.quality_score,
        is_valid: quality.is_valid,
        direction: orientation.direction.into(),
        up: up.into(),
        anchor: fitted.primitive.point().into(),
        roi_point_count: prepared.roi_count,
        iterations: fitted.iterations,
        seed,
    };

    Ok(FitOutcome {
        report,
        samples: prepared.samples,
        inliers: fitted.inliers,
        residuals: fitted.residuals,
    })
}
