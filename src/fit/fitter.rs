//! Fit a single primitive to a prepared capture.
//!
//! search → convergence floor → refinement → final consensus pass.

use rand::rngs::StdRng;

use crate::data::PreparedSamples;
use crate::domain::{FitConfig, FittedPrimitive, PrimitiveKind};
use crate::error::FitError;
use crate::fit::budget::ransac_iterations;
use crate::fit::ransac::ransac_search;
use crate::fit::refine::{consensus, refine_primitive};

/// Fitting options that vary between the target fit and the ground fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Inlier distance `τ` (meters).
    pub threshold: f64,
    /// Number of hypotheses to score.
    pub iterations: usize,
    /// Consensus floor as a fraction of the point count.
    pub min_consensus_ratio: f64,
    /// Spread below which the refined covariance counts as rank deficient.
    pub min_spread: f64,
}

impl FitOptions {
    pub fn for_target(kind: PrimitiveKind, config: &FitConfig) -> Result<Self, FitError> {
        Ok(Self {
            threshold: config.inlier_threshold_m,
            iterations: ransac_iterations(kind, config)?,
            min_consensus_ratio: config.min_consensus_ratio,
            min_spread: config.degenerate_spread_m,
        })
    }

    pub fn for_ground(config: &FitConfig) -> Result<Self, FitError> {
        Ok(Self {
            threshold: config.ground_inlier_threshold_m,
            ..Self::for_target(PrimitiveKind::Plane, config)?
        })
    }
}

/// Minimum inlier count for a candidate to be accepted:
/// `max(m + 1, ceil(ratio × n))`.
pub fn consensus_floor(kind: PrimitiveKind, point_count: usize, ratio: f64) -> usize {
    let m = kind.minimal_sample_size();
    let by_ratio = (ratio * point_count as f64).ceil() as usize;
    (m + 1).max(by_ratio)
}

/// RANSAC + refinement for one primitive kind.
pub fn fit_primitive(
    prepared: &PreparedSamples,
    kind: PrimitiveKind,
    opts: &FitOptions,
    rng: &mut StdRng,
) -> Result<FittedPrimitive, FitError> {
    let points = prepared.positions();
    let floor = consensus_floor(kind, points.len(), opts.min_consensus_ratio);

    let outcome = ransac_search(&points, kind, opts.threshold, opts.iterations, rng)?;
    if outcome.inliers.len() < floor {
        return Err(FitError::FitDidNotConverge {
            inliers: outcome.inliers.len(),
            required: floor,
        });
    }

    let refined = refine_primitive(kind, &prepared.samples, &outcome.inliers, opts.min_spread)?;
    let (inliers, residuals) = consensus(&refined, &points, opts.threshold);

    let m = kind.minimal_sample_size();
    if inliers.len() <= m {
        return Err(FitError::FitDidNotConverge {
            inliers: inliers.len(),
            required: m + 1,
        });
    }

    Ok(FittedPrimitive {
        primitive: refined,
        inliers,
        residuals,
        iterations: outcome.iterations,
    })
}
