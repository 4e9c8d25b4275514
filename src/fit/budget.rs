//! RANSAC iteration budget.
//!
//! The standard bound: with inlier fraction `w` and minimal sample size `m`,
//! `k` draws contain at least one all-inlier sample with probability `p` when
//!
//! ```text
//! k = ceil( ln(1 - p) / ln(1 - w^m) )
//! ```
//!
//! The result is clamped to `[1, cap]` so worst-case latency stays bounded.

use crate::domain::{FitConfig, PrimitiveKind};
use crate::error::FitError;

/// Number of RANSAC hypotheses to score for `kind` under `config`.
pub fn ransac_iterations(kind: PrimitiveKind, config: &FitConfig) -> Result<usize, FitError> {
    iteration_budget(
        config.target_confidence,
        config.assumed_inlier_fraction,
        kind.minimal_sample_size(),
        config.max_ransac_iterations,
    )
}

/// Raw form of the budget formula.
pub fn iteration_budget(confidence: f64, inlier_fraction: f64, sample_size: usize, cap: usize) -> Result<usize, FitError> {
    if !(confidence.is_finite() && confidence > 0.0 && confidence < 1.0) {
        return Err(FitError::InvalidConfig(format!(
            "target confidence must lie in (0, 1) (got {confidence})"
        )));
    }
    if !(inlier_fraction.is_finite() && inlier_fraction > 0.0 && inlier_fraction <= 1.0) {
        return Err(FitError::InvalidConfig(format!(
            "assumed inlier fraction must lie in (0, 1] (got {inlier_fraction})"
        )));
    }
    if cap == 0 {
        return Err(FitError::InvalidConfig("iteration cap must be >= 1".to_string()));
    }

    let p_good = inlier_fraction.powi(sample_size as i32);
    if p_good >= 1.0 {
        return Ok(1);
    }
    let k = ((1.0 - confidence).ln() / (1.0 - p_good).ln()).ceil();
    if !k.is_finite() || k >= cap as f64 {
        return Ok(cap);
    }
    Ok((k as usize).max(1))
}
