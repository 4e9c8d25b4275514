//! Fit quality assessment.

use crate::domain::FitConfig;

/// Quality of a fitted primitive over the points it was fitted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetrics {
    pub inlier_ratio: f64,
    /// Meters.
    pub residual_rms: f64,
    /// `[0, 1]`; ratio discounted by residual RMS relative to `τ`.
    pub quality_score: f64,
    pub is_valid: bool,
}

/// Pure function of the consensus set and the acceptance thresholds.
pub fn assess_quality(point_count: usize, residuals: &[f64], threshold: f64, config: &FitConfig) -> QualityMetrics {
    let inlier_ratio = if point_count == 0 {
        0.0
    } else {
        residuals.len() as f64 / point_count as f64
    };

    let residual_rms = if residuals.is_empty() {
        0.0
    } else {
        (residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64).sqrt()
    };

    let raw = inlier_ratio * (-residual_rms / threshold).exp();
    let quality_score = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };

    let is_valid = inlier_ratio >= config.min_inlier_ratio && residual_rms <= config.max_residual_rms_m;

    QualityMetrics {
        inlier_ratio,
        residual_rms,
        quality_score,
        is_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_fit_scores_its_ratio() {
        let q = assess_quality(10, &[0.0; 8], 0.005, &FitConfig::default());
        assert_relative_eq!(q.inlier_ratio, 0.8);
        assert_eq!(q.residual_rms, 0.0);
        assert_relative_eq!(q.quality_score, 0.8);
        assert!(q.is_valid);
    }

    #[test]
    fn rms_discounts_the_score() {
        let q = assess_quality(4, &[0.003, 0.004, 0.0, 0.0], 0.005, &FitConfig::default());
        assert_relative_eq!(q.residual_rms, 0.0025, epsilon = 1e-12);
        assert_relative_eq!(q.quality_score, (-0.5f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn thresholds_gate_validity() {
        let config = FitConfig::default();
        assert!(!assess_quality(10, &[0.0; 5], 0.005, &config).is_valid);

        let strict = FitConfig {
            max_residual_rms_m: 0.001,
            ..FitConfig::default()
        };
        assert!(!assess_quality(10, &[0.002; 10], 0.005, &strict).is_valid);
    }

    #[test]
    fn empty_inputs_are_zero() {
        let q = assess_quality(0, &[], 0.005, &FitConfig::default());
        assert_eq!(q.inlier_ratio, 0.0);
        assert_eq!(q.residual_rms, 0.0);
        assert_eq!(q.quality_score, 0.0);
        assert!(!q.is_valid);
    }
}
