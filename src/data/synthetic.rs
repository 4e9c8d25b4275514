//! Synthetic capture generation.
//!
//! Produces seeded, reproducible point clouds of a known primitive so that
//! fits can be checked against ground truth:
//!
//! - inliers: uniform points in the ROI projected onto the primitive, plus
//!   isotropic Gaussian sensor noise
//! - outliers: uniform points anywhere in the ROI

use nalgebra::Vector3;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{NORM_EPS, PointSample, PointSampleSet, Roi};
use crate::error::AppError;

/// Rejection-sampling budget per inlier before giving up.
const MAX_ATTEMPTS_PER_POINT: usize = 1000;

/// Ground-truth primitive for a synthetic capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticShape {
    Plane {
        point: Vector3<f64>,
        normal: Vector3<f64>,
    },
    Line {
        point: Vector3<f64>,
        direction: Vector3<f64>,
    },
}

impl SyntheticShape {
    fn project(&self, p: &Vector3<f64>) -> Vector3<f64> {
        match self {
            SyntheticShape::Plane { point, normal } => p - normal * (p - point).dot(normal),
            SyntheticShape::Line { point, direction } => point + direction * (p - point).dot(direction),
        }
    }

    fn normalized(self) -> Option<Self> {
        match self {
            SyntheticShape::Plane { point, normal } => normal
                .try_normalize(NORM_EPS)
                .map(|normal| SyntheticShape::Plane { point, normal }),
            SyntheticShape::Line { point, direction } => direction
                .try_normalize(NORM_EPS)
                .map(|direction| SyntheticShape::Line { point, direction }),
        }
    }
}

/// Parameters of a synthetic capture.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub shape: SyntheticShape,
    /// Total number of points (inliers + outliers).
    pub count: usize,
    /// Per-axis standard deviation of the inlier noise (meters).
    pub noise_sigma: f64,
    /// Fraction of `count` drawn as uniform outliers.
    pub outlier_fraction: f64,
    pub roi: Roi,
    pub seed: u64,
}

impl SyntheticSpec {
    /// 1,000 points on `z = 0` in a 1 m cube, σ = 1 mm, 10% outliers.
    pub fn horizontal_plane(seed: u64) -> Self {
        Self {
            shape: SyntheticShape::Plane {
                point: Vector3::zeros(),
                normal: Vector3::z(),
            },
            count: 1000,
            noise_sigma: 0.001,
            outlier_fraction: 0.1,
            roi: Roi::axis_aligned(Vector3::zeros(), 1.0, 1.0, 1.0),
            seed,
        }
    }

    /// 500 points on the Z axis in a 1 m cube, σ = 1 mm, 10% outliers.
    pub fn vertical_line(seed: u64) -> Self {
        Self {
            shape: SyntheticShape::Line {
                point: Vector3::zeros(),
                direction: Vector3::z(),
            },
            count: 500,
            noise_sigma: 0.001,
            outlier_fraction: 0.1,
            roi: Roi::axis_aligned(Vector3::zeros(), 1.0, 1.0, 1.0),
            seed,
        }
    }
}

/// Generate a capture. Inliers come first, then outliers.
pub fn generate_capture(spec: &SyntheticSpec) -> Result<PointSampleSet, AppError> {
    if spec.count == 0 {
        return Err(AppError::new(2, "Synthetic point count must be > 0."));
    }
    if !(spec.noise_sigma.is_finite() && spec.noise_sigma >= 0.0) {
        return Err(AppError::new(2, "Noise sigma must be finite and >= 0."));
    }
    if !(0.0..=1.0).contains(&spec.outlier_fraction) {
        return Err(AppError::new(2, "Outlier fraction must lie in [0, 1]."));
    }
    let roi = &spec.roi;
    if ![roi.width, roi.height, roi.depth].iter().all(|v| v.is_finite() && *v > 0.0) {
        return Err(AppError::new(2, "Synthetic captures need a finite, non-empty ROI."));
    }
    let shape = spec
        .shape
        .normalized()
        .ok_or_else(|| AppError::new(2, "Synthetic primitive direction must be non-zero."))?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let noise = Normal::new(0.0, spec.noise_sigma)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let n_outliers = (spec.count as f64 * spec.outlier_fraction).round() as usize;
    let n_inliers = spec.count - n_outliers;

    let mut samples = Vec::with_capacity(spec.count);
    for _ in 0..n_inliers {
        samples.push(sample_inlier(&mut rng, &shape, roi, &noise)?);
    }
    for _ in 0..n_outliers {
        samples.push(PointSample {
            position: uniform_in_roi(&mut rng, roi),
            confidence: None,
        });
    }

    Ok(PointSampleSet::new(samples, spec.roi.clone()))
}

fn sample_inlier(
    rng: &mut StdRng,
    shape: &SyntheticShape,
    roi: &Roi,
    noise: &Normal<f64>,
) -> Result<PointSample, AppError> {
    for _ in 0..MAX_ATTEMPTS_PER_POINT {
        let on_shape = shape.project(&uniform_in_roi(rng, roi));
        let jitter = Vector3::new(noise.sample(rng), noise.sample(rng), noise.sample(rng));
        let p = on_shape + jitter;
        if roi.contains(&p) {
            return Ok(PointSample {
                position: p,
                confidence: None,
            });
        }
    }
    Err(AppError::new(
        2,
        "Synthetic primitive does not intersect the ROI (rejection sampling exhausted).",
    ))
}

fn uniform_in_roi(rng: &mut StdRng, roi: &Roi) -> Vector3<f64> {
    let local = Vector3::new(
        rng.gen_range(-0.5..=0.5) * roi.width,
        rng.gen_range(-0.5..=0.5) * roi.height,
        rng.gen_range(-0.5..=0.5) * roi.depth,
    );
    let offset = match &roi.rotation {
        Some(r) => r * local,
        None => local,
    };
    roi.center + offset
}
