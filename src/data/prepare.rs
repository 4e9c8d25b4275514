//! Turn a caller's `PointSampleSet` into the point list the fitter runs on.
//!
//! Pipeline (in order):
//! 1. drop non-finite samples, samples outside the ROI, and samples below
//!    `min_confidence`
//! 2. sort into a canonical total order so the input ordering cannot matter
//! 3. decimate to `max_point_count` with the seeded random source
//! 4. optional k-NN statistical outlier removal
//! 5. reject too-small and degenerate sets
//!
//! Nothing here mutates the caller's data.

use std::cmp::Ordering;

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::domain::{FitConfig, OutlierFilter, PointSample, PointSampleSet, PrimitiveKind};
use crate::error::FitError;
use crate::math::weighted_moments;

/// A validated capture in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSamples {
    pub samples: Vec<PointSample>,
    /// Samples that passed the ROI/confidence filter, before decimation.
    pub roi_count: usize,
}

impl PreparedSamples {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn positions(&self) -> Vec<Vector3<f64>> {
        self.samples.iter().map(|s| s.position).collect()
    }
}

/// Validate and canonicalize a capture for a primitive of kind `kind`.
pub fn prepare_samples(
    set: &PointSampleSet,
    kind: PrimitiveKind,
    config: &FitConfig,
    rng: &mut StdRng,
) -> Result<PreparedSamples, FitError> {
    let roi = set.roi();
    let mut samples: Vec<PointSample> = set
        .samples()
        .iter()
        .filter(|s| s.is_finite() && roi.contains(&s.position))
        .filter(|s| s.confidence.is_none_or(|c| c >= config.min_confidence))
        .copied()
        .collect();
    samples.sort_by(canonical_order);
    let roi_count = samples.len();

    if samples.len() > config.max_point_count {
        let mut keep = rand::seq::index::sample(rng, samples.len(), config.max_point_count).into_vec();
        keep.sort_unstable();
        samples = keep.into_iter().map(|i| samples[i]).collect();
    }

    if let Some(filter) = &config.outlier_filter {
        samples = remove_statistical_outliers(samples, filter);
    }

    if samples.len() < config.min_point_count {
        return Err(FitError::InsufficientSamples {
            found: samples.len(),
            required: config.min_point_count,
        });
    }

    check_spread(&samples, kind, config.degenerate_spread_m)?;

    Ok(PreparedSamples { samples, roi_count })
}

/// Lexicographic `(x, y, z, confidence)` order; untagged confidence sorts first.
fn canonical_order(a: &PointSample, b: &PointSample) -> Ordering {
    a.position
        .x
        .total_cmp(&b.position.x)
        .then(a.position.y.total_cmp(&b.position.y))
        .then(a.position.z.total_cmp(&b.position.z))
        .then_with(|| match (a.confidence, b.confidence) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.total_cmp(&y),
        })
}

fn check_spread(samples: &[PointSample], kind: PrimitiveKind, min_spread: f64) -> Result<(), FitError> {
    let moments = weighted_moments(samples.iter().map(|s| (&s.position, 1.0)))
        .ok_or_else(|| FitError::DegenerateGeometry("empty capture".to_string()))?;
    let spreads = moments.principal_spreads();
    match kind {
        PrimitiveKind::Line if spreads[0] < min_spread => Err(FitError::DegenerateGeometry(format!(
            "points are coincident (principal spread {:.2e} m < {min_spread} m)",
            spreads[0]
        ))),
        PrimitiveKind::Plane if spreads[1] < min_spread => Err(FitError::DegenerateGeometry(format!(
            "points are collinear or coincident (secondary spread {:.2e} m < {min_spread} m)",
            spreads[1]
        ))),
        _ => Ok(()),
    }
}

/// Drop points whose mean k-NN distance is unusually large.
///
/// Brute force; `max_point_count` bounds the quadratic cost. Per-point
/// statistics are computed in parallel but reduced sequentially, so the kept
/// set does not depend on thread scheduling.
pub fn remove_statistical_outliers(samples: Vec<PointSample>, filter: &OutlierFilter) -> Vec<PointSample> {
    let n = samples.len();
    if n < 2 {
        return samples;
    }
    let k = filter.neighbors.clamp(1, n - 1);

    let mean_knn: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let p = samples[i].position;
            let mut dists: Vec<f64> = samples
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, s)| (s.position - p).norm())
                .collect();
            dists.select_nth_unstable_by(k - 1, |a, b| a.total_cmp(b));
            dists[..k].iter().sum::<f64>() / k as f64
        })
        .collect();

    let mean = mean_knn.iter().sum::<f64>() / n as f64;
    let var = mean_knn.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
    let cutoff = mean + filter.std_ratio * var.sqrt();

    samples
        .into_iter()
        .zip(mean_knn)
        .filter(|(_, d)| *d <= cutoff)
        .map(|(s, _)| s)
        .collect()
}
