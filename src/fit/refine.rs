//! Least-squares refinement of a RANSAC winner.
//!
//! - point = confidence-weighted centroid of the inliers
//! - line: direction = eigenvector of the largest covariance eigenvalue
//! - plane: normal = eigenvector of the smallest covariance eigenvalue
//!
//! followed by exactly one consensus pass against the refined primitive.

use nalgebra::Vector3;

use crate::domain::{PointSample, PrimitiveKind};
use crate::error::FitError;
use crate::math::weighted_moments;
use crate::models::Primitive;

/// Refit `kind` to `samples[inliers]` by total least squares.
///
/// Falls back to uniform weights when every inlier carries zero confidence.
pub fn refine_primitive(
    kind: PrimitiveKind,
    samples: &[PointSample],
    inliers: &[usize],
    min_spread: f64,
) -> Result<Primitive, FitError> {
    let weighted = inliers.iter().map(|&i| (&samples[i].position, samples[i].weight()));
    let uniform = inliers.iter().map(|&i| (&samples[i].position, 1.0));

    let moments = weighted_moments(weighted)
        .or_else(|| weighted_moments(uniform))
        .ok_or_else(|| FitError::DegenerateGeometry("refinement received no inliers".to_string()))?;

    Primitive::from_moments(kind, &moments, min_spread)
}

/// Inlier indices and their residuals against `primitive`.
pub fn consensus(primitive: &Primitive, points: &[Vector3<f64>], threshold: f64) -> (Vec<usize>, Vec<f64>) {
    let mut inliers = Vec::new();
    let mut residuals = Vec::new();
    for (i, p) in points.iter().enumerate() {
        let d = primitive.distance(p);
        if d <= threshold {
            inliers.push(i);
            residuals.push(d);
        }
    }
    (inliers, residuals)
}
