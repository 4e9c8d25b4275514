//! Weighted first and second moments of 3D point sets.
//!
//! Used both by the degeneracy check on raw captures and by the
//! total-least-squares refinement of RANSAC winners.

use nalgebra::{Matrix3, Vector3};

use super::eigen::{SymmetricEigen3, symmetric_eigen3};

/// Weighted centroid and (population) covariance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub centroid: Vector3<f64>,
    pub covariance: Matrix3<f64>,
}

impl Moments {
    pub fn principal_axes(&self) -> SymmetricEigen3 {
        symmetric_eigen3(&self.covariance)
    }

    /// Standard deviations along the principal axes, largest first.
    pub fn principal_spreads(&self) -> [f64; 3] {
        self.principal_axes().values.map(|v| v.max(0.0).sqrt())
    }
}

/// Compute weighted moments in two passes (centroid, then centered scatter).
///
/// Returns `None` for an empty input or a non-positive total weight.
pub fn weighted_moments<'a, I>(items: I) -> Option<Moments>
where
    I: Iterator<Item = (&'a Vector3<f64>, f64)> + Clone,
{
    let mut total_weight = 0.0;
    let mut sum = Vector3::zeros();
    for (p, w) in items.clone() {
        total_weight += w;
        sum += p * w;
    }
    if !(total_weight > 0.0 && total_weight.is_finite()) {
        return None;
    }
    let centroid = sum / total_weight;

    let mut covariance = Matrix3::zeros();
    for (p, w) in items {
        let d = p - centroid;
        covariance += d * d.transpose() * w;
    }
    covariance /= total_weight;

    Some(Moments { centroid, covariance })
}

/// Unweighted convenience wrapper.
pub fn moments(points: &[Vector3<f64>]) -> Option<Moments> {
    weighted_moments(points.iter().map(|p| (p, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centroid_respects_weights() {
        let pts = [Vector3::new(0.0, 0.0, 0.0), Vector3::new(4.0, 0.0, 0.0)];
        let m = weighted_moments(pts.iter().zip([3.0, 1.0])).unwrap();
        assert_relative_eq!(m.centroid.x, 1.0);
        // Population variance about the weighted mean: (3 * 1 + 1 * 9) / 4.
        assert_relative_eq!(m.covariance[(0, 0)], 3.0);
    }

    #[test]
    fn spreads_of_a_segment() {
        let pts: Vec<Vector3<f64>> = (0..=10).map(|i| Vector3::new(0.0, 0.0, i as f64 * 0.1)).collect();
        let spreads = moments(&pts).unwrap().principal_spreads();
        assert!(spreads[0] > 0.3);
        assert!(spreads[1] < 1e-9);
        assert!(spreads[2] < 1e-9);
    }

    #[test]
    fn empty_or_weightless_input_has_no_moments() {
        assert!(moments(&[]).is_none());
        let pts = [Vector3::new(1.0, 2.0, 3.0)];
        assert!(weighted_moments(pts.iter().zip([0.0])).is_none());
    }
}
