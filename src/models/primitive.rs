//! Line and plane primitives.
//!
//! The fitter relies on three operations per kind:
//! - build a candidate from a minimal sample (closed form)
//! - build a refined primitive from weighted moments (total least squares)
//! - perpendicular distance of a point to the primitive
//!
//! These are implemented here for each primitive kind.

use nalgebra::Vector3;

use crate::domain::{NORM_EPS, PrimitiveKind};
use crate::error::FitError;
use crate::math::Moments;

/// A fitted line or plane. Directions and normals are always unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Line {
        point: Vector3<f64>,
        direction: Vector3<f64>,
    },
    Plane {
        point: Vector3<f64>,
        normal: Vector3<f64>,
    },
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Line { .. } => PrimitiveKind::Line,
            Primitive::Plane { .. } => PrimitiveKind::Plane,
        }
    }

    /// Anchor point on the primitive.
    pub fn point(&self) -> Vector3<f64> {
        match self {
            Primitive::Line { point, .. } | Primitive::Plane { point, .. } => *point,
        }
    }

    /// Line axis or plane normal.
    pub fn principal_direction(&self) -> Vector3<f64> {
        match self {
            Primitive::Line { direction, .. } => *direction,
            Primitive::Plane { normal, .. } => *normal,
        }
    }

    /// Perpendicular distance from `p` to the primitive.
    pub fn distance(&self, p: &Vector3<f64>) -> f64 {
        match self {
            Primitive::Line { point, direction } => (p - point).cross(direction).norm(),
            Primitive::Plane { point, normal } => (p - point).dot(normal).abs(),
        }
    }

    /// Closed-form fit through a minimal sample.
    ///
    /// Returns `None` when the sample is degenerate: coincident points for a
    /// line, or (nearly) collinear points for a plane.
    ///
    /// # Panics
    /// Panics if `sample` is shorter than `kind.minimal_sample_size()`.
    pub fn from_minimal_sample(kind: PrimitiveKind, sample: &[Vector3<f64>]) -> Option<Primitive> {
        match kind {
            PrimitiveKind::Line => {
                let axis = sample[1] - sample[0];
                let span = axis.norm();
                if !(span >= NORM_EPS) {
                    return None;
                }
                Some(Primitive::Line {
                    point: sample[0],
                    direction: axis / span,
                })
            }
            PrimitiveKind::Plane => {
                let e1 = sample[1] - sample[0];
                let e2 = sample[2] - sample[0];
                let (l1, l2) = (e1.norm(), e2.norm());
                if !(l1 >= NORM_EPS && l2 >= NORM_EPS) {
                    return None;
                }
                let cross = e1.cross(&e2);
                let area = cross.norm();
                // |e1 × e2| = |e1||e2| sin θ; reject near-collinear triples.
                if !(area >= NORM_EPS * l1 * l2) {
                    return None;
                }
                Some(Primitive::Plane {
                    point: sample[0],
                    normal: cross / area,
                })
            }
        }
    }

    /// Total-least-squares primitive from the moments of a point set.
    ///
    /// A line takes the axis of largest spread, a plane the axis of smallest.
    /// Fails with `DegenerateGeometry` when the spread that defines the
    /// primitive is below `min_spread` (rank-deficient covariance).
    pub fn from_moments(kind: PrimitiveKind, moments: &Moments, min_spread: f64) -> Result<Primitive, FitError> {
        let eig = moments.principal_axes();
        let spread = |value: f64| value.max(0.0).sqrt();
        match kind {
            PrimitiveKind::Line => {
                let (value, direction) = eig.largest();
                if spread(value) < min_spread {
                    return Err(FitError::DegenerateGeometry(format!(
                        "inliers are coincident (principal spread {:.2e} m)",
                        spread(value)
                    )));
                }
                Ok(Primitive::Line {
                    point: moments.centroid,
                    direction,
                })
            }
            PrimitiveKind::Plane => {
                let (middle, _) = eig.middle();
                if spread(middle) < min_spread {
                    return Err(FitError::DegenerateGeometry(format!(
                        "inliers are collinear (secondary spread {:.2e} m)",
                        spread(middle)
                    )));
                }
                let (_, normal) = eig.smallest();
                Ok(Primitive::Plane {
                    point: moments.centroid,
                    normal,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::moments;
    use approx::assert_relative_eq;

    #[test]
    fn line_distance_is_perpendicular() {
        let line = Primitive::from_minimal_sample(
            PrimitiveKind::Line,
            &[Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 2.0)],
        )
        .unwrap();
        assert_relative_eq!(line.distance(&Vector3::new(3.0, 4.0, 10.0)), 5.0, epsilon = 1e-12);
        assert_relative_eq!(line.principal_direction().z, 1.0);
    }

    #[test]
    fn plane_from_three_points() {
        let plane = Primitive::from_minimal_sample(
            PrimitiveKind::Plane,
            &[
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(1.0, 0.0, 1.0),
                Vector3::new(0.0, 1.0, 1.0),
            ],
        )
        .unwrap();
        assert_relative_eq!(plane.principal_direction().z.abs(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.distance(&Vector3::new(5.0, -2.0, 1.25)), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_minimal_samples_are_rejected() {
        let p = Vector3::new(0.1, 0.2, 0.3);
        assert!(Primitive::from_minimal_sample(PrimitiveKind::Line, &[p, p]).is_none());
        let collinear = [p, p * 2.0, p * 3.0];
        assert!(Primitive::from_minimal_sample(PrimitiveKind::Plane, &collinear).is_none());
    }

    #[test]
    fn refined_plane_uses_smallest_axis() {
        let mut pts = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                pts.push(Vector3::new(i as f64 * 0.01, j as f64 * 0.01, 0.5));
            }
        }
        let m = moments(&pts).unwrap();
        let plane = Primitive::from_moments(PrimitiveKind::Plane, &m, 1e-3).unwrap();
        assert_relative_eq!(plane.principal_direction().z.abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(plane.point().z, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn refined_plane_on_a_segment_is_degenerate() {
        let pts: Vec<Vector3<f64>> = (0..50).map(|i| Vector3::new(i as f64 * 0.01, 0.0, 0.0)).collect();
        let m = moments(&pts).unwrap();
        assert!(matches!(
            Primitive::from_moments(PrimitiveKind::Plane, &m, 1e-3),
            Err(FitError::DegenerateGeometry(_))
        ));
        assert!(Primitive::from_moments(PrimitiveKind::Line, &m, 1e-3).is_ok());
    }
}
