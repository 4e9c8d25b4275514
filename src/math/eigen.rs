//! Cyclic Jacobi eigensolver for symmetric 3×3 matrices.
//!
//! Covariance matrices of point sets are always 3×3 and symmetric, so a
//! handful of Jacobi sweeps converge to machine precision and the result is
//! deterministic (fixed rotation order, no pivoting heuristics).
//!
//! Each rotation `P(p, q, θ)` zeroes `a_pq` using the numerically stable
//! small-root form of `t = tan θ`:
//!
//! ```text
//! θ = (a_qq - a_pp) / (2 a_pq)
//! t = sgn(θ) / (|θ| + sqrt(θ² + 1))
//! c = 1 / sqrt(t² + 1),  s = t c
//! ```

use nalgebra::{Matrix3, Vector3};

const MAX_SWEEPS: usize = 64;
const PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Eigen-decomposition with eigenvalues sorted in descending order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetricEigen3 {
    pub values: [f64; 3],
    /// Unit eigenvectors; `vectors[i]` belongs to `values[i]`.
    pub vectors: [Vector3<f64>; 3],
}

impl SymmetricEigen3 {
    pub fn largest(&self) -> (f64, Vector3<f64>) {
        (self.values[0], self.vectors[0])
    }

    pub fn middle(&self) -> (f64, Vector3<f64>) {
        (self.values[1], self.vectors[1])
    }

    pub fn smallest(&self) -> (f64, Vector3<f64>) {
        (self.values[2], self.vectors[2])
    }
}

/// Diagonalize a symmetric matrix. Only the upper triangle is read.
pub fn symmetric_eigen3(m: &Matrix3<f64>) -> SymmetricEigen3 {
    let mut a = *m;
    a.fill_lower_triangle_with_upper_triangle();
    let mut v = Matrix3::<f64>::identity();

    let scale = a.norm();
    if scale > 0.0 && scale.is_finite() {
        for _ in 0..MAX_SWEEPS {
            let off = (a[(0, 1)].powi(2) + a[(0, 2)].powi(2) + a[(1, 2)].powi(2)).sqrt();
            if off <= f64::EPSILON * scale {
                break;
            }
            for &(p, q) in &PAIRS {
                let apq = a[(p, q)];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                let mut rot = Matrix3::<f64>::identity();
                rot[(p, p)] = c;
                rot[(q, q)] = c;
                rot[(p, q)] = s;
                rot[(q, p)] = -s;

                a = rot.transpose() * a * rot;
                // Kill rounding residue so symmetry is exact.
                a[(p, q)] = 0.0;
                a[(q, p)] = 0.0;
                v *= rot;
            }
        }
    }

    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| a[(j, j)].total_cmp(&a[(i, i)]));

    SymmetricEigen3 {
        values: order.map(|i| a[(i, i)]),
        vectors: order.map(|i| v.column(i).into_owned().normalize()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    #[test]
    fn diagonal_matrix_sorts_descending() {
        let m = Matrix3::from_diagonal(&Vector3::new(1.0, 5.0, 3.0));
        let eig = symmetric_eigen3(&m);
        assert_eq!(eig.values, [5.0, 3.0, 1.0]);
        assert_relative_eq!(eig.vectors[0].y.abs(), 1.0);
        assert_relative_eq!(eig.vectors[2].x.abs(), 1.0);
    }

    #[test]
    fn recovers_rotated_spectrum() {
        let r = Rotation3::from_euler_angles(0.3, -0.7, 1.1);
        let d = Matrix3::from_diagonal(&Vector3::new(4.0, 2.0, 0.5));
        let m = r.matrix() * d * r.matrix().transpose();

        let eig = symmetric_eigen3(&m);
        assert_relative_eq!(eig.values[0], 4.0, epsilon = 1e-12);
        assert_relative_eq!(eig.values[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(eig.values[2], 0.5, epsilon = 1e-12);

        for (value, vector) in eig.values.iter().zip(eig.vectors.iter()) {
            let residual = m * vector - vector * *value;
            assert!(residual.norm() < 1e-10, "residual {residual}");
            assert_relative_eq!(vector.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rank_one_matrix_has_two_zero_eigenvalues() {
        let u = Vector3::new(1.0, 2.0, 2.0) / 3.0;
        let m = u * u.transpose();
        let eig = symmetric_eigen3(&m);
        assert_relative_eq!(eig.values[0], 1.0, epsilon = 1e-12);
        assert!(eig.values[1].abs() < 1e-12);
        assert!(eig.values[2].abs() < 1e-12);
        assert_relative_eq!(eig.vectors[0].dot(&u).abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn lower_triangle_is_ignored() {
        let upper = Matrix3::new(2.0, 1.0, 0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 1.0);
        let mut junk = upper;
        junk[(1, 0)] = 99.0;
        junk[(2, 0)] = -7.0;
        assert_eq!(symmetric_eigen3(&junk), symmetric_eigen3(&upper));
        assert_relative_eq!(symmetric_eigen3(&upper).values[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_matrix_is_identity_basis() {
        let eig = symmetric_eigen3(&Matrix3::zeros());
        assert_eq!(eig.values, [0.0; 3]);
        for v in eig.vectors {
            assert_relative_eq!(v.norm(), 1.0);
        }
    }
}
