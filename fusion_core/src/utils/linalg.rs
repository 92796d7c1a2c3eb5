// fusion_core/src/utils/linalg.rs

use nalgebra::{Cholesky, SMatrix};

/// Relative tolerance under which a Cholesky pivot counts as zero.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Lower-triangular `L` with `L * L^T = A` for a symmetric positive
/// semi-definite `A`.
///
/// Positive definite input goes through `nalgebra::Cholesky`. Only when that
/// fails is a zero pivot accepted: the matching column of `L` is zeroed, as a
/// variance of zero calls for (for example a disabled process-noise term).
/// Returns `None` for a non-finite matrix or one with a clearly negative pivot.
pub fn psd_cholesky<const N: usize>(a: &SMatrix<f64, N, N>) -> Option<SMatrix<f64, N, N>> {
    if a.iter().any(|v| !v.is_finite()) {
        return None;
    }
    if let Some(chol) = Cholesky::new(*a) {
        return Some(chol.l());
    }

    let scale = a.diagonal().iter().fold(1.0_f64, |acc, d| acc.max(d.abs()));
    let tol = PIVOT_TOLERANCE * scale;
    let mut l = SMatrix::<f64, N, N>::zeros();

    for j in 0..N {
        let pivot = a[(j, j)] - (0..j).map(|k| l[(j, k)] * l[(j, k)]).sum::<f64>();
        if pivot < -tol {
            return None;
        }

        if pivot <= tol {
            // Zero variance along this direction: the rest of the column must
            // vanish too, or `A` was not semi-definite after all.
            for i in (j + 1)..N {
                let off = a[(i, j)] - (0..j).map(|k| l[(i, k)] * l[(j, k)]).sum::<f64>();
                if off.abs() > tol.sqrt() {
                    return None;
                }
            }
            continue;
        }

        let diag = pivot.sqrt();
        l[(j, j)] = diag;
        for i in (j + 1)..N {
            let off = a[(i, j)] - (0..j).map(|k| l[(i, k)] * l[(j, k)]).sum::<f64>();
            l[(i, j)] = off / diag;
        }
    }

    Some(l)
}

/// Forces exact symmetry, `(A + A^T) / 2`.
pub fn symmetrize<const N: usize>(a: &SMatrix<f64, N, N>) -> SMatrix<f64, N, N> {
    (a + a.transpose()) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    #[test]
    fn matches_regular_cholesky_for_positive_definite_input() {
        let a = Matrix3::new(4.0, 2.0, 0.6, 2.0, 5.0, 1.0, 0.6, 1.0, 3.0);
        let l = psd_cholesky(&a).unwrap();
        assert_eq!(l, a.cholesky().unwrap().l());
        assert_relative_eq!(l * l.transpose(), a, epsilon = 1e-12);
    }

    #[test]
    fn accepts_zero_variance_directions() {
        let a = Matrix3::new(2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let l = psd_cholesky(&a).unwrap();
        assert_eq!(l[(1, 1)], 0.0);
        assert_relative_eq!(l * l.transpose(), a, epsilon = 1e-12);
    }

    #[test]
    fn rejects_indefinite_and_non_finite_input() {
        let indefinite = Matrix3::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0);
        assert!(psd_cholesky(&indefinite).is_none());

        let coupled_zero = Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.5, 1.0);
        assert!(psd_cholesky(&coupled_zero).is_none());

        let mut nan = Matrix3::identity();
        nan[(2, 0)] = f64::NAN;
        assert!(psd_cholesky(&nan).is_none());
    }

    #[test]
    fn symmetrize_averages_off_diagonal_terms() {
        let a = Matrix3::new(1.0, 2.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let s = symmetrize(&a);
        assert_eq!(s[(0, 1)], 1.0);
        assert_eq!(s[(1, 0)], 1.0);
    }
}
