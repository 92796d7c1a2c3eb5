// fusion_core/src/estimation/sigma_points.rs

use nalgebra::{SMatrix, SVector};

use crate::config::LambdaConvention;
use crate::error::{ConfigError, FilterError};
use crate::state::layout::{NU_ACCEL, NU_YAW_ACCEL};
use crate::types::{
    AugmentedCovariance, AugmentedSigmaPoints, AugmentedVector, Covariance, StateVector, Weights,
    N_AUG, N_SIGMA, N_X,
};
use crate::utils::linalg::psd_cholesky;

/// Standard deviations of the two process-noise terms appended to the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessNoise {
    /// Longitudinal acceleration, m/s^2.
    pub std_a: f64,
    /// Yaw acceleration, rad/s^2.
    pub std_yawdd: f64,
}

/// Draws the `2 * n_aug + 1` sigma points of the augmented state and owns
/// their weights. Both `lambda` and the weights are fixed at construction.
#[derive(Debug, Clone)]
pub struct SigmaPointGenerator {
    lambda: f64,
    weights: Weights,
}

impl SigmaPointGenerator {
    pub fn new(convention: LambdaConvention) -> Result<Self, ConfigError> {
        Self::with_lambda(convention.lambda())
    }

    pub fn with_lambda(lambda: f64) -> Result<Self, ConfigError> {
        if !lambda.is_finite() {
            return Err(ConfigError::NonFiniteParameter {
                name: "lambda",
                value: lambda,
            });
        }
        let denom = lambda + N_AUG as f64;
        if denom <= 0.0 {
            return Err(ConfigError::InvalidScaling {
                lambda,
                n_aug: N_AUG,
            });
        }

        // Calculate the weights for the 2n+1 sigma points.
        let mut weights = Weights::from_element(0.5 / denom);
        weights[0] = lambda / denom;

        Ok(Self { lambda, weights })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// The distance factor `sqrt(lambda + n_aug)` applied to each column of
    /// the covariance square root.
    pub fn spread(&self) -> f64 {
        (self.lambda + N_AUG as f64).sqrt()
    }

    /// Appends the zero-mean noise terms to the state:
    /// `x_aug = [x, 0, 0]`, `P_aug = blockdiag(P, std_a^2, std_yawdd^2)`.
    pub fn augment(
        x: &StateVector,
        p: &Covariance,
        noise: &ProcessNoise,
    ) -> (AugmentedVector, AugmentedCovariance) {
        let mut x_aug = AugmentedVector::zeros();
        x_aug.fixed_rows_mut::<N_X>(0).copy_from(x);

        let mut p_aug = AugmentedCovariance::zeros();
        p_aug.fixed_view_mut::<N_X, N_X>(0, 0).copy_from(p);
        p_aug[(NU_ACCEL, NU_ACCEL)] = noise.std_a * noise.std_a;
        p_aug[(NU_YAW_ACCEL, NU_YAW_ACCEL)] = noise.std_yawdd * noise.std_yawdd;

        (x_aug, p_aug)
    }

    /// Generates the augmented sigma points for the given mean and covariance.
    ///
    /// Column 0 is the mean; columns `i + 1` and `i + 1 + n_aug` sit at
    /// `+-sqrt(lambda + n_aug)` times column `i` of the lower-triangular square
    /// root of `P_aug`.
    pub fn generate(
        &self,
        x: &StateVector,
        p: &Covariance,
        noise: &ProcessNoise,
    ) -> Result<AugmentedSigmaPoints, FilterError> {
        let (x_aug, p_aug) = Self::augment(x, p, noise);

        // Cholesky-style square root: P_aug = L * L^T.
        let l_matrix = psd_cholesky(&p_aug).ok_or(FilterError::SingularCovariance)?;
        let scaled_l = l_matrix * self.spread();

        let mut sigma_points = AugmentedSigmaPoints::zeros();
        sigma_points.set_column(0, &x_aug);
        for i in 0..N_AUG {
            sigma_points.set_column(i + 1, &(x_aug + scaled_l.column(i)));
            sigma_points.set_column(i + 1 + N_AUG, &(x_aug - scaled_l.column(i)));
        }

        Ok(sigma_points)
    }
}

/// Weighted mean of a set of sigma points: `sum(w_i * X_i)`.
pub fn weighted_mean<const R: usize>(
    points: &SMatrix<f64, R, N_SIGMA>,
    weights: &Weights,
) -> SVector<f64, R> {
    points * weights
}

/// Weighted covariance `sum(w_i * r_i * r_i^T)` with `r_i = residual(X_i, mean)`.
///
/// The residual function is applied to every term separately so angular
/// components are wrapped per sigma point.
pub fn weighted_covariance<const R: usize>(
    points: &SMatrix<f64, R, N_SIGMA>,
    mean: &SVector<f64, R>,
    weights: &Weights,
    residual: impl Fn(&SVector<f64, R>, &SVector<f64, R>) -> SVector<f64, R>,
) -> SMatrix<f64, R, R> {
    points
        .column_iter()
        .zip(weights.iter())
        .fold(SMatrix::<f64, R, R>::zeros(), |acc, (column, &w)| {
            let diff = residual(&column.into_owned(), mean);
            acc + diff * diff.transpose() * w
        })
}

/// Weighted cross-covariance `sum(w_i * a_i * b_i^T)` between two sigma point
/// sets that share the same weights.
pub fn weighted_cross_covariance<const R: usize, const C: usize>(
    (a_points, a_mean): (&SMatrix<f64, R, N_SIGMA>, &SVector<f64, R>),
    (b_points, b_mean): (&SMatrix<f64, C, N_SIGMA>, &SVector<f64, C>),
    weights: &Weights,
    a_residual: impl Fn(&SVector<f64, R>, &SVector<f64, R>) -> SVector<f64, R>,
    b_residual: impl Fn(&SVector<f64, C>, &SVector<f64, C>) -> SVector<f64, C>,
) -> SMatrix<f64, R, C> {
    a_points
        .column_iter()
        .zip(b_points.column_iter())
        .zip(weights.iter())
        .fold(SMatrix::<f64, R, C>::zeros(), |acc, ((a, b), &w)| {
            let da = a_residual(&a.into_owned(), a_mean);
            let db = b_residual(&b.into_owned(), b_mean);
            acc + da * db.transpose() * w
        })
}
