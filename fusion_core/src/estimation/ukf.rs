// fusion_core/src/estimation/ukf.rs

use nalgebra::{Cholesky, SMatrix, SVector};

use crate::error::FilterError;
use crate::estimation::sigma_points::{
    weighted_covariance, weighted_cross_covariance, weighted_mean, ProcessNoise,
    SigmaPointGenerator,
};
use crate::models::dynamics::MotionModel;
use crate::models::measurement::MeasurementModel;
use crate::types::{
    Covariance, MeasurementSigmaPoints, PredictedSigmaPoints, StateVector, N_X,
};
use crate::utils::linalg::symmetrize;

/// A container for the parameters shared by the UKF prediction and update steps.
pub struct UkfParams<'a> {
    pub generator: &'a SigmaPointGenerator,
    pub motion: &'a dyn MotionModel,
    pub noise: ProcessNoise,
}

/// A container for the parameters needed by the UKF update step.
pub struct UkfMeasurementParams<'a, const M: usize, H: MeasurementModel<M>> {
    pub model: &'a H,
    pub z: &'a SVector<f64, M>,
}

/// The outcome of a prediction: the predicted moments plus the propagated
/// sigma points the following update must reuse.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub x: StateVector,
    pub p: Covariance,
    pub sigma_points: PredictedSigmaPoints,
}

/// The predicted sigma points mapped through a measurement model.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPrediction<const M: usize> {
    /// Predicted measurement mean.
    pub z_pred: SVector<f64, M>,
    /// Innovation covariance `S`, measurement noise included.
    pub s: SMatrix<f64, M, M>,
    /// State/measurement cross-covariance `Tc`.
    pub tc: SMatrix<f64, N_X, M>,
}

/// The corrected state after fusing one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction<const M: usize> {
    pub x: StateVector,
    pub p: Covariance,
    /// Observed minus predicted measurement, angles wrapped.
    pub innovation: SVector<f64, M>,
    /// Normalized innovation squared, `y^T S^-1 y`.
    pub nis: f64,
}

/// PURE FUNCTION: Performs one UKF prediction step.
///
/// Draws augmented sigma points from `(x, p)`, pushes each through the motion
/// model and reduces them back into a predicted mean and covariance.
pub fn ukf_predict(
    x: &StateVector,
    p: &Covariance,
    params: &UkfParams,
    dt: f64,
) -> Result<Prediction, FilterError> {
    let augmented = params.generator.generate(x, p, &params.noise)?;

    // --- Propagate each point through the NON-LINEAR motion model ---
    let mut sigma_points = PredictedSigmaPoints::zeros();
    for (i, column) in augmented.column_iter().enumerate() {
        let propagated = params.motion.propagate(&column.into_owned(), dt);
        sigma_points.set_column(i, &propagated);
    }

    // --- Recover the predicted mean and covariance ---
    let weights = params.generator.weights();
    let x_pred = params.motion.normalize(weighted_mean(&sigma_points, weights));
    let p_pred = weighted_covariance(&sigma_points, &x_pred, weights, |a, b| {
        params.motion.residual(a, b)
    });

    Ok(Prediction {
        x: x_pred,
        p: symmetrize(&p_pred),
        sigma_points,
    })
}

/// PURE FUNCTION: Projects the predicted sigma points into a sensor's
/// measurement space and computes `z_pred`, `S` and `Tc`.
pub fn predict_measurement<const M: usize, H: MeasurementModel<M>>(
    prediction: &Prediction,
    params: &UkfParams,
    model: &H,
) -> Result<MeasurementPrediction<M>, FilterError> {
    let mut z_sigma = MeasurementSigmaPoints::<M>::zeros();
    for (i, column) in prediction.sigma_points.column_iter().enumerate() {
        z_sigma.set_column(i, &model.project(&column.into_owned())?);
    }

    let weights = params.generator.weights();
    let z_pred = model.mean(&z_sigma, weights);
    let s = weighted_covariance(&z_sigma, &z_pred, weights, |a, b| model.residual(a, b))
        + model.noise_covariance();
    let tc = weighted_cross_covariance(
        (&prediction.sigma_points, &prediction.x),
        (&z_sigma, &z_pred),
        weights,
        |a, b| params.motion.residual(a, b),
        |a, b| model.residual(a, b),
    );

    Ok(MeasurementPrediction { z_pred, s, tc })
}

/// PURE FUNCTION: Performs one UKF measurement update step.
/// Takes a prediction and returns the corrected state. It has no side effects.
pub fn ukf_update<const M: usize, H: MeasurementModel<M>>(
    prediction: &Prediction,
    params: &UkfParams,
    measurement: &UkfMeasurementParams<M, H>,
) -> Result<Correction<M>, FilterError> {
    let model = measurement.model;
    let MeasurementPrediction { z_pred, s, tc } = predict_measurement(prediction, params, model)?;

    // S is symmetric positive definite unless something went badly wrong.
    let s_chol = Cholesky::new(s).ok_or(FilterError::SingularInnovation { sensor: H::SENSOR })?;

    let innovation = model.residual(measurement.z, &z_pred);

    // K = Tc * S^-1, computed as (S^-1 * Tc^T)^T since S is symmetric.
    let k_gain = s_chol.solve(&tc.transpose()).transpose();

    let x = params.motion.normalize(prediction.x + k_gain * innovation);
    let p = symmetrize(&(prediction.p - k_gain * s * k_gain.transpose()));
    let nis = innovation.dot(&s_chol.solve(&innovation)).max(0.0);

    Ok(Correction {
        x,
        p,
        innovation,
        nis,
    })
}
