// fusion_core/src/estimation/filters/ukf.rs

use tracing::{debug, trace};

// --- Core Library Imports ---
use crate::config::UkfConfig;
use crate::error::{ConfigError, FilterError};
use crate::estimation::sigma_points::{ProcessNoise, SigmaPointGenerator};
use crate::estimation::ukf::{ukf_predict, ukf_update, Prediction, UkfMeasurementParams, UkfParams};
use crate::estimation::{ProcessOutcome, StateEstimator};
use crate::messages::{MeasurementData, MeasurementPackage, SensorType};
use crate::models::dynamics::CtrvModel;
use crate::models::measurement::{LidarModel, MeasurementModel, RadarModel};
use crate::state::FilterState;
use crate::types::{
    micros_to_seconds, Covariance, PredictedSigmaPoints, StateVector, TimestampUs, Weights,
};

/// The two lifecycle phases of the filter. There is no terminal phase.
#[derive(Debug, Clone, PartialEq)]
enum FilterPhase {
    Uninitialized,
    Tracking(FilterState),
}

/// Most recent NIS per sensor. Diagnostic only; never fed back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct NisRecord {
    lidar: Option<f64>,
    radar: Option<f64>,
    last: Option<SensorType>,
}

impl NisRecord {
    fn record(&mut self, sensor: SensorType, nis: f64) {
        match sensor {
            SensorType::Lidar => self.lidar = Some(nis),
            SensorType::Radar => self.radar = Some(nis),
        }
        self.last = Some(sensor);
    }

    fn get(&self, sensor: SensorType) -> Option<f64> {
        match sensor {
            SensorType::Lidar => self.lidar,
            SensorType::Radar => self.radar,
        }
    }
}

/// An unscented Kalman filter tracking one object with the CTRV model,
/// fusing lidar positions and radar range/bearing/range-rate readings.
///
/// One instance tracks one object. Calls must be serialized; the filter
/// holds no locks and shares nothing with other instances.
#[derive(Debug, Clone)]
pub struct UnscentedKalmanFilter {
    config: UkfConfig,
    generator: SigmaPointGenerator,
    motion: CtrvModel,
    lidar: LidarModel,
    radar: RadarModel,

    // --- Filter state ---
    phase: FilterPhase,
    /// Sigma points of the latest prediction, consumed by the update of the
    /// same cycle and overwritten by the next one.
    xsig_pred: PredictedSigmaPoints,
    nis: NisRecord,
}

impl UnscentedKalmanFilter {
    /// Validates the configuration and builds an uninitialized filter.
    pub fn new(config: UkfConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let generator = SigmaPointGenerator::new(config.lambda)?;
        let lidar = LidarModel::new(config.std_laspx, config.std_laspy);
        let radar = RadarModel::new(
            config.std_radr,
            config.std_radphi,
            config.std_radrd,
            config.degenerate_range,
        );

        Ok(Self {
            config,
            generator,
            motion: CtrvModel,
            lidar,
            radar,
            phase: FilterPhase::Uninitialized,
            xsig_pred: PredictedSigmaPoints::zeros(),
            nis: NisRecord::default(),
        })
    }

    pub fn config(&self) -> &UkfConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.phase, FilterPhase::Tracking(_))
    }

    pub fn state(&self) -> Result<&FilterState, FilterError> {
        match &self.phase {
            FilterPhase::Tracking(state) => Ok(state),
            FilterPhase::Uninitialized => Err(FilterError::UninitializedAccess),
        }
    }

    /// The state mean `x`.
    pub fn mean(&self) -> Result<&StateVector, FilterError> {
        self.state().map(|s| &s.x)
    }

    /// The state covariance `P`.
    pub fn covariance(&self) -> Result<&Covariance, FilterError> {
        self.state().map(|s| &s.p)
    }

    /// The NIS computed by the most recent update from `sensor`, if any.
    pub fn nis(&self, sensor: SensorType) -> Option<f64> {
        self.nis.get(sensor)
    }

    /// The sensor processed by the most recent update and its NIS.
    pub fn last_nis(&self) -> Option<(SensorType, f64)> {
        let sensor = self.nis.last?;
        self.nis.get(sensor).map(|nis| (sensor, nis))
    }

    /// Sigma points produced by the most recent prediction.
    pub fn predicted_sigma_points(&self) -> &PredictedSigmaPoints {
        &self.xsig_pred
    }

    pub fn weights(&self) -> &Weights {
        self.generator.weights()
    }

    /// Drops the estimate and all diagnostics.
    pub fn reset(&mut self) {
        self.phase = FilterPhase::Uninitialized;
        self.xsig_pred = PredictedSigmaPoints::zeros();
        self.nis = NisRecord::default();
    }

    /// Processes one measurement record.
    ///
    /// On error the filter is left exactly as it was before the call.
    pub fn process(&mut self, package: &MeasurementPackage) -> Result<ProcessOutcome, FilterError> {
        let sensor = package.sensor();
        if !self.config.is_enabled(sensor) {
            trace!(%sensor, "sensor disabled; ignoring record");
            return Ok(ProcessOutcome::Ignored { sensor });
        }

        if !self.is_initialized() {
            self.initialize(package);
            return Ok(ProcessOutcome::Initialized { sensor });
        }
        let state = self.state()?;

        // 1. PREDICT: Advance the state to the exact time of the measurement.
        let dt = Self::elapsed_seconds(state, package.timestamp_us)?;
        trace!(dt, "predicting");
        let prediction = ukf_predict(&state.x, &state.p, &self.params(), dt)?;

        // 2. UPDATE: Fuse the measurement with the matching sensor model.
        let (x, p, nis) = match &package.data {
            MeasurementData::Lidar(z) => self.update(&prediction, &self.lidar, z)?,
            MeasurementData::Radar(z) => self.update(&prediction, &self.radar, z)?,
        };
        debug!(%sensor, nis, "measurement fused");

        // 3. COMMIT: Nothing above touched `self`.
        self.phase = FilterPhase::Tracking(FilterState {
            x,
            p,
            timestamp_us: package.timestamp_us,
        });
        self.xsig_pred = prediction.sigma_points;
        self.nis.record(sensor, nis);

        Ok(ProcessOutcome::Updated { sensor, nis })
    }

    /// Runs a prediction alone, coasting the estimate `dt_seconds` forward
    /// without fusing a measurement.
    pub fn predict(&mut self, dt_seconds: f64) -> Result<(), FilterError> {
        let previous_us = self.state()?.timestamp_us;
        let invalid = FilterError::InvalidTimeStep {
            previous_us,
            dt_seconds,
        };

        let dt_us = (dt_seconds * 1e6).round();
        if !dt_us.is_finite() || dt_us.abs() >= TimestampUs::MAX as f64 {
            return Err(invalid);
        }
        let timestamp_us = previous_us
            .checked_add(dt_us as TimestampUs)
            .ok_or(invalid)?;
        if dt_seconds < 0.0 {
            return Err(FilterError::OutOfOrderMeasurement {
                previous_us,
                timestamp_us,
            });
        }
        self.coast(dt_seconds, timestamp_us)
    }

    /// Like [`Self::predict`], but advances to an absolute timestamp.
    pub fn predict_to(&mut self, timestamp_us: TimestampUs) -> Result<(), FilterError> {
        let dt = Self::elapsed_seconds(self.state()?, timestamp_us)?;
        self.coast(dt, timestamp_us)
    }

    // --- Private Helper Methods ---

    fn params(&self) -> UkfParams<'_> {
        UkfParams {
            generator: &self.generator,
            motion: &self.motion,
            noise: ProcessNoise {
                std_a: self.config.std_a,
                std_yawdd: self.config.std_yawdd,
            },
        }
    }

    fn coast(&mut self, dt: f64, timestamp_us: TimestampUs) -> Result<(), FilterError> {
        let state = self.state()?;
        let prediction = ukf_predict(&state.x, &state.p, &self.params(), dt)?;
        trace!(dt, "coasting without a measurement");

        self.phase = FilterPhase::Tracking(FilterState {
            x: prediction.x,
            p: prediction.p,
            timestamp_us,
        });
        self.xsig_pred = prediction.sigma_points;
        Ok(())
    }

    fn initialize(&mut self, package: &MeasurementPackage) {
        let x = match &package.data {
            MeasurementData::Lidar(z) => self.lidar.initial_state(z),
            MeasurementData::Radar(z) => self.radar.initial_state(z),
        };
        debug!(sensor = %package.sensor(), ?x, "filter initialized");

        self.phase = FilterPhase::Tracking(FilterState::with_unit_covariance(
            x,
            package.timestamp_us,
        ));
    }

    fn update<const M: usize, H: MeasurementModel<M>>(
        &self,
        prediction: &Prediction,
        model: &H,
        z: &nalgebra::SVector<f64, M>,
    ) -> Result<(StateVector, Covariance, f64), FilterError> {
        let correction = ukf_update(prediction, &self.params(), &UkfMeasurementParams { model, z })?;
        Ok((correction.x, correction.p, correction.nis))
    }

    fn elapsed_seconds(state: &FilterState, timestamp_us: TimestampUs) -> Result<f64, FilterError> {
        if timestamp_us < state.timestamp_us {
            return Err(FilterError::OutOfOrderMeasurement {
                previous_us: state.timestamp_us,
                timestamp_us,
            });
        }
        let elapsed_us = timestamp_us.checked_sub(state.timestamp_us).ok_or_else(|| {
            FilterError::InvalidTimeStep {
                previous_us: state.timestamp_us,
                dt_seconds: (timestamp_us as f64 - state.timestamp_us as f64) / 1.0e6,
            }
        })?;
        Ok(micros_to_seconds(elapsed_us))
    }
}

// --- The Public Trait Implementation ---
impl StateEstimator for UnscentedKalmanFilter {
    fn process(&mut self, package: &MeasurementPackage) -> Result<ProcessOutcome, FilterError> {
        UnscentedKalmanFilter::process(self, package)
    }

    fn state(&self) -> Result<&FilterState, FilterError> {
        UnscentedKalmanFilter::state(self)
    }

    fn reset(&mut self) {
        UnscentedKalmanFilter::reset(self)
    }
}
