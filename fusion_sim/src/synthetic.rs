// fusion_sim/src/synthetic.rs

use nalgebra::Vector4;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use fusion_core::config::UkfConfig;
use fusion_core::messages::MeasurementPackage;
use fusion_core::models::dynamics::{CtrvModel, MotionModel};
use fusion_core::models::measurement::RadarModel;
use fusion_core::state::layout::{PX, PY, SPEED, YAW};
use fusion_core::types::{micros_to_seconds, AugmentedVector, StateVector, N_X};
use fusion_core::utils::angles::normalize_angle;

use crate::config::ScenarioConfig;
use crate::error::SimError;
use crate::records::Record;

/// Zero-mean Gaussian noise for every measured channel.
struct SensorNoise {
    lidar: [Normal<f64>; 2],
    radar: [Normal<f64>; 3],
}

impl SensorNoise {
    fn new(filter: &UkfConfig) -> Result<Self, SimError> {
        let normal = |std: f64| {
            Normal::new(0.0, std).map_err(|e| SimError::InvalidScenario(e.to_string()))
        };
        Ok(Self {
            lidar: [normal(filter.std_laspx)?, normal(filter.std_laspy)?],
            radar: [
                normal(filter.std_radr)?,
                normal(filter.std_radphi)?,
                normal(filter.std_radrd)?,
            ],
        })
    }
}

/// A noise-free CTRV target observed by a noisy lidar and radar, producing
/// records that alternate between the two, lidar first.
///
/// The sensors use the same noise levels the filter is configured with, so
/// a consistent filter should see NIS values following the chi-square law.
pub struct SyntheticTrack {
    rng: ChaCha8Rng,
    noise: SensorNoise,
    motion: CtrvModel,
    truth: StateVector,
    dt: f64,
    dt_us: i64,
    step: usize,
}

impl SyntheticTrack {
    pub fn new(scenario: &ScenarioConfig, filter: &UkfConfig) -> Result<Self, SimError> {
        scenario.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(scenario.seed),
            noise: SensorNoise::new(filter)?,
            motion: CtrvModel,
            truth: StateVector::new(
                scenario.px,
                scenario.py,
                scenario.speed,
                scenario.yaw,
                scenario.yaw_rate,
            ),
            dt: micros_to_seconds(scenario.dt_us),
            dt_us: scenario.dt_us,
            step: 0,
        })
    }

    pub fn truth(&self) -> &StateVector {
        &self.truth
    }

    fn ground_truth(&self) -> Vector4<f64> {
        let (v, yaw) = (self.truth[SPEED], self.truth[YAW]);
        Vector4::new(self.truth[PX], self.truth[PY], v * yaw.cos(), v * yaw.sin())
    }

    fn measure(&mut self) -> MeasurementPackage {
        let timestamp_us = self.step as i64 * self.dt_us;
        let (px, py, v, yaw) = (
            self.truth[PX],
            self.truth[PY],
            self.truth[SPEED],
            self.truth[YAW],
        );

        if self.step % 2 == 0 {
            let [nx, ny] = &self.noise.lidar;
            MeasurementPackage::lidar(
                timestamp_us,
                px + nx.sample(&mut self.rng),
                py + ny.sample(&mut self.rng),
            )
        } else {
            let [n_range, n_bearing, n_rate] = &self.noise.radar;
            let range = px.hypot(py).max(RadarModel::min_range());
            let range_rate = (px * v * yaw.cos() + py * v * yaw.sin()) / range;
            MeasurementPackage::radar(
                timestamp_us,
                range + n_range.sample(&mut self.rng),
                normalize_angle(py.atan2(px) + n_bearing.sample(&mut self.rng)),
                range_rate + n_rate.sample(&mut self.rng),
            )
        }
    }

    fn advance(&mut self) {
        let mut augmented = AugmentedVector::zeros();
        augmented.fixed_rows_mut::<N_X>(0).copy_from(&self.truth);
        self.truth = self.motion.normalize(self.motion.propagate(&augmented, self.dt));
        self.step += 1;
    }
}

impl Iterator for SyntheticTrack {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let record = Record {
            line: self.step + 1,
            package: self.measure(),
            ground_truth: Some(self.ground_truth()),
        };
        self.advance();
        Some(record)
    }
}

/// Generates `scenario.steps` records.
pub fn generate(scenario: &ScenarioConfig, filter: &UkfConfig) -> Result<Vec<Record>, SimError> {
    let records: Vec<Record> = SyntheticTrack::new(scenario, filter)?
        .take(scenario.steps)
        .collect();
    debug!(count = records.len(), seed = scenario.seed, "generated synthetic records");
    Ok(records)
}
