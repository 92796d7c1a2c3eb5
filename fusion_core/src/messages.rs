// fusion_core/src/messages.rs

use nalgebra::{Vector2, Vector3};
use std::fmt;

use crate::error::FilterError;
use crate::types::{TimestampUs, N_LIDAR, N_RADAR};

/// The sensors the estimator knows how to fuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorType {
    Lidar,
    Radar,
}

impl SensorType {
    /// Length of the raw measurement slice this sensor delivers.
    pub const fn measurement_dim(self) -> usize {
        match self {
            SensorType::Lidar => N_LIDAR,
            SensorType::Radar => N_RADAR,
        }
    }

    /// The single-letter tag used in measurement log files.
    pub const fn tag(self) -> char {
        match self {
            SensorType::Lidar => 'L',
            SensorType::Radar => 'R',
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Lidar => f.write_str("lidar"),
            SensorType::Radar => f.write_str("radar"),
        }
    }
}

/// A self-describing container for the raw values of one sensor reading.
#[derive(Clone, Debug, PartialEq)]
pub enum MeasurementData {
    /// Cartesian position `[px, py]`.
    Lidar(Vector2<f64>),
    /// Polar observation `[range, bearing, range_rate]`.
    Radar(Vector3<f64>),
}

impl MeasurementData {
    pub fn sensor(&self) -> SensorType {
        match self {
            MeasurementData::Lidar(_) => SensorType::Lidar,
            MeasurementData::Radar(_) => SensorType::Radar,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        match self {
            MeasurementData::Lidar(z) => z.as_slice(),
            MeasurementData::Radar(z) => z.as_slice(),
        }
    }
}

/// One already-parsed measurement record, as handed to the estimator.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementPackage {
    pub timestamp_us: TimestampUs,
    pub data: MeasurementData,
}

impl MeasurementPackage {
    pub fn lidar(timestamp_us: TimestampUs, px: f64, py: f64) -> Self {
        Self {
            timestamp_us,
            data: MeasurementData::Lidar(Vector2::new(px, py)),
        }
    }

    pub fn radar(timestamp_us: TimestampUs, range: f64, bearing: f64, range_rate: f64) -> Self {
        Self {
            timestamp_us,
            data: MeasurementData::Radar(Vector3::new(range, bearing, range_rate)),
        }
    }

    /// Builds a package from a sensor tag and its raw values, checking the
    /// value count against the sensor and rejecting non-finite values.
    pub fn from_raw(
        sensor: SensorType,
        timestamp_us: TimestampUs,
        raw: &[f64],
    ) -> Result<Self, FilterError> {
        if raw.len() != sensor.measurement_dim() {
            return Err(FilterError::InvalidMeasurement {
                sensor,
                reason: format!(
                    "expected {} values, got {}",
                    sensor.measurement_dim(),
                    raw.len()
                ),
            });
        }
        if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
            return Err(FilterError::InvalidMeasurement {
                sensor,
                reason: format!("non-finite value {bad}"),
            });
        }

        let data = match sensor {
            SensorType::Lidar => MeasurementData::Lidar(Vector2::from_column_slice(raw)),
            SensorType::Radar => MeasurementData::Radar(Vector3::from_column_slice(raw)),
        };
        Ok(Self { timestamp_us, data })
    }

    pub fn sensor(&self) -> SensorType {
        self.data.sensor()
    }
}
