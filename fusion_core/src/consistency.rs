// fusion_core/src/consistency.rs

use crate::messages::SensorType;

/// The 95th percentile of the chi-square distribution for the measurement
/// dimensions this crate produces. A consistent filter keeps about 5% of its
/// NIS values above this line.
pub fn chi_square_95(dof: usize) -> Option<f64> {
    match dof {
        1 => Some(3.841),
        2 => Some(5.991),
        3 => Some(7.815),
        4 => Some(9.488),
        5 => Some(11.070),
        _ => None,
    }
}

/// Running NIS statistics for one sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NisStats {
    pub count: usize,
    sum: f64,
    above_95: usize,
}

impl NisStats {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Share of samples above the 95% chi-square threshold.
    pub fn fraction_above_95(&self) -> Option<f64> {
        (self.count > 0).then(|| self.above_95 as f64 / self.count as f64)
    }
}

/// Accumulates NIS values per sensor across a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NisMonitor {
    lidar: NisStats,
    radar: NisStats,
}

impl NisMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sensor: SensorType, nis: f64) {
        let threshold = chi_square_95(sensor.measurement_dim()).unwrap_or(f64::INFINITY);
        let stats = match sensor {
            SensorType::Lidar => &mut self.lidar,
            SensorType::Radar => &mut self.radar,
        };
        stats.count += 1;
        stats.sum += nis;
        if nis > threshold {
            stats.above_95 += 1;
        }
    }

    pub fn stats(&self, sensor: SensorType) -> &NisStats {
        match sensor {
            SensorType::Lidar => &self.lidar,
            SensorType::Radar => &self.radar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn thresholds_for_sensor_dimensions() {
        assert_eq!(chi_square_95(SensorType::Lidar.measurement_dim()), Some(5.991));
        assert_eq!(chi_square_95(SensorType::Radar.measurement_dim()), Some(7.815));
        assert_eq!(chi_square_95(0), None);
    }

    #[test]
    fn empty_monitor_has_no_statistics() {
        let monitor = NisMonitor::new();
        assert_eq!(monitor.stats(SensorType::Lidar).count, 0);
        assert_eq!(monitor.stats(SensorType::Lidar).mean(), None);
        assert_eq!(monitor.stats(SensorType::Radar).fraction_above_95(), None);
    }

    #[test]
    fn statistics_are_kept_per_sensor() {
        let mut monitor = NisMonitor::new();
        for nis in [1.0, 2.0, 6.0, 3.0] {
            monitor.record(SensorType::Lidar, nis);
        }
        // 6.0 is above the lidar line but below the radar one.
        monitor.record(SensorType::Radar, 6.0);

        let lidar = monitor.stats(SensorType::Lidar);
        assert_eq!(lidar.count, 4);
        assert_abs_diff_eq!(lidar.mean().unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lidar.fraction_above_95().unwrap(), 0.25, epsilon = 1e-12);

        let radar = monitor.stats(SensorType::Radar);
        assert_eq!(radar.count, 1);
        assert_eq!(radar.fraction_above_95(), Some(0.0));
    }
}
