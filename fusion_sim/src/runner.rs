// fusion_sim/src/runner.rs

use nalgebra::Vector4;
use std::io::Write;
use tracing::{info, warn};

use fusion_core::consistency::{chi_square_95, NisMonitor};
use fusion_core::estimation::{ProcessOutcome, StateEstimator};
use fusion_core::messages::SensorType;
use fusion_core::state::FilterState;
use fusion_core::state::layout::{PX, PY, SPEED, YAW, YAW_RATE};

use crate::error::SimError;
use crate::records::Record;

pub const CSV_HEADER: &str = "timestamp,sensor,px,py,v,yaw,yaw_rate,nis,outcome";

/// Root-mean-square error of `[px, py, vx, vy]` against ground truth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RmseAccumulator {
    squared: Vector4<f64>,
    count: usize,
}

impl RmseAccumulator {
    pub fn add(&mut self, state: &FilterState, truth: &Vector4<f64>) {
        let velocity = state.velocity();
        let estimate = Vector4::new(state.x[PX], state.x[PY], velocity.x, velocity.y);
        let err = estimate - truth;
        self.squared += err.component_mul(&err);
        self.count += 1;
    }

    pub fn rmse(&self) -> Option<Vector4<f64>> {
        (self.count > 0).then(|| (self.squared / self.count as f64).map(f64::sqrt))
    }
}

/// What a run did, record by record, summed up.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub processed: usize,
    pub ignored: usize,
    pub rejected: usize,
    pub nis: NisMonitor,
    pub rmse: RmseAccumulator,
}

impl RunReport {
    /// Logs the per-sensor NIS statistics and, if ground truth was present,
    /// the RMSE.
    pub fn log_summary(&self) {
        info!(
            processed = self.processed,
            ignored = self.ignored,
            rejected = self.rejected,
            "run finished"
        );
        for sensor in [SensorType::Lidar, SensorType::Radar] {
            let stats = self.nis.stats(sensor);
            if let (Some(mean), Some(above)) = (stats.mean(), stats.fraction_above_95()) {
                info!(
                    %sensor,
                    count = stats.count,
                    mean_nis = mean,
                    threshold = chi_square_95(sensor.measurement_dim()),
                    fraction_above = above,
                    "NIS summary"
                );
            }
        }
        if let Some(rmse) = self.rmse.rmse() {
            info!(px = rmse[0], py = rmse[1], vx = rmse[2], vy = rmse[3], "RMSE");
        }
    }
}

fn write_row<W: Write>(
    out: &mut W,
    record: &Record,
    state: Option<&FilterState>,
    nis: Option<f64>,
    outcome: &str,
) -> Result<(), SimError> {
    let ts = record.package.timestamp_us;
    let sensor = record.package.sensor();
    let nis = nis.map(|v| format!("{v:.6}")).unwrap_or_default();
    match state {
        Some(s) => writeln!(
            out,
            "{ts},{sensor},{:.6},{:.6},{:.6},{:.6},{:.6},{nis},{outcome}",
            s.x[PX], s.x[PY], s.x[SPEED], s.x[YAW], s.x[YAW_RATE]
        )?,
        None => writeln!(out, "{ts},{sensor},,,,,,{nis},{outcome}")?,
    }
    Ok(())
}

/// Feeds every record to `estimator` in order and writes one CSV row per
/// record. Parse and filter failures are logged and skipped unless `strict`
/// is set, in which case the first one is returned.
pub fn run<I, W>(
    estimator: &mut dyn StateEstimator,
    records: I,
    out: &mut W,
    strict: bool,
) -> Result<RunReport, SimError>
where
    I: IntoIterator<Item = Result<Record, SimError>>,
    W: Write,
{
    let mut report = RunReport::default();
    writeln!(out, "{CSV_HEADER}")?;

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(e @ SimError::Parse { .. }) if !strict => {
                warn!("skipping record: {e}");
                report.rejected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        match estimator.process(&record.package) {
            Ok(outcome) => {
                match outcome {
                    ProcessOutcome::Updated { sensor, nis } => {
                        report.nis.record(sensor, nis);
                        report.processed += 1;
                    }
                    ProcessOutcome::Initialized { .. } => report.processed += 1,
                    ProcessOutcome::Ignored { .. } => report.ignored += 1,
                }

                let state = estimator.state().ok();
                if let (Some(state), Some(truth)) = (state, &record.ground_truth) {
                    report.rmse.add(state, truth);
                }
                write_row(out, &record, state, outcome.nis(), outcome.label())?;
            }
            Err(source) if strict => {
                return Err(SimError::Filter {
                    line: record.line,
                    source,
                })
            }
            Err(source) => {
                warn!(line = record.line, "record rejected by the filter: {source}");
                report.rejected += 1;
                write_row(out, &record, estimator.state().ok(), None, "rejected")?;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::parse_records;
    use fusion_core::config::{DegenerateRangePolicy, UkfConfig};
    use fusion_core::estimation::filters::UnscentedKalmanFilter;

    fn filter(config: UkfConfig) -> UnscentedKalmanFilter {
        UnscentedKalmanFilter::new(config).unwrap()
    }

    fn output(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf).unwrap().lines().map(str::to_owned).collect()
    }

    #[test]
    fn writes_header_and_one_row_per_record() {
        let log = "L 1 1 0\nR 1.5 0.8 0.1 50000\nL 1.05 1.02 100000\n";
        let mut ukf = filter(UkfConfig::default());
        let mut buf = Vec::new();

        let report = run(&mut ukf, parse_records(log.as_bytes()), &mut buf, true).unwrap();
        let rows = output(buf);

        assert_eq!(rows[0], CSV_HEADER);
        assert_eq!(rows.len(), 4);
        assert!(rows[1].starts_with("0,lidar,1.000000,1.000000,"));
        assert!(rows[1].ends_with(",,initialized"));
        assert!(rows[2].starts_with("50000,radar,"));
        assert!(rows[2].ends_with(",updated"));
        assert_eq!(report.processed, 3);
        assert_eq!(report.nis.stats(SensorType::Radar).count, 1);
        assert_eq!(report.nis.stats(SensorType::Lidar).count, 1);
    }

    #[test]
    fn ignored_records_before_initialization_have_no_state() {
        let log = "R 1.5 0.8 0.1 0\nL 1 1 50000\n";
        let mut ukf = filter(UkfConfig {
            use_radar: false,
            ..Default::default()
        });
        let mut buf = Vec::new();

        let report = run(&mut ukf, parse_records(log.as_bytes()), &mut buf, false).unwrap();
        let rows = output(buf);
        assert_eq!(rows[1], "0,radar,,,,,,,ignored");
        assert!(rows[2].ends_with("initialized"));
        assert_eq!(report.ignored, 1);
    }

    #[test]
    fn lenient_run_skips_bad_records() {
        let log = "L 1 1 100\nL oops 1 200\nL 1 1 50\nL 1.1 1 300\n";
        let mut ukf = filter(UkfConfig::default());
        let mut buf = Vec::new();

        let report = run(&mut ukf, parse_records(log.as_bytes()), &mut buf, false).unwrap();
        let rows = output(buf);
        // The unparseable line produces no row; the out-of-order one does.
        assert_eq!(rows.len(), 4);
        assert!(rows[2].ends_with(",rejected"));
        assert!(rows[3].ends_with(",updated"));
        assert_eq!(report.rejected, 2);
        assert_eq!(report.processed, 2);
    }

    #[test]
    fn strict_run_stops_at_the_first_failure() {
        let log = "L 0 0 0\nR 0.01 0 0 50000\n";
        let mut ukf = filter(UkfConfig {
            degenerate_range: DegenerateRangePolicy::Reject,
            ..Default::default()
        });
        let mut buf = Vec::new();

        let err = run(&mut ukf, parse_records(log.as_bytes()), &mut buf, true).unwrap_err();
        assert!(matches!(err, SimError::Filter { line: 2, .. }));

        let err = run(&mut ukf, parse_records("L x 0 0\n".as_bytes()), &mut Vec::new(), true)
            .unwrap_err();
        assert!(matches!(err, SimError::Parse { line: 1, .. }));
    }

    #[test]
    fn rmse_needs_ground_truth() {
        let mut rmse = RmseAccumulator::default();
        assert_eq!(rmse.rmse(), None);

        let state = FilterState::with_unit_covariance(
            fusion_core::types::StateVector::new(1.0, 2.0, 0.0, 0.0, 0.0),
            0,
        );
        rmse.add(&state, &Vector4::new(1.0, 1.0, 0.0, 0.0));
        rmse.add(&state, &Vector4::new(1.0, 3.0, 0.0, 0.0));
        assert_eq!(rmse.rmse(), Some(Vector4::new(0.0, 1.0, 0.0, 0.0)));
    }
}
