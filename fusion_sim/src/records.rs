// fusion_sim/src/records.rs

//! The plain-text measurement log format shared by `replay` and `synth`.
//!
//! One record per line, whitespace separated:
//!
//! ```text
//! L  px  py            timestamp_us  [gt_px gt_py gt_vx gt_vy]
//! R  rho phi rho_dot   timestamp_us  [gt_px gt_py gt_vx gt_vy]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use nalgebra::Vector4;
use std::fmt::Write as _;
use std::io::BufRead;

use fusion_core::messages::{MeasurementPackage, SensorType};

use crate::error::SimError;

/// Number of ground-truth columns: position and cartesian velocity.
pub const GROUND_TRUTH_LEN: usize = 4;

/// A parsed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based line number in the source, used for error reports.
    pub line: usize,
    pub package: MeasurementPackage,
    /// `[px, py, vx, vy]`, present only when the log carries it.
    pub ground_truth: Option<Vector4<f64>>,
}

fn parse_err(line: usize, reason: impl Into<String>) -> SimError {
    SimError::Parse {
        line,
        reason: reason.into(),
    }
}

fn parse_f64(line: usize, token: &str) -> Result<f64, SimError> {
    token
        .parse()
        .map_err(|_| parse_err(line, format!("invalid number `{token}`")))
}

/// Parses one line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: usize, text: &str) -> Result<Option<Record>, SimError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = text.split_whitespace();
    let sensor = match tokens.next() {
        Some("L") => SensorType::Lidar,
        Some("R") => SensorType::Radar,
        Some(tag) => return Err(parse_err(line, format!("unknown sensor tag `{tag}`"))),
        None => return Ok(None),
    };

    let raw = tokens
        .by_ref()
        .take(sensor.measurement_dim())
        .map(|t| parse_f64(line, t))
        .collect::<Result<Vec<_>, _>>()?;
    if raw.len() < sensor.measurement_dim() {
        return Err(parse_err(
            line,
            format!(
                "{sensor} record needs {} values, found {}",
                sensor.measurement_dim(),
                raw.len()
            ),
        ));
    }

    let timestamp_us = match tokens.next() {
        Some(t) => t
            .parse::<i64>()
            .map_err(|_| parse_err(line, format!("invalid timestamp `{t}`")))?,
        None => return Err(parse_err(line, "missing timestamp")),
    };

    let package = MeasurementPackage::from_raw(sensor, timestamp_us, &raw)
        .map_err(|e| parse_err(line, e.to_string()))?;

    // Trailing columns are optional; a short or malformed tail is ignored.
    let tail: Vec<f64> = tokens
        .take(GROUND_TRUTH_LEN)
        .map_while(|t| t.parse().ok())
        .collect();
    let ground_truth = (tail.len() == GROUND_TRUTH_LEN).then(|| Vector4::from_column_slice(&tail));

    Ok(Some(Record {
        line,
        package,
        ground_truth,
    }))
}

/// Lazily parses every record of a log.
pub fn parse_records<R: BufRead>(reader: R) -> impl Iterator<Item = Result<Record, SimError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, text)| match text {
            Ok(text) => parse_line(i + 1, &text).transpose(),
            Err(e) => Some(Err(e.into())),
        })
}

/// Formats a record back into its log line.
pub fn format_record(record: &Record) -> String {
    let package = &record.package;
    let mut line = String::new();
    line.push(package.sensor().tag());

    for v in package.data.as_slice() {
        let _ = write!(line, " {v}");
    }
    let _ = write!(line, " {}", package.timestamp_us);

    if let Some(gt) = &record.ground_truth {
        for v in gt.iter() {
            let _ = write!(line, " {v}");
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lidar_with_ground_truth() {
        let record = parse_line(3, "L\t3.122427e-01 5.803398e-01 1477010443000000 6.000000e-01 6.000000e-01 5.199937e+00 0")
            .unwrap()
            .unwrap();
        assert_eq!(record.line, 3);
        assert_eq!(record.package, MeasurementPackage::lidar(1477010443000000, 0.3122427, 0.5803398));
        assert_eq!(record.ground_truth, Some(Vector4::new(0.6, 0.6, 5.199937, 0.0)));
    }

    #[test]
    fn parses_radar_without_ground_truth() {
        let record = parse_line(1, "R 1.014892e+00 5.543292e-01 4.892807e+00 1477010443050000")
            .unwrap()
            .unwrap();
        assert_eq!(record.package.sensor(), SensorType::Radar);
        assert_eq!(record.package.timestamp_us, 1477010443050000);
        assert_eq!(record.ground_truth, None);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_line(1, "").unwrap(), None);
        assert_eq!(parse_line(2, "   ").unwrap(), None);
        assert_eq!(parse_line(3, "# header").unwrap(), None);
    }

    #[test]
    fn reports_line_numbers() {
        let err = parse_line(7, "L 1.0 2.0").unwrap_err();
        assert!(matches!(err, SimError::Parse { line: 7, .. }));

        let err = parse_line(8, "X 1.0 2.0 3").unwrap_err();
        assert!(err.to_string().contains("unknown sensor tag"));

        let err = parse_line(9, "R 1.0 abc 0.0 5").unwrap_err();
        assert!(err.to_string().starts_with("line 9:"));

        let err = parse_line(10, "L 1.0 NaN 5").unwrap_err();
        assert!(matches!(err, SimError::Parse { line: 10, .. }));
    }

    #[test]
    fn format_is_parseable() {
        let record = Record {
            line: 1,
            package: MeasurementPackage::radar(50_000, 1.5, -0.25, 0.75),
            ground_truth: Some(Vector4::new(1.0, -0.5, 2.0, 0.125)),
        };
        let text = format_record(&record);
        assert_eq!(text, "R 1.5 -0.25 0.75 50000 1 -0.5 2 0.125");
        assert_eq!(parse_line(1, &text).unwrap(), Some(record));
    }

    #[test]
    fn iterator_numbers_lines_from_one() {
        let log = "# log\nL 1 2 0\n\nR 1 0 0 100\n";
        let records: Vec<_> = parse_records(log.as_bytes()).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 2);
        assert_eq!(records[1].line, 4);
    }
}
