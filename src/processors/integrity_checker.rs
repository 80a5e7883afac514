use crate::error::Result;
use crate::models::StationTable;
use crate::readers::{parse_measurement, MeasurementReader};
use crate::utils::constants::{TEMPERATURE_JITTER, TEMP_TOLERANCE};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub total_lines: u64,
    pub valid_lines: u64,
    pub expected_lines: Option<u64>,
    pub violations: Vec<LineViolation>,
    pub violation_count: u64,
    pub station_statistics: HashMap<String, StationStatistics>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violation_count == 0 && self.line_count_matches()
    }

    pub fn line_count_matches(&self) -> bool {
        self.expected_lines.map_or(true, |n| n == self.total_lines)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineViolation {
    pub line_number: usize,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationType {
    Malformed,
    UnknownStation,
    OutOfRange,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StationStatistics {
    pub count: u64,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub sum_temp: f64,
}

impl StationStatistics {
    fn record(&mut self, temperature: f64) {
        self.count += 1;
        self.sum_temp += temperature;
        self.min_temp = Some(self.min_temp.map_or(temperature, |t| t.min(temperature)));
        self.max_temp = Some(self.max_temp.map_or(temperature, |t| t.max(temperature)));
    }

    pub fn mean_temp(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum_temp / self.count as f64)
    }
}

/// Checks a generated measurements file against the station table it was
/// generated from
pub struct IntegrityChecker<'a> {
    stations: &'a StationTable,
    jitter: f64,
    max_reported: usize,
    use_mmap: bool,
}

impl<'a> IntegrityChecker<'a> {
    pub fn new(stations: &'a StationTable) -> Self {
        Self {
            stations,
            jitter: TEMPERATURE_JITTER,
            max_reported: 100,
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Keep at most `max_reported` violations in the report; all are counted
    pub fn with_max_reported(mut self, max_reported: usize) -> Self {
        self.max_reported = max_reported;
        self
    }

    pub fn check_file(&self, path: &Path, expected_lines: Option<u64>) -> Result<IntegrityReport> {
        let mut report = self.empty_report(expected_lines);
        MeasurementReader::with_mmap(self.use_mmap).for_each_line(path, |line_number, line| {
            self.check_line(line_number, line, &mut report);
            Ok(())
        })?;

        tracing::debug!(
            "Checked {} lines of {}: {} violations",
            report.total_lines,
            path.display(),
            report.violation_count
        );
        Ok(report)
    }

    pub fn check_str(&self, content: &str, expected_lines: Option<u64>) -> IntegrityReport {
        let mut report = self.empty_report(expected_lines);
        for (idx, line) in content.lines().enumerate() {
            self.check_line(idx + 1, line, &mut report);
        }
        report
    }

    fn empty_report(&self, expected_lines: Option<u64>) -> IntegrityReport {
        IntegrityReport {
            total_lines: 0,
            valid_lines: 0,
            expected_lines,
            violations: Vec::new(),
            violation_count: 0,
            station_statistics: HashMap::new(),
        }
    }

    fn check_line(&self, line_number: usize, line: &str, report: &mut IntegrityReport) {
        report.total_lines += 1;

        let Some(measurement) = parse_measurement(line) else {
            self.push_violation(
                report,
                line_number,
                ViolationType::Malformed,
                format!("'{}' is not 'name;temperature' with one decimal", line),
            );
            return;
        };

        let Some(station) = self.stations.lookup(measurement.station) else {
            self.push_violation(
                report,
                line_number,
                ViolationType::UnknownStation,
                format!("station '{}' is not in the station table", measurement.station),
            );
            return;
        };

        if !station.accepts(measurement.temperature, self.jitter, TEMP_TOLERANCE) {
            self.push_violation(
                report,
                line_number,
                ViolationType::OutOfRange,
                format!(
                    "{} reading {:.1} is outside {:.1} ± {:.1}",
                    station.name, measurement.temperature, station.base_temperature, self.jitter
                ),
            );
            return;
        }

        report.valid_lines += 1;
        report
            .station_statistics
            .entry(station.name.clone())
            .or_default()
            .record(measurement.temperature);
    }

    fn push_violation(
        &self,
        report: &mut IntegrityReport,
        line_number: usize,
        violation_type: ViolationType,
        details: String,
    ) {
        report.violation_count += 1;
        if report.violations.len() < self.max_reported {
            report.violations.push(LineViolation {
                line_number,
                violation_type,
                details,
            });
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();
        let pct = |n: u64| {
            if report.total_lines == 0 {
                0.0
            } else {
                100.0 * n as f64 / report.total_lines as f64
            }
        };

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Lines: {}\n", report.total_lines));
        if let Some(expected) = report.expected_lines {
            summary.push_str(&format!(
                "Expected Lines: {} ({})\n",
                expected,
                if report.line_count_matches() {
                    "match"
                } else {
                    "MISMATCH"
                }
            ));
        }
        summary.push_str(&format!(
            "Valid Lines: {} ({:.1}%)\n",
            report.valid_lines,
            pct(report.valid_lines)
        ));
        summary.push_str(&format!(
            "Stations Seen: {} of {}\n",
            report.station_statistics.len(),
            self.stations.len()
        ));
        summary.push_str(&format!("\nViolations: {}\n", report.violation_count));

        if !report.violations.is_empty() {
            summary.push_str("\nFirst 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Line {} ({:?}): {}\n",
                    i + 1,
                    violation.line_number,
                    violation.violation_type,
                    violation.details
                ));
            }
        }

        summary
    }
}
