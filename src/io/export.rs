//! Exports: report JSON, per-point inlier CSV, and capture CSV.
//!
//! The JSON wraps the report in a small envelope (tool name, timestamp, the
//! persisted-precision view) so files are self-describing.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FitConfig, FitReport, PointSample, StoredMeasurement};
use crate::engine::FitOutcome;
use crate::error::AppError;

/// On-disk report schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub report: FitReport,
    pub stored: StoredMeasurement,
    pub config: FitConfig,
}

impl ReportFile {
    pub fn new(report: &FitReport, config: &FitConfig, generated_at: DateTime<Utc>) -> Self {
        Self {
            tool: "vfit".to_string(),
            generated_at,
            report: report.clone(),
            stored: report.stored(),
            config: config.clone(),
        }
    }
}

/// Write the report JSON, stamped with the current time.
pub fn write_report_json(path: &Path, report: &FitReport, config: &FitConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    let body = ReportFile::new(report, config, Utc::now());
    serde_json::to_writer_pretty(file, &body)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Read a report JSON written by [`write_report_json`].
pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))
}

/// Write every fitted point with its inlier flag and residual.
pub fn write_inliers_csv(path: &Path, outcome: &FitOutcome) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create inlier CSV '{}': {e}", path.display())))?;
    write_inliers(file, outcome)
}

fn write_inliers<W: Write>(mut out: W, outcome: &FitOutcome) -> Result<(), AppError> {
    let mut residual_of = vec![None; outcome.samples.len()];
    for (&i, &r) in outcome.inliers.iter().zip(&outcome.residuals) {
        residual_of[i] = Some(r);
    }

    let err = |e: std::io::Error| AppError::new(2, format!("Failed to write inlier CSV: {e}"));
    writeln!(out, "x,y,z,confidence,inlier,residual").map_err(err)?;
    for (s, residual) in outcome.samples.iter().zip(&residual_of) {
        writeln!(
            out,
            "{:.6},{:.6},{:.6},{},{},{}",
            s.position.x,
            s.position.y,
            s.position.z,
            s.confidence.map(|c| format!("{c:.4}")).unwrap_or_default(),
            u8::from(residual.is_some()),
            residual.map(|r| format!("{r:.6}")).unwrap_or_default(),
        )
        .map_err(err)?;
    }
    Ok(())
}

/// Write samples in the CSV layout `load_capture` reads.
pub fn write_capture_csv(path: &Path, samples: &[PointSample]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create capture CSV '{}': {e}", path.display())))?;
    write_capture(file, samples)
}

fn write_capture<W: Write>(out: W, samples: &[PointSample]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    let err = |e: csv::Error| AppError::new(2, format!("Failed to write capture CSV: {e}"));

    writer.write_record(["x", "y", "z", "confidence"]).map_err(err)?;
    for s in samples {
        writer
            .write_record([
                format!("{:.6}", s.position.x),
                format!("{:.6}", s.position.y),
                format!("{:.6}", s.position.z),
                s.confidence.map(|c| format!("{c:.4}")).unwrap_or_default(),
            ])
            .map_err(err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush capture CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BasisKind, PrimitiveKind, TargetSpecification};
    use crate::io::read_csv_capture;

    fn outcome() -> FitOutcome {
        FitOutcome {
            report: FitReport {
                target: TargetSpecification::StemAxis,
                primitive: PrimitiveKind::Line,
                basis: BasisKind::Imu,
                pitch_deg: 0.0,
                roll_deg: 0.0,
                point_count: 3,
                inlier_count: 2,
                inlier_ratio: 2.0 / 3.0,
                residual_rms: 0.001,
                quality_score: 0.5,
                is_valid: true,
                direction: [0.0, 0.0, 1.0],
                up: [0.0, 0.0, 1.0],
                anchor: [0.0; 3],
                roi_point_count: 3,
                iterations: 17,
                seed: 1,
            },
            samples: vec![
                PointSample::new(0.0, 0.0, 0.0),
                PointSample::new(0.5, 0.0, 0.1).with_confidence(0.25),
                PointSample::new(0.0, 0.0, 0.2),
            ],
            inliers: vec![0, 2],
            residuals: vec![0.0, 0.002],
        }
    }

    #[test]
    fn inlier_csv_flags_every_point() {
        let mut buf = Vec::new();
        write_inliers(&mut buf, &outcome()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(",1,0.000000"));
        assert!(lines[2].ends_with(",0.2500,0,"));
        assert!(lines[3].ends_with(",1,0.002000"));
    }

    #[test]
    fn capture_csv_reads_back() {
        let samples = outcome().samples;
        let mut buf = Vec::new();
        write_capture(&mut buf, &samples).unwrap();
        let back = read_csv_capture(buf.as_slice()).unwrap();
        assert_eq!(back.samples, samples);
    }

    #[test]
    fn report_file_round_trips() {
        let report = outcome().report;
        let body = ReportFile::new(&report, &FitConfig::default(), Utc::now());
        let json = serde_json::to_string(&body).unwrap();
        let back: ReportFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, body);
        assert_eq!(back.tool, "vfit");
        assert_eq!(back.stored.target_type, 'A');
    }
}
