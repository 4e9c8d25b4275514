//! Capture ingest.
//!
//! Turns a point-cloud file into `PointSample`s:
//! - CSV with `x,y,z` and an optional `confidence` column (header names are
//!   case-insensitive, a UTF-8 BOM is ignored)
//! - JSON: an array of `{ "x": .., "y": .., "z": .., "confidence": .. }`
//!
//! Bad rows are skipped and reported; a file with no usable rows is an error.
//! No ROI filtering happens here, that is the engine's job.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::debug;
use serde::Deserialize;

use crate::domain::PointSample;
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line (CSV) or element index + 1 (JSON).
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed samples plus what was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedCapture {
    pub samples: Vec<PointSample>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedCapture {
    pub fn rows_used(&self) -> usize {
        self.samples.len()
    }
}

/// Capture file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Csv,
    Json,
}

impl CaptureFormat {
    /// `.json` is JSON; anything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => CaptureFormat::Json,
            _ => CaptureFormat::Csv,
        }
    }
}

/// Load a capture from disk, picking the format from the extension.
pub fn load_capture(path: &Path) -> Result<IngestedCapture, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open capture '{}': {e}", path.display())))?;
    let format = CaptureFormat::from_path(path);
    debug!("reading {} as {format:?}", path.display());
    match format {
        CaptureFormat::Csv => read_csv_capture(file),
        CaptureFormat::Json => read_json_capture(file),
    }
}

/// Parse a CSV capture.
pub fn read_csv_capture<R: Read>(reader: R) -> Result<IngestedCapture, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    for name in ["x", "y", "z"] {
        if !header_map.contains_key(name) {
            return Err(AppError::new(2, format!("Missing required column: `{name}`")));
        }
    }

    let mut samples = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(sample) => samples.push(sample),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    finish(samples, row_errors, rows_read)
}

#[derive(Debug, Deserialize)]
struct JsonPoint {
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parse a JSON capture.
pub fn read_json_capture<R: Read>(reader: R) -> Result<IngestedCapture, AppError> {
    let raw: Vec<serde_json::Value> =
        serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid capture JSON: {e}")))?;

    let mut samples = Vec::with_capacity(raw.len());
    let mut row_errors = Vec::new();
    let rows_read = raw.len();

    for (idx, value) in raw.into_iter().enumerate() {
        let line = idx + 1;
        let parsed = serde_json::from_value::<JsonPoint>(value)
            .map_err(|e| format!("Invalid point: {e}"))
            .and_then(|p| {
                let sample = PointSample {
                    position: nalgebra::Vector3::new(p.x, p.y, p.z),
                    confidence: p.confidence,
                };
                validate_sample(sample)
            });
        match parsed {
            Ok(sample) => samples.push(sample),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    finish(samples, row_errors, rows_read)
}

fn finish(samples: Vec<PointSample>, row_errors: Vec<RowError>, rows_read: usize) -> Result<IngestedCapture, AppError> {
    if samples.is_empty() {
        return Err(AppError::new(3, "No valid points in capture."));
    }
    Ok(IngestedCapture {
        samples,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<PointSample, String> {
    let x = parse_f64(get_required(record, header_map, "x")?, "x")?;
    let y = parse_f64(get_required(record, header_map, "y")?, "y")?;
    let z = parse_f64(get_required(record, header_map, "z")?, "z")?;
    let confidence = get_optional(record, header_map, "confidence")
        .map(|s| parse_f64(s, "confidence"))
        .transpose()?;

    validate_sample(PointSample {
        position: nalgebra::Vector3::new(x, y, z),
        confidence,
    })
}

fn validate_sample(sample: PointSample) -> Result<PointSample, String> {
    if !sample.is_finite() {
        return Err("Non-finite coordinate or confidence".to_string());
    }
    if let Some(c) = sample.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Confidence {c} outside [0, 1]"));
        }
    }
    Ok(sample)
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .map_err(|_| format!("Invalid number for `{name}`: '{s}'"))
}
