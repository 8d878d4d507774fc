//! Sensor file parsing.
//!
//! Row 0 holds the start time (epoch seconds), row 1 the sampling rate in Hz,
//! every following row one sample. Multi-axis files repeat the header value
//! in each column; only the first column is read.

use crate::reader::types::{Modality, SensorSeries};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

/// Failure to parse a sensor file.
#[derive(Debug)]
pub enum ReadError {
    Io(String),
    /// Header row (0 = start time, 1 = sampling rate) missing
    MissingHeader { row: usize },
    InvalidNumber { line: usize, value: String },
    InvalidRate(f64),
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Io(e) => write!(f, "IO error: {e}"),
            ReadError::MissingHeader { row } => write!(f, "missing header row {row}"),
            ReadError::InvalidNumber { line, value } => {
                write!(f, "invalid number {value:?} on line {line}")
            }
            ReadError::InvalidRate(rate) => write!(f, "invalid sampling rate {rate}"),
            ReadError::ShortRow {
                line,
                expected,
                found,
            } => write!(f, "line {line} has {found} columns, expected {expected}"),
        }
    }
}

impl std::error::Error for ReadError {}

/// Parse a sensor file, failing on any malformed content.
pub fn try_read(path: impl AsRef<Path>, modality: Modality) -> Result<SensorSeries, ReadError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| ReadError::Io(e.to_string()))?;

    let width = modality.sample_width();
    let mut start_time = None;
    let mut sampling_rate = None;
    let mut samples = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ReadError::Io(e.to_string()))?;
        let line = row + 1;
        match row {
            0 => start_time = Some(parse_field(&record, 0, line)?),
            1 => sampling_rate = Some(parse_field(&record, 0, line)?),
            _ => {
                if record.len() < width {
                    return Err(ReadError::ShortRow {
                        line,
                        expected: width,
                        found: record.len(),
                    });
                }
                for column in 0..width {
                    samples.push(parse_field(&record, column, line)?);
                }
            }
        }
    }

    let start_time = start_time.ok_or(ReadError::MissingHeader { row: 0 })?;
    let sampling_rate = sampling_rate.ok_or(ReadError::MissingHeader { row: 1 })?;

    SensorSeries::new(modality, start_time, sampling_rate, samples)
        .ok_or(ReadError::InvalidRate(sampling_rate))
}

/// Parse a sensor file, substituting an empty series on failure.
///
/// A corrupt file only removes that modality from its folder; the warning is
/// the sole trace of the failure.
pub fn read(path: impl AsRef<Path>, modality: Modality) -> SensorSeries {
    let path = path.as_ref();
    match try_read(path, modality) {
        Ok(series) => {
            tracing::debug!(
                "Read {} rows of {} at {} Hz from {:?}",
                series.len(),
                modality,
                series.sampling_rate,
                path
            );
            series
        }
        Err(e) => {
            tracing::warn!("Error reading the file {:?}: {}", path, e);
            SensorSeries::empty(modality)
        }
    }
}

fn parse_field(record: &StringRecord, column: usize, line: usize) -> Result<f64, ReadError> {
    let raw = record.get(column).unwrap_or("");
    raw.parse::<f64>().map_err(|_| ReadError::InvalidNumber {
        line,
        value: raw.to_string(),
    })
}
