//! In-memory types for parsed sensor recordings.
//!
//! A series keeps only what its file header provides (start time and rate);
//! timing of every sample is derived from those two values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor stream type recorded by the wristband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    /// Electrodermal activity
    Eda,
    /// Heart rate
    Hr,
    /// Skin temperature
    Temp,
    /// Blood-volume pulse
    Bvp,
    /// Three-axis acceleration
    Acc,
}

impl Modality {
    /// Every modality, in the order folders are processed.
    pub const ALL: [Modality; 5] = [
        Modality::Eda,
        Modality::Temp,
        Modality::Bvp,
        Modality::Hr,
        Modality::Acc,
    ];

    /// Name of the file holding this modality inside a recording folder.
    pub fn file_name(self) -> &'static str {
        match self {
            Modality::Eda => "EDA.csv",
            Modality::Hr => "HR.csv",
            Modality::Temp => "TEMP.csv",
            Modality::Bvp => "BVP.csv",
            Modality::Acc => "ACC.csv",
        }
    }

    /// Label used in output file names.
    pub fn label(self) -> &'static str {
        match self {
            Modality::Eda => "EDA",
            Modality::Hr => "HR",
            Modality::Temp => "TEMP",
            Modality::Bvp => "BVP",
            Modality::Acc => "ACC",
        }
    }

    /// Number of values per sample row.
    pub fn sample_width(self) -> usize {
        match self {
            Modality::Acc => 3,
            _ => 1,
        }
    }

    /// Whether extracted segments pass through signal conditioning.
    pub fn is_conditioned(self) -> bool {
        matches!(self, Modality::Eda)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed sensor file.
///
/// `samples` is row-major: each row holds `width` consecutive values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSeries {
    pub modality: Modality,
    /// Recording start, epoch seconds
    pub start_time: f64,
    /// Sampling frequency in Hz (always > 0)
    pub sampling_rate: f64,
    /// Values per row
    pub width: usize,
    samples: Vec<f64>,
}

impl SensorSeries {
    /// Build a series from row-major samples.
    ///
    /// Returns `None` when the rate is not a positive finite number or the
    /// sample count is not a multiple of the modality's width.
    pub fn new(
        modality: Modality,
        start_time: f64,
        sampling_rate: f64,
        samples: Vec<f64>,
    ) -> Option<Self> {
        let width = modality.sample_width();
        if !(sampling_rate.is_finite() && sampling_rate > 0.0) || samples.len() % width != 0 {
            return None;
        }
        Some(Self {
            modality,
            start_time,
            sampling_rate,
            width,
            samples,
        })
    }

    /// The series a failed read yields: no rows, contributes no segments.
    pub fn empty(modality: Modality) -> Self {
        Self {
            modality,
            start_time: 0.0,
            sampling_rate: 1.0,
            width: modality.sample_width(),
            samples: Vec::new(),
        }
    }

    /// Number of sample rows.
    pub fn len(&self) -> usize {
        self.samples.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time just past the last sample, derived from the header.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.len() as f64 / self.sampling_rate
    }

    /// Whether a timestamp lies in `[start_time, end_time]`.
    pub fn covers(&self, timestamp: f64) -> bool {
        timestamp >= self.start_time && timestamp <= self.end_time()
    }

    /// Raw row-major payload.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Rows `[from, to)` as a flat slice. Bounds must already be clamped.
    pub fn rows(&self, from: usize, to: usize) -> &[f64] {
        &self.samples[from * self.width..to * self.width]
    }
}

/// Where a segment was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentOrigin {
    /// Centered on an event tag
    Tag { timestamp: f64 },
    /// Between two boundaries (tags or recording edges)
    InterTag { from: f64, to: f64 },
    /// The entire recording of a folder without tags
    WholeRecording,
    /// Fixed-length window, numbered within its source
    Window { index: usize },
}

/// A contiguous run of rows taken from one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub modality: Modality,
    pub origin: SegmentOrigin,
    /// First row of the segment within its source
    pub start_index: usize,
    /// Values per row
    pub width: usize,
    /// Row-major values
    pub values: Vec<f64>,
}

impl Segment {
    /// Copy rows `[from, to)` of a series into a new segment.
    pub fn from_rows(series: &SensorSeries, origin: SegmentOrigin, from: usize, to: usize) -> Self {
        Self {
            modality: series.modality,
            origin,
            start_index: from,
            width: series.width,
            values: series.rows(from, to).to_vec(),
        }
    }

    /// Number of rows in the segment.
    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row range `[start, end)` within the source series.
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_time_is_derived() {
        let series = SensorSeries::new(Modality::Eda, 1000.0, 4.0, vec![0.0; 400]).unwrap();
        assert_eq!(series.len(), 400);
        assert_eq!(series.end_time(), 1100.0);
        assert!(series.covers(1000.0));
        assert!(series.covers(1100.0));
        assert!(!series.covers(1100.5));
    }

    #[test]
    fn test_acc_rows_have_three_values() {
        let samples: Vec<f64> = (0..12).map(f64::from).collect();
        let series = SensorSeries::new(Modality::Acc, 0.0, 32.0, samples).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.rows(1, 2), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_invalid_series_rejected() {
        assert!(SensorSeries::new(Modality::Hr, 0.0, 0.0, vec![1.0]).is_none());
        assert!(SensorSeries::new(Modality::Hr, 0.0, f64::NAN, vec![1.0]).is_none());
        assert!(SensorSeries::new(Modality::Acc, 0.0, 32.0, vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn test_modality_labels() {
        assert_eq!(Modality::Eda.file_name(), "EDA.csv");
        assert_eq!(Modality::Acc.to_string(), "ACC");
        assert!(Modality::Eda.is_conditioned());
        assert!(!Modality::Bvp.is_conditioned());
    }
}
