//! Fixed-length windowing of tag-free recordings.
//!
//! A payload is cut into windows of `window_length_seconds * rate` rows,
//! advancing by `window_length_seconds * (1 - overlap) * rate` rows. A tail
//! shorter than one window is dropped, never padded.

use crate::reader::types::{Modality, Segment, SegmentOrigin};
use serde::{Deserialize, Serialize};

/// Segment and window sizing for one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowParameters {
    /// Full length of a tag-centered segment; half of it is the guard band
    pub segment_length_seconds: f64,
    /// Length of a fixed window
    pub window_length_seconds: f64,
    /// Fraction of a window shared with the next one, in `[0, 1)`
    pub overlap_fraction: f64,
}

impl Default for WindowParameters {
    fn default() -> Self {
        Self {
            segment_length_seconds: 40.0 * 60.0, // 20 minutes either side of an event
            window_length_seconds: 60.0,
            overlap_fraction: 0.5,
        }
    }
}

impl WindowParameters {
    /// Check that every length is positive and the overlap leaves a step.
    pub fn validate(&self) -> Result<(), WindowError> {
        if !(self.segment_length_seconds.is_finite() && self.segment_length_seconds > 0.0) {
            return Err(WindowError::InvalidLength(self.segment_length_seconds));
        }
        if !(self.window_length_seconds.is_finite() && self.window_length_seconds > 0.0) {
            return Err(WindowError::InvalidLength(self.window_length_seconds));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(WindowError::InvalidOverlap(self.overlap_fraction));
        }
        Ok(())
    }
}

/// Window sizing errors.
#[derive(Debug, PartialEq)]
pub enum WindowError {
    InvalidLength(f64),
    InvalidOverlap(f64),
    /// Window or step rounds to zero rows at the given rate
    DegenerateWindow { rate: f64 },
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::InvalidLength(len) => write!(f, "invalid length: {len} seconds"),
            WindowError::InvalidOverlap(o) => write!(f, "overlap {o} outside [0, 1)"),
            WindowError::DegenerateWindow { rate } => {
                write!(f, "window or step is shorter than one sample at {rate} Hz")
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// Cuts payloads into fixed-length overlapping windows.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindowSegmenter {
    window_length_seconds: f64,
    overlap_fraction: f64,
}

impl FixedWindowSegmenter {
    /// Create a segmenter for the given window length and overlap.
    pub fn new(window_length_seconds: f64, overlap_fraction: f64) -> Result<Self, WindowError> {
        if !(window_length_seconds.is_finite() && window_length_seconds > 0.0) {
            return Err(WindowError::InvalidLength(window_length_seconds));
        }
        if !(0.0..1.0).contains(&overlap_fraction) {
            return Err(WindowError::InvalidOverlap(overlap_fraction));
        }
        Ok(Self {
            window_length_seconds,
            overlap_fraction,
        })
    }

    /// Create a segmenter from validated run parameters.
    pub fn from_parameters(params: &WindowParameters) -> Result<Self, WindowError> {
        Self::new(params.window_length_seconds, params.overlap_fraction)
    }

    /// Window and step in rows at `sample_rate`.
    pub fn window_and_step(&self, sample_rate: f64) -> Result<(usize, usize), WindowError> {
        let window = (self.window_length_seconds * sample_rate).floor();
        let step =
            (self.window_length_seconds * (1.0 - self.overlap_fraction) * sample_rate).floor();
        if !(window >= 1.0 && step >= 1.0) {
            return Err(WindowError::DegenerateWindow { rate: sample_rate });
        }
        Ok((window as usize, step as usize))
    }

    /// Window a row-major payload of `width` values per row.
    pub fn segment(
        &self,
        modality: Modality,
        values: &[f64],
        width: usize,
        sample_rate: f64,
    ) -> Result<Vec<Segment>, WindowError> {
        let (window, step) = self.window_and_step(sample_rate)?;
        let rows = if width == 0 { 0 } else { values.len() / width };

        let segments = (0..)
            .map(|i| i * step)
            .take_while(|&start| start + window <= rows)
            .enumerate()
            .map(|(index, start)| Segment {
                modality,
                origin: SegmentOrigin::Window { index },
                start_index: start,
                width,
                values: values[start * width..(start + window) * width].to_vec(),
            })
            .collect();

        Ok(segments)
    }

    /// Window every segment of a collection and concatenate the results.
    ///
    /// Window indices keep counting across the collection; start indices stay
    /// relative to each source segment's series.
    pub fn segment_collection(
        &self,
        segments: &[Segment],
        sample_rate: f64,
    ) -> Result<Vec<Segment>, WindowError> {
        let mut windows = Vec::new();
        for source in segments {
            let source_windows =
                self.segment(source.modality, &source.values, source.width, sample_rate)?;
            for mut window in source_windows {
                window.start_index += source.start_index;
                window.origin = SegmentOrigin::Window {
                    index: windows.len(),
                };
                windows.push(window);
            }
        }
        Ok(windows)
    }
}
