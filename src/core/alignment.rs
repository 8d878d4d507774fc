//! Timestamp to sample-index alignment.
//!
//! Every segmenter locates samples through these two functions. Indices are
//! truncated, never rounded; datasets built earlier depend on that.

use crate::reader::types::SensorSeries;

/// Row index of `timestamp` within `series`: `floor((t - start) * rate)`.
///
/// Only meaningful when `series.covers(timestamp)`.
pub fn index_for(series: &SensorSeries, timestamp: f64) -> i64 {
    ((timestamp - series.start_time) * series.sampling_rate).floor() as i64
}

/// Half-window row count for a segment of `segment_length_seconds`.
///
/// The duration is floor-divided by two before scaling by the rate, and the
/// product is truncated again. For odd lengths this differs from
/// `floor(length * rate / 2)`.
pub fn half_window_samples(segment_length_seconds: f64, sampling_rate: f64) -> i64 {
    ((segment_length_seconds / 2.0).floor() * sampling_rate).floor() as i64
}

/// Clamp a signed row range to `[0, len)`; `None` when nothing remains.
pub(crate) fn clamp_range(from: i64, to: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let from = from.clamp(0, len);
    let to = to.clamp(0, len);
    (to > from).then_some((from as usize, to as usize))
}
