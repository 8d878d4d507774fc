//! Tag-driven segment extraction.
//!
//! Two complementary cuts of the same series:
//! - tag-centered windows `[c - n, c + n)` around each event tag
//! - inter-tag stretches between consecutive boundaries, each end pulled in
//!   by the same `n` rows so they never reach into a tag-centered window
//!
//! `n` is [`half_window_samples`] of the configured segment length.

use crate::core::alignment::{clamp_range, half_window_samples, index_for};
use crate::reader::types::{Segment, SegmentOrigin, SensorSeries};
use serde::{Deserialize, Serialize};

/// How the closing boundary of the inter-tag sequence is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryConvention {
    /// `start + rows / rate`, the series' own end time
    #[default]
    Derived,
    /// `start + (rows + 2) / rate`: the two header rows counted as samples,
    /// as in datasets built before the end time was unified
    LegacyHeaderRows,
}

impl BoundaryConvention {
    /// Closing boundary of `series` under this convention.
    pub fn end_boundary(self, series: &SensorSeries) -> f64 {
        match self {
            BoundaryConvention::Derived => series.end_time(),
            BoundaryConvention::LegacyHeaderRows => {
                series.start_time + (series.len() + 2) as f64 / series.sampling_rate
            }
        }
    }
}

/// Extract a clipped window around each tag that falls inside the series.
///
/// Tags outside `[start_time, end_time]` are skipped; windows touching an
/// edge come out shorter rather than being dropped. Output follows tag order.
pub fn extract_around_tags(
    series: &SensorSeries,
    tags: &[f64],
    segment_length_seconds: f64,
) -> Vec<Segment> {
    let n = half_window_samples(segment_length_seconds, series.sampling_rate);
    let mut segments = Vec::new();

    for &timestamp in tags {
        if !series.covers(timestamp) {
            tracing::trace!(
                "Tag {} outside {} range [{}, {}]",
                timestamp,
                series.modality,
                series.start_time,
                series.end_time()
            );
            continue;
        }

        let center = index_for(series, timestamp);
        if let Some((from, to)) = clamp_range(
            center.saturating_sub(n),
            center.saturating_add(n),
            series.len(),
        ) {
            segments.push(Segment::from_rows(
                series,
                SegmentOrigin::Tag { timestamp },
                from,
                to,
            ));
        }
    }

    segments
}

/// Extract the stretches between tags, guarded by the half-window.
///
/// With no tags the whole recording is a single segment. An empty series
/// yields nothing.
pub fn extract_between_tags(
    series: &SensorSeries,
    tags: &[f64],
    segment_length_seconds: f64,
    convention: BoundaryConvention,
) -> Vec<Segment> {
    if series.is_empty() {
        return Vec::new();
    }

    if tags.is_empty() {
        return vec![Segment::from_rows(
            series,
            SegmentOrigin::WholeRecording,
            0,
            series.len(),
        )];
    }

    let n = half_window_samples(segment_length_seconds, series.sampling_rate);

    let mut boundaries = Vec::with_capacity(tags.len() + 2);
    boundaries.push(series.start_time);
    boundaries.extend_from_slice(tags);
    boundaries.push(convention.end_boundary(series));

    boundaries
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let from = index_for(series, a).saturating_add(n);
            let to = index_for(series, b).saturating_sub(n);
            if to <= from {
                return None;
            }
            let (from, to) = clamp_range(from, to, series.len())?;
            Some(Segment::from_rows(
                series,
                SegmentOrigin::InterTag { from: a, to: b },
                from,
                to,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::types::Modality;

    fn ramp(start: f64, rate: f64, rows: usize) -> SensorSeries {
        let samples = (0..rows).map(|i| i as f64).collect();
        SensorSeries::new(Modality::Eda, start, rate, samples).unwrap()
    }

    #[test]
    fn test_tag_at_start_clamps_left_edge() {
        let series = SensorSeries::new(Modality::Eda, 1000.0, 4.0, vec![0.0; 400]).unwrap();
        let segments = extract_around_tags(&series, &[1000.0], 40.0);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_index, 0);
        assert_eq!(segments[0].len(), 80);
        assert_eq!(segments[0].origin, SegmentOrigin::Tag { timestamp: 1000.0 });
    }

    #[test]
    fn test_tag_at_end_clamps_right_edge() {
        let series = ramp(1000.0, 4.0, 400);
        let segments = extract_around_tags(&series, &[series.end_time()], 40.0);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index_range(), 320..400);
        assert_eq!(segments[0].values.last(), Some(&399.0));
    }

    #[test]
    fn test_centered_window_is_symmetric() {
        let series = ramp(0.0, 4.0, 400);
        let segments = extract_around_tags(&series, &[50.0], 20.0);

        assert_eq!(segments[0].index_range(), 160..240);
        assert_eq!(segments[0].values[0], 160.0);
    }

    #[test]
    fn test_out_of_range_tags_skipped_in_order() {
        let series = ramp(1000.0, 1.0, 100);
        let tags = [1080.0, 999.0, 1010.0, 1100.5];
        let segments = extract_around_tags(&series, &tags, 10.0);

        let origins: Vec<_> = segments.iter().map(|s| s.origin).collect();
        assert_eq!(
            origins,
            vec![
                SegmentOrigin::Tag { timestamp: 1080.0 },
                SegmentOrigin::Tag { timestamp: 1010.0 },
            ]
        );
    }

    #[test]
    fn test_acc_segments_keep_rows_whole() {
        let samples: Vec<f64> = (0..300).map(f64::from).collect();
        let series = SensorSeries::new(Modality::Acc, 0.0, 10.0, samples).unwrap();
        let segments = extract_around_tags(&series, &[5.0], 2.0);

        assert_eq!(segments[0].width, 3);
        assert_eq!(segments[0].index_range(), 40..60);
        assert_eq!(segments[0].values.len(), 60);
        assert_eq!(segments[0].values[0], 120.0);
    }

    #[test]
    fn test_no_tags_yields_whole_payload() {
        let series = ramp(0.0, 4.0, 37);
        let segments = extract_between_tags(&series, &[], 40.0, BoundaryConvention::Derived);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].origin, SegmentOrigin::WholeRecording);
        assert_eq!(segments[0].values, series.samples());
    }

    #[test]
    fn test_empty_series_yields_nothing() {
        let series = SensorSeries::empty(Modality::Hr);
        let convention = BoundaryConvention::Derived;
        assert!(extract_between_tags(&series, &[], 40.0, convention).is_empty());
        assert!(extract_between_tags(&series, &[1.0], 40.0, convention).is_empty());
        assert!(extract_around_tags(&series, &[0.0], 40.0).is_empty());
    }

    #[test]
    fn test_between_tags_guarded() {
        // 100 s at 4 Hz, tag at 50 s, n = 10 * 4 = 40 rows
        let series = ramp(0.0, 4.0, 400);
        let segments = extract_between_tags(&series, &[50.0], 20.0, BoundaryConvention::Derived);

        let ranges: Vec<_> = segments.iter().map(|s| s.index_range()).collect();
        assert_eq!(ranges, vec![40..160, 240..360]);
        assert_eq!(
            segments[1].origin,
            SegmentOrigin::InterTag {
                from: 50.0,
                to: 100.0
            }
        );
    }

    #[test]
    fn test_close_tags_leave_no_gap_segment() {
        // n = 40 rows, 2n / rate = 20 s; tags 15 s apart
        let series = ramp(0.0, 4.0, 800);
        let segments =
            extract_between_tags(&series, &[60.0, 75.0], 20.0, BoundaryConvention::Derived);

        let ranges: Vec<_> = segments.iter().map(|s| s.index_range()).collect();
        assert_eq!(ranges, vec![40..200, 340..760]);
    }

    #[test]
    fn test_legacy_boundary_extends_last_segment() {
        let series = ramp(0.0, 1.0, 100);
        let derived = extract_between_tags(&series, &[30.0], 10.0, BoundaryConvention::Derived);
        let legacy =
            extract_between_tags(&series, &[30.0], 10.0, BoundaryConvention::LegacyHeaderRows);

        assert_eq!(derived.last().unwrap().index_range(), 35..95);
        assert_eq!(legacy.last().unwrap().index_range(), 35..97);
    }

    #[test]
    fn test_unsorted_tags_skip_backward_pairs() {
        let series = ramp(0.0, 1.0, 100);
        let segments =
            extract_between_tags(&series, &[70.0, 20.0], 10.0, BoundaryConvention::Derived);

        let ranges: Vec<_> = segments.iter().map(|s| s.index_range()).collect();
        assert_eq!(ranges, vec![5..65, 25..95]);
    }

    #[test]
    fn test_tag_and_gap_segments_never_overlap() {
        let series = ramp(0.0, 4.0, 4000);
        let tags = [100.0, 130.0, 400.0, 401.0, 990.0];
        let segment_length = 40.0;

        let mut coverage = vec![0u8; series.len()];
        let around = extract_around_tags(&series, &tags, segment_length);
        let between = extract_between_tags(
            &series,
            &tags,
            segment_length,
            BoundaryConvention::Derived,
        );

        // the two windows around 400/401 overlap each other by construction;
        // check gaps against tag windows and against one another
        for segment in &between {
            for index in segment.index_range() {
                coverage[index] += 1;
            }
        }
        assert!(coverage.iter().all(|&c| c <= 1));

        for segment in &around {
            for index in segment.index_range() {
                assert_eq!(coverage[index], 0, "index {index} covered twice");
            }
        }
    }

    #[test]
    fn test_extreme_inputs_do_not_overflow() {
        let series = ramp(0.0, 4.0, 400);

        let around = extract_around_tags(&series, &[50.0], 1e300);
        assert_eq!(around[0].index_range(), 0..400);

        let between = extract_between_tags(&series, &[50.0], 1e300, BoundaryConvention::Derived);
        assert!(between.is_empty());

        let between =
            extract_between_tags(&series, &[f64::INFINITY], 20.0, BoundaryConvention::Derived);
        assert_eq!(between.len(), 1);
        assert_eq!(between[0].index_range(), 40..400);
    }
}
