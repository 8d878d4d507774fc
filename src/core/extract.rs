//! Single entry point tying the segmenters to a modality.
//!
//! Modality-specific behavior is limited to the conditioning flag: EDA
//! segments are filtered and normalized after extraction, every other
//! modality is returned raw.

use crate::core::conditioning::{ConditioningPipeline, SignalConditioner};
use crate::core::segments::{extract_around_tags, extract_between_tags, BoundaryConvention};
use crate::core::windowing::{FixedWindowSegmenter, WindowError, WindowParameters};
use crate::reader::types::{Segment, SensorSeries};
use serde::{Deserialize, Serialize};

/// Which cut to take from a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMode {
    /// Windows centered on each tag
    TagCentered,
    /// Guarded stretches between tags (whole recording when untagged)
    InterTag,
    /// Fixed overlapping windows over the whole recording, tags ignored
    FixedWindows,
}

/// Segment extraction with a fixed parameter set.
#[derive(Debug, Clone)]
pub struct Extractor {
    params: WindowParameters,
    windows: FixedWindowSegmenter,
    convention: BoundaryConvention,
    conditioner: Option<ConditioningPipeline>,
}

impl Extractor {
    pub fn new(
        params: WindowParameters,
        convention: BoundaryConvention,
        conditioner: Option<ConditioningPipeline>,
    ) -> Result<Self, WindowError> {
        params.validate()?;
        Ok(Self {
            windows: FixedWindowSegmenter::from_parameters(&params)?,
            params,
            convention,
            conditioner,
        })
    }

    /// Extract the segments of one series, conditioning them if its
    /// modality asks for it.
    pub fn extract_for_modality(
        &self,
        series: &SensorSeries,
        tags: &[f64],
        mode: SegmentationMode,
    ) -> Result<Vec<Segment>, WindowError> {
        let segment_length = self.params.segment_length_seconds;
        let mut segments = match mode {
            SegmentationMode::TagCentered => extract_around_tags(series, tags, segment_length),
            SegmentationMode::InterTag => {
                extract_between_tags(series, tags, segment_length, self.convention)
            }
            SegmentationMode::FixedWindows => {
                let whole = extract_between_tags(series, &[], segment_length, self.convention);
                self.windows.segment_collection(&whole, series.sampling_rate)?
            }
        };

        if series.modality.is_conditioned() {
            if let Some(ref conditioner) = self.conditioner {
                for segment in &mut segments {
                    // rows are stored flat, so the values are already raveled
                    segment.values = conditioner.condition(&segment.values);
                }
            }
        }

        Ok(segments)
    }
}
