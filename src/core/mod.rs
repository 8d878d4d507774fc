//! Core segment-extraction engine.
//!
//! This module contains:
//! - Timestamp to sample-index alignment
//! - Tag-centered and inter-tag segmentation
//! - Fixed-length overlapping windowing
//! - Signal conditioning for electrodermal segments

pub mod alignment;
pub mod conditioning;
pub mod extract;
pub mod segments;
pub mod windowing;

// Re-export commonly used types
pub use alignment::{half_window_samples, index_for};
pub use conditioning::{
    ButterworthLowPass, ConditioningConfig, ConditioningError, ConditioningPipeline, Normalizer,
    SignalConditioner,
};
pub use extract::{Extractor, SegmentationMode};
pub use segments::{extract_around_tags, extract_between_tags, BoundaryConvention};
pub use windowing::{FixedWindowSegmenter, WindowError, WindowParameters};
