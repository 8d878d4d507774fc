//! Reading recordings from disk.
//!
//! This module provides:
//! - Sensor file parsing into typed series (fail-soft)
//! - Event tag file parsing (strict)

pub mod sensor;
pub mod tags;
pub mod types;

// Re-export commonly used types
pub use sensor::ReadError;
pub use tags::{TagFileError, TAG_FILE_NAME};
pub use types::{Modality, Segment, SegmentOrigin, SensorSeries};
