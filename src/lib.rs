//! Physio Segmenter - event-aligned segment extraction for wearable recordings.
//!
//! This library cuts physiological sensor recordings (electrodermal activity,
//! heart rate, skin temperature, blood-volume pulse, acceleration) into
//! segments around externally recorded event tags, for building labeled
//! stress-detection datasets.
//!
//! # Alignment
//!
//! Each sensor file carries only a start time and a sampling rate. The row
//! index of a timestamp is `floor((t - start) * rate)`; every extraction goes
//! through that single truncating rule, so streams recorded at 1, 4, 32 and
//! 64 Hz line up against the same tags.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Physio Segmenter                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐       │
//! │  │   Reader    │──▶│  Segmenters  │──▶│ Conditioning │       │
//! │  │ (csv files) │   │ tag/gap/win  │   │  (EDA only)  │       │
//! │  └─────────────┘   └──────────────┘   └──────────────┘       │
//! │         │                                     │               │
//! │         ▼                                     ▼               │
//! │  ┌─────────────┐                      ┌──────────────┐       │
//! │  │   Run Log   │◀─────────────────────│  Assembler   │       │
//! │  │   (stats)   │                      │  + Export    │       │
//! │  └─────────────┘                      └──────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use physio_segmenter::core::extract_around_tags;
//! use physio_segmenter::reader::{Modality, SensorSeries};
//!
//! // 100 seconds of EDA at 4 Hz, starting at epoch 1000
//! let series = SensorSeries::new(Modality::Eda, 1000.0, 4.0, vec![0.0; 400]).unwrap();
//!
//! // A 40 second segment around a tag at the very start is clipped to 80 rows
//! let segments = extract_around_tags(&series, &[1000.0], 40.0);
//! assert_eq!(segments[0].len(), 80);
//! ```

pub mod assembler;
pub mod config;
pub mod core;
pub mod export;
pub mod reader;
pub mod runlog;

// Re-export key types at crate root for convenience
pub use assembler::{AssembleError, DatasetAssembler, DatasetSummary, ParticipantDataset};
pub use config::{Config, ConfigError, ExportFormat, ExtractionMode};
pub use self::core::{
    BoundaryConvention, Extractor, FixedWindowSegmenter, SegmentationMode, WindowParameters,
};
pub use export::TagPresence;
pub use reader::{Modality, Segment, SegmentOrigin, SensorSeries};
pub use runlog::{RunLog, SharedRunLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
