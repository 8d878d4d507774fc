//! Run statistics for segmentation batches.
//!
//! Tracks what each run read, skipped and exported, and persists it next to
//! the exported collections.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, RunLog, RunStats, SharedRunLog,
    RUN_LOG_FILE_NAME,
};
