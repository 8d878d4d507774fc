//! Run statistics log.
//!
//! Counts what a segmentation run read, skipped and wrote, so a finished or
//! interrupted run can be audited from the output directory alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// File name of the persisted log inside the output directory.
pub const RUN_LOG_FILE_NAME: &str = "run_log.json";

/// Statistics for the current run.
#[derive(Debug)]
pub struct RunLog {
    /// Unique identifier of this run
    run_id: Uuid,
    /// Sensor files opened
    files_read: AtomicU64,
    /// Sensor reads that produced no rows (missing, corrupt or empty files)
    empty_series: AtomicU64,
    /// Recording folders segmented
    folders_processed: AtomicU64,
    /// Recording folders skipped because of their tag file
    folders_skipped: AtomicU64,
    /// Segments extracted across all modalities
    segments_extracted: AtomicU64,
    /// Participants fully processed and saved
    participants_completed: AtomicU64,
    /// Per-modality collections written to disk
    collections_exported: AtomicU64,
    /// Collections that failed to write
    export_failures: AtomicU64,
    /// Run start time
    run_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl RunLog {
    /// Create a new run log.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            files_read: AtomicU64::new(0),
            empty_series: AtomicU64::new(0),
            folders_processed: AtomicU64::new(0),
            folders_skipped: AtomicU64::new(0),
            segments_extracted: AtomicU64::new(0),
            participants_completed: AtomicU64::new(0),
            collections_exported: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a run log that is saved to `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);
        log
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Record a sensor file read and whether it produced rows.
    pub fn record_file_read(&self, empty: bool) {
        self.files_read.fetch_add(1, Ordering::Relaxed);
        if empty {
            self.empty_series.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_folder_processed(&self) {
        self.folders_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_folder_skipped(&self) {
        self.folders_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record extracted segments.
    pub fn record_segments(&self, count: u64) {
        self.segments_extracted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_participant_completed(&self) {
        self.participants_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_collection_exported(&self) {
        self.collections_exported.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export_failure(&self) {
        self.export_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RunStats {
        RunStats {
            run_id: self.run_id,
            files_read: self.files_read.load(Ordering::Relaxed),
            empty_series: self.empty_series.load(Ordering::Relaxed),
            folders_processed: self.folders_processed.load(Ordering::Relaxed),
            folders_skipped: self.folders_skipped.load(Ordering::Relaxed),
            segments_extracted: self.segments_extracted.load(Ordering::Relaxed),
            participants_completed: self.participants_completed.load(Ordering::Relaxed),
            collections_exported: self.collections_exported.load(Ordering::Relaxed),
            export_failures: self.export_failures.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics ({}):\n\
             - Participants completed: {}\n\
             - Folders processed: {}\n\
             - Folders skipped: {}\n\
             - Sensor files read: {} ({} empty or unreadable)\n\
             - Segments extracted: {}\n\
             - Collections exported: {} ({} failed)\n\
             - Run duration: {} seconds",
            stats.run_id,
            stats.participants_completed,
            stats.folders_processed,
            stats.folders_skipped,
            stats.files_read,
            stats.empty_series,
            stats.segments_extracted,
            stats.collections_exported,
            stats.export_failures,
            stats.run_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let persisted = PersistedStats {
                stats: self.stats(),
                finished_at: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub files_read: u64,
    pub empty_series: u64,
    pub folders_processed: u64,
    pub folders_skipped: u64,
    pub segments_extracted: u64,
    pub participants_completed: u64,
    pub collections_exported: u64,
    pub export_failures: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    #[serde(flatten)]
    stats: RunStats,
    finished_at: DateTime<Utc>,
}

/// Shared run log.
pub type SharedRunLog = Arc<RunLog>;

/// Create a new shared run log.
pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

/// Create a new shared run log saved to `path`.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}
