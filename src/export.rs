//! Persisting per-participant segment collections.
//!
//! One file per (participant, modality, tag presence), named
//! `{participant}_{MODALITY}_{TAG|NO_TAG}.{json|jsonl}`.

use crate::config::ExportFormat;
use crate::reader::types::{Modality, Segment};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Whether a collection holds event-centered or baseline segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TagPresence {
    Tag,
    NoTag,
}

impl TagPresence {
    pub fn label(self) -> &'static str {
        match self {
            TagPresence::Tag => "TAG",
            TagPresence::NoTag => "NO_TAG",
        }
    }
}

/// Export errors.
#[derive(Debug)]
pub enum ExportError {
    Io(String),
    Serialization(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "Export IO error: {e}"),
            ExportError::Serialization(e) => write!(f, "Export serialization error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// File name for one collection.
pub fn collection_file_name(
    participant: &str,
    modality: Modality,
    presence: TagPresence,
    format: ExportFormat,
) -> String {
    format!(
        "{}_{}_{}.{}",
        participant,
        modality.label(),
        presence.label(),
        format.extension()
    )
}

/// Write one collection into `directory`, returning the file path.
pub fn write_collection(
    directory: &Path,
    participant: &str,
    modality: Modality,
    presence: TagPresence,
    segments: &[Segment],
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    let path = directory.join(collection_file_name(participant, modality, presence, format));
    let file = File::create(&path).map_err(|e| ExportError::Io(e.to_string()))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Json => serde_json::to_writer(&mut writer, segments)
            .map_err(|e| ExportError::Serialization(e.to_string()))?,
        ExportFormat::Jsonl => {
            for segment in segments {
                serde_json::to_writer(&mut writer, segment)
                    .map_err(|e| ExportError::Serialization(e.to_string()))?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| ExportError::Io(e.to_string()))?;
            }
        }
    }

    writer.flush().map_err(|e| ExportError::Io(e.to_string()))?;
    Ok(path)
}

/// Read back a collection written by [`write_collection`].
pub fn read_collection(path: &Path, format: ExportFormat) -> Result<Vec<Segment>, ExportError> {
    let content = std::fs::read_to_string(path).map_err(|e| ExportError::Io(e.to_string()))?;
    match format {
        ExportFormat::Json => {
            serde_json::from_str(&content).map_err(|e| ExportError::Serialization(e.to_string()))
        }
        ExportFormat::Jsonl => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| ExportError::Serialization(e.to_string()))
            })
            .collect(),
    }
}
