//! Dataset assembly across participants and recording folders.
//!
//! Input layout:
//!
//! ```text
//! <input>/<participant>/<recording folder>/{EDA,HR,TEMP,BVP,ACC}.csv
//! <input>/<participant>/<recording folder>/tags.csv
//! ```
//!
//! Participants are processed one at a time. Folders are visited in sorted
//! name order, modalities in [`Modality::ALL`] order, tags in file order, so
//! repeated runs produce identical collections. Each participant's
//! collections are written as soon as the participant completes.

use crate::config::{Config, ConfigError, ExtractionMode};
use crate::core::conditioning::{ConditioningError, ConditioningPipeline};
use crate::core::extract::{Extractor, SegmentationMode};
use crate::core::windowing::WindowError;
use crate::export::{write_collection, TagPresence};
use crate::reader::types::{Modality, Segment};
use crate::reader::{sensor, tags, TagFileError, TAG_FILE_NAME};
use crate::runlog::SharedRunLog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Batch-level errors. Anything finer grained is logged and skipped.
#[derive(Debug)]
pub enum AssembleError {
    Config(ConfigError),
    Window(WindowError),
    Conditioning(ConditioningError),
    /// A directory that must be listed could not be read
    Directory { path: PathBuf, message: String },
    /// Verified tag list of a participant could not be read
    VerifiedTags(TagFileError),
}

impl std::fmt::Display for AssembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssembleError::Config(e) => write!(f, "Configuration error: {e}"),
            AssembleError::Window(e) => write!(f, "Window error: {e}"),
            AssembleError::Conditioning(e) => write!(f, "Conditioning error: {e}"),
            AssembleError::Directory { path, message } => {
                write!(f, "Cannot read directory {path:?}: {message}")
            }
            AssembleError::VerifiedTags(e) => write!(f, "Verified tags error: {e}"),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<ConfigError> for AssembleError {
    fn from(e: ConfigError) -> Self {
        AssembleError::Config(e)
    }
}

impl From<WindowError> for AssembleError {
    fn from(e: WindowError) -> Self {
        AssembleError::Window(e)
    }
}

impl From<ConditioningError> for AssembleError {
    fn from(e: ConditioningError) -> Self {
        AssembleError::Conditioning(e)
    }
}

/// All segments of one participant, grouped by modality.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantDataset {
    pub participant: String,
    pub presence: TagPresence,
    pub collections: BTreeMap<Modality, Vec<Segment>>,
}

impl ParticipantDataset {
    fn new(participant: &str, presence: TagPresence) -> Self {
        Self {
            participant: participant.to_string(),
            presence,
            collections: Modality::ALL.iter().map(|&m| (m, Vec::new())).collect(),
        }
    }

    /// Segments of one modality.
    pub fn segments(&self, modality: Modality) -> &[Segment] {
        self.collections
            .get(&modality)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Segment count per modality.
    pub fn counts(&self) -> BTreeMap<Modality, usize> {
        self.collections
            .iter()
            .map(|(&m, segments)| (m, segments.len()))
            .collect()
    }
}

/// What a finished participant contributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant: String,
    pub counts: BTreeMap<Modality, usize>,
    pub files: Vec<PathBuf>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub participants: Vec<ParticipantSummary>,
    /// Segment count per modality across all participants
    pub totals: BTreeMap<Modality, usize>,
    /// Whether the run stopped early on request
    pub interrupted: bool,
}

/// Walks participant folders and assembles per-modality collections.
pub struct DatasetAssembler {
    config: Config,
    extractor: Extractor,
    log: SharedRunLog,
}

impl DatasetAssembler {
    /// Create an assembler; parameters are validated here.
    pub fn new(config: Config, log: SharedRunLog) -> Result<Self, AssembleError> {
        let conditioner = ConditioningPipeline::new(&config.conditioning)?;
        let extractor =
            Extractor::new(config.window, config.boundary_convention, Some(conditioner))?;
        Ok(Self {
            config,
            extractor,
            log,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Label of every collection this run writes.
    pub fn presence(&self) -> TagPresence {
        if self.config.mode.is_tagged() {
            TagPresence::Tag
        } else {
            TagPresence::NoTag
        }
    }

    /// Configured participants, or every directory under the input root.
    pub fn participants(&self) -> Result<Vec<String>, AssembleError> {
        if !self.config.participants.is_empty() {
            return Ok(self.config.participants.clone());
        }

        Ok(sorted_subdirectories(&self.config.input_directory)?
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    /// Process every participant, saving each as soon as it completes.
    ///
    /// `stop` is checked between participants; when set, the run ends early
    /// and the already-written collections remain valid.
    pub fn run(&self, stop: &AtomicBool) -> Result<DatasetSummary, AssembleError> {
        self.config.ensure_directories()?;

        let mut summary = DatasetSummary::default();

        for participant in self.participants()? {
            if stop.load(Ordering::SeqCst) {
                tracing::info!("Stop requested, ending run before {}", participant);
                summary.interrupted = true;
                break;
            }

            let dataset = match self.process_participant(&participant) {
                Ok(Some(dataset)) => dataset,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Skipping participant {}: {}", participant, e);
                    continue;
                }
            };

            let files = self.persist(&dataset);
            let counts = dataset.counts();
            for (&modality, &count) in &counts {
                *summary.totals.entry(modality).or_insert(0) += count;
            }

            tracing::info!(
                "Saved data of participant {} ({} segments)",
                participant,
                counts.values().sum::<usize>()
            );
            self.log.record_participant_completed();

            summary.participants.push(ParticipantSummary {
                participant,
                counts,
                files,
            });
        }

        Ok(summary)
    }

    /// Extract every folder of one participant.
    ///
    /// Returns `None` when the participant has nothing to contribute in this
    /// mode (no verified tag list).
    pub fn process_participant(
        &self,
        participant: &str,
    ) -> Result<Option<ParticipantDataset>, AssembleError> {
        let verified = match self.config.mode {
            ExtractionMode::VerifiedTags => match self.verified_tags(participant)? {
                Some(verified) => Some(verified),
                None => {
                    tracing::info!("No verified tags for participant {}", participant);
                    return Ok(None);
                }
            },
            _ => None,
        };

        tracing::info!("Extracting data for participant {}", participant);
        let participant_dir = self.config.input_directory.join(participant);
        let mut dataset = ParticipantDataset::new(participant, self.presence());

        for folder in sorted_subdirectories(&participant_dir)? {
            match self.process_folder(&folder, verified.as_deref()) {
                Ok(Some(folder_segments)) => {
                    self.log.record_folder_processed();
                    for (modality, segments) in folder_segments {
                        self.log.record_segments(segments.len() as u64);
                        dataset
                            .collections
                            .entry(modality)
                            .or_default()
                            .extend(segments);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    self.log.record_folder_skipped();
                    tracing::warn!("Skipping folder {:?}: {}", folder, e);
                }
            }
        }

        Ok(Some(dataset))
    }

    /// Extract one recording folder.
    ///
    /// `Ok(None)` means the folder does not take part in this mode (tagged
    /// modes skip untagged folders and the reverse). A bad tag file aborts
    /// only this folder.
    pub fn process_folder(
        &self,
        folder: &Path,
        verified: Option<&[f64]>,
    ) -> Result<Option<Vec<(Modality, Vec<Segment>)>>, TagFileError> {
        let mut folder_tags = tags::read(folder.join(TAG_FILE_NAME))?;
        if self.config.sort_tags {
            folder_tags.sort_by(f64::total_cmp);
        }

        let (selected, mode) = match self.config.mode {
            ExtractionMode::Tagged if !folder_tags.is_empty() => {
                (folder_tags, SegmentationMode::TagCentered)
            }
            ExtractionMode::InterTag => (folder_tags, SegmentationMode::InterTag),
            ExtractionMode::ZeroTagWhole if folder_tags.is_empty() => {
                (folder_tags, SegmentationMode::InterTag)
            }
            ExtractionMode::ZeroTagWindows if folder_tags.is_empty() => {
                (folder_tags, SegmentationMode::FixedWindows)
            }
            ExtractionMode::VerifiedTags if !folder_tags.is_empty() => {
                let matched = match_verified(
                    verified.unwrap_or(&[]),
                    &folder_tags,
                    self.config.verified_tag_tolerance_secs,
                );
                if matched.is_empty() {
                    return Ok(None);
                }
                (matched, SegmentationMode::TagCentered)
            }
            _ => return Ok(None),
        };

        tracing::debug!("Folder {:?}: {} tags, {:?}", folder, selected.len(), mode);

        let mut result = Vec::with_capacity(Modality::ALL.len());
        for modality in Modality::ALL {
            let series = sensor::read(folder.join(modality.file_name()), modality);
            self.log.record_file_read(series.is_empty());

            let segments = match self.extractor.extract_for_modality(&series, &selected, mode) {
                Ok(segments) => segments,
                Err(e) => {
                    // a window shorter than one sample at this modality's rate
                    tracing::warn!("No {} windows for {:?}: {}", modality, folder, e);
                    Vec::new()
                }
            };
            result.push((modality, segments));
        }

        Ok(Some(result))
    }

    /// Write all collections of a participant; failures are logged.
    pub fn persist(&self, dataset: &ParticipantDataset) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for (&modality, segments) in &dataset.collections {
            match write_collection(
                &self.config.output_directory,
                &dataset.participant,
                modality,
                dataset.presence,
                segments,
                self.config.export_format,
            ) {
                Ok(path) => {
                    self.log.record_collection_exported();
                    files.push(path);
                }
                Err(e) => {
                    self.log.record_export_failure();
                    tracing::error!(
                        "Failed to save {} data of participant {}: {}",
                        modality,
                        dataset.participant,
                        e
                    );
                }
            }
        }
        files
    }

    /// Verified tags of a participant, from the first file in the verified
    /// directory named after the participant (see [`is_participant_file`]).
    fn verified_tags(&self, participant: &str) -> Result<Option<Vec<f64>>, AssembleError> {
        let Some(ref dir) = self.config.verified_tags_directory else {
            return Err(AssembleError::Config(ConfigError::MissingVerifiedTags));
        };

        let file = sorted_entries(dir)?.into_iter().find(|path| {
            path.is_file()
                && path
                    .file_name()
                    .map(|n| is_participant_file(&n.to_string_lossy(), participant))
                    .unwrap_or(false)
        });

        let Some(file) = file else {
            return Ok(None);
        };

        let verified = tags::read(&file).map_err(AssembleError::VerifiedTags)?;
        Ok((!verified.is_empty()).then_some(verified))
    }
}

/// Whether `file_name` belongs to `participant`: the identifier followed by
/// `_`, `.` or nothing, so `P1` does not claim `P10_tags.csv`.
pub fn is_participant_file(file_name: &str, participant: &str) -> bool {
    match file_name.strip_prefix(participant) {
        Some(rest) => rest.is_empty() || rest.starts_with(['_', '.']),
        None => false,
    }
}

/// Folder tags within `tolerance` seconds of a verified tag.
///
/// Ordered by verified tag, then folder tag; each folder tag is taken once.
pub fn match_verified(verified: &[f64], folder_tags: &[f64], tolerance: f64) -> Vec<f64> {
    let mut matched: Vec<f64> = Vec::new();
    for &v in verified {
        for &stamp in folder_tags {
            if (v - stamp).abs() < tolerance && !matched.contains(&stamp) {
                matched.push(stamp);
            }
        }
    }
    matched
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, AssembleError> {
    let entries = std::fs::read_dir(dir).map_err(|e| AssembleError::Directory {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();
    Ok(paths)
}

fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, AssembleError> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}
