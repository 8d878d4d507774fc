//! Configuration for a segmentation run.

use crate::core::conditioning::ConditioningConfig;
use crate::core::segments::BoundaryConvention;
use crate::core::windowing::{WindowError, WindowParameters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a run extracts and under which label it is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// Segments centered on every tag of folders that have tags
    #[default]
    Tagged,
    /// Guarded stretches between tags, from every folder
    InterTag,
    /// The whole recording of folders without tags
    ZeroTagWhole,
    /// Fixed overlapping windows over folders without tags
    ZeroTagWindows,
    /// Segments centered on folder tags confirmed by a verified tag list
    VerifiedTags,
}

impl ExtractionMode {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tagged" | "tag" => Some(Self::Tagged),
            "inter-tag" | "between" => Some(Self::InterTag),
            "zero-tag-whole" => Some(Self::ZeroTagWhole),
            "zero-tag-windows" | "windows" => Some(Self::ZeroTagWindows),
            "verified-tags" | "verified" => Some(Self::VerifiedTags),
            _ => None,
        }
    }

    /// Whether the run produces event-labeled segments.
    pub fn is_tagged(self) -> bool {
        matches!(self, Self::Tagged | Self::VerifiedTags)
    }
}

/// On-disk format of exported collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One JSON array per file
    #[default]
    Json,
    /// One segment per line
    Jsonl,
}

impl ExportFormat {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::Jsonl),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Jsonl => "jsonl",
        }
    }
}

/// Main configuration for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root holding one directory per participant
    pub input_directory: PathBuf,

    /// Destination for exported collections and the run log
    pub output_directory: PathBuf,

    /// Participants to process; empty means every directory under the input
    pub participants: Vec<String>,

    pub mode: ExtractionMode,

    pub window: WindowParameters,

    /// End boundary used by inter-tag extraction
    pub boundary_convention: BoundaryConvention,

    /// Sort each folder's tags chronologically before extraction
    pub sort_tags: bool,

    /// Electrodermal filtering and normalization
    pub conditioning: ConditioningConfig,

    /// Directory of per-participant verified tag files
    pub verified_tags_directory: Option<PathBuf>,

    /// Maximum distance between a verified tag and a folder tag, in seconds
    pub verified_tag_tolerance_secs: f64,

    pub export_format: ExportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("."),
            output_directory: PathBuf::from("segments"),
            participants: Vec::new(),
            mode: ExtractionMode::Tagged,
            window: WindowParameters::default(),
            boundary_convention: BoundaryConvention::Derived,
            sort_tags: false,
            conditioning: ConditioningConfig::default(),
            verified_tags_directory: None,
            verified_tag_tolerance_secs: 10.0,
            export_format: ExportFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("physio-segmenter")
            .join("config.json")
    }

    /// Check parameters and required inputs before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate().map_err(ConfigError::InvalidWindow)?;

        if !self.input_directory.is_dir() {
            return Err(ConfigError::MissingDirectory(self.input_directory.clone()));
        }

        if self.mode == ExtractionMode::VerifiedTags {
            match &self.verified_tags_directory {
                Some(dir) if dir.is_dir() => {}
                Some(dir) => return Err(ConfigError::MissingDirectory(dir.clone())),
                None => return Err(ConfigError::MissingVerifiedTags),
            }
        }

        Ok(())
    }

    /// Ensure the output directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_directory)
            .map_err(|e| ConfigError::IoError(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    MissingDirectory(PathBuf),
    MissingVerifiedTags,
    InvalidWindow(WindowError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::MissingDirectory(p) => write!(f, "Directory not found: {p:?}"),
            ConfigError::MissingVerifiedTags => {
                write!(f, "verified-tags mode needs a verified tags directory")
            }
            ConfigError::InvalidWindow(e) => write!(f, "Invalid window parameters: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
