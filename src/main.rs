//! Physio Segmenter CLI
//!
//! Extracts tagged and baseline segments from a directory of participant
//! recordings.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use physio_segmenter::{
    config::{Config, ExportFormat, ExtractionMode},
    core::Normalizer,
    runlog::{create_shared_log_with_persistence, RUN_LOG_FILE_NAME},
    BoundaryConvention, DatasetAssembler, VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "physio-segment")]
#[command(version = VERSION)]
#[command(about = "Extract event-aligned segments from wearable sensor recordings")]
struct Cli {
    /// Directory that contains one folder per participant
    #[arg(short = 'i', long = "input_directory")]
    input_directory: PathBuf,

    /// Directory to store the processed collections
    #[arg(short = 'o', long = "output_directory")]
    output_directory: PathBuf,

    /// Window size in seconds
    #[arg(short = 'w', long = "window_size")]
    window_size: u32,

    /// Extraction mode (tagged, inter-tag, zero-tag-whole, zero-tag-windows, verified-tags)
    #[arg(long)]
    mode: Option<String>,

    /// Comma-separated participant folders (default: all)
    #[arg(long)]
    participants: Option<String>,

    /// Overlap fraction between consecutive fixed windows
    #[arg(long)]
    overlap: Option<f64>,

    /// Segment length in seconds for the inter-tag guard band (default: window size)
    #[arg(long = "segment_length")]
    segment_length: Option<f64>,

    /// Directory of per-participant verified tag files
    #[arg(long = "verified_tags_directory")]
    verified_tags_directory: Option<PathBuf>,

    /// Export format (json or jsonl)
    #[arg(long)]
    format: Option<String>,

    /// Normalizer for EDA segments (min-max or z-score)
    #[arg(long)]
    normalizer: Option<String>,

    /// Count the two header rows when computing the inter-tag end boundary
    #[arg(long = "legacy_boundaries")]
    legacy_boundaries: bool,

    /// Sort each folder's tags chronologically
    #[arg(long = "sort_tags")]
    sort_tags: bool,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(cli)?;
    config.validate().context("Invalid configuration")?;
    config
        .ensure_directories()
        .with_context(|| format!("Cannot create {:?}", config.output_directory))?;

    println!("Physio Segmenter v{VERSION}");
    println!();
    println!("  Input: {:?}", config.input_directory);
    println!("  Output: {:?}", config.output_directory);
    println!("  Mode: {:?}", config.mode);
    println!(
        "  Segment length: {}s, window: {}s, overlap: {}",
        config.window.segment_length_seconds,
        config.window.window_length_seconds,
        config.window.overlap_fraction
    );
    println!();

    let log = create_shared_log_with_persistence(config.output_directory.join(RUN_LOG_FILE_NAME));
    let assembler = DatasetAssembler::new(config, log.clone()).context("Cannot start run")?;

    // Set up Ctrl+C handler
    let stop = Arc::new(AtomicBool::new(false));
    ctrlc_handler(stop.clone())?;

    let summary = assembler.run(&stop)?;

    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save run log: {e}");
    }

    for (modality, count) in &summary.totals {
        println!("  {modality}: {count} segments");
    }
    if summary.interrupted {
        println!("Run interrupted; completed participants were saved.");
    }
    println!();
    println!("{}", log.summary());

    Ok(())
}

/// Load the base configuration, then apply the command-line flags.
///
/// The base is `--config` when given, otherwise the default config file when
/// it exists, otherwise built-in defaults.
fn build_config(cli: Cli) -> Result<Config> {
    let (config, from_file) = match cli.config {
        Some(ref path) => {
            let config = Config::load_from(path)
                .with_context(|| format!("Cannot load config {path:?}"))?;
            (config, true)
        }
        None => {
            let from_file = Config::config_path().exists();
            let config = Config::load().context("Cannot load default config")?;
            (config, from_file)
        }
    };

    apply_flags(cli, config, from_file)
}

/// Override `config` with the flags that were given.
///
/// Without `--segment_length`, a file-provided segment length is kept and a
/// built-in default follows the window size.
fn apply_flags(cli: Cli, mut config: Config, from_file: bool) -> Result<Config> {
    config.input_directory = cli.input_directory;
    config.output_directory = cli.output_directory;

    let window_size = f64::from(cli.window_size);
    config.window.window_length_seconds = window_size;
    match cli.segment_length {
        Some(length) => config.window.segment_length_seconds = length,
        None if !from_file => config.window.segment_length_seconds = window_size,
        None => {}
    }

    if let Some(mode) = cli.mode {
        config.mode =
            ExtractionMode::from_name(&mode).ok_or_else(|| anyhow!("Unknown mode: {mode}"))?;
    }
    if let Some(participants) = cli.participants {
        config.participants = participants
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }
    if let Some(overlap) = cli.overlap {
        config.window.overlap_fraction = overlap;
    }
    if let Some(dir) = cli.verified_tags_directory {
        config.verified_tags_directory = Some(dir);
    }
    if let Some(format) = cli.format {
        config.export_format =
            ExportFormat::from_name(&format).ok_or_else(|| anyhow!("Unknown format: {format}"))?;
    }
    if let Some(normalizer) = cli.normalizer {
        config.conditioning.normalizer = Normalizer::from_name(&normalizer)
            .ok_or_else(|| anyhow!("Unknown normalizer: {normalizer}"))?;
    }
    if cli.legacy_boundaries {
        config.boundary_convention = BoundaryConvention::LegacyHeaderRows;
    }
    if cli.sort_tags {
        config.sort_tags = true;
    }

    Ok(config)
}

/// Set up Ctrl+C handler; the run stops after the current participant.
fn ctrlc_handler(stop: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}
