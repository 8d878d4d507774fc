//! Integration tests for dataset assembly over a recording directory tree

use physio_segmenter::config::{Config, ExportFormat, ExtractionMode};
use physio_segmenter::export::read_collection;
use physio_segmenter::runlog::create_shared_log;
use physio_segmenter::{DatasetAssembler, Modality, SegmentOrigin, WindowParameters};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

const START: f64 = 1000.0;
const DURATION_SECS: usize = 100;

fn rate(modality: Modality) -> usize {
    match modality {
        Modality::Eda | Modality::Temp => 4,
        Modality::Hr => 1,
        Modality::Bvp => 64,
        Modality::Acc => 32,
    }
}

fn sensor_file(modality: Modality) -> String {
    let width = modality.sample_width();
    let header = |value: String| vec![value; width].join(",");

    let mut content = String::new();
    writeln!(content, "{}", header(format!("{START}"))).unwrap();
    writeln!(content, "{}", header(format!("{}", rate(modality)))).unwrap();
    for i in 0..DURATION_SECS * rate(modality) {
        writeln!(content, "{}", header(format!("{i}"))).unwrap();
    }
    content
}

/// Write a recording folder with every modality and the given tags file.
fn write_recording(root: &Path, participant: &str, folder: &str, tags: &str) -> PathBuf {
    let dir = root.join(participant).join(folder);
    std::fs::create_dir_all(&dir).unwrap();
    for modality in Modality::ALL {
        std::fs::write(dir.join(modality.file_name()), sensor_file(modality)).unwrap();
    }
    std::fs::write(dir.join("tags.csv"), tags).unwrap();
    dir
}

fn fixture() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("input");

    write_recording(&input, "P1", "rec_a", "tag\n1050.0\n");
    write_recording(&input, "P1", "rec_b", "");
    write_recording(&input, "P1", "rec_c", "tag\nnot-a-time\n");

    let corrupt = write_recording(&input, "P2", "rec_a", "tag\n1020.0\n");
    std::fs::write(corrupt.join("EDA.csv"), "garbage\n").unwrap();

    root
}

fn config(root: &TempDir, mode: ExtractionMode) -> Config {
    Config {
        input_directory: root.path().join("input"),
        output_directory: root.path().join("output"),
        mode,
        window: WindowParameters {
            segment_length_seconds: 20.0,
            window_length_seconds: 10.0,
            overlap_fraction: 0.5,
        },
        ..Config::default()
    }
}

#[test]
fn test_tagged_run_extracts_around_tags() {
    let root = fixture();
    let log = create_shared_log();
    let assembler =
        DatasetAssembler::new(config(&root, ExtractionMode::Tagged), log.clone()).unwrap();

    let summary = assembler.run(&AtomicBool::new(false)).unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.participants.len(), 2);

    let p1 = &summary.participants[0];
    assert_eq!(p1.participant, "P1");
    assert_eq!(p1.files.len(), 5);
    assert!(p1.counts.values().all(|&c| c == 1));

    // P2's EDA file is corrupt: the other modalities still contribute
    let p2 = &summary.participants[1];
    assert_eq!(p2.counts[&Modality::Eda], 0);
    assert_eq!(p2.counts[&Modality::Hr], 1);
    assert_eq!(summary.totals[&Modality::Bvp], 2);

    let stats = log.stats();
    assert_eq!(stats.folders_processed, 2);
    assert_eq!(stats.folders_skipped, 1);
    assert_eq!(stats.empty_series, 1);
    assert_eq!(stats.collections_exported, 10);
    assert_eq!(stats.participants_completed, 2);

    let output = root.path().join("output");
    let acc = read_collection(&output.join("P1_ACC_TAG.json"), ExportFormat::Json).unwrap();
    assert_eq!(acc.len(), 1);
    assert_eq!(acc[0].origin, SegmentOrigin::Tag { timestamp: 1050.0 });
    // 10 s either side at 32 Hz, three values per row
    assert_eq!(acc[0].len(), 640);
    assert_eq!(acc[0].values.len(), 1920);

    let eda = read_collection(&output.join("P1_EDA_TAG.json"), ExportFormat::Json).unwrap();
    assert_eq!(eda[0].len(), 80);
    assert!(eda[0].values.iter().all(|v| (0.0..=1.0).contains(v)));

    let hr = read_collection(&output.join("P1_HR_TAG.json"), ExportFormat::Json).unwrap();
    assert_eq!(hr[0].values.first(), Some(&40.0));
}

#[test]
fn test_inter_tag_run_covers_gaps_and_untagged_folders() {
    let root = fixture();
    let assembler =
        DatasetAssembler::new(config(&root, ExtractionMode::InterTag), create_shared_log())
            .unwrap();

    let dataset = assembler.process_participant("P1").unwrap().unwrap();
    let hr = dataset.segments(Modality::Hr);

    // rec_a: two guarded gaps around the tag; rec_b: the whole recording
    let ranges: Vec<_> = hr.iter().map(|s| s.index_range()).collect();
    assert_eq!(ranges, vec![10..40, 60..90, 0..100]);
    assert_eq!(hr[2].origin, SegmentOrigin::WholeRecording);
    assert_eq!(
        hr[1].origin,
        SegmentOrigin::InterTag {
            from: 1050.0,
            to: 1100.0
        }
    );
}

#[test]
fn test_zero_tag_windows_only_use_untagged_folders() {
    let root = fixture();
    let mut config = config(&root, ExtractionMode::ZeroTagWindows);
    config.participants = vec!["P1".to_string()];
    config.export_format = ExportFormat::Jsonl;
    let assembler = DatasetAssembler::new(config, create_shared_log()).unwrap();

    let summary = assembler.run(&AtomicBool::new(false)).unwrap();
    let counts = &summary.participants[0].counts;

    // 10 s windows with 5 s step over 100 s
    assert_eq!(counts[&Modality::Eda], 19);
    assert_eq!(counts[&Modality::Hr], 19);

    let path = root.path().join("output").join("P1_TEMP_NO_TAG.jsonl");
    let temp = read_collection(&path, ExportFormat::Jsonl).unwrap();
    assert_eq!(temp.len(), 19);
    assert!(temp.iter().all(|s| s.len() == 40));
}

#[test]
fn test_zero_tag_whole_takes_entire_recording() {
    let root = fixture();
    let assembler = DatasetAssembler::new(
        config(&root, ExtractionMode::ZeroTagWhole),
        create_shared_log(),
    )
    .unwrap();

    let dataset = assembler.process_participant("P1").unwrap().unwrap();
    assert_eq!(dataset.segments(Modality::Bvp).len(), 1);
    assert_eq!(dataset.segments(Modality::Bvp)[0].len(), 6400);
}

#[test]
fn test_verified_tags_filter_folder_tags() {
    let root = fixture();
    let verified = root.path().join("verified");
    std::fs::create_dir_all(&verified).unwrap();
    std::fs::write(verified.join("P1_tags.csv"), "tag\n1052.0\n").unwrap();

    let mut config = config(&root, ExtractionMode::VerifiedTags);
    config.verified_tags_directory = Some(verified);
    let assembler = DatasetAssembler::new(config, create_shared_log()).unwrap();

    let summary = assembler.run(&AtomicBool::new(false)).unwrap();

    // P2 has no verified list and is skipped entirely
    assert_eq!(summary.participants.len(), 1);
    assert_eq!(summary.participants[0].participant, "P1");
    assert_eq!(summary.totals[&Modality::Temp], 1);
}

#[test]
fn test_verified_tags_of_similar_participant_ids_stay_separate() {
    let root = fixture();
    let verified = root.path().join("verified");
    std::fs::create_dir_all(&verified).unwrap();
    std::fs::write(verified.join("P10_tags.csv"), "tag\n1050.0\n").unwrap();

    let mut config = config(&root, ExtractionMode::VerifiedTags);
    config.participants = vec!["P1".to_string()];
    config.verified_tags_directory = Some(verified.clone());
    let assembler = DatasetAssembler::new(config.clone(), create_shared_log()).unwrap();

    // only P10's list exists, so P1 has nothing verified
    assert!(assembler.process_participant("P1").unwrap().is_none());

    std::fs::write(verified.join("P1_tags.csv"), "tag\n1048.0\n").unwrap();
    let assembler = DatasetAssembler::new(config, create_shared_log()).unwrap();
    let dataset = assembler.process_participant("P1").unwrap().unwrap();
    assert_eq!(dataset.segments(Modality::Hr).len(), 1);
}

#[test]
fn test_stop_flag_ends_run_before_next_participant() {
    let root = fixture();
    let assembler =
        DatasetAssembler::new(config(&root, ExtractionMode::Tagged), create_shared_log()).unwrap();

    let summary = assembler.run(&AtomicBool::new(true)).unwrap();

    assert!(summary.interrupted);
    assert!(summary.participants.is_empty());
    assert!(root.path().join("output").is_dir());
}

#[test]
fn test_missing_input_directory_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let config = Config {
        input_directory: root.path().join("nowhere"),
        output_directory: root.path().join("output"),
        ..Config::default()
    };
    assert!(config.validate().is_err());

    let assembler = DatasetAssembler::new(config, create_shared_log()).unwrap();
    assert!(assembler.run(&AtomicBool::new(false)).is_err());
}
