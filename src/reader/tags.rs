//! Event tag file parsing.
//!
//! A tag file has one header line followed by one event per line, with the
//! epoch timestamp in the first column. Fewer than two lines means the
//! recording has no events.

use csv::{ReaderBuilder, Trim};
use std::path::Path;

/// Name of the tag file inside a recording folder.
pub const TAG_FILE_NAME: &str = "tags.csv";

/// Failure to parse a tag file.
#[derive(Debug)]
pub enum TagFileError {
    Io(String),
    Malformed { line: u64, value: String },
}

impl std::fmt::Display for TagFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagFileError::Io(e) => write!(f, "IO error: {e}"),
            TagFileError::Malformed { line, value } => {
                write!(f, "malformed tag {value:?} on line {line}")
            }
        }
    }
}

impl std::error::Error for TagFileError {}

/// Read the tag timestamps of a file, in file order.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<f64>, TagFileError> {
    let content =
        std::fs::read_to_string(path.as_ref()).map_err(|e| TagFileError::Io(e.to_string()))?;
    parse(&content)
}

/// Parse tag file content. See [`read`].
pub fn parse(content: &str) -> Result<Vec<f64>, TagFileError> {
    if content.lines().count() < 2 {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut timestamps = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| TagFileError::Io(e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let raw = record.get(0).unwrap_or("");
        let timestamp = raw
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| TagFileError::Malformed {
                line,
                value: raw.to_string(),
            })?;
        timestamps.push(timestamp);
    }

    Ok(timestamps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_header_only() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("timestamp\n").unwrap().is_empty());
        assert!(parse("timestamp").unwrap().is_empty());
    }

    #[test]
    fn test_file_order_preserved() {
        let tags = parse("timestamp\n1600000300.5\n1600000100.25\n").unwrap();
        assert_eq!(tags, vec![1600000300.5, 1600000100.25]);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let tags = parse("timestamp,note\n200.0,walk\n300.0\n").unwrap();
        assert_eq!(tags, vec![200.0, 300.0]);
    }

    #[test]
    fn test_malformed_row_is_error() {
        let err = parse("timestamp\n100.0\nlater\n").unwrap_err();
        match err {
            TagFileError::Malformed { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "later");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_non_finite_tag_is_error() {
        for raw in ["inf", "-inf", "NaN"] {
            let err = parse(&format!("timestamp\n100.0\n{raw}\n")).unwrap_err();
            assert!(matches!(err, TagFileError::Malformed { line: 3, .. }));
        }
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read(dir.path().join(TAG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, TagFileError::Io(_)));
    }
}
