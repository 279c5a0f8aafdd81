//! CSV readers for recordings and anchor lists, with full input validation.

use std::path::{Path, PathBuf};

use chromalign_dtw::{Anchor, Frame, Recording, RecordingId};
use tracing::{debug, instrument};

use crate::IoError;

/// Reads a scalar-trace recording from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `scan,time,intensity`
/// - One row per scan, in scan order; `time` strictly increasing
///
/// The recording id is derived from the file stem.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyRecording`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has an unexpected column count |
/// | [`IoError::NonFiniteValue`] | A cell is NaN, Inf, or unparseable |
/// | [`IoError::InvalidRecording`] | Engine-side validation failed (e.g. non-increasing time) |
pub struct RecordingReader {
    path: PathBuf,
}

impl RecordingReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`Recording`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Recording, IoError> {
        let id = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IoError::MissingRecordingId {
                path: self.path.clone(),
            })?;
        let id = RecordingId::new(id.to_string()).map_err(|source| IoError::InvalidRecording {
            path: self.path.clone(),
            source,
        })?;

        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) allows rows with varying column counts so that our
        // own InconsistentRowLength check fires instead of a low-level
        // CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut frames = Vec::new();
        let mut times = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != 3 {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: 3,
                    got: record.len(),
                });
            }

            let time = self.parse_cell(&record, row_index, 1)?;
            let intensity = self.parse_cell(&record, row_index, 2)?;
            times.push(time);
            frames.push(Frame::Scalar(intensity));
        }

        if frames.is_empty() {
            return Err(IoError::EmptyRecording {
                path: self.path.clone(),
            });
        }
        debug!(n_frames = frames.len(), "recording parsed");

        Recording::with_times(id, frames, times).map_err(|source| IoError::InvalidRecording {
            path: self.path.clone(),
            source,
        })
    }

    fn parse_cell(
        &self,
        record: &csv::StringRecord,
        row_index: usize,
        col_index: usize,
    ) -> Result<f64, IoError> {
        let raw = record.get(col_index).unwrap_or("");
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                col_index,
                raw: raw.to_string(),
            }),
        }
    }
}

/// Reads an anchor list from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `reference,query`
/// - One row per anchor
///
/// Monotonicity is not checked here; the engine validates the full anchor
/// set as a configuration concern.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InconsistentRowLength`] | Row has an unexpected column count |
/// | [`IoError::InvalidAnchorIndex`] | A cell is not a non-negative integer |
pub struct AnchorReader {
    path: PathBuf,
}

impl AnchorReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read the anchor list. An empty file (header only) yields no anchors.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<Anchor>, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let mut anchors = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != 2 {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: 2,
                    got: record.len(),
                });
            }

            let reference = self.parse_index(&record, row_index, 0)?;
            let query = self.parse_index(&record, row_index, 1)?;
            anchors.push(Anchor::new(reference, query));
        }
        debug!(n_anchors = anchors.len(), "anchor list parsed");
        Ok(anchors)
    }

    fn parse_index(
        &self,
        record: &csv::StringRecord,
        row_index: usize,
        col_index: usize,
    ) -> Result<usize, IoError> {
        let raw = record.get(col_index).unwrap_or("");
        raw.trim()
            .parse::<usize>()
            .map_err(|_| IoError::InvalidAnchorIndex {
                path: self.path.clone(),
                row_index,
                raw: raw.to_string(),
            })
    }
}
