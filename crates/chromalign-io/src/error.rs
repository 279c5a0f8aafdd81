//! I/O error types for chromalign-io.

use std::path::PathBuf;

/// Errors from file I/O, CSV parsing, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty recording (no data rows) in {path}")]
    EmptyRecording {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has an unexpected number of columns.
    #[error("row {row_index} in {path} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns.
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell cannot be parsed as a finite float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based column index.
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when an anchor index cell cannot be parsed as an integer.
    #[error("invalid anchor index in {path}: row {row_index}, raw value \"{raw}\"")]
    InvalidAnchorIndex {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a file stem cannot provide a usable recording id.
    #[error("cannot derive a recording id from path {path}")]
    MissingRecordingId {
        /// Path to the input file.
        path: PathBuf,
    },

    /// Returned when the recording fails engine-side validation
    /// (non-increasing timestamps, non-finite values).
    #[error("invalid recording in {path}: {source}")]
    InvalidRecording {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying validation error.
        source: chromalign_dtw::AlignError,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
