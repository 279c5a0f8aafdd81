//! File I/O, validation, and serialization for the chromalign pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::{AnchorReader, RecordingReader};
pub use writer::ResultWriter;
