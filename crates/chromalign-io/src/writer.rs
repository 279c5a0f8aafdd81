//! JSON and CSV result writers for alignment outputs.

use std::fs;
use std::path::{Path, PathBuf};

use chromalign_dtw::{AlignmentResult, BandMatrix};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::ExperimentName;
use crate::IoError;

/// Writes alignment results to JSON and CSV files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_alignment.json`,
/// `{experiment}_path.csv`, and optionally `{experiment}_cumulative.csv`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

#[derive(Serialize)]
struct AlignmentArtifact<'a> {
    experiment: &'a str,
    reference: &'a str,
    query: &'a str,
    raw_score: f64,
    normalized_score: Option<f64>,
    path_length: usize,
    n_diagonal: usize,
    n_expansion: usize,
    n_compression: usize,
    stored_cells: usize,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write the alignment summary to `{experiment}_alignment.json` and the
    /// warping path to `{experiment}_path.csv`. When the result carries its
    /// cumulative matrix, it is additionally dumped to
    /// `{experiment}_cumulative.csv` for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if any file cannot be written.
    #[instrument(skip_all)]
    pub fn write_alignment(&self, result: &AlignmentResult) -> Result<(), IoError> {
        let counts = result.counts();
        let artifact = AlignmentArtifact {
            experiment: self.experiment.as_str(),
            reference: result.reference_id().as_str(),
            query: result.query_id().as_str(),
            raw_score: result.raw_score(),
            normalized_score: result.normalized_score(),
            path_length: result.path().len(),
            n_diagonal: counts.diagonal,
            n_expansion: counts.expansion,
            n_compression: counts.compression,
            stored_cells: result.stored_cells(),
        };

        let json_path = self
            .output_dir
            .join(format!("{}_alignment.json", self.experiment.as_str()));
        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&json_path, &json).map_err(|e| IoError::WriteFile {
            path: json_path.clone(),
            source: e,
        })?;

        self.write_path_csv(result)?;
        if let Some(cumulative) = result.cumulative_matrix() {
            self.write_matrix_csv(cumulative)?;
        }

        info!(path = %json_path.display(), "alignment result written");
        Ok(())
    }

    /// Write the warping path as `step,reference,query` rows.
    fn write_path_csv(&self, result: &AlignmentResult) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_path.csv", self.experiment.as_str()));

        let mut lines = String::from("step,reference,query\n");
        for (step, pair) in result.path().steps().iter().enumerate() {
            lines.push_str(&format!("{step},{},{}\n", pair.reference, pair.query));
        }
        fs::write(&path, &lines).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })
    }

    /// Dump the band matrix as `row,col,value` rows, in-band cells only.
    fn write_matrix_csv(&self, matrix: &BandMatrix) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_cumulative.csv", self.experiment.as_str()));

        let layout = matrix.layout();
        let mut lines = String::from("row,col,value\n");
        for row in 0..layout.rows() {
            let (start, len) = layout.column_bounds(row);
            for col in start..start + len {
                let value = matrix.get(row, col).expect("in-band cell by construction");
                lines.push_str(&format!("{row},{col},{value}\n"));
            }
        }
        fs::write(&path, &lines).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })
    }
}
