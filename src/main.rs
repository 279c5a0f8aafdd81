use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use chromalign_dtw::{
    align_pairs, AlignmentCache, AlignmentConfig, AlignmentJob, BandWidth, CostFunction,
    Recording, RecurrenceWeights,
};
use chromalign_io::{AnchorReader, ExperimentName, RecordingReader, ResultWriter};

#[derive(Parser)]
#[command(name = "chromalign")]
#[command(about = "Anchor-constrained pairwise alignment of chromatography-MS recordings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared alignment parameters.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Corridor half-width as a fraction of the shorter recording length
    #[arg(long, default_value_t = 0.25, conflicts_with = "band_scans")]
    band_fraction: f64,

    /// Corridor half-width as an absolute number of scans
    #[arg(long)]
    band_scans: Option<usize>,

    /// How far the corridor extends around an anchor's diagonal
    #[arg(long, default_value_t = 10)]
    anchor_radius: usize,

    /// Minimum scan separation between corridor-shaping anchors
    #[arg(long, default_value_t = 10)]
    min_scan_distance: usize,

    /// Widen every corridor row by the band width, independent of anchors
    #[arg(long, default_value_t = false)]
    global_band: bool,

    /// Evaluate pairwise costs during the sweep instead of precomputing them
    #[arg(long, default_value_t = false)]
    lazy_costs: bool,

    /// Also report a score normalized by the path's move composition
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// Keep and dump the cumulative band matrix for diagnostics
    #[arg(long, default_value_t = false)]
    keep_matrices: bool,

    /// Pairwise cost strategy: "absolute-difference", "dot-product", or "correlation"
    #[arg(long, default_value = "absolute-difference")]
    cost: String,

    /// Weight of the diagonal (match) move
    #[arg(long, default_value_t = 1.0)]
    diagonal_weight: f64,

    /// Weight of the expansion (horizontal) move
    #[arg(long, default_value_t = 1.0)]
    expansion_weight: f64,

    /// Weight of the compression (vertical) move
    #[arg(long, default_value_t = 1.0)]
    compression_weight: f64,

    /// Flat penalty added to every off-diagonal move
    #[arg(long, default_value_t = 0.0)]
    gap_penalty: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Align one query recording against a reference
    Align {
        /// Path to the reference trace CSV (scan,time,intensity)
        #[arg(long)]
        reference: PathBuf,

        /// Path to the query trace CSV
        #[arg(long)]
        query: PathBuf,

        /// Optional anchor list CSV (reference,query)
        #[arg(long)]
        anchors: Option<PathBuf>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Align every query CSV in a directory against one reference, in parallel
    Batch {
        /// Path to the reference trace CSV
        #[arg(long)]
        reference: PathBuf,

        /// Directory of query trace CSVs
        #[arg(long)]
        queries: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct AlignOutput {
    experiment: String,
    reference: String,
    query: String,
    raw_score: f64,
    normalized_score: Option<f64>,
    path_length: usize,
    n_diagonal: usize,
    n_expansion: usize,
    n_compression: usize,
}

#[derive(Serialize)]
struct BatchOutput {
    experiment: String,
    reference: String,
    n_queries: usize,
    n_failed: usize,
    results: Vec<BatchPairOutput>,
}

#[derive(Serialize)]
struct BatchPairOutput {
    query: String,
    raw_score: Option<f64>,
    normalized_score: Option<f64>,
    path_length: Option<usize>,
    error: Option<String>,
}

fn parse_cost(s: &str) -> Result<CostFunction> {
    match s {
        "absolute-difference" => Ok(CostFunction::AbsoluteDifference),
        "dot-product" => Ok(CostFunction::DotProduct),
        "correlation" => Ok(CostFunction::Correlation),
        other => anyhow::bail!(
            "unknown cost strategy: {other} (expected absolute-difference, dot-product, or correlation)"
        ),
    }
}

fn build_config(tuning: &TuningArgs) -> Result<AlignmentConfig> {
    let band_width = match tuning.band_scans {
        Some(scans) => BandWidth::Scans(scans),
        None => BandWidth::Fraction(tuning.band_fraction),
    };
    let config = AlignmentConfig::new()
        .with_band_width(band_width)
        .with_anchor_radius(tuning.anchor_radius)
        .with_min_scan_distance(tuning.min_scan_distance)
        .with_global_band(tuning.global_band)
        .with_precompute_costs(!tuning.lazy_costs)
        .with_normalize(tuning.normalize)
        .with_keep_matrices(tuning.keep_matrices)
        .with_weights(RecurrenceWeights::new(
            tuning.diagonal_weight,
            tuning.expansion_weight,
            tuning.compression_weight,
            tuning.gap_penalty,
        ))
        .with_cost(parse_cost(&tuning.cost)?);
    config.validate().context("invalid alignment configuration")?;
    Ok(config)
}

fn read_query_dir(dir: &PathBuf) -> Result<Vec<Recording>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read query directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut recordings = Vec::with_capacity(paths.len());
    for path in &paths {
        let recording = RecordingReader::new(path)
            .read()
            .with_context(|| format!("failed to read query {}", path.display()))?;
        recordings.push(recording);
    }
    Ok(recordings)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Align {
            reference,
            query,
            anchors,
            experiment,
            output_dir,
            tuning,
        } => {
            let config = build_config(&tuning)?;
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let reference_rec = RecordingReader::new(&reference)
                .read()
                .context("failed to read reference recording")?;
            let query_rec = RecordingReader::new(&query)
                .read()
                .context("failed to read query recording")?;
            info!(
                reference = %reference_rec.id(),
                query = %query_rec.id(),
                n_ref = reference_rec.len(),
                n_query = query_rec.len(),
                "recordings loaded"
            );

            let anchor_list = match &anchors {
                Some(path) => AnchorReader::new(path)
                    .read()
                    .context("failed to read anchor list")?,
                None => Vec::new(),
            };

            let result = config
                .align(&reference_rec, &query_rec, &anchor_list)
                .context("alignment failed")?;
            info!(
                raw_score = result.raw_score(),
                path_length = result.path().len(),
                "alignment complete"
            );

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_alignment(&result)?;

            let counts = result.counts();
            let output = AlignOutput {
                experiment,
                reference: reference_rec.id().as_str().to_string(),
                query: query_rec.id().as_str().to_string(),
                raw_score: result.raw_score(),
                normalized_score: result.normalized_score(),
                path_length: result.path().len(),
                n_diagonal: counts.diagonal,
                n_expansion: counts.expansion,
                n_compression: counts.compression,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Batch {
            reference,
            queries,
            experiment,
            output_dir,
            tuning,
        } => {
            let config = build_config(&tuning)?;
            ExperimentName::new(experiment.clone())?;

            let reference_rec = RecordingReader::new(&reference)
                .read()
                .context("failed to read reference recording")?;
            let query_recs = read_query_dir(&queries)?;
            anyhow::ensure!(
                !query_recs.is_empty(),
                "no query CSV files in {}",
                queries.display()
            );
            info!(n_queries = query_recs.len(), "batch loaded");

            let jobs: Vec<AlignmentJob<'_>> = query_recs
                .iter()
                .map(|query| AlignmentJob {
                    reference: &reference_rec,
                    query,
                    anchors: &[],
                })
                .collect();

            let cache = AlignmentCache::new();
            let results = align_pairs(&config, &jobs, &cache);

            let mut outputs = Vec::with_capacity(results.len());
            let mut n_failed = 0;
            for (query, result) in query_recs.iter().zip(&results) {
                match result {
                    Ok(res) => {
                        let name = format!("{}_{}", experiment, query.id());
                        match ExperimentName::new(name) {
                            Ok(per_pair) => {
                                ResultWriter::new(&output_dir, per_pair)?.write_alignment(res)?;
                            }
                            Err(_) => warn!(
                                query = %query.id(),
                                "query id not usable in file names, skipping artifact"
                            ),
                        }
                        outputs.push(BatchPairOutput {
                            query: query.id().as_str().to_string(),
                            raw_score: Some(res.raw_score()),
                            normalized_score: res.normalized_score(),
                            path_length: Some(res.path().len()),
                            error: None,
                        });
                    }
                    Err(err) => {
                        warn!(query = %query.id(), error = %err, "pair alignment failed");
                        n_failed += 1;
                        outputs.push(BatchPairOutput {
                            query: query.id().as_str().to_string(),
                            raw_score: None,
                            normalized_score: None,
                            path_length: None,
                            error: Some(err.to_string()),
                        });
                    }
                }
            }
            cache.clear();

            let output = BatchOutput {
                experiment,
                reference: reference_rec.id().as_str().to_string(),
                n_queries: query_recs.len(),
                n_failed,
                results: outputs,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
