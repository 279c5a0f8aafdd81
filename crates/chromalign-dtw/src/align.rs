//! Alignment orchestration: configuration, staged execution, and results.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::anchor::{Anchor, AnchorSet};
use crate::cost::{CostContext, CostFunction};
use crate::error::AlignError;
use crate::layout::{BandLayout, BandWidth};
use crate::matrix::{BandMatrix, PredecessorMatrix};
use crate::recording::{Recording, RecordingId};
use crate::recurrence;
use crate::traceback::{self, MoveCounts, WarpingPath};
use crate::weights::RecurrenceWeights;

/// Configuration for one or more pairwise alignments.
///
/// Construct via [`AlignmentConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default                |
/// |----------------------|------------------------|
/// | `band_width`         | `Fraction(0.25)`       |
/// | `anchor_radius`      | 10                     |
/// | `min_scan_distance`  | 10                     |
/// | `use_global_band`    | false                  |
/// | `precompute_costs`   | true                   |
/// | `normalize`          | false                  |
/// | `keep_matrices`      | false                  |
/// | `weights`            | 1.0 / 1.0 / 1.0, gap 0 |
/// | `cost`               | `AbsoluteDifference`   |
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    band_width: BandWidth,
    anchor_radius: usize,
    min_scan_distance: usize,
    use_global_band: bool,
    precompute_costs: bool,
    normalize: bool,
    keep_matrices: bool,
    weights: RecurrenceWeights,
    cost: CostFunction,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignmentConfig {
    /// Create a config with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            band_width: BandWidth::Fraction(0.25),
            anchor_radius: 10,
            min_scan_distance: 10,
            use_global_band: false,
            precompute_costs: true,
            normalize: false,
            keep_matrices: false,
            weights: RecurrenceWeights::default(),
            cost: CostFunction::AbsoluteDifference,
        }
    }

    // --- Setters ---

    /// Set the corridor half-width.
    #[must_use]
    pub fn with_band_width(mut self, band_width: BandWidth) -> Self {
        self.band_width = band_width;
        self
    }

    /// Set how far the corridor extends around an anchor's diagonal.
    #[must_use]
    pub fn with_anchor_radius(mut self, anchor_radius: usize) -> Self {
        self.anchor_radius = anchor_radius;
        self
    }

    /// Set the minimum scan separation between corridor-shaping anchors.
    #[must_use]
    pub fn with_min_scan_distance(mut self, min_scan_distance: usize) -> Self {
        self.min_scan_distance = min_scan_distance;
        self
    }

    /// Widen every interval by the band width, independent of anchor density.
    #[must_use]
    pub fn with_global_band(mut self, use_global_band: bool) -> Self {
        self.use_global_band = use_global_band;
        self
    }

    /// Precompute all pairwise costs into a band matrix before the
    /// recurrence, instead of evaluating them lazily during the sweep.
    /// Both modes produce identical results.
    #[must_use]
    pub fn with_precompute_costs(mut self, precompute_costs: bool) -> Self {
        self.precompute_costs = precompute_costs;
        self
    }

    /// Also report a score normalized by the path's move composition.
    #[must_use]
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Keep the cost and cumulative band matrices on the result for
    /// diagnostics. Never required for correctness.
    #[must_use]
    pub fn with_keep_matrices(mut self, keep_matrices: bool) -> Self {
        self.keep_matrices = keep_matrices;
        self
    }

    /// Set the recurrence move weights and gap penalty.
    #[must_use]
    pub fn with_weights(mut self, weights: RecurrenceWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the pairwise cost strategy.
    #[must_use]
    pub fn with_cost(mut self, cost: CostFunction) -> Self {
        self.cost = cost;
        self
    }

    // --- Getters ---

    /// Return the corridor half-width.
    #[must_use]
    pub fn band_width(&self) -> BandWidth {
        self.band_width
    }

    /// Return the anchor radius.
    #[must_use]
    pub fn anchor_radius(&self) -> usize {
        self.anchor_radius
    }

    /// Return the minimum scan separation between shaping anchors.
    #[must_use]
    pub fn min_scan_distance(&self) -> usize {
        self.min_scan_distance
    }

    /// Return the recurrence weights.
    #[must_use]
    pub fn weights(&self) -> RecurrenceWeights {
        self.weights
    }

    /// Return the cost strategy.
    #[must_use]
    pub fn cost(&self) -> CostFunction {
        self.cost
    }

    /// Validate the configuration against the chosen cost strategy.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidBandWidthScans`] | Zero absolute band width |
    /// | [`AlignError::InvalidBandWidthFraction`] | Fraction outside `(0.0, 1.0]` |
    /// | [`AlignError::InvalidWeights`] | Non-finite/negative weights or a gap penalty sign inconsistent with the minimize/maximize mode |
    pub fn validate(&self) -> Result<(), AlignError> {
        self.band_width.validate()?;
        self.weights.validate(self.cost.minimizes())
    }

    /// Align `query` against `reference`, driving every stage in order.
    ///
    /// # Errors
    ///
    /// Configuration errors surface before any matrix is allocated;
    /// [`AlignError::DiscontinuousPath`] signals a band too narrow to
    /// contain a valid path (retry with a wider band).
    #[instrument(skip_all, fields(reference = %reference.id(), query = %query.id()))]
    pub fn align(
        &self,
        reference: &Recording,
        query: &Recording,
        anchors: &[Anchor],
    ) -> Result<AlignmentResult, AlignError> {
        let mut aligner = Aligner::new(self, reference, query, anchors)?;
        aligner.build_anchors()?;
        aligner.allocate_matrices()?;
        aligner.prepare_costs()?;
        aligner.run_recurrence()?;
        aligner.trace_path()?;
        aligner.score()
    }
}

/// Execution stage of an [`Aligner`]. Transitions are strictly ordered;
/// no stage may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Config validated, nothing computed yet.
    Initialized,
    /// Anchor set built and validated.
    AnchorsBuilt,
    /// Band layout derived, matrices allocated.
    MatricesAllocated,
    /// Pairwise costs ready (precomputed or deferred to the sweep).
    CostsReady,
    /// Cumulative and predecessor matrices filled.
    RecurrenceDone,
    /// Warping path traced.
    PathTraced,
    /// Final scores computed; the aligner is exhausted.
    Scored,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::AnchorsBuilt => "anchors-built",
            Self::MatricesAllocated => "matrices-allocated",
            Self::CostsReady => "costs-ready",
            Self::RecurrenceDone => "recurrence-done",
            Self::PathTraced => "path-traced",
            Self::Scored => "scored",
        }
    }
}

/// Stepwise aligner for one recording pair.
///
/// Created by [`AlignmentConfig::align`], which drives all stages; exposed
/// so callers can step through stages individually for diagnostics. Each
/// stage method may be called exactly once, in order.
pub struct Aligner<'a> {
    config: &'a AlignmentConfig,
    reference: &'a Recording,
    query: &'a Recording,
    user_anchors: &'a [Anchor],
    stage: Stage,
    anchors: Option<AnchorSet>,
    layout: Option<Arc<BandLayout>>,
    costs: Option<BandMatrix>,
    cumulative: Option<BandMatrix>,
    predecessors: Option<PredecessorMatrix>,
    path: Option<WarpingPath>,
    counts: MoveCounts,
}

impl<'a> Aligner<'a> {
    /// Create an aligner, validating the configuration eagerly.
    ///
    /// # Errors
    ///
    /// See [`AlignmentConfig::validate`].
    pub fn new(
        config: &'a AlignmentConfig,
        reference: &'a Recording,
        query: &'a Recording,
        user_anchors: &'a [Anchor],
    ) -> Result<Self, AlignError> {
        config.validate()?;
        Ok(Self {
            config,
            reference,
            query,
            user_anchors,
            stage: Stage::Initialized,
            anchors: None,
            layout: None,
            costs: None,
            cumulative: None,
            predecessors: None,
            path: None,
            counts: MoveCounts::default(),
        })
    }

    /// Return the current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), AlignError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(AlignError::StageOrder {
                expected: expected.name(),
                found: self.stage.name(),
            })
        }
    }

    /// Build and validate the anchor set.
    ///
    /// # Errors
    ///
    /// Anchor configuration errors; [`AlignError::StageOrder`] out of order.
    pub fn build_anchors(&mut self) -> Result<(), AlignError> {
        self.expect_stage(Stage::Initialized)?;
        let set = AnchorSet::build(
            self.user_anchors,
            self.reference.len(),
            self.query.len(),
            self.config.min_scan_distance,
        )?;
        debug!(
            shaping = set.shaping().len(),
            rejected = set.rejected().len(),
            "anchor set built"
        );
        self.anchors = Some(set);
        self.stage = Stage::AnchorsBuilt;
        Ok(())
    }

    /// Derive the band layout and allocate the cumulative and predecessor
    /// matrices.
    ///
    /// # Errors
    ///
    /// [`AlignError::StageOrder`] out of order.
    pub fn allocate_matrices(&mut self) -> Result<(), AlignError> {
        self.expect_stage(Stage::AnchorsBuilt)?;
        let anchors = self.anchors.as_ref().expect("set in build_anchors");
        let layout = Arc::new(BandLayout::build(
            anchors,
            self.config.anchor_radius,
            self.config.band_width,
            self.config.use_global_band,
        ));
        debug!(
            rows = layout.rows(),
            cols = layout.cols(),
            stored = layout.stored_cells(),
            "band layout built"
        );
        let fill = self.config.cost.unreachable_fill();
        self.cumulative = Some(BandMatrix::new(Arc::clone(&layout), fill));
        self.predecessors = Some(PredecessorMatrix::new(Arc::clone(&layout)));
        self.layout = Some(layout);
        self.stage = Stage::MatricesAllocated;
        Ok(())
    }

    /// Precompute pairwise costs into a band matrix, or mark them for lazy
    /// evaluation during the sweep. Both modes produce identical results.
    ///
    /// # Errors
    ///
    /// [`AlignError::StageOrder`] out of order.
    pub fn prepare_costs(&mut self) -> Result<(), AlignError> {
        self.expect_stage(Stage::MatricesAllocated)?;
        if self.config.precompute_costs {
            let layout = self.layout.as_ref().expect("set in allocate_matrices");
            let mut costs = BandMatrix::new(Arc::clone(layout), self.config.cost.unreachable_fill());
            for i in 0..layout.rows() {
                let (start, len) = layout.column_bounds(i);
                for j in start..start + len {
                    let value = self.config.cost.evaluate(&self.cost_context(i, j));
                    costs.data[layout.flat_offset(i, j)] = value;
                }
            }
            self.costs = Some(costs);
        }
        self.stage = Stage::CostsReady;
        Ok(())
    }

    /// Run the weighted recurrence over the band.
    ///
    /// # Errors
    ///
    /// [`AlignError::StageOrder`] out of order.
    pub fn run_recurrence(&mut self) -> Result<(), AlignError> {
        self.expect_stage(Stage::CostsReady)?;
        let cumulative = self.cumulative.as_mut().expect("set in allocate_matrices");
        let predecessors = self.predecessors.as_mut().expect("set in allocate_matrices");
        let minimizes = self.config.cost.minimizes();

        match &self.costs {
            Some(costs) => {
                let layout = Arc::clone(costs.layout_arc());
                let data = &costs.data;
                recurrence::fill(cumulative, predecessors, &self.config.weights, minimizes, |i, j| {
                    data[layout.flat_offset(i, j)]
                });
            }
            None => {
                let cost = self.config.cost;
                let reference = self.reference;
                let query = self.query;
                recurrence::fill(cumulative, predecessors, &self.config.weights, minimizes, |i, j| {
                    cost.evaluate(&CostContext {
                        reference_index: i,
                        query_index: j,
                        reference_time: reference.time(i),
                        query_time: query.time(j),
                        reference_frame: reference.frame(i),
                        query_frame: query.frame(j),
                    })
                });
            }
        }
        self.stage = Stage::RecurrenceDone;
        Ok(())
    }

    /// Trace the optimal path back from the terminal cell.
    ///
    /// # Errors
    ///
    /// [`AlignError::DiscontinuousPath`] if the band was too narrow;
    /// [`AlignError::StageOrder`] out of order.
    pub fn trace_path(&mut self) -> Result<(), AlignError> {
        self.expect_stage(Stage::RecurrenceDone)?;
        let predecessors = self.predecessors.as_ref().expect("set in allocate_matrices");
        let (path, counts) = traceback::traceback(predecessors)?;
        self.path = Some(path);
        self.counts = counts;
        self.stage = Stage::PathTraced;
        Ok(())
    }

    fn cost_context(&self, i: usize, j: usize) -> CostContext<'a> {
        CostContext {
            reference_index: i,
            query_index: j,
            reference_time: self.reference.time(i),
            query_time: self.query.time(j),
            reference_frame: self.reference.frame(i),
            query_frame: self.query.frame(j),
        }
    }

    /// Compute the final scores and assemble the result, consuming the
    /// aligner's matrices.
    ///
    /// # Errors
    ///
    /// [`AlignError::StageOrder`] out of order.
    pub fn score(&mut self) -> Result<AlignmentResult, AlignError> {
        self.expect_stage(Stage::PathTraced)?;
        let cumulative = self.cumulative.take().expect("set in allocate_matrices");
        let raw_score = cumulative
            .get(cumulative.rows() - 1, cumulative.cols() - 1)
            .expect("terminal cell is always in band");

        let normalized_score = if self.config.normalize {
            Some(normalize_score(raw_score, &self.config.weights, &self.counts))
        } else {
            None
        };

        let stored_cells = cumulative.stored_cells();
        let (cost_matrix, cumulative_matrix) = if self.config.keep_matrices {
            (self.costs.take(), Some(cumulative))
        } else {
            (None, None)
        };

        self.stage = Stage::Scored;
        Ok(AlignmentResult {
            reference_id: self.reference.id().clone(),
            query_id: self.query.id().clone(),
            raw_score,
            normalized_score,
            path: self.path.take().expect("set in trace_path"),
            counts: self.counts,
            stored_cells,
            cost_matrix,
            cumulative_matrix,
        })
    }
}

/// Normalize the raw score by the path's weighted move composition.
///
/// Falls back to the raw score when the weighted denominator is zero.
fn normalize_score(raw: f64, weights: &RecurrenceWeights, counts: &MoveCounts) -> f64 {
    let denominator = weights.diagonal * counts.diagonal as f64
        + weights.expansion * counts.expansion as f64
        + weights.compression * counts.compression as f64;
    if denominator == 0.0 {
        return raw;
    }
    let gap_total = weights.gap_penalty * (counts.expansion + counts.compression) as f64;
    (raw - gap_total) / denominator
}

/// The outcome of one pairwise alignment.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    reference_id: RecordingId,
    query_id: RecordingId,
    raw_score: f64,
    normalized_score: Option<f64>,
    path: WarpingPath,
    counts: MoveCounts,
    stored_cells: usize,
    cost_matrix: Option<BandMatrix>,
    cumulative_matrix: Option<BandMatrix>,
}

impl AlignmentResult {
    /// Return the reference recording id.
    #[must_use]
    pub fn reference_id(&self) -> &RecordingId {
        &self.reference_id
    }

    /// Return the query recording id.
    #[must_use]
    pub fn query_id(&self) -> &RecordingId {
        &self.query_id
    }

    /// Return the raw terminal cumulative score.
    #[must_use]
    pub fn raw_score(&self) -> f64 {
        self.raw_score
    }

    /// Return the normalized score, if normalization was requested.
    #[must_use]
    pub fn normalized_score(&self) -> Option<f64> {
        self.normalized_score
    }

    /// Return the warping path.
    #[must_use]
    pub fn path(&self) -> &WarpingPath {
        &self.path
    }

    /// Return the per-move-type counts.
    #[must_use]
    pub fn counts(&self) -> MoveCounts {
        self.counts
    }

    /// Return the number of stored band cells.
    #[must_use]
    pub fn stored_cells(&self) -> usize {
        self.stored_cells
    }

    /// Return the pairwise cost matrix, if matrices were kept and costs
    /// were precomputed.
    #[must_use]
    pub fn cost_matrix(&self) -> Option<&BandMatrix> {
        self.cost_matrix.as_ref()
    }

    /// Return the cumulative score matrix, if matrices were kept.
    #[must_use]
    pub fn cumulative_matrix(&self) -> Option<&BandMatrix> {
        self.cumulative_matrix.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Frame, RecordingId};

    fn recording(id: &str, values: &[f64]) -> Recording {
        Recording::new(
            RecordingId::new(id.to_string()).unwrap(),
            values.iter().map(|&v| Frame::Scalar(v)).collect(),
        )
        .unwrap()
    }

    fn full_band_config() -> AlignmentConfig {
        AlignmentConfig::new().with_band_width(BandWidth::Fraction(1.0))
    }

    #[test]
    fn identical_recordings_score_zero() {
        let a = recording("a", &[1.0, 2.0, 3.0, 2.0]);
        let b = recording("b", &[1.0, 2.0, 3.0, 2.0]);
        let result = full_band_config().align(&a, &b, &[]).unwrap();
        assert_eq!(result.raw_score(), 0.0);
        assert_eq!(result.counts().diagonal, 3);
        assert_eq!(result.counts().expansion, 0);
        assert_eq!(result.counts().compression, 0);
    }

    #[test]
    fn stage_methods_must_run_in_order() {
        let a = recording("a", &[1.0, 2.0]);
        let b = recording("b", &[1.0, 2.0]);
        let config = full_band_config();
        let mut aligner = Aligner::new(&config, &a, &b, &[]).unwrap();
        let err = aligner.run_recurrence().unwrap_err();
        assert!(matches!(
            err,
            AlignError::StageOrder {
                expected: "costs-ready",
                found: "initialized"
            }
        ));
    }

    #[test]
    fn stages_cannot_repeat() {
        let a = recording("a", &[1.0, 2.0]);
        let b = recording("b", &[1.0, 2.0]);
        let config = full_band_config();
        let mut aligner = Aligner::new(&config, &a, &b, &[]).unwrap();
        aligner.build_anchors().unwrap();
        assert!(aligner.build_anchors().is_err());
        assert_eq!(aligner.stage(), Stage::AnchorsBuilt);
    }

    #[test]
    fn invalid_config_rejected_before_any_allocation() {
        let a = recording("a", &[1.0]);
        let b = recording("b", &[1.0]);
        let config = AlignmentConfig::new().with_band_width(BandWidth::Fraction(2.0));
        let err = config.align(&a, &b, &[]).unwrap_err();
        assert!(matches!(
            err,
            AlignError::InvalidBandWidthFraction { got } if got == 2.0
        ));
    }

    #[test]
    fn lazy_and_precomputed_costs_agree() {
        let a = recording("a", &[0.0, 4.0, 1.0, 3.0, 2.0]);
        let b = recording("b", &[0.0, 3.0, 2.0, 4.0, 1.0]);
        let precomputed = full_band_config()
            .with_precompute_costs(true)
            .align(&a, &b, &[])
            .unwrap();
        let lazy = full_band_config()
            .with_precompute_costs(false)
            .align(&a, &b, &[])
            .unwrap();
        assert_eq!(precomputed.raw_score().to_bits(), lazy.raw_score().to_bits());
        assert_eq!(precomputed.path(), lazy.path());
    }

    #[test]
    fn normalized_score_divides_by_weighted_moves() {
        let a = recording("a", &[1.0, 2.0, 3.0]);
        let b = recording("b", &[2.0, 3.0, 4.0]);
        let result = full_band_config()
            .with_normalize(true)
            .align(&a, &b, &[])
            .unwrap();
        let counts = result.counts();
        let denominator =
            (counts.diagonal + counts.expansion + counts.compression) as f64;
        let expected = result.raw_score() / denominator;
        assert_eq!(result.normalized_score(), Some(expected));
    }

    #[test]
    fn matrices_kept_only_on_request() {
        let a = recording("a", &[1.0, 2.0]);
        let b = recording("b", &[1.0, 2.0]);
        let without = full_band_config().align(&a, &b, &[]).unwrap();
        assert!(without.cumulative_matrix().is_none());
        assert!(without.cost_matrix().is_none());

        let with = full_band_config()
            .with_keep_matrices(true)
            .align(&a, &b, &[])
            .unwrap();
        let cum = with.cumulative_matrix().unwrap();
        assert_eq!(
            cum.get(1, 1).unwrap(),
            with.raw_score()
        );
        assert!(with.cost_matrix().is_some());
    }

    #[test]
    fn length_one_recordings_align_trivially() {
        let a = recording("a", &[5.0]);
        let b = recording("b", &[3.0]);
        let result = full_band_config().align(&a, &b, &[]).unwrap();
        assert_eq!(result.raw_score(), 2.0);
        assert_eq!(result.path().len(), 1);
        assert_eq!(result.counts().total(), 0);
    }

    #[test]
    fn maximizing_cost_uses_negative_infinity_fill() {
        let a = recording("a", &[1.0, 2.0, 3.0]);
        let b = recording("b", &[1.0, 2.0, 3.0]);
        let result = full_band_config()
            .with_cost(CostFunction::DotProduct)
            .align(&a, &b, &[])
            .unwrap();
        // Scalar dot product: maximizing picks the expansion/compression-rich
        // path that accumulates the most product mass.
        assert!(result.raw_score() > 0.0);
    }

    #[test]
    fn anchored_alignment_stays_in_corridor() {
        let n = 40;
        let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin()).collect();
        let a = recording("a", &values);
        let b = recording("b", &values);
        let result = AlignmentConfig::new()
            .with_band_width(BandWidth::Scans(3))
            .with_anchor_radius(3)
            .with_min_scan_distance(5)
            .align(&a, &b, &[Anchor::new(20, 20)])
            .unwrap();
        assert_eq!(result.raw_score(), 0.0);
        assert!(result.stored_cells() < n * n);
    }
}
