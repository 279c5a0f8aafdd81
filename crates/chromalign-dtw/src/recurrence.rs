//! The weighted dynamic-programming recurrence over the band.

use std::sync::Arc;

use crate::matrix::{BandMatrix, Predecessor, PredecessorMatrix};
use crate::weights::RecurrenceWeights;

/// Fill the cumulative matrix and predecessor matrix over the shared band.
///
/// Rows are swept in order and columns in increasing order within each row,
/// so every predecessor cell is final before it is read. Per cell the three
/// candidates are
///
/// - diagonal: `cum(i-1, j-1) + diagonal * cost`
/// - expansion: `cum(i, j-1) + expansion * cost + gap_penalty`
/// - compression: `cum(i-1, j) + compression * cost + gap_penalty`
///
/// Candidates whose predecessor lies outside the band are excluded;
/// predecessors holding the unreachable fill value lose every comparison
/// against a finite candidate, so unreachability propagates without extra
/// bookkeeping. Ties prefer diagonal over expansion over compression, which
/// makes paths reproducible. Cells with no finite candidate keep the fill
/// value and an `Unset` predecessor.
///
/// Runs in O(stored band cells).
pub(crate) fn fill<F>(
    cumulative: &mut BandMatrix,
    predecessors: &mut PredecessorMatrix,
    weights: &RecurrenceWeights,
    minimizes: bool,
    mut local_cost: F,
) where
    F: FnMut(usize, usize) -> f64,
{
    debug_assert!(
        Arc::ptr_eq(cumulative.layout_arc(), predecessors.layout_arc()),
        "cumulative and predecessor matrices must share one layout"
    );
    let layout = Arc::clone(cumulative.layout_arc());
    let cum = &mut cumulative.data;
    let pred = &mut predecessors.data;

    for i in 0..layout.rows() {
        let (start, len) = layout.column_bounds(i);
        for j in start..start + len {
            let cost = local_cost(i, j);
            let idx = layout.flat_offset(i, j);

            if i == 0 && j == 0 {
                if cost.is_finite() {
                    cum[idx] = cost;
                    pred[idx] = Predecessor::Origin;
                }
                continue;
            }

            let mut best: Option<(f64, Predecessor)> = None;
            let mut consider = |value: f64, direction: Predecessor| match best {
                None => best = Some((value, direction)),
                Some((current, _)) => {
                    let improves = if minimizes {
                        value < current
                    } else {
                        value > current
                    };
                    if improves {
                        best = Some((value, direction));
                    }
                }
            };

            if i > 0
                && j > 0
                && let Some(p) = layout.flat_index(i - 1, j - 1)
            {
                consider(cum[p] + weights.diagonal * cost, Predecessor::Diagonal);
            }
            if j > 0 && let Some(p) = layout.flat_index(i, j - 1) {
                consider(
                    cum[p] + weights.expansion * cost + weights.gap_penalty,
                    Predecessor::Expansion,
                );
            }
            if i > 0 && let Some(p) = layout.flat_index(i - 1, j) {
                consider(
                    cum[p] + weights.compression * cost + weights.gap_penalty,
                    Predecessor::Compression,
                );
            }

            if let Some((value, direction)) = best
                && value.is_finite()
            {
                cum[idx] = value;
                pred[idx] = direction;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorSet;
    use crate::layout::{BandLayout, BandWidth};

    fn matrices(rows: usize, cols: usize, fill: f64) -> (BandMatrix, PredecessorMatrix) {
        let set = AnchorSet::build(&[], rows, cols, 1).unwrap();
        let layout = Arc::new(BandLayout::build(
            &set,
            0,
            BandWidth::Fraction(1.0),
            false,
        ));
        let cum = BandMatrix::new(Arc::clone(&layout), fill);
        let pred = PredecessorMatrix::new(layout);
        (cum, pred)
    }

    #[test]
    fn hand_computed_two_by_two() {
        // costs: c(0,0)=1, c(0,1)=0, c(1,0)=0, c(1,1)=1
        // cum(0,0) = 1 (unweighted base case)
        // cum(0,1) = 1 + 1*0 + 0 = 1 (expansion)
        // cum(1,0) = 1 + 1*0 + 0 = 1 (compression)
        // cum(1,1) = min(1 + 1, 1 + 1, 1 + 1) = 2, diagonal wins the tie
        let costs = [[1.0, 0.0], [0.0, 1.0]];
        let (mut cum, mut pred) = matrices(2, 2, f64::INFINITY);
        fill(&mut cum, &mut pred, &RecurrenceWeights::default(), true, |i, j| {
            costs[i][j]
        });

        assert_eq!(cum.get(0, 0).unwrap(), 1.0);
        assert_eq!(cum.get(0, 1).unwrap(), 1.0);
        assert_eq!(cum.get(1, 0).unwrap(), 1.0);
        assert_eq!(cum.get(1, 1).unwrap(), 2.0);
        assert_eq!(pred.get(0, 0).unwrap(), Predecessor::Origin);
        assert_eq!(pred.get(0, 1).unwrap(), Predecessor::Expansion);
        assert_eq!(pred.get(1, 0).unwrap(), Predecessor::Compression);
        assert_eq!(pred.get(1, 1).unwrap(), Predecessor::Diagonal);
    }

    #[test]
    fn gap_penalty_charged_on_off_diagonal_moves() {
        let (mut cum, mut pred) = matrices(2, 2, f64::INFINITY);
        let weights = RecurrenceWeights::new(1.0, 1.0, 1.0, 10.0);
        fill(&mut cum, &mut pred, &weights, true, |_, _| 0.0);

        assert_eq!(cum.get(0, 1).unwrap(), 10.0);
        assert_eq!(cum.get(1, 0).unwrap(), 10.0);
        // Diagonal avoids the penalty entirely.
        assert_eq!(cum.get(1, 1).unwrap(), 0.0);
        assert_eq!(pred.get(1, 1).unwrap(), Predecessor::Diagonal);
    }

    #[test]
    fn maximizing_selects_largest_candidate() {
        // Similarities: every pair scores 1.0, so longer paths accumulate more.
        let (mut cum, mut pred) = matrices(2, 2, f64::NEG_INFINITY);
        fill(&mut cum, &mut pred, &RecurrenceWeights::default(), false, |_, _| 1.0);

        // cum(1,1): diagonal = 1 + 1 = 2; expansion via cum(1,0)=2 gives 3.
        assert_eq!(cum.get(1, 1).unwrap(), 3.0);
        assert_eq!(pred.get(1, 1).unwrap(), Predecessor::Expansion);
    }

    #[test]
    fn weighted_diagonal_scales_local_cost() {
        let (mut cum, mut pred) = matrices(2, 2, f64::INFINITY);
        let weights = RecurrenceWeights::new(2.0, 1.0, 1.0, 0.0);
        let costs = [[1.0, 5.0], [5.0, 3.0]];
        fill(&mut cum, &mut pred, &weights, true, |i, j| costs[i][j]);

        // diag candidate at (1,1): 1 + 2*3 = 7
        // expansion: cum(0,1)=1+5=6, then 6 + 3 = 9
        // compression: cum(1,0)=1+5=6, then 6 + 3 = 9
        assert_eq!(cum.get(1, 1).unwrap(), 7.0);
        assert_eq!(pred.get(1, 1).unwrap(), Predecessor::Diagonal);
    }

    #[test]
    fn tie_prefers_expansion_over_compression() {
        // Make the diagonal candidate worse, leave expansion == compression.
        let costs = [[0.0, 0.0], [0.0, 5.0]];
        let (mut cum, mut pred) = matrices(2, 2, f64::INFINITY);
        let weights = RecurrenceWeights::new(100.0, 1.0, 1.0, 0.0);
        fill(&mut cum, &mut pred, &weights, true, |i, j| costs[i][j]);

        // expansion and compression both give 0 + 5 = 5; diagonal gives 500.
        assert_eq!(cum.get(1, 1).unwrap(), 5.0);
        assert_eq!(pred.get(1, 1).unwrap(), Predecessor::Expansion);
    }

    #[test]
    fn narrow_band_accumulates_along_the_diagonal() {
        // Radius-1 band on a 3x3 matrix with unit cost everywhere.
        let set = AnchorSet::build(&[], 3, 3, 1).unwrap();
        let layout = Arc::new(BandLayout::build(&set, 0, BandWidth::Scans(1), false));
        let mut cum = BandMatrix::new(Arc::clone(&layout), f64::INFINITY);
        let mut pred = PredecessorMatrix::new(layout);
        fill(&mut cum, &mut pred, &RecurrenceWeights::default(), true, |_, _| 1.0);

        assert_eq!(cum.get(0, 0).unwrap(), 1.0);
        assert_eq!(cum.get(1, 1).unwrap(), 2.0);
        assert_eq!(cum.get(2, 2).unwrap(), 3.0);
        assert_eq!(pred.get(2, 2).unwrap(), Predecessor::Diagonal);
    }
}
