//! Traceback: recover the warping path from the predecessor matrix.

use crate::error::AlignError;
use crate::matrix::{Predecessor, PredecessorMatrix};

/// One step of a warping path, mapping a reference frame to a query frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarpingStep {
    /// Frame index in the reference recording.
    pub reference: usize,
    /// Frame index in the query recording.
    pub query: usize,
}

/// The optimal monotonic warping path from `(0, 0)` to `(rows-1, cols-1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpingPath(Vec<WarpingStep>);

impl WarpingPath {
    pub(crate) fn new(steps: Vec<WarpingStep>) -> Self {
        Self(steps)
    }

    /// Return the steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[WarpingStep] {
        &self.0
    }

    /// Return the number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a WarpingPath {
    type Item = &'a WarpingStep;
    type IntoIter = std::slice::Iter<'a, WarpingStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-move-type counts of a warping path, used for score normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveCounts {
    /// Number of diagonal (match) moves.
    pub diagonal: usize,
    /// Number of expansion (horizontal) moves.
    pub expansion: usize,
    /// Number of compression (vertical) moves.
    pub compression: usize,
}

impl MoveCounts {
    /// Return the total number of moves (one less than the path length).
    #[must_use]
    pub fn total(&self) -> usize {
        self.diagonal + self.expansion + self.compression
    }
}

/// Walk the predecessor matrix from the terminal cell back to the origin.
///
/// Any `Unset` marker on the walk means the band was too narrow to contain
/// a valid path: the error is surfaced rather than patched, and the caller's
/// remedy is to widen the band and retry the whole alignment.
pub(crate) fn traceback(
    predecessors: &PredecessorMatrix,
) -> Result<(WarpingPath, MoveCounts), AlignError> {
    let layout = predecessors.layout();
    let mut i = layout.rows() - 1;
    let mut j = layout.cols() - 1;
    let mut steps = Vec::with_capacity(layout.rows().max(layout.cols()));
    let mut counts = MoveCounts::default();

    loop {
        steps.push(WarpingStep {
            reference: i,
            query: j,
        });
        let marker = match layout.flat_index(i, j) {
            Some(idx) => predecessors.data[idx],
            None => return Err(AlignError::DiscontinuousPath { row: i, col: j }),
        };
        match marker {
            Predecessor::Unset => return Err(AlignError::DiscontinuousPath { row: i, col: j }),
            Predecessor::Origin => break,
            Predecessor::Diagonal => {
                if i == 0 || j == 0 {
                    return Err(AlignError::DiscontinuousPath { row: i, col: j });
                }
                counts.diagonal += 1;
                i -= 1;
                j -= 1;
            }
            Predecessor::Expansion => {
                if j == 0 {
                    return Err(AlignError::DiscontinuousPath { row: i, col: j });
                }
                counts.expansion += 1;
                j -= 1;
            }
            Predecessor::Compression => {
                if i == 0 {
                    return Err(AlignError::DiscontinuousPath { row: i, col: j });
                }
                counts.compression += 1;
                i -= 1;
            }
        }
    }

    steps.reverse();
    Ok((WarpingPath::new(steps), counts))
}
