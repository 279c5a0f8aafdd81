//! Band layout: the per-row column corridor derived from anchors.

use crate::anchor::AnchorSet;
use crate::error::AlignError;

/// Corridor half-width: an absolute column radius or a fraction of the
/// shorter recording length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandWidth {
    /// Absolute half-width in scans.
    Scans(usize),
    /// Half-width as a fraction of the shorter recording length, in `(0.0, 1.0]`.
    Fraction(f64),
}

impl BandWidth {
    /// Validate the configured width.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidBandWidthScans`] | `Scans(0)` |
    /// | [`AlignError::InvalidBandWidthFraction`] | Fraction outside `(0.0, 1.0]` or non-finite |
    pub fn validate(&self) -> Result<(), AlignError> {
        match *self {
            Self::Scans(0) => Err(AlignError::InvalidBandWidthScans { got: 0 }),
            Self::Scans(_) => Ok(()),
            Self::Fraction(f) if !f.is_finite() || f <= 0.0 || f > 1.0 => {
                Err(AlignError::InvalidBandWidthFraction { got: f })
            }
            Self::Fraction(_) => Ok(()),
        }
    }

    /// Resolve to an absolute half-width in scans for a `rows x cols` matrix.
    pub(crate) fn resolve(&self, rows: usize, cols: usize) -> usize {
        match *self {
            Self::Scans(w) => w,
            Self::Fraction(f) => {
                let shorter = rows.min(cols);
                ((f * shorter as f64).ceil() as usize).max(1)
            }
        }
    }
}

/// Immutable per-row column intervals for one alignment.
///
/// Built once per recording pair; the cost matrix, cumulative matrix, and
/// predecessor matrix all share one layout so the bounds are computed once.
///
/// Invariants guaranteed by [`BandLayout::build`]:
/// - every row interval is non-empty;
/// - consecutive intervals overlap or are adjacent, so a monotonic path can
///   always cross between them;
/// - row 0 contains column 0 and the last row contains the last column.
#[derive(Debug, Clone, PartialEq)]
pub struct BandLayout {
    rows: usize,
    cols: usize,
    /// Inclusive first in-band column per row.
    starts: Vec<usize>,
    /// Interval length per row.
    lens: Vec<usize>,
    /// Flat-storage offset of each row's first cell.
    offsets: Vec<usize>,
    total: usize,
}

impl BandLayout {
    /// Build the corridor for an anchor set.
    ///
    /// Between each consecutive pair of shaping anchors the column center is
    /// linearly interpolated along the local diagonal and the interval is
    /// `center ± half-width`, clipped to the matrix. With interior anchors
    /// the half-width is `anchor_radius`, widened by the resolved band width
    /// when `use_global_band` is set; without interior anchors the resolved
    /// band width itself is the half-width, so a fraction of 1.0 degrades to
    /// unconstrained DTW. A final pass widens intervals where consecutive
    /// rows would otherwise disconnect.
    #[must_use]
    pub fn build(
        anchors: &AnchorSet,
        anchor_radius: usize,
        band_width: BandWidth,
        use_global_band: bool,
    ) -> Self {
        let rows = anchors.rows();
        let cols = anchors.cols();

        if rows == 1 || cols == 1 {
            return Self::from_bounds(rows, cols, vec![0; rows], vec![cols; rows]);
        }

        let resolved = band_width.resolve(rows, cols);
        let half_width = if anchors.interior_count() > 0 {
            if use_global_band {
                anchor_radius + resolved
            } else {
                anchor_radius
            }
        } else {
            // Without interior anchors the corridor follows the endpoint
            // diagonal and the band width alone sets its half-width, so a
            // fraction of 1.0 degrades to unconstrained DTW.
            resolved
        };

        let mut starts = vec![usize::MAX; rows];
        let mut lasts = vec![0usize; rows];
        let radius = half_width as i64;

        for pair in anchors.shaping().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let span = (b.reference - a.reference) as f64;
            for i in a.reference..=b.reference {
                let t = (i - a.reference) as f64 / span;
                let center = a.query as f64 + t * (b.query as f64 - a.query as f64);
                let c = center.round() as i64;
                let lo = (c - radius).max(0) as usize;
                let hi = ((c + radius).min(cols as i64 - 1)) as usize;
                starts[i] = starts[i].min(lo);
                lasts[i] = lasts[i].max(hi);
            }
        }

        // Connectivity: a path steps from row i to row i+1 without moving the
        // column backward, so the next interval must begin no later than one
        // past the previous interval's end. Widening only; the corridor is
        // never narrowed here.
        for i in 1..rows {
            if starts[i] > lasts[i - 1] + 1 {
                starts[i] = lasts[i - 1] + 1;
            }
        }

        let lens = starts
            .iter()
            .zip(lasts.iter())
            .map(|(&s, &l)| l - s + 1)
            .collect();
        Self::from_bounds(rows, cols, starts, lens)
    }

    fn from_bounds(rows: usize, cols: usize, starts: Vec<usize>, lens: Vec<usize>) -> Self {
        let mut offsets = Vec::with_capacity(rows);
        let mut total = 0usize;
        for &len in &lens {
            offsets.push(total);
            total += len;
        }
        Self {
            rows,
            cols,
            starts,
            lens,
            offsets,
            total,
        }
    }

    /// Return the reference frame count (rows).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the query frame count (columns).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return `(start, length)` of the in-band column interval for `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows()`.
    #[must_use]
    pub fn column_bounds(&self, row: usize) -> (usize, usize) {
        (self.starts[row], self.lens[row])
    }

    /// Return true if `(row, col)` lies inside the band.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col >= self.starts[row] && col < self.starts[row] + self.lens[row]
    }

    /// Return the number of stored band cells (sum of interval lengths).
    #[must_use]
    pub fn stored_cells(&self) -> usize {
        self.total
    }

    /// Return the flat storage index of `(row, col)`, or `None` if the cell
    /// is outside the band.
    #[must_use]
    pub fn flat_index(&self, row: usize, col: usize) -> Option<usize> {
        if self.contains(row, col) {
            Some(self.offsets[row] + (col - self.starts[row]))
        } else {
            None
        }
    }

    /// Flat storage index of an in-band cell.
    pub(crate) fn flat_offset(&self, row: usize, col: usize) -> usize {
        debug_assert!(self.contains(row, col), "cell ({row}, {col}) outside band");
        self.offsets[row] + (col - self.starts[row])
    }

    /// Build the out-of-band error for `(row, col)`.
    pub(crate) fn out_of_band(&self, row: usize, col: usize) -> AlignError {
        let (start, end) = if row < self.rows {
            (self.starts[row], self.starts[row] + self.lens[row])
        } else {
            (0, 0)
        };
        AlignError::OutOfBand {
            row,
            col,
            start,
            end,
        }
    }
}
