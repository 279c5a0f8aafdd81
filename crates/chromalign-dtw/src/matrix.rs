//! Band-shaped matrices over a shared layout.

use std::sync::Arc;

use crate::error::AlignError;
use crate::layout::BandLayout;

/// A 2D `f64` container that stores only in-band cells.
///
/// The backing store is sized to the sum of the per-row interval lengths,
/// never `rows x cols`. Cells outside a row's interval cannot be read or
/// written; the fill value (`+inf` for minimizing cost functions, `-inf`
/// for maximizing) makes untouched band-adjacent cells behave as
/// unreachable.
#[derive(Debug, Clone, PartialEq)]
pub struct BandMatrix {
    layout: Arc<BandLayout>,
    pub(crate) data: Vec<f64>,
}

impl BandMatrix {
    /// Create a band matrix over `layout` with every cell set to `fill`.
    #[must_use]
    pub fn new(layout: Arc<BandLayout>, fill: f64) -> Self {
        let data = vec![fill; layout.stored_cells()];
        Self { layout, data }
    }

    /// Create a second matrix with the identical band layout, without
    /// recomputing the bounds.
    #[must_use]
    pub fn with_same_layout(&self, fill: f64) -> Self {
        Self::new(Arc::clone(&self.layout), fill)
    }

    /// Return the shared layout.
    #[must_use]
    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub(crate) fn layout_arc(&self) -> &Arc<BandLayout> {
        &self.layout
    }

    /// Return the number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.layout.rows()
    }

    /// Return the number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.layout.cols()
    }

    /// Return the number of stored cells.
    #[must_use]
    pub fn stored_cells(&self) -> usize {
        self.data.len()
    }

    /// Read the value at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::OutOfBand`] if the cell lies outside row's
    /// band interval. Never clamped.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, AlignError> {
        self.layout
            .flat_index(row, col)
            .map(|idx| self.data[idx])
            .ok_or_else(|| self.layout.out_of_band(row, col))
    }

    /// Write the value at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::OutOfBand`] if the cell lies outside row's
    /// band interval. Never clamped.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), AlignError> {
        match self.layout.flat_index(row, col) {
            Some(idx) => {
                self.data[idx] = value;
                Ok(())
            }
            None => Err(self.layout.out_of_band(row, col)),
        }
    }
}

/// Predecessor direction of one cumulative-matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Predecessor {
    /// Never written: the cell was unreachable within the band.
    Unset,
    /// The origin cell `(0, 0)`.
    Origin,
    /// Came from `(i-1, j-1)`.
    Diagonal,
    /// Came from `(i, j-1)` — one reference frame maps to several query frames.
    Expansion,
    /// Came from `(i-1, j)` — several reference frames map to one query frame.
    Compression,
}

/// Predecessor directions over the same band layout as the cumulative
/// matrix. Written once per cell by the recurrence, read once by traceback.
#[derive(Debug, Clone)]
pub struct PredecessorMatrix {
    layout: Arc<BandLayout>,
    pub(crate) data: Vec<Predecessor>,
}

impl PredecessorMatrix {
    /// Create a predecessor matrix with every cell `Unset`.
    #[must_use]
    pub fn new(layout: Arc<BandLayout>) -> Self {
        let data = vec![Predecessor::Unset; layout.stored_cells()];
        Self { layout, data }
    }

    /// Return the shared layout.
    #[must_use]
    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub(crate) fn layout_arc(&self) -> &Arc<BandLayout> {
        &self.layout
    }

    /// Read the predecessor at `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::OutOfBand`] if the cell lies outside the band.
    pub fn get(&self, row: usize, col: usize) -> Result<Predecessor, AlignError> {
        self.layout
            .flat_index(row, col)
            .map(|idx| self.data[idx])
            .ok_or_else(|| self.layout.out_of_band(row, col))
    }
}
