//! Move weights for the alignment recurrence.

use crate::error::AlignError;

/// Per-move weights and the global gap penalty of the weighted recurrence.
///
/// The diagonal weight scales the local cost of a matched pair; expansion
/// and compression weights scale the cost of off-diagonal moves, each of
/// which additionally pays the gap penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecurrenceWeights {
    /// Weight of the diagonal (match) move.
    pub diagonal: f64,
    /// Weight of the expansion (horizontal) move.
    pub expansion: f64,
    /// Weight of the compression (vertical) move.
    pub compression: f64,
    /// Flat penalty added to every off-diagonal move.
    pub gap_penalty: f64,
}

impl Default for RecurrenceWeights {
    fn default() -> Self {
        Self {
            diagonal: 1.0,
            expansion: 1.0,
            compression: 1.0,
            gap_penalty: 0.0,
        }
    }
}

impl RecurrenceWeights {
    /// Create weights from explicit values.
    #[must_use]
    pub fn new(diagonal: f64, expansion: f64, compression: f64, gap_penalty: f64) -> Self {
        Self {
            diagonal,
            expansion,
            compression,
            gap_penalty,
        }
    }

    /// Validate the weights against the cost function's optimization mode.
    ///
    /// Move weights must be finite and non-negative. The gap penalty must
    /// be finite, and its sign must penalize: `>= 0` when minimizing,
    /// `<= 0` when maximizing.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidWeights`] on any violation.
    pub fn validate(&self, minimizes: bool) -> Result<(), AlignError> {
        let moves = [self.diagonal, self.expansion, self.compression];
        if moves.iter().any(|w| !w.is_finite()) || !self.gap_penalty.is_finite() {
            return Err(AlignError::InvalidWeights {
                reason: "weights must be finite",
            });
        }
        if moves.iter().any(|&w| w < 0.0) {
            return Err(AlignError::InvalidWeights {
                reason: "move weights must be non-negative",
            });
        }
        if minimizes && self.gap_penalty < 0.0 {
            return Err(AlignError::InvalidWeights {
                reason: "gap penalty must be non-negative for a minimizing cost function",
            });
        }
        if !minimizes && self.gap_penalty > 0.0 {
            return Err(AlignError::InvalidWeights {
                reason: "gap penalty must be non-positive for a maximizing cost function",
            });
        }
        Ok(())
    }
}
