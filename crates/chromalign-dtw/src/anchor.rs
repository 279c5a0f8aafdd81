//! Anchors: trusted correspondences between reference and query frames.

use crate::error::AlignError;

/// A known correspondence between a reference frame and a query frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Anchor {
    /// Frame index in the reference recording.
    pub reference: usize,
    /// Frame index in the query recording.
    pub query: usize,
}

impl Anchor {
    /// Create a new anchor.
    #[must_use]
    pub fn new(reference: usize, query: usize) -> Self {
        Self { reference, query }
    }
}

/// A validated anchor set for one recording pair.
///
/// Always contains the synthetic endpoints `(0, 0)` and `(rows-1, cols-1)`.
/// User anchors are sorted, deduplicated, and checked for strict
/// monotonicity in both coordinates; a violation is a configuration error,
/// never silently fixed. Interior anchors closer than the minimum scan
/// distance to their accepted predecessor are rejected for corridor shaping
/// but retained for reporting.
#[derive(Debug, Clone)]
pub struct AnchorSet {
    shaping: Vec<Anchor>,
    rejected: Vec<Anchor>,
    rows: usize,
    cols: usize,
}

impl AnchorSet {
    /// Build the anchor set for a `rows x cols` alignment matrix.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::AnchorOutOfBounds`] | An anchor lies outside the matrix |
    /// | [`AlignError::NonMonotonicAnchors`] | Sorted, deduplicated anchors are not strictly increasing in both coordinates |
    pub fn build(
        anchors: &[Anchor],
        rows: usize,
        cols: usize,
        min_scan_distance: usize,
    ) -> Result<Self, AlignError> {
        debug_assert!(rows > 0 && cols > 0, "recordings are validated non-empty");

        for &a in anchors {
            if a.reference >= rows || a.query >= cols {
                return Err(AlignError::AnchorOutOfBounds {
                    reference: a.reference,
                    query: a.query,
                    rows,
                    cols,
                });
            }
        }

        // A single-row or single-column matrix admits only the trivial
        // corridor; endpoint anchors would coincide in one coordinate, so
        // user anchors cannot shape anything here.
        if rows == 1 || cols == 1 {
            let mut shaping = vec![Anchor::new(0, 0)];
            let terminal = Anchor::new(rows - 1, cols - 1);
            if terminal != shaping[0] {
                shaping.push(terminal);
            }
            return Ok(Self {
                shaping,
                rejected: Vec::new(),
                rows,
                cols,
            });
        }

        let mut sorted: Vec<Anchor> = anchors.to_vec();
        sorted.push(Anchor::new(0, 0));
        sorted.push(Anchor::new(rows - 1, cols - 1));
        sorted.sort();
        sorted.dedup();

        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b.reference <= a.reference || b.query <= a.query {
                return Err(AlignError::NonMonotonicAnchors {
                    first_reference: a.reference,
                    first_query: a.query,
                    second_reference: b.reference,
                    second_query: b.query,
                });
            }
        }

        // Reject interior anchors closer than min_scan_distance (in either
        // coordinate) to the previously accepted anchor. Endpoints always
        // shape the corridor.
        let terminal = *sorted.last().expect("endpoints are always present");
        let mut shaping = vec![sorted[0]];
        let mut rejected = Vec::new();
        for &a in &sorted[1..sorted.len() - 1] {
            let prev = *shaping.last().expect("shaping starts non-empty");
            if a.reference - prev.reference < min_scan_distance
                || a.query - prev.query < min_scan_distance
            {
                rejected.push(a);
            } else {
                shaping.push(a);
            }
        }
        shaping.push(terminal);

        Ok(Self {
            shaping,
            rejected,
            rows,
            cols,
        })
    }

    /// Return the anchors that shape the corridor, endpoints included.
    #[must_use]
    pub fn shaping(&self) -> &[Anchor] {
        &self.shaping
    }

    /// Return anchors rejected for corridor shaping (too close to a neighbor).
    #[must_use]
    pub fn rejected(&self) -> &[Anchor] {
        &self.rejected
    }

    /// Return the number of shaping anchors between the endpoints.
    #[must_use]
    pub fn interior_count(&self) -> usize {
        self.shaping.len().saturating_sub(2)
    }

    /// Return the reference frame count.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the query frame count.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_added_when_no_user_anchors() {
        let set = AnchorSet::build(&[], 50, 60, 10).unwrap();
        assert_eq!(set.shaping(), &[Anchor::new(0, 0), Anchor::new(49, 59)]);
        assert_eq!(set.interior_count(), 0);
        assert!(set.rejected().is_empty());
    }

    #[test]
    fn user_anchors_sorted_and_kept() {
        let anchors = [Anchor::new(30, 32), Anchor::new(15, 14)];
        let set = AnchorSet::build(&anchors, 50, 60, 10).unwrap();
        assert_eq!(
            set.shaping(),
            &[
                Anchor::new(0, 0),
                Anchor::new(15, 14),
                Anchor::new(30, 32),
                Anchor::new(49, 59),
            ]
        );
        assert_eq!(set.interior_count(), 2);
    }

    #[test]
    fn duplicate_anchors_deduplicated() {
        let anchors = [Anchor::new(20, 20), Anchor::new(20, 20)];
        let set = AnchorSet::build(&anchors, 50, 50, 10).unwrap();
        assert_eq!(set.shaping().len(), 3);
    }

    #[test]
    fn non_monotonic_anchors_rejected() {
        // Crossing pair: second anchor goes backward in query.
        let anchors = [Anchor::new(10, 30), Anchor::new(20, 20)];
        let result = AnchorSet::build(&anchors, 50, 50, 1);
        assert!(matches!(result, Err(AlignError::NonMonotonicAnchors { .. })));
    }

    #[test]
    fn equal_reference_rows_rejected() {
        let anchors = [Anchor::new(10, 20), Anchor::new(10, 30)];
        let result = AnchorSet::build(&anchors, 50, 50, 1);
        assert!(matches!(result, Err(AlignError::NonMonotonicAnchors { .. })));
    }

    #[test]
    fn out_of_bounds_anchor_rejected() {
        let result = AnchorSet::build(&[Anchor::new(50, 10)], 50, 50, 1);
        assert!(matches!(result, Err(AlignError::AnchorOutOfBounds { .. })));
    }

    #[test]
    fn close_anchor_rejected_but_retained() {
        let anchors = [Anchor::new(20, 20), Anchor::new(25, 25)];
        let set = AnchorSet::build(&anchors, 100, 100, 10).unwrap();
        assert_eq!(
            set.shaping(),
            &[Anchor::new(0, 0), Anchor::new(20, 20), Anchor::new(99, 99)]
        );
        assert_eq!(set.rejected(), &[Anchor::new(25, 25)]);
    }

    #[test]
    fn anchor_near_origin_rejected() {
        let set = AnchorSet::build(&[Anchor::new(3, 3)], 100, 100, 10).unwrap();
        assert_eq!(set.interior_count(), 0);
        assert_eq!(set.rejected(), &[Anchor::new(3, 3)]);
    }

    #[test]
    fn single_row_matrix_uses_trivial_corridor() {
        let set = AnchorSet::build(&[], 1, 6, 10).unwrap();
        assert_eq!(set.shaping(), &[Anchor::new(0, 0), Anchor::new(0, 5)]);
    }

    #[test]
    fn single_cell_matrix_has_one_anchor() {
        let set = AnchorSet::build(&[], 1, 1, 10).unwrap();
        assert_eq!(set.shaping(), &[Anchor::new(0, 0)]);
    }
}
