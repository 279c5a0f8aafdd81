//! Anchor-constrained pairwise alignment of chromatography-MS recordings.
//!
//! Pure math library — zero I/O. Aligns two recordings (time-ordered frame
//! sequences) with banded dynamic time warping: anchors restrict the search
//! to a corridor around known correspondences, a weighted recurrence fills a
//! band-shaped cumulative matrix, and a deterministic traceback recovers the
//! optimal monotonic warping path.

mod align;
mod anchor;
mod batch;
mod cost;
mod error;
mod layout;
mod matrix;
mod recording;
mod recurrence;
mod traceback;
mod weights;

pub use align::{AlignmentConfig, AlignmentResult, Aligner, Stage};
pub use anchor::{Anchor, AnchorSet};
pub use batch::{AlignmentCache, AlignmentJob, align_pairs};
pub use cost::{CostContext, CostFunction};
pub use error::AlignError;
pub use layout::{BandLayout, BandWidth};
pub use matrix::{BandMatrix, Predecessor, PredecessorMatrix};
pub use recording::{Frame, Recording, RecordingId};
pub use traceback::{MoveCounts, WarpingPath, WarpingStep};
pub use weights::RecurrenceWeights;
