//! Error types for recording validation and alignment.

/// Errors from recording validation, corridor construction, and alignment.
///
/// Every variant is fatal to the single alignment call that raised it.
/// There is no silent degradation: band-geometry violations and traceback
/// discontinuities abort rather than clamp, since clamping would silently
/// corrupt the score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignError {
    /// Returned when a recording is constructed with zero frames.
    #[error("recording must contain at least one frame")]
    EmptyRecording,

    /// Returned when a recording id is empty.
    #[error("recording id must not be empty")]
    EmptyRecordingId,

    /// Returned when a frame contains NaN, infinity, or negative infinity.
    #[error("frame {frame} contains a non-finite value")]
    NonFiniteValue {
        /// Index of the offending frame.
        frame: usize,
    },

    /// Returned when a spectrum frame's mass values are not strictly increasing.
    #[error("frame {frame}: mass values must be strictly increasing")]
    UnsortedMasses {
        /// Index of the offending frame.
        frame: usize,
    },

    /// Returned when a spectrum frame's parallel arrays differ in length.
    #[error("frame {frame}: mass and intensity arrays differ in length ({mz} vs {intensity})")]
    SpectrumLengthMismatch {
        /// Index of the offending frame.
        frame: usize,
        /// Length of the mass array.
        mz: usize,
        /// Length of the intensity array.
        intensity: usize,
    },

    /// Returned when the timestamp array does not match the frame count.
    #[error("timestamp count {times} does not match frame count {frames}")]
    TimestampLengthMismatch {
        /// Number of timestamps supplied.
        times: usize,
        /// Number of frames in the recording.
        frames: usize,
    },

    /// Returned when per-frame timestamps are not strictly increasing.
    #[error("timestamps must be strictly increasing (violated at index {index})")]
    NonIncreasingTimestamps {
        /// Index of the first violation.
        index: usize,
    },

    /// Returned when an absolute band width of zero scans is configured.
    #[error("band width must be positive (got {got} scans)")]
    InvalidBandWidthScans {
        /// The configured width.
        got: usize,
    },

    /// Returned when a fractional band width lies outside `(0.0, 1.0]`.
    #[error("band width fraction {got} is outside (0.0, 1.0]")]
    InvalidBandWidthFraction {
        /// The configured fraction.
        got: f64,
    },

    /// Returned when recurrence weights are non-finite, negative, or the gap
    /// penalty sign is inconsistent with the cost function's optimization mode.
    #[error("invalid recurrence weights: {reason}")]
    InvalidWeights {
        /// What was wrong.
        reason: &'static str,
    },

    /// Returned when the sorted, deduplicated anchor list is not strictly
    /// increasing in both coordinates. Never silently fixed.
    #[error(
        "anchors are not strictly monotonic: ({first_reference}, {first_query}) \
         precedes ({second_reference}, {second_query})"
    )]
    NonMonotonicAnchors {
        /// Reference index of the earlier anchor.
        first_reference: usize,
        /// Query index of the earlier anchor.
        first_query: usize,
        /// Reference index of the later anchor.
        second_reference: usize,
        /// Query index of the later anchor.
        second_query: usize,
    },

    /// Returned when an anchor lies outside the alignment matrix.
    #[error("anchor ({reference}, {query}) lies outside the {rows}x{cols} matrix")]
    AnchorOutOfBounds {
        /// Reference index of the anchor.
        reference: usize,
        /// Query index of the anchor.
        query: usize,
        /// Reference frame count.
        rows: usize,
        /// Query frame count.
        cols: usize,
    },

    /// Returned when a cell is addressed outside its row's band interval.
    #[error("cell ({row}, {col}) is outside the band (row {row} spans columns {start}..{end})")]
    OutOfBand {
        /// Row that was addressed.
        row: usize,
        /// Column that was addressed.
        col: usize,
        /// Inclusive start of the row's interval.
        start: usize,
        /// Exclusive end of the row's interval.
        end: usize,
    },

    /// Returned when an alignment stage method is called out of order.
    #[error("alignment stage out of order: expected {expected}, found {found}")]
    StageOrder {
        /// Stage the aligner was expected to be in.
        expected: &'static str,
        /// Stage the aligner was actually in.
        found: &'static str,
    },

    /// Returned when traceback visits a cell whose predecessor was never
    /// written. Indicates a band too narrow to contain any valid path; the
    /// remedy is to widen the band and retry the whole alignment.
    #[error(
        "discontinuous warping path at cell ({row}, {col}): \
         predecessor never written (band too narrow)"
    )]
    DiscontinuousPath {
        /// Row of the unreachable cell.
        row: usize,
        /// Column of the unreachable cell.
        col: usize,
    },
}
