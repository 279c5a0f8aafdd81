//! Recording and frame types with validation guarantees.

use crate::error::AlignError;

/// A recording identifier, used as the cache key for aligned pairs.
///
/// Wraps a non-empty string, typically derived from the input file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordingId(String);

impl RecordingId {
    /// Create a new recording id from a non-empty string.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::EmptyRecordingId`] if `id` is empty.
    pub fn new(id: String) -> Result<Self, AlignError> {
        if id.is_empty() {
            return Err(AlignError::EmptyRecordingId);
        }
        Ok(Self(id))
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scan's data: a scalar total intensity or a sparse mass spectrum.
///
/// Spectrum frames store parallel mass/intensity arrays with strictly
/// increasing masses.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A single total-intensity sample.
    Scalar(f64),
    /// A sparse spectrum as parallel mass/intensity arrays.
    Spectrum {
        /// Mass values, strictly increasing.
        mz: Vec<f64>,
        /// Intensity per mass value.
        intensity: Vec<f64>,
    },
}

impl Frame {
    /// Return the summed intensity of this frame.
    #[must_use]
    pub fn total_intensity(&self) -> f64 {
        match self {
            Self::Scalar(v) => *v,
            Self::Spectrum { intensity, .. } => intensity.iter().sum(),
        }
    }

    /// Collapse the frame onto unit-mass bins: `(round(mz), intensity)`,
    /// sorted by bin, intensities of shared bins summed. Scalar frames map
    /// to the single bin 0.
    pub(crate) fn unit_mass_bins(&self) -> Vec<(i64, f64)> {
        match self {
            Self::Scalar(v) => vec![(0, *v)],
            Self::Spectrum { mz, intensity } => {
                let mut bins: Vec<(i64, f64)> = Vec::with_capacity(mz.len());
                for (&m, &x) in mz.iter().zip(intensity.iter()) {
                    let bin = m.round() as i64;
                    match bins.last_mut() {
                        Some((last, acc)) if *last == bin => *acc += x,
                        _ => bins.push((bin, x)),
                    }
                }
                bins
            }
        }
    }

    /// Validate finiteness, parallel-array lengths, and mass ordering.
    fn validate(&self, frame: usize) -> Result<(), AlignError> {
        match self {
            Self::Scalar(v) => {
                if !v.is_finite() {
                    return Err(AlignError::NonFiniteValue { frame });
                }
            }
            Self::Spectrum { mz, intensity } => {
                if mz.len() != intensity.len() {
                    return Err(AlignError::SpectrumLengthMismatch {
                        frame,
                        mz: mz.len(),
                        intensity: intensity.len(),
                    });
                }
                if mz.iter().chain(intensity.iter()).any(|v| !v.is_finite()) {
                    return Err(AlignError::NonFiniteValue { frame });
                }
                if mz.windows(2).any(|w| w[0] >= w[1]) {
                    return Err(AlignError::UnsortedMasses { frame });
                }
            }
        }
        Ok(())
    }
}

/// An immutable, validated recording: ≥1 frames, optional strictly
/// increasing per-frame timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    id: RecordingId,
    frames: Vec<Frame>,
    times: Option<Vec<f64>>,
}

impl Recording {
    /// Create a recording without timestamps.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptyRecording`] | `frames` is empty |
    /// | [`AlignError::NonFiniteValue`] | Any frame value is NaN or infinite |
    /// | [`AlignError::UnsortedMasses`] | A spectrum's masses are not strictly increasing |
    /// | [`AlignError::SpectrumLengthMismatch`] | A spectrum's parallel arrays differ in length |
    pub fn new(id: RecordingId, frames: Vec<Frame>) -> Result<Self, AlignError> {
        Self::validate_frames(&frames)?;
        Ok(Self {
            id,
            frames,
            times: None,
        })
    }

    /// Create a recording with per-frame timestamps.
    ///
    /// # Errors
    ///
    /// In addition to the [`Recording::new`] errors:
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::TimestampLengthMismatch`] | `times.len() != frames.len()` |
    /// | [`AlignError::NonIncreasingTimestamps`] | Timestamps are not strictly increasing |
    pub fn with_times(
        id: RecordingId,
        frames: Vec<Frame>,
        times: Vec<f64>,
    ) -> Result<Self, AlignError> {
        Self::validate_frames(&frames)?;
        if times.len() != frames.len() {
            return Err(AlignError::TimestampLengthMismatch {
                times: times.len(),
                frames: frames.len(),
            });
        }
        if let Some(index) = times.iter().position(|t| !t.is_finite()) {
            return Err(AlignError::NonFiniteValue { frame: index });
        }
        if let Some(index) = times.windows(2).position(|w| w[0] >= w[1]) {
            return Err(AlignError::NonIncreasingTimestamps { index: index + 1 });
        }
        Ok(Self {
            id,
            frames,
            times: Some(times),
        })
    }

    fn validate_frames(frames: &[Frame]) -> Result<(), AlignError> {
        if frames.is_empty() {
            return Err(AlignError::EmptyRecording);
        }
        for (index, frame) in frames.iter().enumerate() {
            frame.validate(index)?;
        }
        Ok(())
    }

    /// Return the recording id.
    #[must_use]
    pub fn id(&self) -> &RecordingId {
        &self.id
    }

    /// Return the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return true if the recording has no frames.
    ///
    /// A [`Recording`] constructed via [`Recording::new`] is always non-empty,
    /// so this always returns `false` for valid instances. Provided to satisfy
    /// the `len_without_is_empty` convention.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Return the frame at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    /// Return all frames.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Return the timestamp of frame `index`, if timestamps were supplied.
    #[must_use]
    pub fn time(&self, index: usize) -> Option<f64> {
        self.times.as_ref().map(|t| t[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordingId {
        RecordingId::new(s.to_string()).unwrap()
    }

    #[test]
    fn rejects_empty_frames() {
        let result = Recording::new(id("r"), vec![]);
        assert!(matches!(result, Err(AlignError::EmptyRecording)));
    }

    #[test]
    fn rejects_empty_id() {
        let result = RecordingId::new(String::new());
        assert!(matches!(result, Err(AlignError::EmptyRecordingId)));
    }

    #[test]
    fn rejects_nan_scalar() {
        let result = Recording::new(id("r"), vec![Frame::Scalar(1.0), Frame::Scalar(f64::NAN)]);
        assert!(matches!(result, Err(AlignError::NonFiniteValue { frame: 1 })));
    }

    #[test]
    fn rejects_spectrum_length_mismatch() {
        let frame = Frame::Spectrum {
            mz: vec![50.0, 51.0],
            intensity: vec![1.0],
        };
        let result = Recording::new(id("r"), vec![frame]);
        assert!(matches!(
            result,
            Err(AlignError::SpectrumLengthMismatch {
                frame: 0,
                mz: 2,
                intensity: 1
            })
        ));
    }

    #[test]
    fn rejects_unsorted_masses() {
        let frame = Frame::Spectrum {
            mz: vec![51.0, 50.0],
            intensity: vec![1.0, 2.0],
        };
        let result = Recording::new(id("r"), vec![frame]);
        assert!(matches!(result, Err(AlignError::UnsortedMasses { frame: 0 })));
    }

    #[test]
    fn rejects_mismatched_timestamps() {
        let result = Recording::with_times(
            id("r"),
            vec![Frame::Scalar(1.0), Frame::Scalar(2.0)],
            vec![0.0],
        );
        assert!(matches!(
            result,
            Err(AlignError::TimestampLengthMismatch { times: 1, frames: 2 })
        ));
    }

    #[test]
    fn rejects_non_increasing_timestamps() {
        let result = Recording::with_times(
            id("r"),
            vec![Frame::Scalar(1.0), Frame::Scalar(2.0)],
            vec![1.0, 1.0],
        );
        assert!(matches!(
            result,
            Err(AlignError::NonIncreasingTimestamps { index: 1 })
        ));
    }

    #[test]
    fn total_intensity_sums_spectrum() {
        let frame = Frame::Spectrum {
            mz: vec![50.0, 60.0, 70.0],
            intensity: vec![1.0, 2.0, 3.0],
        };
        assert_eq!(frame.total_intensity(), 6.0);
        assert_eq!(Frame::Scalar(4.5).total_intensity(), 4.5);
    }

    #[test]
    fn unit_mass_bins_merge_shared_bins() {
        let frame = Frame::Spectrum {
            mz: vec![49.8, 50.2, 60.0],
            intensity: vec![1.0, 2.0, 3.0],
        };
        assert_eq!(frame.unit_mass_bins(), vec![(50, 3.0), (60, 3.0)]);
    }

    #[test]
    fn scalar_maps_to_bin_zero() {
        assert_eq!(Frame::Scalar(7.0).unit_mass_bins(), vec![(0, 7.0)]);
    }

    #[test]
    fn accepts_valid_recording_with_times() {
        let rec = Recording::with_times(
            id("sample_a"),
            vec![Frame::Scalar(1.0), Frame::Scalar(2.0)],
            vec![0.5, 1.5],
        )
        .unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.time(1), Some(1.5));
        assert_eq!(rec.id().as_str(), "sample_a");
    }

    #[test]
    fn time_is_none_without_timestamps() {
        let rec = Recording::new(id("r"), vec![Frame::Scalar(1.0)]).unwrap();
        assert_eq!(rec.time(0), None);
    }
}
