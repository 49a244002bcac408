//! Sync context: one electrophysiology channel's correspondence data.

use contracts::{CoreError, Label};

/// One recording channel/device to align against.
///
/// Holds the detected ephys anchor events as explicit (time, sample index)
/// pairs; the pairs are the ground truth and the sampling rate only serves
/// extrapolation beyond the matched range. Both arrays are validated at
/// construction so later stages never see a malformed context.
#[derive(Debug, Clone)]
pub struct SyncContext {
    name: Label,
    ephys_times: Vec<f64>,
    ephys_indices: Vec<i64>,
    sampling_rate: f64,
}

impl SyncContext {
    /// Validate and construct.
    ///
    /// Fails on length mismatch, non-ascending input, or a non-positive
    /// sampling rate.
    pub fn new(
        name: impl AsRef<str>,
        ephys_times: Vec<f64>,
        ephys_indices: Vec<i64>,
        sampling_rate: f64,
    ) -> Result<Self, CoreError> {
        let name: Label = name.as_ref().into();

        if ephys_times.len() != ephys_indices.len() {
            return Err(CoreError::EphysLengthMismatch {
                name: name.to_string(),
                times: ephys_times.len(),
                indices: ephys_indices.len(),
            });
        }
        if let Some(position) = first_non_ascending_f64(&ephys_times) {
            return Err(CoreError::EphysNotAscending {
                name: name.to_string(),
                column: "ephys_times",
                position,
            });
        }
        if let Some(position) = first_non_ascending_i64(&ephys_indices) {
            return Err(CoreError::EphysNotAscending {
                name: name.to_string(),
                column: "ephys_indices",
                position,
            });
        }
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(CoreError::InvalidSamplingRate {
                name: name.to_string(),
                rate: sampling_rate,
            });
        }

        Ok(Self {
            name,
            ephys_times,
            ephys_indices,
            sampling_rate,
        })
    }

    /// Context name
    pub fn name(&self) -> &Label {
        &self.name
    }

    /// Ephys anchor times, strictly ascending seconds
    pub fn ephys_times(&self) -> &[f64] {
        &self.ephys_times
    }

    /// Ephys anchor sample indices, strictly ascending
    pub fn ephys_indices(&self) -> &[i64] {
        &self.ephys_indices
    }

    /// Sampling rate in samples per second
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Number of ephys anchors
    pub fn len(&self) -> usize {
        self.ephys_times.len()
    }

    /// Whether the context holds no ephys anchors
    pub fn is_empty(&self) -> bool {
        self.ephys_times.is_empty()
    }
}

fn first_non_ascending_f64(values: &[f64]) -> Option<usize> {
    values
        .windows(2)
        .position(|w| !(w[1] > w[0]))
        .map(|p| p + 1)
}

fn first_non_ascending_i64(values: &[i64]) -> Option<usize> {
    values
        .windows(2)
        .position(|w| w[1] <= w[0])
        .map(|p| p + 1)
}
