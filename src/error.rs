use std::collections::TryReserveError;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the estimator
///
/// none of them are fatal, the estimator keeps running with its last valid configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// frequency has to satisfy `0 <= frequency < sample_rate / 2`
    #[error("target frequency {frequency}hz is outside of [0, {nyquist}hz)")]
    InvalidFrequency { frequency: f32, nyquist: f32 },

    #[error("sample rate {0}hz must be positive and finite")]
    InvalidSampleRate(f32),

    #[error("window size must be at least 1 sample, got {0}")]
    InvalidWindowSize(usize),

    /// a new window buffer could not be allocated, previous buffer is still in use
    #[error("could not allocate window of {size} samples: {source}")]
    Allocation {
        size: usize,
        #[source]
        source: TryReserveError,
    },

    /// the other half of a `stream::Stream` / `stream::Controller` pair is gone
    #[error("stream disconnected")]
    Disconnected,
}
