#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_FREQUENCY: f32 = 440.0;
pub const DEFAULT_WINDOW_SIZE: usize = 1024;
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// How incoming blocks are turned into analysis windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Analysis {
    /// every processing block is one window, one result per block
    ///
    /// resolution depends on the block size chosen by the host
    Block,

    /// samples are collected in a ring buffer of `window_size`,
    /// one result every `window_size` samples regardless of block size
    /// ```text
    ///  block    block    block    block
    /// |------|--------|------|--------|
    /// |    window     |    window     |
    ///                 ↑               ↑
    ///               result          result
    /// ```
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Output {
    Magnitude,
    /// real and imaginary part, carries the phase of the signal
    Complex,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimatorConfig {
    /// in hz, must be in `[0, sample_rate / 2)`, `0` mutes the estimator
    pub target_frequency: f32,

    /// only used with `Analysis::Window`
    ///
    /// bigger windows resolve frequencies more precisely (`sample_rate / window_size`)
    /// but report less often
    pub window_size: usize,

    /// neccessary to know where the frequency lies, is updated by every `process_block()` call
    pub sample_rate: f32,

    pub analysis: Analysis,

    pub output: Output,
}
impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            target_frequency: DEFAULT_FREQUENCY,
            window_size: DEFAULT_WINDOW_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
            analysis: Analysis::Window,
            output: Output::Magnitude,
        }
    }
}
