/// configs for `Estimator`
pub mod config;

/// bin quantization and cached cosine / sine values
pub mod coefficients;

/// the second-order recursion and result extraction
pub mod recurrence;

/// fixed capacity window buffer keeping the most recent samples
pub mod ring_buffer;

/// block and sliding window analysis
pub mod processor;

/// continuously running resonant filter, one output sample per input sample
pub mod resonator;

/// hand-off of parameter changes from a control thread to the audio thread
#[cfg(feature = "stream")]
pub mod stream;

pub use coefficients::Coefficients;
pub use processor::Estimator;
pub use resonator::Resonator;

use crate::error::Result;
use config::Output;
use recurrence::Recurrence;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of one analysed window
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GoertzelResult {
    /// amplitude of the sinusoid at the resolved frequency
    Magnitude(f32),

    /// normalised DFT bin, `real = A * cos(phase)`, `imag = A * sin(phase)`
    /// for a signal `A * cos(omega * n + phase)`
    Complex { real: f32, imag: f32 },
}

impl GoertzelResult {
    pub fn zero(output: Output) -> Self {
        match output {
            Output::Magnitude => GoertzelResult::Magnitude(0.0),
            Output::Complex => GoertzelResult::Complex { real: 0.0, imag: 0.0 },
        }
    }

    pub fn magnitude(&self) -> f32 {
        match *self {
            GoertzelResult::Magnitude(m) => m,
            GoertzelResult::Complex { real, imag } => (real * real + imag * imag).sqrt(),
        }
    }

    /// in radians, `None` if only the magnitude is known
    pub fn phase(&self) -> Option<f32> {
        match *self {
            GoertzelResult::Magnitude(_) => None,
            GoertzelResult::Complex { real, imag } => Some(imag.atan2(real)),
        }
    }
}

/// analyses `samples` as a single window
///
/// ```
/// use goertzel::estimator::{goertzel, config::Output};
///
/// let sample_rate = 8_000.0;
/// // 1000hz lies exactly on bin 25 of a 200 sample window
/// let samples: Vec<f32> = (0..200)
///     .map(|n| 0.5 * (2.0 * std::f32::consts::PI * 1000.0 * n as f32 / sample_rate).sin())
///     .collect();
///
/// let result = goertzel(&samples, sample_rate, 1000.0, Output::Magnitude).unwrap();
/// assert!((result.magnitude() - 0.5).abs() < 1e-3);
/// ```
pub fn goertzel(samples: &[f32], sample_rate: f32, frequency: f32, output: Output) -> Result<GoertzelResult> {
    let c = Coefficients::new(frequency, sample_rate, samples.len())?;
    let mut recurrence = Recurrence::new();
    recurrence.run(c.coeff, samples);
    Ok(recurrence.extract(&c, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;

    #[test]
    fn one_shot_phase() {
        let sr = 1_000.0;
        let samples: Vec<f32> = (0..100)
            .map(|n| (2.0 * core::f32::consts::PI * 50.0 * n as f32 / sr + 0.6).cos())
            .collect();
        let result = goertzel(&samples, sr, 50.0, Output::Complex).unwrap();
        assert_abs_diff_eq!(result.magnitude(), 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.phase().unwrap(), 0.6, epsilon = 1e-3);
    }

    #[test]
    fn one_shot_errors() {
        assert_eq!(
            goertzel(&[], 44_100.0, 440.0, Output::Magnitude).unwrap_err(),
            Error::InvalidWindowSize(0)
        );
        assert!(goertzel(&[1.0], 44_100.0, 30_000.0, Output::Magnitude).is_err());
    }

    #[test]
    fn magnitude_only_has_no_phase() {
        assert_eq!(GoertzelResult::Magnitude(1.0).phase(), None);
        assert_eq!(GoertzelResult::zero(Output::Complex).magnitude(), 0.0);
    }
}
