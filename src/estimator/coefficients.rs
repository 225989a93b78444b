use core::f64::consts::PI;

use crate::error::{Error, Result};

/// checks `0 <= frequency < sample_rate / 2`
///
/// a frequency of `0.0` is valid and means muted
pub fn validate_frequency(frequency: f32, sample_rate: f32) -> Result<()> {
    validate_sample_rate(sample_rate)?;
    let nyquist = sample_rate / 2.0;
    if frequency.is_finite() && frequency >= 0.0 && frequency < nyquist {
        Ok(())
    } else {
        Err(Error::InvalidFrequency { frequency, nyquist })
    }
}

pub fn validate_sample_rate(sample_rate: f32) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSampleRate(sample_rate))
    }
}

/// Cached values needed by the recurrence and by result extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// `2 * cos(omega)`, used in the recurrence itself
    ///
    /// kept in f64, for long windows at low bins it lies too close to 2 for f32
    pub coeff: f64,
    pub cosine: f64,
    pub sine: f64,

    /// bin index, the requested frequency rounded to a multiple of `sample_rate / len`
    pub bin: usize,

    /// analysis length in samples, `0` for continuous coefficients
    pub len: usize,

    frequency: f32,
    sample_rate: f32,
}

impl Coefficients {
    /// coefficients for analysing windows of `len` samples
    ///
    /// `frequency` gets quantized to the nearest bin, so the analysed frequency
    /// is `bin * sample_rate / len` and not necessarily `frequency` itself
    pub fn new(frequency: f32, sample_rate: f32, len: usize) -> Result<Self> {
        validate_frequency(frequency, sample_rate)?;
        if len == 0 {
            return Err(Error::InvalidWindowSize(len));
        }

        let bin = (len as f64 * frequency as f64 / sample_rate as f64).round() as usize;
        let omega = 2.0 * PI * bin as f64 / len as f64;

        Ok(Self {
            coeff: 2.0 * omega.cos(),
            cosine: omega.cos(),
            sine: omega.sin(),
            bin,
            len,
            frequency,
            sample_rate,
        })
    }

    /// coefficients without bin quantization for the continuously running resonator
    pub fn continuous(frequency: f32, sample_rate: f32) -> Result<Self> {
        validate_frequency(frequency, sample_rate)?;

        let omega = 2.0 * PI * frequency as f64 / sample_rate as f64;
        Ok(Self {
            coeff: 2.0 * omega.cos(),
            cosine: omega.cos(),
            sine: omega.sin(),
            bin: 0,
            len: 0,
            frequency,
            sample_rate,
        })
    }

    /// frequency that was requested
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// frequency that actually gets analysed, the center of the resolved bin
    ///
    /// continuous coefficients are not quantized and return the requested frequency
    pub fn resolved_frequency(&self) -> f32 {
        if self.len == 0 {
            return self.frequency;
        }
        self.bin as f32 * self.sample_rate / self.len as f32
    }

    /// whether these were computed for exactly this configuration
    pub fn matches(&self, frequency: f32, sample_rate: f32, len: usize) -> bool {
        self.frequency == frequency && self.sample_rate == sample_rate && self.len == len
    }

    /// normalisation that turns a DFT bin into the amplitude of the sinusoid
    ///
    /// the bins at 0 and `len / 2` are their own conjugate and hold the full energy
    pub fn scale(&self) -> f32 {
        if self.len == 0 {
            return 1.0;
        }
        if self.bin == 0 || 2 * self.bin == self.len {
            self.len as f32
        } else {
            self.len as f32 / 2.0
        }
    }
}
