//! The Goertzel recursion as a continuously running resonant IIR filter
//!
//! Registers are never reset by processing, the output of every block continues
//! where the previous block stopped. A sinusoid at the resonance frequency makes
//! the output grow without bound, call `reset()` to start over.

use super::coefficients::{validate_sample_rate, Coefficients};
use super::config::{DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE};
use super::recurrence::Recurrence;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct Resonator {
    coefficients: Coefficients,
    recurrence: Recurrence,
}

impl Resonator {
    /// invalid values fall back to 440hz at 44100hz
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        let coefficients = Coefficients::continuous(frequency, sample_rate).unwrap_or_else(|e| {
            log::warn!("{}, using {}hz at {}hz", e, DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE);
            Self::default_coefficients()
        });
        Self {
            coefficients,
            recurrence: Recurrence::new(),
        }
    }

    fn default_coefficients() -> Coefficients {
        match Coefficients::continuous(DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE) {
            Ok(c) => c,
            Err(_) => unreachable!("default frequency lies below nyquist"),
        }
    }

    pub fn frequency(&self) -> f32 {
        self.coefficients.frequency()
    }

    pub fn sample_rate(&self) -> f32 {
        self.coefficients.sample_rate()
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// keeps the register state, only the resonance moves
    pub fn set_frequency(&mut self, frequency: f32) -> Result<()> {
        let c = Coefficients::continuous(frequency, self.sample_rate()).map_err(|e| {
            log::warn!("rejected resonator frequency: {}", e);
            e
        })?;
        log::debug!("resonator frequency set to {}hz", frequency);
        self.coefficients = c;
        Ok(())
    }

    /// if the current frequency lies above the new nyquist frequency, the resonator gets muted
    /// by tuning it to 0hz
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        match Coefficients::continuous(self.frequency(), sample_rate) {
            Ok(c) => {
                self.coefficients = c;
                Ok(())
            }
            Err(e) => {
                log::warn!("{}, muting", e);
                self.coefficients = Coefficients::continuous(0.0, sample_rate)?;
                Err(e)
            }
        }
    }

    pub fn reset(&mut self) {
        self.recurrence.reset();
    }

    /// filters a single sample
    #[inline]
    pub fn tick(&mut self, sample: f32) -> f32 {
        self.recurrence.step(self.coefficients.coeff, sample)
    }

    /// filters `input` into `output`, only the first `min(input.len(), output.len())` samples are processed
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.tick(*x);
        }
    }

    /// filters `buffer` in place
    pub fn process_in_place(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    /// unnormalised real and imaginary part of the current filter state
    pub fn response(&self) -> (f32, f32) {
        self.recurrence.response(&self.coefficients)
    }
}

impl Default for Resonator {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE)
    }
}
