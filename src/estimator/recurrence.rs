//! second-order recursion and result extraction
//!
//! ```text
//! q0 = coeff * q1 - q2 + x[n]
//! q2 = q1
//! q1 = q0
//! ```

use super::coefficients::Coefficients;
use super::config::Output;
use super::GoertzelResult;

/// Recurrence registers
///
/// order of the samples matters, this is a stateful IIR filter
///
/// samples come in as f32, the registers run in f64 so long windows keep their accuracy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Recurrence {
    pub q1: f64,
    pub q2: f64,
}

impl Recurrence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.q1 = 0.0;
        self.q2 = 0.0;
    }

    /// advances by one sample and returns the new `q0`
    #[inline]
    pub fn step(&mut self, coeff: f64, sample: f32) -> f32 {
        let q0 = coeff * self.q1 - self.q2 + sample as f64;
        self.q2 = self.q1;
        self.q1 = q0;
        q0 as f32
    }

    pub fn run<'a, I>(&mut self, coeff: f64, samples: I)
    where
        I: IntoIterator<Item = &'a f32>,
    {
        for sample in samples {
            self.step(coeff, *sample);
        }
    }

    /// DFT bin of the analysed window, `real = q1 * cos - q2`, `imag = q1 * sin`,
    /// normalised so that a bin-centred sinusoid reads its amplitude
    pub fn complex(&self, c: &Coefficients) -> (f32, f32) {
        let scale = c.scale() as f64;
        let real = (self.q1 * c.cosine - self.q2) / scale;
        let imag = (self.q1 * c.sine) / scale;
        (real as f32, imag as f32)
    }

    pub fn magnitude(&self, c: &Coefficients) -> f32 {
        let scale = c.scale() as f64;
        let real = (self.q1 * c.cosine - self.q2) / scale;
        let imag = (self.q1 * c.sine) / scale;
        (real * real + imag * imag).sqrt() as f32
    }

    /// unnormalised response of the continuously running resonator
    pub fn response(&self, c: &Coefficients) -> (f32, f32) {
        let real = 0.5 * c.coeff * self.q1 - self.q2;
        let imag = c.sine * self.q1;
        (real as f32, imag as f32)
    }

    pub fn extract(&self, c: &Coefficients, output: Output) -> GoertzelResult {
        match output {
            Output::Magnitude => GoertzelResult::Magnitude(self.magnitude(c)),
            Output::Complex => {
                let (real, imag) = self.complex(c);
                GoertzelResult::Complex { real, imag }
            }
        }
    }
}
