//! ## Example
//! ```
//! use goertzel::estimator::Estimator;
//! use goertzel::estimator::config::{EstimatorConfig, Analysis};
//!
//! let mut estimator = Estimator::new(EstimatorConfig {
//!     target_frequency: 1000.0,
//!     window_size: 1024,
//!     analysis: Analysis::Window,
//!     ..Default::default()
//! });
//!
//! // the host delivers blocks of 64 samples
//! let sample_rate = 44_100.0;
//! let freq = estimator.resolved_frequency();
//! let signal: Vec<f32> = (0..1024)
//!     .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate).sin())
//!     .collect();
//!
//! let mut last = None;
//! for block in signal.chunks(64) {
//!     if let Some(result) = estimator.process_block(block, sample_rate) {
//!         last = Some(result);
//!     }
//! }
//! assert!((last.unwrap().magnitude() - 1.0).abs() < 1e-3);
//! ```

use super::coefficients::{validate_frequency, validate_sample_rate, Coefficients};
use super::config::{
    Analysis, EstimatorConfig, Output, DEFAULT_FREQUENCY, DEFAULT_SAMPLE_RATE, DEFAULT_WINDOW_SIZE,
};
use super::recurrence::Recurrence;
use super::ring_buffer::RingBuffer;
use super::GoertzelResult;
use crate::error::{Error, Result};

/// Single frequency estimator that consumes blocks of samples
///
/// never allocates inside `process_block()`, the window buffer is only
/// allocated on construction and by `set_window_size()`
#[derive(Clone, Debug)]
pub struct Estimator {
    target_frequency: f32,
    sample_rate: f32,
    window_size: usize,
    analysis: Analysis,
    output: Output,

    /// `None` until block mode saw its first block
    coefficients: Option<Coefficients>,
    recurrence: Recurrence,
    buffer: RingBuffer,
}

impl Estimator {
    /// creates an estimator, invalid values of `config` fall back to
    /// 44100hz, 440hz and a window of 1024 samples
    pub fn new(config: EstimatorConfig) -> Self {
        let sample_rate = match validate_sample_rate(config.sample_rate) {
            Ok(()) => config.sample_rate,
            Err(e) => {
                log::warn!("{}, using {}hz", e, DEFAULT_SAMPLE_RATE);
                DEFAULT_SAMPLE_RATE
            }
        };
        let target_frequency = match validate_frequency(config.target_frequency, sample_rate) {
            Ok(()) => config.target_frequency,
            Err(e) => {
                log::warn!("{}, using {}hz", e, DEFAULT_FREQUENCY);
                DEFAULT_FREQUENCY
            }
        };
        let buffer = match RingBuffer::try_new(config.window_size) {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("{}, using window of {} samples", e, DEFAULT_WINDOW_SIZE);
                RingBuffer::new(DEFAULT_WINDOW_SIZE)
            }
        };
        let window_size = buffer.capacity();

        let mut estimator = Self {
            target_frequency,
            sample_rate,
            window_size,
            analysis: config.analysis,
            output: config.output,
            coefficients: None,
            recurrence: Recurrence::new(),
            buffer,
        };
        if estimator.analysis == Analysis::Window {
            estimator.coefficients =
                Coefficients::new(target_frequency, sample_rate, window_size).ok();
        }
        estimator
    }

    pub fn target_frequency(&self) -> f32 {
        self.target_frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn analysis(&self) -> Analysis {
        self.analysis
    }

    pub fn output(&self) -> Output {
        self.output
    }

    pub fn coefficients(&self) -> Option<&Coefficients> {
        self.coefficients.as_ref()
    }

    /// frequency that is actually analysed, the center of the bin nearest to `target_frequency()`
    ///
    /// in block mode it depends on the size of the last block and equals the
    /// target frequency until the first block arrived
    pub fn resolved_frequency(&self) -> f32 {
        match &self.coefficients {
            Some(c) => c.resolved_frequency(),
            None => self.target_frequency,
        }
    }

    /// `0.0` mutes the estimator
    ///
    /// on error the previous frequency and coefficients stay in place
    pub fn set_target_frequency(&mut self, frequency: f32) -> Result<()> {
        if let Err(e) = validate_frequency(frequency, self.sample_rate) {
            log::warn!("rejected target frequency: {}", e);
            return Err(e);
        }
        log::debug!("target frequency set to {}hz", frequency);
        self.target_frequency = frequency;
        self.update_coefficients(self.analysis_len());
        Ok(())
    }

    /// changes the sample rate outside of `process_block()`
    ///
    /// if the target frequency lies above the new nyquist frequency the estimator gets muted
    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        if let Err(e) = validate_sample_rate(sample_rate) {
            log::warn!("rejected sample rate: {}", e);
            return Err(e);
        }
        if sample_rate == self.sample_rate {
            return Ok(());
        }
        log::debug!("sample rate changed from {}hz to {}hz", self.sample_rate, sample_rate);
        self.sample_rate = sample_rate;

        let result = validate_frequency(self.target_frequency, sample_rate);
        if let Err(e) = &result {
            log::warn!("{}, muting", e);
            self.target_frequency = 0.0;
        }
        self.update_coefficients(self.analysis_len());
        result
    }

    /// reallocates the window buffer, any partially collected window is discarded
    ///
    /// if the new buffer can not be allocated, the old one is kept
    pub fn set_window_size(&mut self, window_size: usize) -> Result<()> {
        let buffer = RingBuffer::try_new(window_size).map_err(|e| {
            log::warn!("rejected window size: {}", e);
            e
        })?;
        self.replace_buffer(buffer);
        Ok(())
    }

    /// swaps in an already allocated window buffer and returns the previous one
    ///
    /// the new buffer is cleared, its capacity becomes the window size
    pub fn replace_buffer(&mut self, mut buffer: RingBuffer) -> RingBuffer {
        buffer.clear();
        log::debug!("window size set to {} samples", buffer.capacity());
        self.window_size = buffer.capacity();
        let old = std::mem::replace(&mut self.buffer, buffer);
        self.recurrence.reset();
        if self.analysis == Analysis::Window {
            self.update_coefficients(Some(self.window_size));
        }
        old
    }

    pub fn set_output(&mut self, output: Output) {
        self.output = output;
    }

    /// discards collected samples and recurrence state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.recurrence.reset();
    }

    /// samples collected towards the next window, always `0` in block mode
    pub fn pending(&self) -> usize {
        match self.analysis {
            Analysis::Block => 0,
            Analysis::Window => (self.buffer.samples_seen() % self.window_size as u64) as usize,
        }
    }

    /// processes one block of samples
    ///
    /// returns a result if a window got completed with this block. If the block
    /// completes more than one window, only the last result is returned,
    /// use `process_block_with()` to receive all of them.
    ///
    /// an invalid `sample_rate` skips the block
    pub fn process_block(&mut self, samples: &[f32], sample_rate: f32) -> Option<GoertzelResult> {
        let mut last = None;
        self.process_block_with(samples, sample_rate, |result| last = Some(result));
        last
    }

    /// same as `process_block()` but calls `on_result` for every completed window
    pub fn process_block_with<F>(&mut self, samples: &[f32], sample_rate: f32, mut on_result: F)
    where
        F: FnMut(GoertzelResult),
    {
        if sample_rate != self.sample_rate {
            // a rejected frequency only mutes, a rejected rate leaves nothing to compute
            if let Err(Error::InvalidSampleRate(_)) = self.set_sample_rate(sample_rate) {
                return;
            }
        }

        match self.analysis {
            Analysis::Block => {
                if samples.is_empty() {
                    return;
                }
                on_result(self.analyse_block(samples));
            }
            Analysis::Window => {
                for sample in samples {
                    self.buffer.push(*sample);
                    if self.buffer.samples_seen() % self.window_size as u64 == 0 {
                        on_result(self.analyse_window());
                    }
                }
            }
        }
    }

    fn analyse_block(&mut self, samples: &[f32]) -> GoertzelResult {
        let needs_update = match &self.coefficients {
            Some(c) => !c.matches(self.target_frequency, self.sample_rate, samples.len()),
            None => true,
        };
        if needs_update {
            self.update_coefficients(Some(samples.len()));
        }

        self.recurrence.reset();
        match &self.coefficients {
            Some(c) if !self.is_muted() => {
                self.recurrence.run(c.coeff, samples);
                self.recurrence.extract(c, self.output)
            }
            _ => GoertzelResult::zero(self.output),
        }
    }

    fn analyse_window(&mut self) -> GoertzelResult {
        self.recurrence.reset();
        match &self.coefficients {
            Some(c) if !self.is_muted() => {
                self.recurrence.run(c.coeff, self.buffer.iter());
                let result = self.recurrence.extract(c, self.output);
                log::trace!("window of {} samples analysed: {:?}", self.window_size, result);
                result
            }
            _ => GoertzelResult::zero(self.output),
        }
    }

    fn is_muted(&self) -> bool {
        self.target_frequency == 0.0
    }

    /// length the coefficients are computed for, unknown in block mode before the first block
    fn analysis_len(&self) -> Option<usize> {
        match self.analysis {
            Analysis::Block => self.coefficients.as_ref().map(|c| c.len),
            Analysis::Window => Some(self.window_size),
        }
    }

    fn update_coefficients(&mut self, len: Option<usize>) {
        let len = match len {
            Some(len) => len,
            None => return,
        };
        match Coefficients::new(self.target_frequency, self.sample_rate, len) {
            Ok(c) => self.coefficients = Some(c),
            // inputs are validated beforehand
            Err(e) => log::warn!("could not compute coefficients: {}", e),
        }
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use core::f32::consts::PI;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sine(len: usize, frequency: f32, sample_rate: f32, amplitude: f32, phase: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * frequency * n as f32 / sample_rate + phase).sin())
            .collect()
    }

    fn window_estimator(frequency: f32, window_size: usize) -> Estimator {
        Estimator::new(EstimatorConfig {
            target_frequency: frequency,
            window_size,
            analysis: Analysis::Window,
            ..Default::default()
        })
    }

    fn block_estimator(frequency: f32, output: Output) -> Estimator {
        Estimator::new(EstimatorConfig {
            target_frequency: frequency,
            analysis: Analysis::Block,
            output,
            ..Default::default()
        })
    }

    #[test]
    fn bin_centred_tone_at_1024() {
        init();
        let sr = 44_100.0;
        let mut estimator = window_estimator(1000.0, 1024);
        let freq = estimator.resolved_frequency();
        assert_relative_eq!(freq, 23.0 * sr / 1024.0);

        let signal = sine(1024, freq, sr, 1.0, 0.0);
        let mut results = Vec::new();
        for block in signal.chunks(64) {
            if let Some(result) = estimator.process_block(block, sr) {
                results.push(result);
            }
        }
        assert_eq!(results.len(), 1);
        assert_relative_eq!(results[0].magnitude(), 1.0, max_relative = 1e-3);
    }

    #[test]
    fn amplitude_independent_of_phase() {
        let sr = 8_000.0;
        let mut estimator = block_estimator(1000.0, Output::Magnitude);
        for phase in [0.0, 0.3, 1.1, 2.0, 4.4] {
            let block = sine(256, 1000.0, sr, 0.5, phase);
            let result = estimator.process_block(&block, sr).unwrap();
            assert_abs_diff_eq!(result.magnitude(), 0.5, epsilon = 1e-3);
        }
    }

    #[test]
    fn bin_centred_tone_for_many_lengths() {
        let sr = 48_000.0;
        let mut estimator = block_estimator(3_000.0, Output::Magnitude);
        for len in [1usize, 2, 3, 7, 16, 100, 480, 1000, 4096] {
            // warm up so coefficients for this length exist
            estimator.process_block(&vec![0.0; len], sr);
            let freq = estimator.resolved_frequency();
            let block: Vec<f32> = (0..len)
                .map(|n| 0.7 * (2.0 * PI * freq * n as f32 / sr + 0.25).cos())
                .collect();
            let result = estimator.process_block(&block, sr).unwrap();
            let expected = if estimator.coefficients().unwrap().bin == 0 {
                // a "tone" at bin 0 is the constant 0.7 * cos(0.25)
                0.7 * 0.25f32.cos()
            } else {
                0.7
            };
            assert_abs_diff_eq!(result.magnitude(), expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn long_window_at_low_bins() {
        let sr = 44_100.0;
        for frequency in [5.0, 20.0] {
            let mut estimator = window_estimator(frequency, 65_536);
            let resolved = estimator.resolved_frequency() as f64;
            let signal: Vec<f32> = (0..65_536)
                .map(|n| (2.0 * core::f64::consts::PI * resolved * n as f64 / sr as f64).sin() as f32)
                .collect();

            let mut last = None;
            for block in signal.chunks(512) {
                if let Some(result) = estimator.process_block(block, sr) {
                    last = Some(result);
                }
            }
            assert_relative_eq!(last.unwrap().magnitude(), 1.0, max_relative = 1e-3);
        }
    }

    #[test]
    fn leakage_between_bins() {
        let sr = 1024.0;
        let mut estimator = block_estimator(100.0, Output::Magnitude);
        // bins are 1hz apart, 100.5hz lies exactly between two of them
        for phase in [0.0, 0.7, 1.9] {
            let block = sine(1024, 100.5, sr, 1.0, phase);
            let magnitude = estimator.process_block(&block, sr).unwrap().magnitude();
            assert!(magnitude < 1.0, "{}", magnitude);
            assert!(magnitude > 0.3, "{}", magnitude);
        }
    }

    #[test]
    fn silence() {
        let mut estimator = block_estimator(440.0, Output::Complex);
        let result = estimator.process_block(&[0.0; 512], 44_100.0).unwrap();
        assert_eq!(result, GoertzelResult::Complex { real: 0.0, imag: 0.0 });

        let mut estimator = window_estimator(440.0, 128);
        let result = estimator.process_block(&[0.0; 128], 44_100.0).unwrap();
        assert_eq!(result, GoertzelResult::Magnitude(0.0));
    }

    #[test]
    fn invalid_frequency_keeps_state() {
        init();
        let mut estimator = window_estimator(1000.0, 256);
        estimator.process_block(&sine(100, 1000.0, 44_100.0, 1.0, 0.0), 44_100.0);
        let before = *estimator.coefficients().unwrap();

        assert!(matches!(
            estimator.set_target_frequency(-5.0),
            Err(Error::InvalidFrequency { .. })
        ));
        assert!(estimator.set_target_frequency(22_050.0).is_err());
        assert!(estimator.set_target_frequency(f32::INFINITY).is_err());

        assert_eq!(estimator.target_frequency(), 1000.0);
        assert_eq!(*estimator.coefficients().unwrap(), before);
        assert_eq!(estimator.pending(), 100);
    }

    #[test]
    fn zero_frequency_mutes() {
        let mut estimator = block_estimator(440.0, Output::Magnitude);
        estimator.set_target_frequency(0.0).unwrap();
        let result = estimator.process_block(&[1.0; 64], 44_100.0).unwrap();
        assert_eq!(result, GoertzelResult::Magnitude(0.0));
    }

    #[test]
    fn resize_discards_partial_window() {
        init();
        let sr = 44_100.0;
        let mut estimator = window_estimator(2_000.0, 512);
        let noise: Vec<f32> = (0..511).map(|n| ((n * 31) % 17) as f32 / 8.0 - 1.0).collect();
        assert!(estimator.process_block(&noise, sr).is_none());
        assert_eq!(estimator.pending(), 511);

        estimator.set_window_size(256).unwrap();
        assert_eq!(estimator.window_size(), 256);
        assert_eq!(estimator.pending(), 0);

        let freq = estimator.resolved_frequency();
        let tone = sine(256, freq, sr, 0.9, 0.4);
        let result = estimator.process_block(&tone, sr).unwrap();
        assert_abs_diff_eq!(result.magnitude(), 0.9, epsilon = 1e-3);

        let mut reference = block_estimator(2_000.0, Output::Magnitude);
        let expected = reference.process_block(&tone, sr).unwrap();
        assert_abs_diff_eq!(result.magnitude(), expected.magnitude(), epsilon = 1e-5);
    }

    #[test]
    fn invalid_window_size_keeps_buffer() {
        let mut estimator = window_estimator(1_000.0, 64);
        estimator.process_block(&[0.1; 10], 44_100.0);
        assert_eq!(estimator.set_window_size(0), Err(Error::InvalidWindowSize(0)));
        assert_eq!(estimator.window_size(), 64);
        assert_eq!(estimator.pending(), 10);
    }

    #[test]
    fn failed_allocation_keeps_buffer() {
        init();
        let mut estimator = window_estimator(1_000.0, 64);
        estimator.process_block(&[0.1; 10], 44_100.0);
        assert!(matches!(
            estimator.set_window_size(usize::MAX),
            Err(Error::Allocation { size: usize::MAX, .. })
        ));
        assert_eq!(estimator.window_size(), 64);
        assert_eq!(estimator.pending(), 10);

        // the old window keeps collecting
        assert!(estimator.process_block(&[0.1; 54], 44_100.0).is_some());
    }

    #[test]
    fn window_cadence_is_independent_of_block_size() {
        let sr = 44_100.0;
        let mut estimator = window_estimator(1_000.0, 100);
        let signal = vec![0.25; 1000];

        let mut emitted = 0;
        for block in signal.chunks(33) {
            if estimator.process_block(block, sr).is_some() {
                emitted += 1;
            }
        }
        assert_eq!(emitted, 10);

        let mut count = 0;
        estimator.process_block_with(&signal[..350], sr, |_| count += 1);
        assert_eq!(count, 3);
        assert_eq!(estimator.pending(), 50);
    }

    #[test]
    fn window_reads_in_logical_order() {
        // wraparound must not change the result compared to a contiguous block
        let sr = 16_000.0;
        let mut estimator = Estimator::new(EstimatorConfig {
            target_frequency: 1_500.0,
            window_size: 160,
            sample_rate: sr,
            analysis: Analysis::Window,
            output: Output::Complex,
        });
        let signal: Vec<f32> = (0..320).map(|n| ((n * 13) % 29) as f32 / 14.0 - 1.0).collect();
        estimator.process_block(&signal[..37], sr);
        estimator.process_block(&signal[37..160], sr);
        let second = estimator.process_block(&signal[160..], sr).unwrap();

        let mut reference = Estimator::new(EstimatorConfig {
            target_frequency: 1_500.0,
            sample_rate: sr,
            analysis: Analysis::Block,
            output: Output::Complex,
            ..Default::default()
        });
        let expected = reference.process_block(&signal[160..], sr).unwrap();
        match (second, expected) {
            (
                GoertzelResult::Complex { real, imag },
                GoertzelResult::Complex { real: e_real, imag: e_imag },
            ) => {
                assert_abs_diff_eq!(real, e_real, epsilon = 1e-5);
                assert_abs_diff_eq!(imag, e_imag, epsilon = 1e-5);
            }
            other => panic!("unexpected results {:?}", other),
        }
    }

    #[test]
    fn sample_rate_change_recomputes() {
        init();
        let mut estimator = block_estimator(10_000.0, Output::Magnitude);
        estimator.process_block(&[0.0; 64], 44_100.0);
        let bin = estimator.coefficients().unwrap().bin;
        assert_eq!(bin, 15);

        estimator.process_block(&[0.0; 64], 48_000.0);
        assert_eq!(estimator.sample_rate(), 48_000.0);
        assert_eq!(estimator.coefficients().unwrap().bin, 13);

        // 10khz is above nyquist of 16khz
        let result = estimator.process_block(&[1.0; 64], 16_000.0).unwrap();
        assert_eq!(estimator.target_frequency(), 0.0);
        assert_eq!(result, GoertzelResult::Magnitude(0.0));

        // invalid rate skips the block and keeps the previous one
        assert!(estimator.process_block(&[1.0; 64], -1.0).is_none());
        assert_eq!(estimator.sample_rate(), 16_000.0);
    }

    #[test]
    fn falls_back_to_defaults() {
        init();
        let estimator = Estimator::new(EstimatorConfig {
            target_frequency: 30_000.0,
            window_size: 0,
            sample_rate: f32::NAN,
            ..Default::default()
        });
        assert_eq!(estimator.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(estimator.target_frequency(), DEFAULT_FREQUENCY);
        assert_eq!(estimator.window_size(), DEFAULT_WINDOW_SIZE);
        assert!(estimator.coefficients().is_some());
    }

    #[test]
    fn empty_block_in_block_mode() {
        let mut estimator = block_estimator(440.0, Output::Magnitude);
        assert!(estimator.process_block(&[], 44_100.0).is_none());
        assert!(estimator.coefficients().is_none());
    }
}
