//! Estimates magnitude and phase of an audio stream at a single frequency
//!
//! This is done with the help of the Goertzel algorithm, a second-order IIR
//! recursion that computes one bin of the Discrete Fourier Transform,
//! a lot cheaper than a full FFT if only one frequency is of interest.
//!
//! It is meant to be driven from a real-time audio callback: the host pushes
//! blocks of samples of whatever size it likes and gets a result whenever a window is complete.
//!
//! There are three ways to run it:
//! * `Analysis::Block`, every block is analysed on its own
//! * `Analysis::Window`, samples are collected over blocks into a window of fixed size
//! * `Resonator`, the recursion as a filter that outputs one sample per input sample
//!
//! Analysed frequencies are quantized to the nearest bin, a multiple of `sample_rate / window_size`,
//! `Estimator::resolved_frequency()` tells which frequency is actually measured.
//!
//!# Code Example
//!```
//!use goertzel::estimator::{Estimator, GoertzelResult};
//!use goertzel::estimator::config::{EstimatorConfig, Analysis, Output};
//!
//!let mut estimator = Estimator::new(EstimatorConfig {
//!    target_frequency: 1000.0,
//!    window_size: 1024,
//!    analysis: Analysis::Window,
//!    output: Output::Complex,
//!    ..Default::default()
//!});
//!
//!loop {
//!    // gets called by the audio backend
//!    let block: Vec<f32> = vec![0.0; 256];
//!
//!    if let Some(GoertzelResult::Complex { real, imag }) = estimator.process_block(&block, 44_100.0) {
//!        println!("{} {}", real, imag);
//!        break;
//!    }
//!}
//!```

/// errors that can be reported to the host
pub mod error;

/// single frequency estimation using the Goertzel algorithm
pub mod estimator;

pub use error::{Error, Result};
