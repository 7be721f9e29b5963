//! # Fast Fourier Transform (FFT) Module
//!
//! The magnitude spectrum provider consumed by the analyzer. It turns a frame
//! of N bias-free samples into K = N/2 non-negative magnitudes.
//!
//! ## Features
//! - Transform planned once with RustFFT and reused every frame
//! - Residual DC removal
//! - Hann window computed once per provider

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::AnalyzerError;

/// Anything that can turn a frame of samples into a magnitude spectrum.
pub trait SpectrumProvider {
    /// Writes `samples.len() / 2` magnitudes into `out`.
    fn magnitudes(&mut self, samples: &[f32], out: &mut [f32]) -> Result<(), AnalyzerError>;
}

/// Computes a Hann window of length `n`.
fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// The nominal converter bias is subtracted at acquisition; this catches
/// whatever drift is left.
fn remove_dc_offset(signal: &mut [Complex<f32>]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().map(|c| c.re).sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            sample.re -= avg;
        }
    }
}

/// RustFFT-backed spectrum provider for one fixed frame size.
pub struct FftSpectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftSpectrum {
    /// Plans a forward transform of `sample_count` points.
    pub fn new(sample_count: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(sample_count);
        let window = hann_window(sample_count);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        Self {
            fft,
            window,
            buffer: vec![Complex::default(); sample_count],
            scratch,
        }
    }
}

impl SpectrumProvider for FftSpectrum {
    fn magnitudes(&mut self, samples: &[f32], out: &mut [f32]) -> Result<(), AnalyzerError> {
        let n = self.buffer.len();
        if samples.len() != n {
            return Err(AnalyzerError::FrameLength { expected: n, actual: samples.len() });
        }
        if out.len() != n / 2 {
            return Err(AnalyzerError::FrameLength { expected: n / 2, actual: out.len() });
        }

        for (slot, &sample) in self.buffer.iter_mut().zip(samples) {
            *slot = Complex { re: sample, im: 0.0 };
        }
        remove_dc_offset(&mut self.buffer);
        for (slot, &w) in self.buffer.iter_mut().zip(&self.window) {
            slot.re *= w;
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        for (magnitude, bin) in out.iter_mut().zip(&self.buffer) {
            *magnitude = bin.norm(); // .norm() is sqrt(re^2 + im^2)
        }
        Ok(())
    }
}
