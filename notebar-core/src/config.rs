//! # Configuration Module
//!
//! Compile-time constants for the analysis pipeline and the `AnalyzerConfig`
//! value that carries them into an `Analyzer`.
//!
//! The defaults describe a 12-bit converter sampled at 8 kHz with a 256-point
//! transform, giving 128 magnitude bins spaced 31.25 Hz apart.

use crate::error::AnalyzerError;

/// Number of time-domain samples per frame (N).
pub const SAMPLE_COUNT: usize = 256;

/// Sample rate in Hz (Fs).
pub const SAMPLE_RATE: u32 = 8000;

/// Number of display bands (B).
pub const BAND_COUNT: usize = 16;

/// Minimum peak magnitude for a confident pitch estimate.
pub const MAGNITUDE_THRESHOLD: f32 = 400.0;

/// Minimum peak-to-average ratio for a confident pitch estimate.
pub const RATIO_THRESHOLD: f32 = 6.0;

/// Lowest frequency (exclusive) accepted by the confidence gate.
pub const MIN_FREQUENCY_HZ: f32 = 60.0;

/// Exponential smoothing factor for the tracked frequency.
pub const SMOOTHING_ALPHA: f32 = 0.3;

/// Consecutive frames a candidate note must persist before it is shown.
pub const STABLE_FRAMES: u32 = 3;

/// Non-confident frames a shown note survives before tracking resets.
pub const HOLD_FRAMES: u32 = 8;

/// Per-frame multiplicative decay of the display reference.
pub const AGC_DECAY: f32 = 0.992;

/// Compression constant of the bar-height curve.
pub const COMPRESSION: f32 = 4.0;

/// Mean band magnitude below which a frame counts as quiet.
pub const QUIET_THRESHOLD: f32 = 25.0;

/// Converter resolution in bits.
pub const ADC_BITS: u32 = 12;

/// Nominal DC bias of the microphone front-end, in converter codes.
pub const ADC_BIAS: u16 = 2048;

/// Allowed lateness of a sample tick before it is counted as an overrun.
pub const JITTER_TOLERANCE_US: u64 = 20;

/// All tunables of the pipeline in one place.
///
/// `Default` yields the constants above. Values are checked once by
/// [`AnalyzerConfig::validate`] when an analyzer is built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub sample_count: usize,
    pub sample_rate: u32,
    pub band_count: usize,
    pub magnitude_threshold: f32,
    pub ratio_threshold: f32,
    pub min_frequency_hz: f32,
    pub smoothing_alpha: f32,
    pub stable_frames: u32,
    pub hold_frames: u32,
    pub agc_decay: f32,
    pub compression: f32,
    pub quiet_threshold: f32,
    pub adc_bits: u32,
    pub adc_bias: u16,
    pub jitter_tolerance_us: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_count: SAMPLE_COUNT,
            sample_rate: SAMPLE_RATE,
            band_count: BAND_COUNT,
            magnitude_threshold: MAGNITUDE_THRESHOLD,
            ratio_threshold: RATIO_THRESHOLD,
            min_frequency_hz: MIN_FREQUENCY_HZ,
            smoothing_alpha: SMOOTHING_ALPHA,
            stable_frames: STABLE_FRAMES,
            hold_frames: HOLD_FRAMES,
            agc_decay: AGC_DECAY,
            compression: COMPRESSION,
            quiet_threshold: QUIET_THRESHOLD,
            adc_bits: ADC_BITS,
            adc_bias: ADC_BIAS,
            jitter_tolerance_us: JITTER_TOLERANCE_US,
        }
    }
}

impl AnalyzerConfig {
    /// Number of magnitude bins (K = N/2).
    pub fn bin_count(&self) -> usize {
        self.sample_count / 2
    }

    /// Frequency spacing between adjacent bins in Hz.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate as f32 / self.sample_count as f32
    }

    pub fn nyquist_hz(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Largest code the converter can produce.
    pub fn adc_max(&self) -> u16 {
        ((1u32 << self.adc_bits) - 1) as u16
    }

    /// Checks that the configuration describes a workable pipeline.
    ///
    /// # Returns
    /// * `Ok(())` - Every value is in range
    /// * `Err(AnalyzerError::InvalidConfig)` - Names the first offending field
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        let fail = |msg: String| Err(AnalyzerError::InvalidConfig(msg));

        if self.sample_count < 8 || !self.sample_count.is_power_of_two() {
            return fail(format!(
                "sample_count must be a power of two >= 8, got {}",
                self.sample_count
            ));
        }
        if self.sample_rate == 0 {
            return fail("sample_rate must be positive".to_string());
        }
        let bins = self.bin_count();
        if self.band_count == 0 || self.band_count > bins - 1 {
            return fail(format!(
                "band_count must be in 1..={}, got {}",
                bins - 1,
                self.band_count
            ));
        }
        if !(self.magnitude_threshold >= 0.0) || !(self.ratio_threshold >= 0.0) {
            return fail("magnitude and ratio thresholds must be non-negative".to_string());
        }
        if !(self.min_frequency_hz > 0.0 && self.min_frequency_hz < self.nyquist_hz()) {
            return fail(format!(
                "min_frequency_hz must lie in (0, {}), got {}",
                self.nyquist_hz(),
                self.min_frequency_hz
            ));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return fail(format!(
                "smoothing_alpha must lie in (0, 1], got {}",
                self.smoothing_alpha
            ));
        }
        if self.stable_frames == 0 || self.hold_frames == 0 {
            return fail("stable_frames and hold_frames must be at least 1".to_string());
        }
        if !(self.agc_decay > 0.0 && self.agc_decay < 1.0) {
            return fail(format!("agc_decay must lie in (0, 1), got {}", self.agc_decay));
        }
        if !(self.compression > 0.0) {
            return fail(format!("compression must be positive, got {}", self.compression));
        }
        if !(self.quiet_threshold >= 0.0) {
            return fail("quiet_threshold must be non-negative".to_string());
        }
        if self.adc_bits == 0 || self.adc_bits > 16 {
            return fail(format!("adc_bits must be in 1..=16, got {}", self.adc_bits));
        }
        if self.adc_bias > self.adc_max() {
            return fail(format!(
                "adc_bias {} exceeds converter range 0..={}",
                self.adc_bias,
                self.adc_max()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 128);
        assert!((config.bin_width_hz() - 31.25).abs() < 1e-6);
        assert_eq!(config.adc_max(), 4095);
    }

    #[test]
    fn rejects_non_power_of_two_frames() {
        let config = AnalyzerConfig { sample_count: 300, ..Default::default() };
        assert!(matches!(config.validate(), Err(AnalyzerError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_too_many_bands() {
        let config = AnalyzerConfig { band_count: 128, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AnalyzerConfig { band_count: 127, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_smoothing_and_decay() {
        let config = AnalyzerConfig { smoothing_alpha: 0.0, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AnalyzerConfig { agc_decay: 1.0, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AnalyzerConfig { hold_frames: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
