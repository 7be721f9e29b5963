//! # Analyzer Module
//!
//! Composes the per-frame stages in pipeline order:
//!
//! ```text
//! spectrum -> bands ---------------------------> display normalizer -> bars
//!          \-> peak locator -> interpolator -> confidence gate -> pitch tracker -> note
//! ```
//!
//! `Analyzer` owns the persistent pitch and display state; `FrameLoop` adds
//! acquisition and the transform in front of it.

use log::trace;

use crate::audio::{self, FrameClock, SampleSource};
use crate::bands::aggregate_bands;
use crate::config::AnalyzerConfig;
use crate::confidence::is_confident;
use crate::error::AnalyzerError;
use crate::fft::SpectrumProvider;
use crate::normalize::{Display, DisplayNormalizer};
use crate::peak::estimate_peak;
use crate::pitch::PitchTracker;
use crate::render::Renderer;
use crate::FrameReport;

/// Persistent analysis context. Feed it one spectrum per frame, in order,
/// from a single thread.
///
/// The band and bar buffers are sized from the configuration once and reused
/// for every frame.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    tracker: PitchTracker,
    normalizer: DisplayNormalizer,
    bands: Vec<f32>,
    bars: Vec<f32>,
}

impl Analyzer {
    /// Validates `config` and builds an analyzer in its initial state.
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        config.validate()?;
        Ok(Self {
            tracker: PitchTracker::new(&config),
            normalizer: DisplayNormalizer::new(&config),
            bands: vec![0.0; config.band_count],
            bars: vec![0.0; config.band_count],
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn tracker(&self) -> &PitchTracker {
        &self.tracker
    }

    pub fn normalizer(&self) -> &DisplayNormalizer {
        &self.normalizer
    }

    /// Band magnitudes of the most recent frame, band 0 blanked.
    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    /// Returns pitch and display state to their start-up values.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.normalizer.reset();
    }

    /// Runs the full pipeline on one magnitude spectrum.
    ///
    /// # Arguments
    /// * `magnitudes` - Exactly K = N/2 non-negative magnitudes
    ///
    /// # Returns
    /// * `Ok(FrameReport)` - Display instructions and the shown note, if any
    /// * `Err(AnalyzerError::FrameLength)` - Spectrum has the wrong size
    pub fn analyze_spectrum(&mut self, magnitudes: &[f32]) -> Result<FrameReport, AnalyzerError> {
        let expected = self.config.bin_count();
        if magnitudes.len() != expected {
            return Err(AnalyzerError::FrameLength { expected, actual: magnitudes.len() });
        }

        aggregate_bands(magnitudes, &mut self.bands);
        self.bands[0] = 0.0;

        let peak = estimate_peak(magnitudes, self.config.bin_width_hz());
        let confident = is_confident(&peak, &self.config);
        self.tracker.update(confident, peak.frequency_hz);

        let display = match self.normalizer.normalize(&self.bands, &mut self.bars) {
            Some(bars) => Display::Bars(bars.to_vec()),
            None => Display::Quiet,
        };

        trace!(
            "peak bin {} ({:.1} Hz, ratio {:.1}) confident={} reference={:.1}",
            peak.bin,
            peak.frequency_hz,
            peak.ratio,
            confident,
            self.normalizer.max_reference()
        );

        Ok(FrameReport {
            display,
            pitch: self.tracker.reading(),
            peak,
            confident,
        })
    }
}

/// One acquisition-to-report iteration of the device loop.
///
/// Owns the sample source, the pacing clock, the spectrum provider and the
/// analyzer, plus the two frame buffers sized once from the configuration.
pub struct FrameLoop<S, C, P> {
    source: S,
    clock: C,
    provider: P,
    analyzer: Analyzer,
    bias: f32,
    samples: Vec<f32>,
    spectrum: Vec<f32>,
}

impl<S, C, P> FrameLoop<S, C, P>
where
    S: SampleSource,
    C: FrameClock,
    P: SpectrumProvider,
{
    pub fn new(source: S, clock: C, provider: P, analyzer: Analyzer) -> Self {
        let config = analyzer.config();
        let bias = config.adc_bias as f32;
        let samples = vec![0.0; config.sample_count];
        let spectrum = vec![0.0; config.bin_count()];
        Self {
            source,
            clock,
            provider,
            analyzer,
            bias,
            samples,
            spectrum,
        }
    }

    /// Replaces the nominal bias with one measured from `count` samples.
    pub fn calibrate_bias(&mut self, count: usize) -> Result<f32, AnalyzerError> {
        self.bias = audio::estimate_bias(&mut self.source, count)?;
        Ok(self.bias)
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn analyzer_mut(&mut self) -> &mut Analyzer {
        &mut self.analyzer
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Acquires one frame, transforms it and runs the analyzer.
    pub fn run_frame(&mut self) -> Result<FrameReport, AnalyzerError> {
        audio::acquire_frame(&mut self.source, &mut self.clock, self.bias, &mut self.samples)?;
        self.provider.magnitudes(&self.samples, &mut self.spectrum)?;
        self.analyzer.analyze_spectrum(&self.spectrum)
    }

    /// `run_frame` followed by handing the report to `renderer`.
    pub fn run_frame_into<R>(&mut self, renderer: &mut R) -> Result<FrameReport, AnalyzerError>
    where
        R: Renderer + ?Sized,
    {
        let report = self.run_frame()?;
        renderer.render(&report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_spectrum() -> Vec<f32> {
        let mut spectrum = vec![5.0; 128];
        spectrum[13] = 200.0;
        spectrum[14] = 1000.0;
        spectrum[15] = 200.0;
        spectrum
    }

    #[test]
    fn rejects_invalid_config() {
        let config = AnalyzerConfig { band_count: 0, ..Default::default() };
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn rejects_wrong_spectrum_length() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let err = analyzer.analyze_spectrum(&[0.0; 64]).unwrap_err();
        assert_eq!(err, AnalyzerError::FrameLength { expected: 128, actual: 64 });
    }

    #[test]
    fn reference_frame_is_confident_and_tracks_a() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let spectrum = reference_spectrum();

        let report = analyzer.analyze_spectrum(&spectrum).unwrap();
        assert!(report.confident);
        assert_eq!(report.peak.bin, 14);
        assert!((report.peak.frequency_hz - 437.5).abs() < 1e-3);
        assert!(report.pitch.is_none(), "a single frame is not stable yet");

        for _ in 1..analyzer.config().stable_frames {
            analyzer.analyze_spectrum(&spectrum).unwrap();
        }
        let report = analyzer.analyze_spectrum(&spectrum).unwrap();
        let pitch = report.pitch.expect("note after stable frames");
        assert_eq!(pitch.name(), "A");
        assert!((pitch.frequency_hz - 437.5).abs() < 1e-2);
    }

    #[test]
    fn lowest_band_is_blanked() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let mut spectrum = vec![50.0; 128];
        spectrum[3] = 5000.0;
        let report = analyzer.analyze_spectrum(&spectrum).unwrap();
        match report.display {
            Display::Bars(bars) => {
                assert_eq!(bars.len(), 16);
                assert_eq!(bars[0], 0.0);
            }
            Display::Quiet => panic!("loud frame reported quiet"),
        }
    }

    #[test]
    fn silence_is_quiet_and_idle() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let report = analyzer.analyze_spectrum(&vec![0.0; 128]).unwrap();
        assert_eq!(report.display, Display::Quiet);
        assert!(!report.confident);
        assert!(report.pitch.is_none());
        assert_eq!(analyzer.normalizer().max_reference(), 1.0);
    }

    #[test]
    fn working_buffers_are_reused_across_frames() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let band_count = analyzer.config().band_count;
        let buffer = analyzer.bands().as_ptr();

        let mut spectrum = reference_spectrum();
        for frame in 0..500 {
            spectrum[20 + frame % 40] = 100.0 + frame as f32;
            let report = analyzer.analyze_spectrum(&spectrum).unwrap();
            assert_eq!(analyzer.bands().len(), band_count);
            assert_eq!(analyzer.bands().as_ptr(), buffer);
            assert_eq!(analyzer.bands()[0], 0.0);
            if let Some(bars) = report.display.bars() {
                assert_eq!(bars.len(), band_count);
            }
        }
        analyzer.analyze_spectrum(&vec![0.0; 128]).unwrap();
        assert_eq!(analyzer.bands(), &[0.0; 16][..]);
    }

    #[test]
    fn reset_clears_pitch_and_reference() {
        let mut analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let mut spectrum = vec![50.0; 128];
        spectrum[13] = 200.0;
        spectrum[14] = 1000.0;
        spectrum[15] = 200.0;
        for _ in 0..5 {
            analyzer.analyze_spectrum(&spectrum).unwrap();
        }
        assert!(analyzer.tracker().current().is_some());
        assert!(analyzer.normalizer().max_reference() > 1.0);

        analyzer.reset();
        assert!(analyzer.tracker().current().is_none());
        assert!(!analyzer.tracker().is_tracking());
        assert_eq!(analyzer.normalizer().max_reference(), 1.0);
    }
}
