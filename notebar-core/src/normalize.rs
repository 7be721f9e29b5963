//! # Display Normalization Module
//!
//! Adaptive scaling of band magnitudes into bar heights in `[0, 1]`.
//!
//! The reference level attacks instantly and releases slowly: a louder frame
//! raises it at once, every other non-quiet frame shrinks it by a fixed
//! factor. Quiet frames leave it frozen and blank the graph.

use log::trace;

use crate::config::AnalyzerConfig;

/// Lowest value the reference (and the per-frame maximum) may take.
const REFERENCE_FLOOR: f32 = 1.0;

/// What the renderer should draw for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Display {
    /// Nothing worth showing; draw the resting graph.
    Quiet,
    /// One bar height in `[0, 1]` per band.
    Bars(Vec<f32>),
}

impl Display {
    pub fn is_quiet(&self) -> bool {
        matches!(self, Display::Quiet)
    }

    pub fn bars(&self) -> Option<&[f32]> {
        match self {
            Display::Quiet => None,
            Display::Bars(bars) => Some(bars),
        }
    }
}

/// Persistent automatic gain reference for the bar graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNormalizer {
    decay: f32,
    compression: f32,
    quiet_threshold: f32,
    max_reference: f32,
}

impl DisplayNormalizer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            decay: config.agc_decay,
            compression: config.compression,
            quiet_threshold: config.quiet_threshold,
            max_reference: REFERENCE_FLOOR,
        }
    }

    pub fn max_reference(&self) -> f32 {
        self.max_reference
    }

    pub fn reset(&mut self) {
        self.max_reference = REFERENCE_FLOOR;
    }

    /// Whether the mean of every band except band 0 sits below the quiet threshold.
    pub fn is_quiet(&self, bands: &[f32]) -> bool {
        let upper = bands.get(1..).unwrap_or(&[]);
        if upper.is_empty() {
            return true;
        }
        let mean = upper.iter().sum::<f32>() / upper.len() as f32;
        mean < self.quiet_threshold
    }

    /// Scales one frame of bands for display.
    ///
    /// # Arguments
    /// * `bands` - Band magnitudes with band 0 already forced to zero
    /// * `bars` - Output heights, same length as `bands`
    ///
    /// # Returns
    /// * `None` - Quiet frame; the reference and `bars` are left untouched
    /// * `Some(bars)` - Compressed heights, one per band
    pub fn normalize<'a>(&mut self, bands: &[f32], bars: &'a mut [f32]) -> Option<&'a [f32]> {
        if self.is_quiet(bands) {
            trace!("quiet frame, reference frozen at {:.1}", self.max_reference);
            return None;
        }

        let frame_max = bands
            .iter()
            .skip(1)
            .fold(REFERENCE_FLOOR, |max, &band| max.max(band));

        self.max_reference *= self.decay;
        if frame_max > self.max_reference {
            self.max_reference = frame_max;
        }
        self.max_reference = self.max_reference.max(REFERENCE_FLOOR);

        let reference = self.max_reference;
        for (bar, &band) in bars.iter_mut().zip(bands) {
            *bar = compress((band / reference).clamp(0.0, 1.0), self.compression);
        }
        Some(bars)
    }
}

/// Logarithmic curve mapping `[0, 1]` onto itself.
///
/// Lifts small values and flattens the top: `log10(1 + k x) / log10(1 + k)`.
pub fn compress(value: f32, k: f32) -> f32 {
    (1.0 + k * value).log10() / (1.0 + k).log10()
}
