// notebar-core/src/lib.rs

//! The core logic for the note bar display.
//! This crate turns frames of microphone samples into a normalized bar-graph
//! spectrum and a debounced pitch class. It is completely headless
//! and contains no drawing code.

pub mod analyzer;
pub mod audio;
pub mod bands;
pub mod config;
pub mod confidence;
pub mod error;
pub mod fft;
pub mod normalize;
pub mod peak;
pub mod pitch;
pub mod render;
pub mod tuning;

pub use analyzer::{Analyzer, FrameLoop};
pub use config::AnalyzerConfig;
pub use error::AnalyzerError;
pub use normalize::Display;
pub use pitch::PitchReading;
pub use render::Renderer;

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// What the bar graph should show.
    pub display: Display,
    /// The currently shown note, absent while nothing has been promoted.
    pub pitch: Option<PitchReading>,
    /// This frame's dominant peak, for diagnostics.
    pub peak: peak::PeakEstimate,
    /// Whether the peak passed the confidence gate.
    pub confident: bool,
}
