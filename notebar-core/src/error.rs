//! Error types for the analysis pipeline.
//!
//! The per-frame numeric path never fails; these only surface at the seams
//! where the pipeline meets its configuration or its collaborators.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzerError {
    /// Configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A buffer handed in from outside had the wrong length.
    #[error("expected {expected} values per frame, got {actual}")]
    FrameLength { expected: usize, actual: usize },

    /// The sample source stopped producing samples.
    #[error("sample source closed")]
    SourceClosed,

    /// The renderer could not accept a frame.
    #[error("render failed: {0}")]
    Render(String),
}
