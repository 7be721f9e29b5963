//! Renderer seam: where finished frames leave the pipeline.

use crossbeam_channel::Sender;

use crate::error::AnalyzerError;
use crate::FrameReport;

/// Consumes one report per frame: either a quiet flag or bar heights, plus
/// the shown note when there is one.
pub trait Renderer {
    fn render(&mut self, report: &FrameReport) -> Result<(), AnalyzerError>;
}

/// Forwards reports to another thread, e.g. a GUI that draws them.
impl Renderer for Sender<FrameReport> {
    fn render(&mut self, report: &FrameReport) -> Result<(), AnalyzerError> {
        self.send(report.clone())
            .map_err(|_| AnalyzerError::Render("display receiver disconnected".to_string()))
    }
}
