//! Confidence gate deciding whether a peak may drive pitch tracking.

use crate::config::AnalyzerConfig;
use crate::peak::PeakEstimate;

/// Returns `true` when the peak is strong in absolute terms, stands out from
/// the rest of the spectrum, and lies strictly inside the audible band.
pub fn is_confident(peak: &PeakEstimate, config: &AnalyzerConfig) -> bool {
    peak.magnitude > config.magnitude_threshold
        && peak.ratio > config.ratio_threshold
        && peak.frequency_hz > config.min_frequency_hz
        && peak.frequency_hz < config.nyquist_hz()
}
