//! # Peak Estimation Module
//!
//! Finds the dominant bin of a magnitude spectrum and refines its position
//! to a fractional bin with a three-point parabolic fit.
//!
//! ## Features
//! - DC and the bin next to it are never considered as a peak
//! - Earliest bin wins on ties
//! - Guarded interpolation: spectrum edges and flat tops fall back to the integer bin

/// First bin scanned by the peak locator. Skips DC and its neighbour.
pub const SCAN_START_BIN: usize = 2;

/// Denominators smaller than this are treated as a flat peak.
const FLAT_PEAK_EPSILON: f32 = 1e-12;

/// Averages smaller than this make the peak ratio meaningless.
const RATIO_EPSILON: f32 = 1e-12;

/// Strongest bin in the scanned range together with the range mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DominantPeak {
    pub index: usize,
    pub value: f32,
    pub average: f32,
}

/// Everything the confidence gate and pitch tracker need about one frame's peak.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeakEstimate {
    /// Integer bin of the strongest magnitude.
    pub bin: usize,
    /// `bin` plus the parabolic offset.
    pub refined_bin: f32,
    pub magnitude: f32,
    /// Mean magnitude of the scanned range.
    pub average: f32,
    /// `magnitude / average`, or 0 when the average vanishes.
    pub ratio: f32,
    pub frequency_hz: f32,
}

/// Locates the strongest bin in `[SCAN_START_BIN, K)`.
///
/// Scans upward and only replaces the current best on a strictly larger
/// value, so the earliest of several equal maxima is reported.
///
/// # Returns
/// * `DominantPeak` - Peak index, peak value and mean over the scanned range.
///   An empty range yields index `SCAN_START_BIN` with value and average 0.
pub fn locate_peak(magnitudes: &[f32]) -> DominantPeak {
    let mut peak = DominantPeak {
        index: SCAN_START_BIN,
        value: 0.0,
        average: 0.0,
    };
    if magnitudes.len() <= SCAN_START_BIN {
        return peak;
    }

    let scanned = &magnitudes[SCAN_START_BIN..];
    let mut best = f32::NEG_INFINITY;
    let mut sum = 0.0;
    for (offset, &magnitude) in scanned.iter().enumerate() {
        sum += magnitude;
        if magnitude > best {
            best = magnitude;
            peak.index = SCAN_START_BIN + offset;
        }
    }
    peak.value = best;
    peak.average = sum / scanned.len() as f32;
    peak
}

/// Fractional offset of the true peak from `peak_index`, in bins.
///
/// Fits a parabola through the magnitudes at `peak_index - 1`, `peak_index`
/// and `peak_index + 1`.
///
/// # Returns
/// * Offset in `[-0.5, 0.5]`. Returns 0 at the spectrum edges and when the
///   three points are (nearly) collinear.
pub fn interpolate_offset(magnitudes: &[f32], peak_index: usize) -> f32 {
    if peak_index == 0 || peak_index + 1 >= magnitudes.len() {
        return 0.0;
    }

    let a = magnitudes[peak_index - 1];
    let b = magnitudes[peak_index];
    let c = magnitudes[peak_index + 1];

    let denominator = a - 2.0 * b + c;
    if denominator.abs() < FLAT_PEAK_EPSILON {
        return 0.0;
    }

    (0.5 * (a - c) / denominator).clamp(-0.5, 0.5)
}

/// Builds the full peak estimate for one frame.
///
/// # Arguments
/// * `magnitudes` - Magnitude spectrum (K bins)
/// * `bin_width_hz` - Frequency spacing of the bins (Fs / N)
pub fn estimate_peak(magnitudes: &[f32], bin_width_hz: f32) -> PeakEstimate {
    let peak = locate_peak(magnitudes);
    let offset = interpolate_offset(magnitudes, peak.index);
    let refined_bin = peak.index as f32 + offset;

    let ratio = if peak.average.abs() < RATIO_EPSILON {
        0.0
    } else {
        peak.value / peak.average
    };

    PeakEstimate {
        bin: peak.index,
        refined_bin,
        magnitude: peak.value,
        average: peak.average,
        ratio,
        frequency_hz: refined_bin * bin_width_hz,
    }
}
