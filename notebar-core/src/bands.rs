//! # Band Aggregation Module
//!
//! Reduces a magnitude spectrum to a handful of display bands by averaging
//! contiguous runs of bins.

/// Averages contiguous runs of bins into `bands.len()` display bands.
///
/// Bin 0 (DC) is never used. The remaining bins are split into groups of
/// `(K - 1) / B` bins; the last band keeps accumulating until the spectrum is
/// exhausted, so it absorbs any remainder. A band that receives no bins
/// reads 0.
///
/// # Arguments
/// * `magnitudes` - Magnitude spectrum (K bins)
/// * `bands` - Output, one mean per band (B slots)
pub fn aggregate_bands(magnitudes: &[f32], bands: &mut [f32]) {
    bands.fill(0.0);
    let band_count = bands.len();
    if band_count == 0 || magnitudes.len() < 2 {
        return;
    }

    let bins = &magnitudes[1..];
    let group_size = (bins.len() / band_count).max(1);

    for (index, band) in bands.iter_mut().enumerate() {
        let start = (index * group_size).min(bins.len());
        let end = if index + 1 == band_count {
            bins.len()
        } else {
            (start + group_size).min(bins.len())
        };
        let group = &bins[start..end];
        if !group.is_empty() {
            *band = group.iter().sum::<f32>() / group.len() as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_takes_exact_means_and_skips_dc() {
        // K = 9: bins 1..=8 split into 4 pairs
        let spectrum = [1000.0, 1.0, 3.0, 5.0, 7.0, 9.0, 11.0, 13.0, 15.0];
        let mut bands = [0.0; 4];
        aggregate_bands(&spectrum, &mut bands);
        assert_eq!(bands, [2.0, 6.0, 10.0, 14.0]);
    }

    #[test]
    fn last_band_absorbs_remainder() {
        // K = 8: bins 1..=7, group size 7 / 3 = 2, last band gets bins 5..=7
        let spectrum = [0.0, 2.0, 2.0, 4.0, 4.0, 3.0, 6.0, 9.0];
        let mut bands = [0.0; 3];
        aggregate_bands(&spectrum, &mut bands);
        assert_eq!(bands[0], 2.0);
        assert_eq!(bands[1], 4.0);
        assert_eq!(bands[2], 6.0);
    }

    #[test]
    fn default_geometry_has_sixteen_bands() {
        let spectrum: Vec<f32> = (0..128).map(|k| k as f32).collect();
        let mut bands = [0.0; 16];
        aggregate_bands(&spectrum, &mut bands);
        // Group size 127 / 16 = 7: band 0 covers bins 1..=7
        assert!((bands[0] - 4.0).abs() < 1e-6);
        // Last band covers bins 106..=127
        assert!((bands[15] - 116.5).abs() < 1e-4);
    }

    #[test]
    fn more_bands_than_bins_leaves_trailing_bands_empty() {
        let spectrum = [5.0, 1.0, 2.0];
        let mut bands = [0.0; 4];
        aggregate_bands(&spectrum, &mut bands);
        assert_eq!(bands, [1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn stale_output_is_overwritten() {
        let spectrum = [0.0, 4.0, 4.0, 8.0, 8.0];
        let mut bands = [99.0; 2];
        aggregate_bands(&spectrum, &mut bands);
        assert_eq!(bands, [4.0, 8.0]);
        aggregate_bands(&[0.0], &mut bands);
        assert_eq!(bands, [0.0, 0.0]);
    }
}
