use super::model::SpectralTrace;

// ---------------------------------------------------------------------------
// Chemical-shift axis reconstruction
// ---------------------------------------------------------------------------

/// Chemical-shift axis for `points` samples spanning `spectral_width`.
///
/// Point `i` (0-based) sits at `(points - i) * spectral_width / points +
/// calibration`, so the axis is strictly descending when the width is
/// positive and the last point lands one step above the calibration offset.
pub fn shift_axis(spectral_width: f64, points: usize, calibration: f64) -> Vec<f64> {
    if points == 0 {
        return Vec::new();
    }
    let step = spectral_width / points as f64;
    (1..=points)
        .rev()
        .map(|k| k as f64 * step + calibration)
        .collect()
}

/// Pair the processed intensities with their reconstructed shifts.
pub fn build_trace(spectral_width: f64, intensity: Vec<f64>, calibration: f64) -> SpectralTrace {
    let shift = shift_axis(spectral_width, intensity.len(), calibration);
    SpectralTrace { shift, intensity }
}
