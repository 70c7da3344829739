use super::model::SpectralTrace;
use crate::config::ShiftWindow;

// ---------------------------------------------------------------------------
// Window predicate: which trace rows are kept for display
// ---------------------------------------------------------------------------

/// Return indices of trace rows whose shift lies inside the window.
pub fn window_indices(trace: &SpectralTrace, window: &ShiftWindow) -> Vec<usize> {
    trace
        .shift
        .iter()
        .enumerate()
        .filter(|(_, &shift)| window.contains(shift))
        .map(|(i, _)| i)
        .collect()
}

/// Restrict a trace to the window, keeping the descending order.
pub fn apply_window(trace: &SpectralTrace, window: &ShiftWindow) -> SpectralTrace {
    let keep = window_indices(trace, window);
    SpectralTrace {
        shift: keep.iter().map(|&i| trace.shift[i]).collect(),
        intensity: keep.iter().map(|&i| trace.intensity[i]).collect(),
    }
}
