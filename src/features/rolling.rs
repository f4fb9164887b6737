//! Windowed aggregates over a team's ordered history
//!
//! Every helper reads a slice holding only matches that happened *before*
//! the fixture being described. Callers push the current result after the
//! features have been taken, which is what keeps the features causal.

/// Sum of the last `window` values, or 0 when fewer than `window` exist
pub fn full_window_sum(history: &[i32], window: usize) -> i32 {
    if window == 0 || history.len() < window {
        return 0;
    }
    history[history.len() - window..].iter().sum()
}

/// The last `window` values, or fewer when the history is shorter
pub fn partial_window<T>(history: &[T], window: usize) -> &[T] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// Sum over up to `window` previous values
pub fn partial_window_sum(history: &[u32], window: usize) -> u32 {
    partial_window(history, window).iter().sum()
}

/// Mean over up to `window` previous values; `None` with no history
pub fn partial_window_mean(history: &[u32], window: usize) -> Option<f64> {
    let values = partial_window(history, window);
    if values.is_empty() {
        return None;
    }
    let sum: u32 = values.iter().sum();
    Some(sum as f64 / values.len() as f64)
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
