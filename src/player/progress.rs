//! Number and time formatting for the player screen.

/// Clamp a seek fraction into `[0, 1]`. NaN counts as 0.
pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// `elapsed / duration` in `[0, 1]`; 0 while the duration is unknown.
pub fn progress_fraction(elapsed_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 0.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
}

/// Format milliseconds as `MM:SS`. Minutes keep growing past 99.
pub fn format_mmss(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
