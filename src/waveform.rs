//! Decorative waveform bars for the player screen.
//!
//! The bars are random heights, not an analysis of the audio; a new set is
//! generated for every playback session.

/// Lowest bar height, so silent-looking gaps never appear.
pub const MIN_HEIGHT: f32 = 0.15;

/// `bars` heights in `[MIN_HEIGHT, 1.0]`.
pub fn generate(bars: usize) -> Vec<f32> {
    (0..bars)
        .map(|_| MIN_HEIGHT + rand::random::<f32>() * (1.0 - MIN_HEIGHT))
        .collect()
}

/// Number of bars that count as already played at `progress`.
pub fn played_bars(bars: usize, progress: f64) -> usize {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    ((bars as f64) * progress).round() as usize
}
