//! Linear percentile placement within a sector's (min, max) range.

/// "Higher is better": 0 at or below min, 100 at or above max, linear
/// interpolation between. A degenerate range (max <= min) returns the neutral
/// 50 rather than dividing by zero.
pub fn percentile(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 50.0;
    }
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// "Lower is better": the same interpolation flipped, so values at or below
/// min score 100 and values at or above max score 0.
pub fn percentile_inverted(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 50.0;
    }
    100.0 - percentile(value, min, max)
}
