//! Contrast ramp
//!
//! A contrast scalar `x ∈ [0, 1]` goes through a normalized logistic curve
//! with steepness `CONTRAST_STEEPNESS`, giving an amplitude `A(x) ∈ [0, 1]`
//! with `A(0) = 0` and `A(1) = 1`. Lightness samples follow
//! `y(t) = 0.5 + A(x) · (0.5 - t)`: surfaces sit at `t = 0.0..0.4`, ink at
//! `t = 1.0..0.6`, so the spread between them widens as contrast grows.

/// Logistic steepness
pub const CONTRAST_STEEPNESS: f64 = 8.0;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn bounds() -> (f64, f64) {
    let half = CONTRAST_STEEPNESS / 2.0;
    (sigmoid(-half), sigmoid(half))
}

/// Ramp amplitude for a contrast scalar
pub fn contrast_amplitude(contrast: f64) -> f64 {
    let (lo, hi) = bounds();
    let x = contrast.clamp(0.0, 1.0);
    let s = sigmoid(CONTRAST_STEEPNESS * (x - 0.5));
    ((s - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Closed-form inverse of [`contrast_amplitude`]
pub fn amplitude_to_contrast(amplitude: f64) -> f64 {
    let (lo, hi) = bounds();
    let s = lo + amplitude.clamp(0.0, 1.0) * (hi - lo);
    (0.5 + (s / (1.0 - s)).ln() / CONTRAST_STEEPNESS).clamp(0.0, 1.0)
}

/// Lightness at ramp position `t` for the given contrast
pub fn ramp_lightness(contrast: f64, t: f64) -> f64 {
    (0.5 + contrast_amplitude(contrast) * (0.5 - t)).clamp(0.0, 1.0)
}

/// Surface lightness samples `b0..b4` (t = 0.0..0.4)
pub fn surface_ramp(contrast: f64) -> [f64; 5] {
    std::array::from_fn(|i| ramp_lightness(contrast, 0.1 * i as f64))
}

/// Ink lightness samples `c0..c4` (t = 1.0..0.6)
pub fn ink_ramp(contrast: f64) -> [f64; 5] {
    std::array::from_fn(|i| ramp_lightness(contrast, 1.0 - 0.1 * i as f64))
}

/// Recover the contrast scalar from a `b0` lightness
///
/// Uses the distance from the midpoint, so an inverted (dark) ramp yields the
/// same contrast as the light ramp it came from.
pub fn contrast_from_lightness(y: f64) -> f64 {
    amplitude_to_contrast(2.0 * (y - 0.5).abs())
}
