//! OKLCH color model and sRGB conversion
//!
//! Conversion pipeline:
//!
//! ```text
//! OKLCH ↔ OKLab ↔ LMS ↔ linear sRGB ↔ gamma-encoded sRGB
//! ```
//!
//! Matrices are the standard OKLab constants. Hue is always reported as
//! non-negative degrees in `[0, 360)`.

mod parse;

pub use parse::{parse_css_color, CssColor};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for token chroma
pub const MAX_CHROMA: f64 = 0.37;

/// Chroma below this is treated as gray (hue undefined)
pub const ACHROMATIC_EPSILON: f64 = 0.0001;

/// A color token in OKLCH space
///
/// Lightness is clamped to `[0, 1]`, chroma to `[0, MAX_CHROMA]` and hue is
/// normalized to `[0, 360)` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oklch {
    l: f64,
    c: f64,
    h: f64,
}

impl Oklch {
    pub fn new(l: f64, c: f64, h: f64) -> Self {
        Self {
            l: l.clamp(0.0, 1.0),
            c: c.clamp(0.0, MAX_CHROMA),
            h: normalize_hue(h),
        }
    }

    /// Gray with the given lightness
    pub fn gray(l: f64) -> Self {
        Self::new(l, 0.0, 0.0)
    }

    pub fn l(&self) -> f64 {
        self.l
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn h(&self) -> f64 {
        self.h
    }

    pub fn with_l(self, l: f64) -> Self {
        Self::new(l, self.c, self.h)
    }

    pub fn with_c(self, c: f64) -> Self {
        Self::new(self.l, c, self.h)
    }

    pub fn with_h(self, h: f64) -> Self {
        Self::new(self.l, self.c, h)
    }

    /// True when every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.c.is_finite() && self.h.is_finite()
    }

    pub fn is_achromatic(&self) -> bool {
        self.c < ACHROMATIC_EPSILON
    }

    /// Convert an sRGB color (components in `[0, 1]`)
    pub fn from_srgb(r: f64, g: f64, b: f64) -> Self {
        let (l, c, h) = srgb_to_oklch(r, g, b);
        Self::new(l, c, h)
    }

    /// Convert to gamma-encoded sRGB, clamped into gamut
    pub fn to_rgba(&self) -> Rgba {
        let (r, g, b) = oklch_to_srgb(self.l, self.c, self.h);
        Rgba::new(r, g, b, 1.0)
    }

    /// CSS representation, e.g. `oklch(0.95 0.02 250deg)`
    pub fn to_css(&self) -> String {
        format!(
            "oklch({} {} {}deg)",
            trim_float(self.l, 4),
            trim_float(self.c, 4),
            trim_float(self.h, 2)
        )
    }

    /// Component-wise comparison with circular hue distance
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.l - other.l).abs() <= tolerance
            && (self.c - other.c).abs() <= tolerance
            && hue_distance(self.h, other.h) <= tolerance
    }

    /// Shortest angular distance between the two hues, in degrees
    pub fn hue_delta(&self, other: &Self) -> f64 {
        hue_distance(self.h, other.h)
    }
}

impl fmt::Display for Oklch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Gamma-encoded sRGB color with alpha, all components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// Create a color, clamping every component into `[0, 1]`
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Create an opaque color from 0-255 values
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    /// Create a color from 0-255 values
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        )
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (leading `#` optional)
    pub fn from_hex(input: &str) -> Option<Self> {
        let digits = input.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 | 8 => digits.to_string(),
            _ => return None,
        };

        let bytes = hex::decode(expanded).ok()?;
        match bytes.as_slice() {
            [r, g, b] => Some(Self::from_rgb8(*r, *g, *b)),
            [r, g, b, a] => Some(Self::from_rgba8(*r, *g, *b, *a)),
            _ => None,
        }
    }

    /// Convert to 0-255 values
    pub fn to_rgb8(&self) -> [u8; 3] {
        [to_u8(self.r), to_u8(self.g), to_u8(self.b)]
    }

    /// Hex string `#rrggbb` (alpha dropped)
    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode(self.to_rgb8()))
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }

    pub fn to_oklch(&self) -> Oklch {
        Oklch::from_srgb(self.r, self.g, self.b)
    }
}

/// Convert OKLCH to gamma-encoded sRGB (may fall outside `[0, 1]`)
pub fn oklch_to_srgb(l: f64, c: f64, h: f64) -> (f64, f64, f64) {
    let hr = h.to_radians();
    let (r, g, b) = oklab_to_linear_srgb(l, c * hr.cos(), c * hr.sin());
    (gamma_correction(r), gamma_correction(g), gamma_correction(b))
}

/// Convert gamma-encoded sRGB to OKLCH
pub fn srgb_to_oklch(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let (l, a, b_) = linear_srgb_to_oklab(inverse_gamma(r), inverse_gamma(g), inverse_gamma(b));
    let c = a.hypot(b_);
    let h = normalize_hue(b_.atan2(a).to_degrees());
    (l, c, h)
}

/// sRGB transfer function: linear light to gamma-encoded
pub fn gamma_correction(x: f64) -> f64 {
    if x <= 0.003_130_8 {
        x * 12.92
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// Inverse sRGB transfer function: gamma-encoded to linear light
pub fn inverse_gamma(x: f64) -> f64 {
    if x <= 0.040_45 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// Normalize any angle to `[0, 360)`
pub fn normalize_hue(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

fn oklab_to_linear_srgb(l: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let l_ = l + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = l - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = l - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

    let l3 = l_ * l_ * l_;
    let m3 = m_ * m_ * m_;
    let s3 = s_ * s_ * s_;

    (
        4.076_741_662_1 * l3 - 3.307_711_591_3 * m3 + 0.230_969_929_2 * s3,
        -1.268_438_004_6 * l3 + 2.609_757_401_1 * m3 - 0.341_319_396_5 * s3,
        -0.004_196_086_3 * l3 - 0.703_418_614_7 * m3 + 1.707_614_701_0 * s3,
    )
}

fn linear_srgb_to_oklab(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let l = 0.412_221_470_8 * r + 0.536_332_536_3 * g + 0.051_445_992_9 * b;
    let m = 0.211_903_498_2 * r + 0.680_699_545_1 * g + 0.107_396_956_6 * b;
    let s = 0.088_302_461_9 * r + 0.281_718_837_6 * g + 0.629_978_700_5 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    (
        0.210_454_255_3 * l_ + 0.793_617_785_0 * m_ - 0.004_072_046_8 * s_,
        1.977_998_495_1 * l_ - 2.428_592_205_0 * m_ + 0.450_593_709_9 * s_,
        0.025_904_037_1 * l_ + 0.782_771_766_2 * m_ - 0.808_675_766_0 * s_,
    )
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Format with at most `decimals` places and no trailing zeros
fn trim_float(value: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, value);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    };
    if s == "-0" {
        "0".to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_black_and_white_lightness() {
        let (l, c, _) = srgb_to_oklch(0.0, 0.0, 0.0);
        assert!(approx(l, 0.0, 1e-9));
        assert!(approx(c, 0.0, 1e-9));

        let (l, c, _) = srgb_to_oklch(1.0, 1.0, 1.0);
        assert!(approx(l, 1.0, 1e-4));
        assert!(c < 1e-4);
    }

    #[test]
    fn test_known_red() {
        // Reference: sRGB red is roughly oklch(0.628 0.2577 29.23)
        let (l, c, h) = srgb_to_oklch(1.0, 0.0, 0.0);
        assert!(approx(l, 0.628, 1e-3), "l = {l}");
        assert!(approx(c, 0.2577, 1e-3), "c = {c}");
        assert!(approx(h, 29.23, 0.1), "h = {h}");
    }

    #[test]
    fn test_hue_is_non_negative() {
        // Blue sits at a negative atan2 angle before normalization
        let (_, _, h) = srgb_to_oklch(0.0, 0.0, 1.0);
        assert!((0.0..360.0).contains(&h));
        assert!(approx(h, 264.05, 0.1), "h = {h}");
    }

    #[test]
    fn test_gamma_continuous_at_threshold() {
        let t = 0.003_130_8;
        let below = gamma_correction(t - 1e-9);
        let at = gamma_correction(t);
        let above = gamma_correction(t + 1e-9);
        assert!(approx(below, at, 1e-6));
        assert!(approx(above, at, 1e-6));
    }

    #[test]
    fn test_inverse_gamma_continuous_at_threshold() {
        let t = 0.040_45;
        assert!(approx(inverse_gamma(t - 1e-9), inverse_gamma(t + 1e-9), 1e-6));
        assert!(approx(inverse_gamma(gamma_correction(0.5)), 0.5, 1e-12));
    }

    #[test]
    fn test_normalize_hue() {
        assert_eq!(normalize_hue(-40.0), 320.0);
        assert_eq!(normalize_hue(400.0), 40.0);
        assert_eq!(normalize_hue(360.0), 0.0);
        assert!(normalize_hue(-1e-20) < 360.0);
    }

    #[test]
    fn test_oklch_clamps_on_construction() {
        let token = Oklch::new(1.4, 0.9, -90.0);
        assert_eq!(token.l(), 1.0);
        assert_eq!(token.c(), MAX_CHROMA);
        assert_eq!(token.h(), 270.0);
    }

    #[test]
    fn test_to_css() {
        assert_eq!(Oklch::new(0.95, 0.0, 0.0).to_css(), "oklch(0.95 0 0deg)");
        assert_eq!(
            Oklch::new(0.5, 0.123456, 250.556).to_css(),
            "oklch(0.5 0.1235 250.56deg)"
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let color = Rgba::from_hex("#1a1e2a").unwrap();
        assert_eq!(color.to_rgb8(), [0x1a, 0x1e, 0x2a]);
        assert_eq!(color.to_hex(), "#1a1e2a");

        let short = Rgba::from_hex("f0a").unwrap();
        assert_eq!(short.to_rgb8(), [0xff, 0x00, 0xaa]);

        let with_alpha = Rgba::from_hex("#00000080").unwrap();
        assert!(approx(with_alpha.a, 128.0 / 255.0, 1e-9));

        assert!(Rgba::from_hex("#12345").is_none());
        assert!(Rgba::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn test_approx_eq_wraps_hue() {
        let a = Oklch::new(0.5, 0.1, 359.9995);
        let b = Oklch::new(0.5, 0.1, 0.0002);
        assert!(a.approx_eq(&b, 1e-3));
    }

    proptest! {
        #[test]
        fn prop_oklch_round_trip_in_gamut(r in 0.0f64..=1.0, g in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            // Every sRGB color is in gamut, so its OKLCH coordinates must survive a round trip
            let (l, c, h) = srgb_to_oklch(r, g, b);
            let (r2, g2, b2) = oklch_to_srgb(l, c, h);
            let (l2, c2, h2) = srgb_to_oklch(r2, g2, b2);

            prop_assert!((l - l2).abs() < 1e-4);
            prop_assert!((c - c2).abs() < 1e-4);
            if c > 1e-3 {
                prop_assert!(hue_distance(h, h2) < 1e-2);
            }
            prop_assert!((r - r2).abs() < 1e-4);
            prop_assert!((g - g2).abs() < 1e-4);
            prop_assert!((b - b2).abs() < 1e-4);
        }
    }
}
