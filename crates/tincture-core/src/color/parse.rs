//! CSS color value parsing
//!
//! Hex notation goes through [`Rgba::from_hex`] and `oklch()` is read here.
//! Everything else CSS accepts (named colors, `rgb()`, `hsl()`, `hwb()` and
//! `transparent`) is handed to `csscolorparser`. Anything else parses to
//! `None`.

use super::{Oklch, Rgba};
use once_cell::sync::Lazy;
use regex::Regex;

static OKLCH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^oklch\(\s*([^)]*?)\s*\)$").expect("valid color regex")
});

/// A parsed CSS color
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssColor {
    Srgb(Rgba),
    Oklch { color: Oklch, alpha: f64 },
}

impl CssColor {
    pub fn alpha(&self) -> f64 {
        match self {
            Self::Srgb(rgba) => rgba.a,
            Self::Oklch { alpha, .. } => *alpha,
        }
    }

    pub fn to_oklch(&self) -> Oklch {
        match self {
            Self::Srgb(rgba) => rgba.to_oklch(),
            Self::Oklch { color, .. } => *color,
        }
    }

    pub fn to_rgba(&self) -> Rgba {
        match self {
            Self::Srgb(rgba) => *rgba,
            Self::Oklch { color, alpha } => {
                let rgba = color.to_rgba();
                Rgba::new(rgba.r, rgba.g, rgba.b, *alpha)
            }
        }
    }
}

/// Parse a CSS color value
pub fn parse_css_color(input: &str) -> Option<CssColor> {
    let value = input.trim();
    if value.is_empty() {
        return None;
    }

    if value.starts_with('#') {
        return Rgba::from_hex(value).map(CssColor::Srgb);
    }
    // CSS requires the '#'; bare digits are lengths or garbage here
    if value.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    if let Some(caps) = OKLCH_RE.captures(value) {
        return parse_oklch_args(&caps[1]);
    }

    let parsed = csscolorparser::parse(value).ok()?;
    let rgba = Rgba::new(parsed.r as f64, parsed.g as f64, parsed.b as f64, parsed.a as f64);
    (rgba.r.is_finite() && rgba.g.is_finite() && rgba.b.is_finite() && rgba.a.is_finite())
        .then_some(CssColor::Srgb(rgba))
}

fn parse_oklch_args(raw: &str) -> Option<CssColor> {
    let (channels, alpha) = match raw.split_once('/') {
        Some((channels, alpha)) => (channels, Some(alpha.trim())),
        None => (raw, None),
    };
    let channels: Vec<&str> = channels.split_whitespace().collect();
    let [l, c, h] = channels.as_slice() else {
        return None;
    };

    let l = match l.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? / 100.0,
        None => l.parse::<f64>().ok()?,
    };
    // 100% chroma maps to 0.4 in CSS Color 4
    let c = match c.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? / 100.0 * 0.4,
        None => c.parse::<f64>().ok()?,
    };
    let h = h.strip_suffix("deg").unwrap_or(h).parse::<f64>().ok()?;

    let color = Oklch::new(l, c, h);
    if !color.is_finite() {
        return None;
    }
    let alpha = parse_alpha(alpha)?;
    Some(CssColor::Oklch { color, alpha })
}

fn parse_alpha(raw: Option<&str>) -> Option<f64> {
    let Some(raw) = raw else {
        return Some(1.0);
    };
    let alpha = match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok()? / 100.0,
        None => raw.parse::<f64>().ok()?,
    };
    alpha.is_finite().then(|| alpha.clamp(0.0, 1.0))
}
