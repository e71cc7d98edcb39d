//! Theme token names and token sets

use crate::color::Oklch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hue offset between consecutive accent tokens
pub const ACCENT_HUE_STEP: f64 = 40.0;

/// Token family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFamily {
    /// Brand/highlight colors (`a0..a4`)
    Accent,
    /// Backgrounds and panels (`b0..b4`)
    Surface,
    /// Text and foreground (`c0..c4`)
    Ink,
}

impl TokenFamily {
    pub const ALL: [TokenFamily; 3] = [Self::Accent, Self::Surface, Self::Ink];

    pub fn tokens(self) -> [TokenName; 5] {
        use TokenName::*;
        match self {
            Self::Accent => [A0, A1, A2, A3, A4],
            Self::Surface => [B0, B1, B2, B3, B4],
            Self::Ink => [C0, C1, C2, C3, C4],
        }
    }
}

/// One of the 15 named theme slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenName {
    A0,
    A1,
    A2,
    A3,
    A4,
    B0,
    B1,
    B2,
    B3,
    B4,
    C0,
    C1,
    C2,
    C3,
    C4,
}

impl TokenName {
    pub const ALL: [TokenName; 15] = [
        Self::A0,
        Self::A1,
        Self::A2,
        Self::A3,
        Self::A4,
        Self::B0,
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
        Self::C0,
        Self::C1,
        Self::C2,
        Self::C3,
        Self::C4,
    ];

    pub fn family(self) -> TokenFamily {
        match self as usize / 5 {
            0 => TokenFamily::Accent,
            1 => TokenFamily::Surface,
            _ => TokenFamily::Ink,
        }
    }

    /// Position within the family (0-4)
    pub fn index(self) -> usize {
        self as usize % 5
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A0 => "a0",
            Self::A1 => "a1",
            Self::A2 => "a2",
            Self::A3 => "a3",
            Self::A4 => "a4",
            Self::B0 => "b0",
            Self::B1 => "b1",
            Self::B2 => "b2",
            Self::B3 => "b3",
            Self::B4 => "b4",
            Self::C0 => "c0",
            Self::C1 => "c1",
            Self::C2 => "c2",
            Self::C3 => "c3",
            Self::C4 => "c4",
        }
    }

    /// CSS custom property name, e.g. `--a0`
    pub fn css_variable(self) -> String {
        format!("--{}", self.as_str())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 15 tokens of a theme
///
/// Serialized as an object keyed by token name; every token must be present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<TokenName, Oklch>",
    into = "BTreeMap<TokenName, Oklch>"
)]
pub struct ThemeTokenSet {
    tokens: [Oklch; 15],
}

impl ThemeTokenSet {
    pub fn from_fn(mut f: impl FnMut(TokenName) -> Oklch) -> Self {
        Self {
            tokens: TokenName::ALL.map(&mut f),
        }
    }

    /// Build a set from family ramps
    ///
    /// Accents share lightness and chroma with hues staggered by
    /// `ACCENT_HUE_STEP` from `accent.h`. Surface and ink tokens share their
    /// family's chroma/hue and take lightness from the ramps.
    pub fn from_ramps(
        accent: Oklch,
        surface: (f64, f64),
        surface_l: [f64; 5],
        ink: (f64, f64),
        ink_l: [f64; 5],
    ) -> Self {
        Self::from_fn(|name| {
            let i = name.index();
            match name.family() {
                TokenFamily::Accent => {
                    accent.with_h(accent.h() + ACCENT_HUE_STEP * i as f64)
                }
                TokenFamily::Surface => Oklch::new(surface_l[i], surface.0, surface.1),
                TokenFamily::Ink => Oklch::new(ink_l[i], ink.0, ink.1),
            }
        })
    }

    pub fn get(&self, name: TokenName) -> Oklch {
        self.tokens[name as usize]
    }

    /// Replace a token, returning whether the value changed
    pub fn set(&mut self, name: TokenName, value: Oklch) -> bool {
        let slot = &mut self.tokens[name as usize];
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenName, Oklch)> + '_ {
        TokenName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }

    /// Ink/surface lightness gap, `|c0.l - b0.l|`
    pub fn contrast(&self) -> f64 {
        (self.get(TokenName::C0).l() - self.get(TokenName::B0).l()).abs()
    }

    /// True when ink is lighter than the panel surface (`c0.l > b1.l`)
    pub fn is_dark(&self) -> bool {
        self.get(TokenName::C0).l() > self.get(TokenName::B1).l()
    }

    /// First token with a non-finite component
    pub fn first_invalid(&self) -> Option<TokenName> {
        self.iter().find(|(_, v)| !v.is_finite()).map(|(n, _)| n)
    }
}

impl From<ThemeTokenSet> for BTreeMap<TokenName, Oklch> {
    fn from(set: ThemeTokenSet) -> Self {
        set.iter().collect()
    }
}

impl TryFrom<BTreeMap<TokenName, Oklch>> for ThemeTokenSet {
    type Error = String;

    fn try_from(map: BTreeMap<TokenName, Oklch>) -> std::result::Result<Self, Self::Error> {
        if let Some(missing) = TokenName::ALL.into_iter().find(|n| !map.contains_key(n)) {
            return Err(format!("missing token {}", missing));
        }
        // Re-run construction so deserialized values are clamped and normalized
        Ok(Self::from_fn(|name| {
            let v = map[&name];
            Oklch::new(v.l(), v.c(), v.h())
        }))
    }
}
