//! Built-in themes
//!
//! Built-ins are read-only and always available alongside user themes. Every
//! built-in clears `MIN_THEME_CONTRAST`.

use crate::color::Oklch;
use crate::types::{Theme, ThemeTokenSet};
use once_cell::sync::Lazy;

pub const LIGHT_THEME_ID: &str = "tincture-light";
pub const DARK_THEME_ID: &str = "tincture-dark";
pub const HIGH_CONTRAST_THEME_ID: &str = "tincture-high-contrast";
pub const EMBER_THEME_ID: &str = "tincture-ember";

static BUILTIN_THEMES: Lazy<Vec<Theme>> = Lazy::new(|| {
    vec![
        Theme::new(
            LIGHT_THEME_ID,
            "Light",
            ThemeTokenSet::from_ramps(
                Oklch::new(0.62, 0.17, 250.0),
                (0.005, 250.0),
                [0.98, 0.955, 0.93, 0.9, 0.86],
                (0.02, 250.0),
                [0.22, 0.35, 0.48, 0.58, 0.68],
            ),
        ),
        Theme::new(
            DARK_THEME_ID,
            "Dark",
            ThemeTokenSet::from_ramps(
                Oklch::new(0.72, 0.14, 250.0),
                (0.012, 255.0),
                [0.16, 0.19, 0.23, 0.27, 0.31],
                (0.015, 255.0),
                [0.93, 0.82, 0.7, 0.6, 0.5],
            ),
        ),
        Theme::new(
            HIGH_CONTRAST_THEME_ID,
            "High Contrast",
            ThemeTokenSet::from_ramps(
                Oklch::new(0.5, 0.2, 265.0),
                (0.0, 0.0),
                [1.0, 0.97, 0.93, 0.88, 0.82],
                (0.0, 0.0),
                [0.0, 0.15, 0.3, 0.42, 0.55],
            ),
        ),
        Theme::new(
            EMBER_THEME_ID,
            "Ember",
            ThemeTokenSet::from_ramps(
                Oklch::new(0.7, 0.16, 40.0),
                (0.02, 40.0),
                [0.18, 0.21, 0.25, 0.29, 0.33],
                (0.025, 60.0),
                [0.92, 0.83, 0.72, 0.62, 0.52],
            ),
        ),
    ]
});

pub fn builtin_themes() -> &'static [Theme] {
    &BUILTIN_THEMES
}

pub fn builtin_theme(id: &str) -> Option<&'static Theme> {
    BUILTIN_THEMES.iter().find(|t| t.id == id)
}

pub fn is_builtin(id: &str) -> bool {
    builtin_theme(id).is_some()
}

/// The light theme, used when nothing else resolves
pub fn default_theme() -> &'static Theme {
    &BUILTIN_THEMES[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::MIN_THEME_CONTRAST;

    #[test]
    fn test_builtins_clear_contrast_invariant() {
        for theme in builtin_themes() {
            assert!(
                theme.tokens.contrast() >= MIN_THEME_CONTRAST,
                "{} has contrast {}",
                theme.id,
                theme.tokens.contrast()
            );
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let mut ids: Vec<&str> = builtin_themes().iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), builtin_themes().len());
    }

    #[test]
    fn test_builtin_modes() {
        assert!(!builtin_theme(LIGHT_THEME_ID).unwrap().tokens.is_dark());
        assert!(builtin_theme(DARK_THEME_ID).unwrap().tokens.is_dark());
        assert_eq!(default_theme().id, LIGHT_THEME_ID);
        assert!(is_builtin(HIGH_CONTRAST_THEME_ID));
        assert!(!is_builtin("nope"));
    }
}
