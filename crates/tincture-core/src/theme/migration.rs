//! Legacy (version 0) theme migration

use crate::color::Oklch;
use crate::error::{Result, ThemeError};
use crate::types::{LegacyTheme, Theme, ThemeTokenSet};

/// Rotation applied to the legacy accent hue
///
/// Saved v0 themes were authored against this offset; changing it would
/// repaint every migrated theme.
pub const LEGACY_ACCENT_HUE_ROTATION: f64 = 30.0;

const SURFACE_KEYS: [&str; 5] = [
    "--surface-l",
    "--surface-l-1",
    "--surface-l-2",
    "--surface-l-3",
    "--surface-l-4",
];

const CONTRAST_KEYS: [&str; 5] = [
    "--contrast-l",
    "--contrast-l-1",
    "--contrast-l-2",
    "--contrast-l-3",
    "--contrast-l-4",
];

/// Map a version 0 theme onto the token model
///
/// Missing or non-finite values reject the whole theme rather than producing
/// NaN tokens.
pub fn migrate_v0_to_v1(legacy: &LegacyTheme) -> Result<Theme> {
    let value = |key: &str| -> Result<f64> {
        match legacy.tokens.get(key) {
            Some(v) if v.is_finite() => Ok(*v),
            Some(_) => Err(invalid(legacy, format!("{} is not a finite number", key))),
            None => Err(invalid(legacy, format!("missing {}", key))),
        }
    };
    let ramp = |keys: [&str; 5]| -> Result<[f64; 5]> {
        let mut out = [0.0; 5];
        for (slot, key) in out.iter_mut().zip(keys) {
            *slot = value(key)?;
        }
        Ok(out)
    };

    let accent = Oklch::new(
        value("--accent-l")?,
        value("--accent-c")?,
        value("--accent-h")? + LEGACY_ACCENT_HUE_ROTATION,
    );
    let tokens = ThemeTokenSet::from_ramps(
        accent,
        (value("--surface-c")?, value("--surface-h")?),
        ramp(SURFACE_KEYS)?,
        (value("--contrast-c")?, value("--contrast-h")?),
        ramp(CONTRAST_KEYS)?,
    );

    Ok(Theme::new(legacy.id.clone(), legacy.name.clone(), tokens))
}

fn invalid(legacy: &LegacyTheme, reason: String) -> crate::Error {
    ThemeError::InvalidLegacyTheme {
        id: legacy.id.clone(),
        reason,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StoredTheme, TokenName, CURRENT_THEME_VERSION};
    use crate::Error;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn fixture() -> LegacyTheme {
        let entries = [
            ("--accent-l", 0.65),
            ("--accent-c", 0.18),
            ("--accent-h", 340.0),
            ("--surface-l", 0.97),
            ("--surface-l-1", 0.94),
            ("--surface-l-2", 0.9),
            ("--surface-l-3", 0.86),
            ("--surface-l-4", 0.8),
            ("--surface-c", 0.01),
            ("--surface-h", 90.0),
            ("--contrast-l", 0.2),
            ("--contrast-l-1", 0.3),
            ("--contrast-l-2", 0.4),
            ("--contrast-l-3", 0.5),
            ("--contrast-l-4", 0.6),
            ("--contrast-c", 0.02),
            ("--contrast-h", 95.0),
        ];
        LegacyTheme {
            id: "legacy-1".to_string(),
            name: "Legacy".to_string(),
            version: 0,
            tokens: entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_migration_rotates_accent_hue() {
        let theme = migrate_v0_to_v1(&fixture()).unwrap();
        assert_eq!(theme.version, CURRENT_THEME_VERSION);
        assert_eq!(theme.id, "legacy-1");

        // 340 + 30 wraps to 10, then the usual +40 stagger
        let hues: Vec<f64> = [TokenName::A0, TokenName::A1, TokenName::A2, TokenName::A3, TokenName::A4]
            .iter()
            .map(|t| theme.tokens.get(*t).h())
            .collect();
        assert_eq!(hues, vec![10.0, 50.0, 90.0, 130.0, 170.0]);
        assert_eq!(theme.tokens.get(TokenName::A4).l(), 0.65);
        assert_eq!(theme.tokens.get(TokenName::A4).c(), 0.18);
    }

    #[test]
    fn test_migration_maps_ramps() {
        let theme = migrate_v0_to_v1(&fixture()).unwrap();
        assert_eq!(theme.tokens.get(TokenName::B0).l(), 0.97);
        assert_eq!(theme.tokens.get(TokenName::B4).l(), 0.8);
        assert_eq!(theme.tokens.get(TokenName::B2).h(), 90.0);
        assert_eq!(theme.tokens.get(TokenName::C0).l(), 0.2);
        assert_eq!(theme.tokens.get(TokenName::C3).l(), 0.5);
        assert_eq!(theme.tokens.get(TokenName::C3).c(), 0.02);
        assert_eq!(theme.tokens.get(TokenName::C3).h(), 95.0);
    }

    #[test]
    fn test_migration_is_deterministic() {
        let a = migrate_v0_to_v1(&fixture()).unwrap();
        let b = migrate_v0_to_v1(&fixture()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_current_payload_passes_through() {
        let migrated = migrate_v0_to_v1(&fixture()).unwrap();
        let again = StoredTheme::V1(migrated.clone()).into_current().unwrap();
        assert_eq!(again, migrated);
    }

    #[test]
    fn test_missing_key_rejected() {
        let mut legacy = fixture();
        legacy.tokens.remove("--surface-l-3");
        let err = migrate_v0_to_v1(&legacy).unwrap_err();
        match err {
            Error::Theme(ThemeError::InvalidLegacyTheme { id, reason }) => {
                assert_eq!(id, "legacy-1");
                assert!(reason.contains("--surface-l-3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let mut legacy = fixture();
        legacy.tokens.insert("--accent-h".to_string(), f64::NAN);
        assert!(matches!(
            migrate_v0_to_v1(&legacy),
            Err(Error::Theme(ThemeError::InvalidLegacyTheme { .. }))
        ));
    }
}
