//! Theme records, legacy payloads and active theme state

use super::ThemeTokenSet;
use crate::error::{Result, ThemeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version written by the current token model
pub const CURRENT_THEME_VERSION: u32 = 1;

/// A named theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub tokens: ThemeTokenSet,
}

impl Theme {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tokens: ThemeTokenSet) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: CURRENT_THEME_VERSION,
            tokens,
        }
    }
}

/// Version 0 theme: flat CSS-variable style keys
///
/// Keys: `--accent-l/-c/-h`, `--surface-l`, `--surface-l-1..-4`,
/// `--surface-c/-h`, `--contrast-l`, `--contrast-l-1..-4`, `--contrast-c/-h`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTheme {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: u32,
    pub tokens: BTreeMap<String, f64>,
}

/// A theme as found in storage or an import payload
#[derive(Debug, Clone, PartialEq)]
pub enum StoredTheme {
    V0(LegacyTheme),
    V1(Theme),
}

impl StoredTheme {
    /// Decode a JSON payload, dispatching on its `version` field
    ///
    /// A missing version means a version 0 payload.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);

        match version {
            0 => Ok(Self::V0(serde_json::from_value(value)?)),
            1 => Ok(Self::V1(serde_json::from_value(value)?)),
            other => Err(ThemeError::UnsupportedVersion(other as u32).into()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::V0(theme) => &theme.id,
            Self::V1(theme) => &theme.id,
        }
    }

    /// Bring the payload up to the current version
    ///
    /// Current payloads pass through untouched.
    pub fn into_current(self) -> Result<Theme> {
        match self {
            Self::V0(legacy) => crate::theme::migrate_v0_to_v1(&legacy),
            Self::V1(theme) => Ok(theme),
        }
    }
}

/// OS color scheme preference
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemMode {
    Dark,
    #[default]
    Light,
}

/// Process-wide theme selection state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveThemeState {
    /// Theme the live tokens were last applied from, if any
    pub current_theme_id: Option<String>,
    /// False while the live tokens hold unsaved edits
    pub is_theme_saved: bool,
    pub light_mode_theme: String,
    pub dark_mode_theme: String,
    pub theme_should_match_system: bool,
    pub system_mode: SystemMode,
}

impl ActiveThemeState {
    pub fn new(light_mode_theme: impl Into<String>, dark_mode_theme: impl Into<String>) -> Self {
        Self {
            current_theme_id: None,
            is_theme_saved: true,
            light_mode_theme: light_mode_theme.into(),
            dark_mode_theme: dark_mode_theme.into(),
            theme_should_match_system: false,
            system_mode: SystemMode::default(),
        }
    }

    /// Theme configured for the current system mode
    pub fn theme_for_system_mode(&self) -> &str {
        match self.system_mode {
            SystemMode::Dark => &self.dark_mode_theme,
            SystemMode::Light => &self.light_mode_theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_stored_theme_dispatches_on_version() {
        let legacy = serde_json::json!({
            "id": "old",
            "name": "Old",
            "tokens": { "--accent-l": 0.5 }
        });
        assert!(matches!(
            StoredTheme::from_json_value(legacy).unwrap(),
            StoredTheme::V0(_)
        ));

        let future = serde_json::json!({ "id": "x", "name": "X", "version": 7, "tokens": {} });
        assert!(matches!(
            StoredTheme::from_json_value(future),
            Err(Error::Theme(ThemeError::UnsupportedVersion(7)))
        ));
    }

    #[test]
    fn test_active_state_serializes_camel_case() {
        let state = ActiveThemeState::new("light", "dark");
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["lightModeTheme"], "light");
        assert_eq!(json["systemMode"], "light");
        assert_eq!(json["themeShouldMatchSystem"], false);

        let back: ActiveThemeState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_theme_for_system_mode() {
        let mut state = ActiveThemeState::new("light", "dark");
        assert_eq!(state.theme_for_system_mode(), "light");
        state.system_mode = SystemMode::Dark;
        assert_eq!(state.theme_for_system_mode(), "dark");
    }
}
