//! Theme import and export
//!
//! Themes travel as JSON (version 0 or 1) or as share codes: the compact JSON
//! wrapped in URL-safe base64. Imported themes always get a fresh id.

use crate::error::{Result, ThemeError};
use crate::types::{StoredTheme, Theme};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use tracing::info;

const UNNAMED_THEME: &str = "Imported theme";

/// Pretty-printed JSON for a theme
pub fn export_theme(theme: &Theme) -> Result<String> {
    Ok(serde_json::to_string_pretty(theme)?)
}

/// Parse a theme payload, migrating legacy versions
///
/// The result carries a new id so an import never replaces an existing theme.
pub fn import_theme(json: &str) -> Result<Theme> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let mut theme = StoredTheme::from_json_value(value)?.into_current()?;

    if let Some(token) = theme.tokens.first_invalid() {
        return Err(ThemeError::InvalidToken {
            token: token.to_string(),
            reason: "non-finite component".to_string(),
        }
        .into());
    }

    let original_id = std::mem::replace(&mut theme.id, uuid::Uuid::new_v4().to_string());
    if theme.name.trim().is_empty() {
        theme.name = UNNAMED_THEME.to_string();
    }
    info!("Imported theme {} as {}", original_id, theme.id);
    Ok(theme)
}

/// Compact share code for a theme
pub fn export_share_code(theme: &Theme) -> Result<String> {
    let json = serde_json::to_string(theme)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a share code produced by [`export_share_code`]
pub fn import_share_code(code: &str) -> Result<Theme> {
    let bytes = URL_SAFE_NO_PAD
        .decode(code.trim())
        .map_err(|e| ThemeError::InvalidShareCode(e.to_string()))?;
    let json = String::from_utf8(bytes).map_err(|e| ThemeError::InvalidShareCode(e.to_string()))?;
    import_theme(&json)
}
