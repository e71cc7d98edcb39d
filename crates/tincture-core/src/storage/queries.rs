//! Database query implementations

use crate::error::Result;
use crate::types::*;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

/// Settings key holding the serialized [`ActiveThemeState`]
pub const ACTIVE_THEME_STATE_KEY: &str = "active_theme_state";

// ===== Theme Queries =====

/// Insert a theme or replace the stored copy with the same id
pub fn upsert_theme(conn: &Connection, theme: &Theme) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO themes (id, name, version, tokens, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            version = excluded.version,
            tokens = excluded.tokens,
            updated_at = excluded.updated_at
        "#,
        params![
            theme.id,
            theme.name,
            theme.version,
            serde_json::to_string(&theme.tokens)?,
            now,
            now,
        ],
    )?;

    Ok(())
}

/// Get a theme by id, migrating legacy rows
pub fn get_theme(conn: &Connection, id: &str) -> Result<Option<Theme>> {
    let row = conn
        .query_row(
            "SELECT id, name, version, tokens FROM themes WHERE id = ?",
            params![id],
            ThemeRow::from_row,
        )
        .optional()?;

    match row {
        Some(row) => Ok(Some(load_theme(conn, row)?)),
        None => Ok(None),
    }
}

/// List all stored themes in creation order
///
/// Rows that cannot be decoded or migrated are logged and skipped so one
/// corrupt record does not hide the rest of the library.
pub fn list_themes(conn: &Connection) -> Result<Vec<Theme>> {
    let mut stmt =
        conn.prepare("SELECT id, name, version, tokens FROM themes ORDER BY created_at, id")?;
    let rows = stmt
        .query_map([], ThemeRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut themes = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id.clone();
        match load_theme(conn, row) {
            Ok(theme) => themes.push(theme),
            Err(e) => warn!("Skipping unreadable theme {}: {}", id, e),
        }
    }
    Ok(themes)
}

/// Delete a theme; returns whether a row was removed
pub fn delete_theme(conn: &Connection, id: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM themes WHERE id = ?", params![id])?;
    Ok(changed > 0)
}

struct ThemeRow {
    id: String,
    name: String,
    version: u32,
    tokens: String,
}

impl ThemeRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            version: row.get(2)?,
            tokens: row.get(3)?,
        })
    }
}

/// Decode a row and rewrite it in place when it was migrated
fn load_theme(conn: &Connection, row: ThemeRow) -> Result<Theme> {
    let tokens: serde_json::Value = serde_json::from_str(&row.tokens)?;
    let stored = StoredTheme::from_json_value(serde_json::json!({
        "id": row.id,
        "name": row.name,
        "version": row.version,
        "tokens": tokens,
    }))?;

    let theme = stored.into_current()?;
    if row.version < CURRENT_THEME_VERSION {
        debug!("Upgrading stored theme {} from version {}", theme.id, row.version);
        upsert_theme(conn, &theme)?;
    }
    Ok(theme)
}

// ===== Settings Queries =====

/// Get a setting value
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let result = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    Ok(result)
}

/// Set a setting value
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
        params![key, value],
    )?;

    Ok(())
}

/// Load the persisted theme selection, ignoring a corrupt record
pub fn load_active_state(conn: &Connection) -> Result<Option<ActiveThemeState>> {
    let Some(raw) = get_setting(conn, ACTIVE_THEME_STATE_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Ok(Some(state)),
        Err(e) => {
            warn!("Ignoring unreadable active theme state: {}", e);
            Ok(None)
        }
    }
}

pub fn save_active_state(conn: &Connection, state: &ActiveThemeState) -> Result<()> {
    set_setting(conn, ACTIVE_THEME_STATE_KEY, &serde_json::to_string(state)?)
}
