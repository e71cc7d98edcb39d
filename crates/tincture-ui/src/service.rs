//! Persistence-backed theme service
//!
//! Owns the engine and writes every library or selection change through to
//! storage, so the next launch restores the same theme.

use std::sync::Arc;
use tincture_core::error::ThemeError;
use tincture_core::remediate::RemediationPalette;
use tincture_core::storage::{self, Storage};
use tincture_core::theme::{export_share_code, export_theme};
use tincture_core::{EngineConfig, Result, Theme, ThemeEngine};
use tracing::info;

pub struct ThemeService {
    storage: Arc<Storage>,
    engine: ThemeEngine,
}

impl ThemeService {
    /// Load saved themes and the persisted selection
    pub fn open(storage: Arc<Storage>, config: EngineConfig) -> Result<Self> {
        let conn = storage.connection()?;
        let user_themes = storage::list_themes(&conn)?;
        let state = storage::load_active_state(&conn)?;
        drop(conn);

        info!("Loaded {} saved theme(s)", user_themes.len());
        let engine = match state {
            Some(state) => ThemeEngine::restore(config, user_themes, state),
            None => ThemeEngine::new(config, user_themes),
        };
        Ok(Self { storage, engine })
    }

    pub fn engine(&self) -> &ThemeEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ThemeEngine {
        &mut self.engine
    }

    /// Palette for remediating content shown on the live theme
    pub fn palette(&self) -> RemediationPalette {
        RemediationPalette::from_tokens(self.engine.tokens())
    }

    /// Apply a theme and remember it as the active one
    pub fn apply_theme(&mut self, id: &str) -> Result<String> {
        let applied = self.engine.apply_theme(id);
        self.persist_state()?;
        Ok(applied)
    }

    /// Save the live tokens as a new theme
    pub fn save_theme(&mut self, name: &str) -> Result<Theme> {
        let theme = self.engine.save_theme(name);
        storage::upsert_theme(&*self.storage.connection()?, &theme)?;
        self.persist_state()?;
        Ok(theme)
    }

    pub fn delete_theme(&mut self, id: &str) -> Result<Theme> {
        let removed = self.engine.delete_theme(id)?;
        storage::delete_theme(&*self.storage.connection()?, id)?;
        self.persist_state()?;
        Ok(removed)
    }

    /// Import a theme JSON payload or share code, optionally applying it
    ///
    /// Applied imports go through the contrast guard, which may leave a
    /// different theme active.
    pub fn import_theme(&mut self, payload: &str, apply: bool) -> Result<Theme> {
        let theme = if apply {
            let (theme, warning) = self.engine.import_and_apply(payload)?;
            if let Some(warning) = warning {
                info!(
                    "Imported theme failed the contrast check; {} applied instead",
                    warning.replacement_id
                );
            }
            theme
        } else {
            self.engine.import(payload)?
        };
        storage::upsert_theme(&*self.storage.connection()?, &theme)?;
        self.persist_state()?;
        Ok(theme)
    }

    /// JSON or share code for a known theme
    pub fn export_theme(&self, id: &str, share_code: bool) -> Result<String> {
        let theme = self
            .engine
            .find_theme(id)
            .ok_or_else(|| ThemeError::NotFound(id.to_string()))?;
        if share_code {
            export_share_code(theme)
        } else {
            export_theme(theme)
        }
    }

    pub fn persist_state(&self) -> Result<()> {
        storage::save_active_state(&*self.storage.connection()?, self.engine.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tincture_core::theme::builtin::{DARK_THEME_ID, HIGH_CONTRAST_THEME_ID, LIGHT_THEME_ID};
    use tincture_core::{Error, TokenName};

    fn service(storage: &Arc<Storage>) -> ThemeService {
        ThemeService::open(storage.clone(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_selection_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new_with_path(dir.path()).unwrap());

        let mut first = service(&storage);
        assert_eq!(first.engine().state().current_theme_id.as_deref(), Some(LIGHT_THEME_ID));
        first.apply_theme(DARK_THEME_ID).unwrap();

        let second = service(&storage);
        assert_eq!(second.engine().state().current_theme_id.as_deref(), Some(DARK_THEME_ID));
        assert_eq!(second.engine().tokens(), first.engine().tokens());
    }

    #[test]
    fn test_saved_and_deleted_themes_are_persisted() {
        let storage = Arc::new(Storage::in_memory().unwrap());
        let mut svc = service(&storage);

        svc.engine_mut().set_hue(200.0);
        let saved = svc.save_theme("Teal").unwrap();

        let reopened = service(&storage);
        assert_eq!(reopened.engine().user_themes(), &[saved.clone()]);
        assert_eq!(reopened.engine().state().current_theme_id, Some(saved.id.clone()));

        svc.delete_theme(&saved.id).unwrap();
        let reopened = service(&storage);
        assert!(reopened.engine().user_themes().is_empty());
        assert!(matches!(
            svc.delete_theme(LIGHT_THEME_ID),
            Err(Error::Theme(ThemeError::ReadOnly(_)))
        ));
    }

    #[test]
    fn test_import_with_low_contrast_falls_back_to_safe_theme() {
        let storage = Arc::new(Storage::in_memory().unwrap());
        let mut svc = service(&storage);

        let mut json: serde_json::Value =
            serde_json::from_str(&svc.export_theme(DARK_THEME_ID, false).unwrap()).unwrap();
        let surface = json["tokens"]["b0"].clone();
        json["tokens"]["c0"] = surface;

        let imported = svc.import_theme(&json.to_string(), true).unwrap();
        assert_ne!(imported.id, DARK_THEME_ID);
        assert_eq!(
            svc.engine().state().current_theme_id.as_deref(),
            Some(HIGH_CONTRAST_THEME_ID)
        );
        assert_eq!(service(&storage).engine().user_themes().len(), 1);
    }

    #[test]
    fn test_share_code_import_and_palette() {
        let storage = Arc::new(Storage::in_memory().unwrap());
        let mut svc = service(&storage);

        let code = svc.export_theme(DARK_THEME_ID, true).unwrap();
        let imported = svc.import_theme(&code, false).unwrap();
        let dark = svc.engine().find_theme(DARK_THEME_ID).unwrap();
        assert_eq!(imported.tokens, dark.tokens);
        assert_eq!(svc.engine().state().current_theme_id.as_deref(), Some(LIGHT_THEME_ID));

        assert_eq!(svc.palette().ink, svc.engine().token(TokenName::C0));
        assert!(svc.export_theme("missing", false).is_err());
    }
}
