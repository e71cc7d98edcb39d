//! Theme engine: the live token model
//!
//! The engine is an explicit context object. The caller constructs it once,
//! registers sinks and observers, and drives it from user actions. It never
//! touches storage; persistence is the caller's job.

use super::builtin::{self, DARK_THEME_ID, HIGH_CONTRAST_THEME_ID, LIGHT_THEME_ID};
use super::observers::{BatchState, Observers, SubscriptionId, ThemeSink};
use super::ramp::{contrast_from_lightness, ink_ramp, surface_ramp};
use super::transfer;
use crate::color::{Oklch, MAX_CHROMA};
use crate::error::{Result, ThemeError};
use crate::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Minimum `|c0.l - b0.l|` a theme must keep
pub const MIN_THEME_CONTRAST: f64 = 0.2;

/// Scale applied to derived surface/ink chroma in `set_chroma`
const NEUTRAL_CHROMA_SCALE: f64 = MAX_CHROMA * 0.8;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Applied when a requested theme cannot be found
    pub default_theme_id: String,
    /// Applied when the active theme fails the contrast guard
    pub safe_theme_id: String,
    pub light_mode_theme: String,
    pub dark_mode_theme: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_theme_id: LIGHT_THEME_ID.to_string(),
            safe_theme_id: HIGH_CONTRAST_THEME_ID.to_string(),
            light_mode_theme: LIGHT_THEME_ID.to_string(),
            dark_mode_theme: DARK_THEME_ID.to_string(),
        }
    }
}

/// Raised when the contrast guard replaced the active theme
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastWarning {
    pub theme_id: Option<String>,
    pub contrast: f64,
    pub replacement_id: String,
}

/// Coarse engine events
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeEvent {
    ThemeApplied { id: String },
    ThemeNotFound { requested: String, fallback: String },
    ThemeSaved { id: String, name: String },
    ThemeDeleted { id: String },
    /// The active theme was deleted; no theme is current until one is applied
    ActiveThemeDeleted { id: String },
    ContrastWarning(ContrastWarning),
    SystemModeChanged(SystemMode),
}

/// Parameters drawn by `randomize_theme`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomThemeParams {
    pub lightness: f64,
    pub hue: f64,
    pub saturation: f64,
    pub contrast: f64,
    pub chroma: f64,
}

/// The live theme token model
pub struct ThemeEngine {
    config: EngineConfig,
    tokens: ThemeTokenSet,
    user_themes: Vec<Theme>,
    state: ActiveThemeState,
    surface_snapshot: String,
    observers: Observers,
    sinks: Vec<Box<dyn ThemeSink>>,
    batch: BatchState,
    events: broadcast::Sender<ThemeEvent>,
}

impl ThemeEngine {
    /// Create an engine and apply the configured default theme
    pub fn new(config: EngineConfig, user_themes: Vec<Theme>) -> Self {
        let (events, _) = broadcast::channel(64);
        let tokens = builtin::default_theme().tokens;
        let state = ActiveThemeState::new(&config.light_mode_theme, &config.dark_mode_theme);
        let mut engine = Self {
            config,
            tokens,
            user_themes,
            state,
            surface_snapshot: String::new(),
            observers: Observers::default(),
            sinks: Vec::new(),
            batch: BatchState::default(),
            events,
        };
        let default_id = engine.config.default_theme_id.clone();
        engine.apply_theme(&default_id);
        engine
    }

    /// Create an engine from persisted selection state
    ///
    /// Re-applies the persisted current theme, or the system-mode theme when
    /// nothing was current.
    pub fn restore(config: EngineConfig, user_themes: Vec<Theme>, state: ActiveThemeState) -> Self {
        let mut engine = Self::new(config, user_themes);
        let target = state
            .current_theme_id
            .clone()
            .unwrap_or_else(|| state.theme_for_system_mode().to_string());
        engine.state = state;
        engine.apply_theme(&target);
        engine
    }

    // ===== Read accessors =====

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn token(&self, name: TokenName) -> Oklch {
        self.tokens.get(name)
    }

    pub fn tokens(&self) -> &ThemeTokenSet {
        &self.tokens
    }

    /// CSS value for a token, e.g. `oklch(0.98 0.005 250deg)`
    pub fn css_value(&self, name: TokenName) -> String {
        self.tokens.get(name).to_css()
    }

    /// `(--name, value)` pairs for every token
    pub fn css_variables(&self) -> Vec<(String, String)> {
        self.tokens
            .iter()
            .map(|(name, value)| (name.css_variable(), value.to_css()))
            .collect()
    }

    /// Hex string of the main surface, for favicon and status bar tinting
    pub fn surface_snapshot(&self) -> &str {
        &self.surface_snapshot
    }

    pub fn state(&self) -> &ActiveThemeState {
        &self.state
    }

    pub fn user_themes(&self) -> &[Theme] {
        &self.user_themes
    }

    /// Built-in themes followed by user themes
    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        builtin::builtin_themes().iter().chain(self.user_themes.iter())
    }

    pub fn find_theme(&self, id: &str) -> Option<&Theme> {
        self.themes().find(|t| t.id == id)
    }

    /// Contrast scalar recovered from the current `b0` lightness
    pub fn contrast(&self) -> f64 {
        contrast_from_lightness(self.tokens.get(TokenName::B0).l())
    }

    // ===== Observers, sinks, events =====

    /// Observe one token; the callback runs once per change (once per batch)
    pub fn subscribe(
        &mut self,
        token: TokenName,
        callback: impl FnMut(TokenName, Oklch) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Some(token), Box::new(callback))
    }

    /// Observe every token
    pub fn subscribe_all(&mut self, callback: impl FnMut(TokenName, Oklch) + 'static) -> SubscriptionId {
        self.observers.subscribe(None, Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Register a sink and push the full current palette into it
    pub fn add_sink(&mut self, mut sink: Box<dyn ThemeSink>) {
        for (name, value) in self.tokens.iter() {
            sink.apply_token(name, &value.to_css());
        }
        sink.batch_applied(&TokenName::ALL);
        self.sinks.push(sink);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ThemeEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ThemeEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    // ===== Batching =====

    pub fn begin_batch(&mut self) {
        self.batch.begin();
    }

    pub fn end_batch(&mut self) {
        if self.batch.end() {
            self.flush();
        }
    }

    /// Run `f` inside a batch so dependents recompute once
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.begin_batch();
        let out = f(self);
        self.end_batch();
        out
    }

    fn flush(&mut self) {
        let changed = self.batch.take_dirty();
        if changed.is_empty() {
            return;
        }
        debug!("Flushing {} changed token(s)", changed.len());

        for &name in &changed {
            let value = self.tokens.get(name);
            let css = value.to_css();
            self.observers.notify(name, value);
            for sink in &mut self.sinks {
                sink.apply_token(name, &css);
            }
        }
        for sink in &mut self.sinks {
            sink.batch_applied(&changed);
        }
    }

    // ===== Token editing =====

    /// Set one token; marks the live theme as an unsaved draft when it changes
    pub fn set_token(&mut self, name: TokenName, value: Oklch) {
        if !self.tokens.set(name, value) {
            return;
        }
        self.state.is_theme_saved = false;
        self.batch.mark(name);
        if !self.batch.is_open() {
            self.flush();
        }
    }

    fn update_family(&mut self, family: TokenFamily, mut f: impl FnMut(usize, Oklch) -> Oklch) {
        for name in family.tokens() {
            let next = f(name.index(), self.tokens.get(name));
            self.set_token(name, next);
        }
    }

    /// Same lightness for all five accents
    pub fn set_lightness(&mut self, lightness: f64) {
        self.batch(|engine| {
            engine.update_family(TokenFamily::Accent, |_, t| t.with_l(lightness));
        });
    }

    /// Accents at `hue + 40·i`; surface and ink exactly at `hue`
    pub fn set_hue(&mut self, hue: f64) {
        self.batch(|engine| {
            engine.update_family(TokenFamily::Accent, |i, t| {
                t.with_h(hue + ACCENT_HUE_STEP * i as f64)
            });
            engine.update_family(TokenFamily::Surface, |_, t| t.with_h(hue));
            engine.update_family(TokenFamily::Ink, |_, t| t.with_h(hue));
        });
    }

    /// Accent chroma `chroma`; surface and ink get a desaturated share of it
    pub fn set_chroma(&mut self, chroma: f64, saturation: f64) {
        let neutral = saturation * chroma * NEUTRAL_CHROMA_SCALE;
        self.batch(|engine| {
            engine.update_family(TokenFamily::Accent, |_, t| t.with_c(chroma));
            engine.update_family(TokenFamily::Surface, |_, t| t.with_c(neutral));
            engine.update_family(TokenFamily::Ink, |_, t| t.with_c(neutral));
        });
    }

    /// Rebuild surface and ink lightness from a contrast scalar in `[0, 1]`
    pub fn set_contrast(&mut self, contrast: f64) {
        let surfaces = surface_ramp(contrast);
        let inks = ink_ramp(contrast);
        self.batch(|engine| {
            engine.update_family(TokenFamily::Surface, |i, t| t.with_l(surfaces[i]));
            engine.update_family(TokenFamily::Ink, |i, t| t.with_l(inks[i]));
        });
    }

    /// Flip surface and ink lightness (`l → 1 - l`)
    pub fn invert_theme(&mut self) {
        self.batch(|engine| {
            engine.update_family(TokenFamily::Surface, |_, t| t.with_l(1.0 - t.l()));
            engine.update_family(TokenFamily::Ink, |_, t| t.with_l(1.0 - t.l()));
        });
        debug!("Inverted theme");
    }

    pub fn randomize_theme(&mut self) -> RandomThemeParams {
        self.randomize_theme_with(&mut rand::rng())
    }

    /// Draw a random theme from `rng` and apply it as one batch
    pub fn randomize_theme_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RandomThemeParams {
        let lightness = rng.random_range(0.3..1.0);
        let params = RandomThemeParams {
            lightness,
            hue: rng.random_range(0.0..360.0),
            saturation: rng.random_range(0.0..0.5),
            contrast: 1.0 - lightness,
            chroma: rng.random_range(0.5..1.0) * MAX_CHROMA,
        };

        self.batch(|engine| {
            engine.set_lightness(params.lightness);
            engine.set_hue(params.hue);
            engine.set_chroma(params.chroma, params.saturation);
            engine.set_contrast(params.contrast);
        });
        debug!("Randomized theme: {:?}", params);
        params
    }

    // ===== Theme selection =====

    /// Apply a theme by id, falling back to the default theme when unknown
    ///
    /// Returns the id that was actually applied.
    pub fn apply_theme(&mut self, id: &str) -> String {
        let theme = match self.find_theme(id) {
            Some(theme) => theme.clone(),
            None => {
                let fallback = self
                    .find_theme(&self.config.default_theme_id)
                    .unwrap_or_else(|| builtin::default_theme())
                    .clone();
                warn!("Theme not found: {}, falling back to {}", id, fallback.id);
                self.emit(ThemeEvent::ThemeNotFound {
                    requested: id.to_string(),
                    fallback: fallback.id.clone(),
                });
                fallback
            }
        };

        let tokens = theme.tokens;
        self.batch(|engine| {
            for (name, value) in tokens.iter() {
                engine.set_token(name, value);
            }
        });

        self.state.current_theme_id = Some(theme.id.clone());
        self.state.is_theme_saved = true;
        if self.state.theme_should_match_system {
            match self.state.system_mode {
                SystemMode::Dark => self.state.dark_mode_theme = theme.id.clone(),
                SystemMode::Light => self.state.light_mode_theme = theme.id.clone(),
            }
        }
        self.refresh_snapshot();

        info!("Applied theme: {} ({})", theme.name, theme.id);
        self.emit(ThemeEvent::ThemeApplied {
            id: theme.id.clone(),
        });
        theme.id
    }

    /// Record the OS color scheme; re-applies when following the system
    pub fn set_system_mode(&mut self, mode: SystemMode) {
        if self.state.system_mode == mode {
            return;
        }
        self.state.system_mode = mode;
        self.emit(ThemeEvent::SystemModeChanged(mode));

        if self.state.theme_should_match_system {
            let id = self.state.theme_for_system_mode().to_string();
            self.apply_theme(&id);
        }
    }

    /// Follow the OS color scheme; enabling applies the current mode's theme
    pub fn set_match_system(&mut self, enabled: bool) {
        self.state.theme_should_match_system = enabled;
        if enabled {
            let id = self.state.theme_for_system_mode().to_string();
            self.apply_theme(&id);
        }
    }

    fn refresh_snapshot(&mut self) {
        self.surface_snapshot = self.tokens.get(TokenName::B0).to_rgba().to_hex();
    }

    // ===== Theme library =====

    /// Snapshot the live tokens into a new user theme and make it current
    ///
    /// The returned theme still has to be persisted by the caller.
    pub fn save_theme(&mut self, name: impl Into<String>) -> Theme {
        let theme = Theme::new(uuid::Uuid::new_v4().to_string(), name, self.tokens);
        self.user_themes.push(theme.clone());
        self.state.current_theme_id = Some(theme.id.clone());
        self.state.is_theme_saved = true;
        self.refresh_snapshot();

        info!("Saved theme: {} ({})", theme.name, theme.id);
        self.emit(ThemeEvent::ThemeSaved {
            id: theme.id.clone(),
            name: theme.name.clone(),
        });
        theme
    }

    /// Add or replace a user theme without applying it
    pub fn add_user_theme(&mut self, theme: Theme) -> Result<()> {
        if builtin::is_builtin(&theme.id) {
            return Err(ThemeError::ReadOnly(theme.id).into());
        }
        match self.user_themes.iter_mut().find(|t| t.id == theme.id) {
            Some(existing) => *existing = theme,
            None => self.user_themes.push(theme),
        }
        Ok(())
    }

    /// Remove a user theme
    ///
    /// Deleting the active theme leaves no current theme; the caller decides
    /// what to apply next.
    pub fn delete_theme(&mut self, id: &str) -> Result<Theme> {
        if builtin::is_builtin(id) {
            return Err(ThemeError::ReadOnly(id.to_string()).into());
        }
        let index = self
            .user_themes
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ThemeError::NotFound(id.to_string()))?;
        let removed = self.user_themes.remove(index);

        if self.state.current_theme_id.as_deref() == Some(id) {
            warn!("Deleted the active theme {}; no theme is current", id);
            self.state.current_theme_id = None;
            self.emit(ThemeEvent::ActiveThemeDeleted { id: id.to_string() });
        }

        info!("Deleted theme: {} ({})", removed.name, removed.id);
        self.emit(ThemeEvent::ThemeDeleted { id: id.to_string() });
        Ok(removed)
    }

    /// Replace the live theme with the safe theme when ink/surface contrast
    /// falls below `MIN_THEME_CONTRAST`
    pub fn ensure_minimal_theme_contrast(&mut self) -> Option<ContrastWarning> {
        let contrast = self.tokens.contrast();
        if contrast >= MIN_THEME_CONTRAST {
            return None;
        }

        let offending = self.state.current_theme_id.clone();
        warn!(
            "Theme {:?} has ink/surface contrast {:.3}, below {}; applying {}",
            offending, contrast, MIN_THEME_CONTRAST, self.config.safe_theme_id
        );
        let safe_id = self.config.safe_theme_id.clone();
        let replacement_id = self.apply_theme(&safe_id);

        let warning = ContrastWarning {
            theme_id: offending,
            contrast,
            replacement_id,
        };
        self.emit(ThemeEvent::ContrastWarning(warning.clone()));
        Some(warning)
    }

    /// Add a theme from a JSON payload or share code to the user library
    pub fn import(&mut self, payload: &str) -> Result<Theme> {
        let theme = if payload.trim_start().starts_with('{') {
            transfer::import_theme(payload)?
        } else {
            transfer::import_share_code(payload)?
        };
        self.add_user_theme(theme.clone())?;
        Ok(theme)
    }

    /// Import an untrusted theme payload, apply it and run the contrast guard
    pub fn import_and_apply(&mut self, payload: &str) -> Result<(Theme, Option<ContrastWarning>)> {
        let theme = self.import(payload)?;
        self.apply_theme(&theme.id);
        let warning = self.ensure_minimal_theme_contrast();
        Ok((theme, warning))
    }
}
