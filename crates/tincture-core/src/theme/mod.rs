//! Theme token model
//!
//! - `engine`    - live tokens, theme selection, contrast guard
//! - `observers` - per-token subscriptions, sinks, batching
//! - `ramp`      - contrast scalar to lightness ramp (and back)
//! - `migration` - version 0 to version 1 themes
//! - `transfer`  - JSON and share-code import/export
//! - `builtin`   - read-only built-in themes

pub mod builtin;
mod engine;
mod migration;
mod observers;
pub mod ramp;
mod transfer;

pub use builtin::{builtin_theme, builtin_themes, is_builtin};
pub use engine::{
    ContrastWarning, EngineConfig, RandomThemeParams, ThemeEngine, ThemeEvent, MIN_THEME_CONTRAST,
};
pub use migration::{migrate_v0_to_v1, LEGACY_ACCENT_HUE_ROTATION};
pub use observers::{SubscriptionId, ThemeSink};
pub use ramp::contrast_from_lightness;
pub use transfer::{export_share_code, export_theme, import_share_code, import_theme};
