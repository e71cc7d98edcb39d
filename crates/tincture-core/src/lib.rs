//! Tincture Core Library
//!
//! This crate provides the theming engine behind Tincture:
//! - OKLCH color math and CSS color parsing
//! - A 15-token theme model with reactive observers and batching
//! - Theme migration, import/export and the built-in theme set
//! - Contrast remediation for third-party HTML such as email bodies
//! - SQLite-based persistence for user themes and the active selection
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     tincture-core                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  color/        - OKLCH <-> sRGB, CSS color parsing          │
//! │  theme/        - Engine, observers, ramps, migration        │
//! │  remediate/    - HTML fragment tree, contrast rewriting     │
//! │  storage/      - SQLite database, queries                   │
//! │  types/        - Tokens, themes, active state               │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod color;
pub mod error;
pub mod remediate;
pub mod storage;
pub mod theme;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

pub use color::{parse_css_color, CssColor, Oklch, Rgba};

pub use theme::{
    ContrastWarning, EngineConfig, RandomThemeParams, SubscriptionId, ThemeEngine, ThemeEvent,
    ThemeSink,
};

pub use remediate::{remediate, remediate_html, Document, RemediationPalette, RemediationReport};

pub use storage::Storage;
