//! Tincture UI Library
//!
//! Consumers of the core theming engine that sit at the rendering layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  tokens   ┌──────────────────┐
//! │ ThemeService │ ────────▶ │ CssVariableSink  │ ──▶ :root { --a0 ... }
//! │  (engine +   │           └──────────────────┘
//! │   storage)   │  palette  ┌──────────────────┐
//! │              │ ────────▶ │ render_email     │ ──▶ remediated HTML
//! └──────────────┘           └──────────────────┘
//! ```

pub mod css_sink;
pub mod email;
pub mod service;

pub use css_sink::{CssVariableSink, TRANSITION_PROPERTY};
pub use email::{render_email, EmailMode, RenderedEmail};
pub use service::ThemeService;
